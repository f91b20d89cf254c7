//! # Tests Module
//!
//! Crate-level tests for the scraper service.
//!
//! ## Test Categories
//!
//! ### Unit Tests
//! - Configuration loading (`ScraperConfig::from_env`)
//! - Server configuration (`get_server_port`)
//!
//! ### Integration Tests
//! - HTTP endpoint testing for all routes
//! - The HTTP page fetcher against a local fake of the frontend API
//!
//! ## Test Environment
//!
//! No test talks to the real API. The fake upstream binds to an ephemeral
//! localhost port; failure cases point the client at a closed port.

use crate::{
    config::{get_server_port, ScraperConfig, DEFAULT_API_BASE},
    error::ScrapeError,
    handlers::{create_router, handle_health, handle_root},
    twitter::ApiClient,
};
use axum::{
    body::Body,
    extract::Query,
    http::{HeaderMap, Request, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Creates a test application whose client points at a closed local port,
/// so every upstream request fails fast.
fn create_test_app() -> Router {
    let mut config = ScraperConfig::new("test-token").with_api_base("http://127.0.0.1:1/i/api");
    config.request_timeout = Duration::from_secs(2);
    let client = ApiClient::new(config).unwrap();
    create_router(Arc::new(client))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json_response: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json_response)
}

/// Builds a search page with tweets `ids` by user 1 and an optional bottom cursor.
fn fake_page(ids: &[&str], cursor: Option<&str>) -> String {
    let mut tweets = serde_json::Map::new();
    let mut entries = Vec::new();
    for id in ids {
        tweets.insert(
            id.to_string(),
            serde_json::json!({
                "id_str": id,
                "full_text": format!("tweet {} #rust", id),
                "created_at": "Wed Oct 10 20:19:24 +0000 2018",
                "user_id_str": "1",
                "entities": {"hashtags": [{"text": "rust"}]}
            }),
        );
        entries.push(serde_json::json!({
            "entryId": format!("sq-I-t-{}", id),
            "content": {"item": {"content": {"tweet": {"id": id}}}}
        }));
        entries.push(serde_json::json!({
            "entryId": format!("sq-U-{}", id),
            "content": {"item": {"content": {"user": {"id": "1"}}}}
        }));
    }
    if let Some(cursor) = cursor {
        entries.push(serde_json::json!({
            "entryId": "sq-cursor-bottom",
            "content": {"operation": {"cursor": {"value": cursor, "cursorType": "Bottom"}}}
        }));
    }
    serde_json::json!({
        "globalObjects": {
            "tweets": tweets,
            "users": {"1": {"id_str": "1", "screen_name": "rustacean", "followers_count": 5}}
        },
        "timeline": {"instructions": [{"addEntries": {"entries": entries}}]}
    })
    .to_string()
}

/// Fake of `2/search/adaptive.json` serving two pages.
async fn fake_adaptive(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == "Bearer test-token");
    if !authorized {
        return (StatusCode::UNAUTHORIZED, r#"{"errors":[]}"#.to_string());
    }

    let count: usize = params
        .get("count")
        .and_then(|c| c.parse().ok())
        .unwrap_or(0);
    if count == 0 || count > 40 || params.get("q").map(String::as_str) != Some("rust lang") {
        return (StatusCode::BAD_REQUEST, "{}".to_string());
    }

    match params.get("cursor").map(String::as_str) {
        None => (StatusCode::OK, fake_page(&["1", "2"], Some("c1"))),
        Some("c1") => (StatusCode::OK, fake_page(&["2", "3"], None)),
        Some(_) => (StatusCode::BAD_REQUEST, "{}".to_string()),
    }
}

/// Starts the fake frontend API and returns its base URL.
async fn start_fake_api() -> String {
    let app = Router::new().route("/i/api/2/search/adaptive.json", get(fake_adaptive));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/i/api", addr)
}

/// Tests the root endpoint handler function directly.
#[tokio::test]
async fn test_handle_root() {
    let response = handle_root().await;
    assert!(response.starts_with("Twitter scraper is up"));
}

/// Tests the health endpoint handler function directly.
#[tokio::test]
async fn test_handle_health() {
    let Json(json_response) = handle_health().await;

    assert_eq!(json_response["status"], "healthy");
    assert_eq!(json_response["service"], "twitter-scraper");
}

/// Integration test for the health endpoint (GET /health).
#[tokio::test]
async fn test_health_endpoint() {
    let (status, json_response) = get_json(create_test_app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_response["status"], "healthy");
}

/// A search without `q` is rejected by the query extractor.
#[tokio::test]
async fn test_search_without_query_is_rejected() {
    let (status, _) = get_json(create_test_app(), "/search/tweets").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json_response) = get_json(create_test_app(), "/search/accounts?q=%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_response["status"], "error");
}

/// A non-numeric user id never reaches the upstream API.
#[tokio::test]
async fn test_timeline_rejects_non_numeric_user() {
    let (status, json_response) = get_json(create_test_app(), "/timeline/jack").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_response["message"], "User id must be numeric");
}

/// When the upstream API is unreachable the endpoint answers 502 with an
/// error body and an empty partial result.
#[tokio::test]
async fn test_search_endpoint_upstream_unreachable() {
    let (status, json_response) = get_json(create_test_app(), "/search/tweets?q=rust&max=5").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json_response["status"], "error");
    assert_eq!(json_response["count"], 0);
    assert!(json_response["message"]
        .as_str()
        .unwrap()
        .contains("Failed to search tweets"));
}

/// The HTTP fetcher follows cursors across pages of the fake API.
#[tokio::test]
async fn test_api_client_paginates_over_http() {
    let base = start_fake_api().await;
    let client = ApiClient::new(ScraperConfig::new("test-token").with_api_base(base)).unwrap();

    let collected = client.search_tweets("rust lang", 100, "").await;

    assert!(collected.is_complete(), "error: {:?}", collected.error);
    let ids: Vec<&str> = collected.items.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(collected.items[0].username, "rustacean");
    assert_eq!(collected.items[0].hashtags, vec!["rust"]);
    assert_eq!(
        collected.items[2].permanent_url,
        "https://twitter.com/rustacean/status/3"
    );
    assert_eq!(collected.next_cursor, None);

    let accounts = client.search_accounts("rust lang", 10, "").await;
    assert!(accounts.is_complete());
    assert_eq!(accounts.items.len(), 1);
    assert_eq!(accounts.items[0].followers_count, 5);
}

/// The service endpoint returns the normalized tweets as JSON.
#[tokio::test]
async fn test_search_endpoint_over_fake_api() {
    let base = start_fake_api().await;
    let client = ApiClient::new(ScraperConfig::new("test-token").with_api_base(base)).unwrap();
    let app = create_router(Arc::new(client));

    let (status, json_response) = get_json(app, "/search/tweets?q=rust%20lang&max=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_response["status"], "success");
    assert_eq!(json_response["count"], 2);
    assert_eq!(json_response["items"][1]["id"], "2");
    assert_eq!(json_response["next_cursor"], "c1");
}

/// A rejected token surfaces as a status error with no items.
#[tokio::test]
async fn test_api_client_reports_status_errors() {
    let base = start_fake_api().await;
    let client = ApiClient::new(ScraperConfig::new("wrong-token").with_api_base(base)).unwrap();

    let collected = client.search_tweets("rust lang", 10, "").await;

    assert!(collected.items.is_empty());
    match collected.error {
        Some(ScrapeError::Status { status, operation }) => {
            assert_eq!(status, 401);
            assert_eq!(operation, "search_tweets");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

/// Unit test for `ScraperConfig::from_env`.
///
/// All environment manipulation for the scraper variables lives in this one
/// test so parallel tests never observe each other's values.
#[test]
fn test_scraper_config_from_env() {
    std::env::remove_var("xapi_bearer_token");
    std::env::remove_var("xapi_guest_token");
    std::env::remove_var("xapi_csrf_token");
    std::env::remove_var("XAPI_BASE_URL");
    std::env::remove_var("XAPI_TIMEOUT_SECS");
    assert!(matches!(
        ScraperConfig::from_env(),
        Err(ScrapeError::Config(_))
    ));

    std::env::set_var("xapi_bearer_token", "   ");
    assert!(matches!(
        ScraperConfig::from_env(),
        Err(ScrapeError::Config(_))
    ));

    std::env::set_var("xapi_bearer_token", "AAAAAAAAAAAAAAAAAAAAAbearer");
    std::env::set_var("xapi_guest_token", "1234567890");
    let config = ScraperConfig::from_env().unwrap();
    assert_eq!(config.bearer_token, "AAAAAAAAAAAAAAAAAAAAAbearer");
    assert_eq!(config.guest_token.as_deref(), Some("1234567890"));
    assert_eq!(config.csrf_token, None);
    assert_eq!(config.api_base, DEFAULT_API_BASE);
    assert_eq!(config.request_timeout, Duration::from_secs(30));

    std::env::set_var("XAPI_BASE_URL", "http://localhost:9999/api");
    std::env::set_var("XAPI_TIMEOUT_SECS", "5");
    let config = ScraperConfig::from_env().unwrap();
    assert_eq!(config.api_base, "http://localhost:9999/api");
    assert_eq!(config.request_timeout, Duration::from_secs(5));

    std::env::set_var("XAPI_TIMEOUT_SECS", "soon");
    assert!(matches!(
        ScraperConfig::from_env(),
        Err(ScrapeError::Config(_))
    ));

    // Clean up
    std::env::remove_var("xapi_bearer_token");
    std::env::remove_var("xapi_guest_token");
    std::env::remove_var("XAPI_BASE_URL");
    std::env::remove_var("XAPI_TIMEOUT_SECS");
}

/// Unit test for the token masking used in configuration logs.
#[test]
fn test_mask_token() {
    use crate::config::mask_token;

    assert_eq!(mask_token("short"), "short...");
    assert_eq!(mask_token("0123456789abcdefXYZ"), "01234567...bcdefXYZ");
}

/// Unit test for the get_server_port function.
#[test]
fn test_get_server_port() {
    // Test default port
    std::env::remove_var("PORT");
    let port = get_server_port();
    assert_eq!(port, 3000);

    // Test custom port
    std::env::set_var("PORT", "8080");
    let port = get_server_port();
    assert_eq!(port, 8080);

    // Clean up
    std::env::remove_var("PORT");
}
