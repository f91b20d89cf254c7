//! HTTP route handlers for the scraper service.
//!
//! This module contains the HTTP route handler functions that expose the
//! search and timeline operations as JSON endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::twitter::{sanitize_for_logging, ApiClient, Collected};

/// Number of items returned when the request does not say.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Shared state of all handlers.
pub type AppState = Arc<ApiClient>;

type HandlerResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

/// Query string of the search endpoints.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_max_results")]
    pub max: usize,
    #[serde(default)]
    pub cursor: String,
}

/// Query string of the timeline endpoint.
#[derive(Debug, Deserialize)]
pub struct TimelineParams {
    #[serde(default = "default_max_results")]
    pub max: usize,
    #[serde(default)]
    pub cursor: String,
}

/// Builds the router with all service routes.
///
/// Middleware is left to the caller so tests can drive the bare routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/search/tweets", get(handle_search_tweets))
        .route("/search/accounts", get(handle_search_accounts))
        .route("/timeline/:user_id", get(handle_user_timeline))
        .with_state(state)
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"status": "error", "message": message})),
    )
}

/// Renders collected items, reporting partial results on failure.
///
/// # Success Response
///
/// ```json
/// {"status": "success", "count": 2, "items": [...], "next_cursor": "..."}
/// ```
///
/// # Error Response (502)
///
/// ```json
/// {"status": "error", "message": "Failed to search tweets", "error": "...",
///  "count": 1, "items": [...], "next_cursor": "..."}
/// ```
fn collected_response<T: Serialize>(operation: &str, collected: Collected<T>) -> HandlerResult {
    let count = collected.items.len();
    match collected.error {
        None => {
            info!("{} returned {} items", operation, count);
            Ok(Json(json!({
                "status": "success",
                "count": count,
                "items": collected.items,
                "next_cursor": collected.next_cursor,
            })))
        }
        Some(e) => {
            error!("{} failed after {} items: {}", operation, count, e);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "status": "error",
                    "message": format!("Failed to {}", operation.replace('_', " ")),
                    "error": e.to_string(),
                    "count": count,
                    "items": collected.items,
                    "next_cursor": collected.next_cursor,
                })),
            ))
        }
    }
}

/// Handles GET requests to the `/` endpoint.
pub async fn handle_root() -> &'static str {
    "Twitter scraper is up. Try /search/tweets?q=rust"
}

/// Handles GET requests to the `/health` endpoint.
///
/// # Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "service": "twitter-scraper"
/// }
/// ```
pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "twitter-scraper"}))
}

/// Handles GET requests to `/search/tweets?q=...&max=...&cursor=...`.
pub async fn handle_search_tweets(
    State(client): State<AppState>,
    Query(params): Query<SearchParams>,
) -> HandlerResult {
    if params.q.trim().is_empty() {
        return Err(bad_request("Query parameter 'q' must not be empty"));
    }
    info!(
        "Tweet search request for '{}' (max {})",
        sanitize_for_logging(&params.q, 100),
        params.max
    );
    let collected = client
        .search_tweets(&params.q, params.max, &params.cursor)
        .await;
    collected_response("search_tweets", collected)
}

/// Handles GET requests to `/search/accounts?q=...&max=...&cursor=...`.
pub async fn handle_search_accounts(
    State(client): State<AppState>,
    Query(params): Query<SearchParams>,
) -> HandlerResult {
    if params.q.trim().is_empty() {
        return Err(bad_request("Query parameter 'q' must not be empty"));
    }
    info!(
        "Account search request for '{}' (max {})",
        sanitize_for_logging(&params.q, 100),
        params.max
    );
    let collected = client
        .search_accounts(&params.q, params.max, &params.cursor)
        .await;
    collected_response("search_accounts", collected)
}

/// Handles GET requests to `/timeline/{user_id}?max=...&cursor=...`.
pub async fn handle_user_timeline(
    State(client): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<TimelineParams>,
) -> HandlerResult {
    if user_id.is_empty() || !user_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad_request("User id must be numeric"));
    }
    info!("Timeline request for user {} (max {})", user_id, params.max);
    let collected = client
        .user_timeline(&user_id, params.max, &params.cursor)
        .await;
    collected_response("fetch_timeline", collected)
}
