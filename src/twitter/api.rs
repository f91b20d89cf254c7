//! Core frontend API utilities.
//!
//! This module builds page requests for the search and profile timeline
//! endpoints and sends them with the configured tokens. It is the production
//! [`PageFetcher`]; nothing in here interprets the response body.

use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use url::Url;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;

use super::paginate::{PageFetcher, MAX_PAGE_SIZE};

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// This function:
/// - Truncates long text to prevent log flooding
/// - Replaces control characters that could manipulate log output
/// - Escapes newlines to prevent log injection
pub(crate) fn sanitize_for_logging(text: &str, max_len: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.chars().count() > max_len {
        let truncated: String = sanitized.chars().take(max_len).collect();
        format!(
            "{}... [truncated, {} total bytes]",
            truncated,
            text.len()
        )
    } else {
        sanitized
    }
}

/// Builds the Authorization header value for a bearer token.
pub fn build_bearer_auth_header(bearer_token: &str) -> String {
    format!("Bearer {}", bearer_token)
}

/// Query parameters the web client sends with every timeline request.
const COMMON_PARAMS: &[(&str, &str)] = &[
    ("include_profile_interstitial_type", "1"),
    ("include_blocking", "1"),
    ("include_blocked_by", "1"),
    ("include_followed_by", "1"),
    ("include_want_retweets", "1"),
    ("include_mute_edge", "1"),
    ("include_can_dm", "1"),
    ("include_can_media_tag", "1"),
    ("skip_status", "1"),
    ("cards_platform", "Web-12"),
    ("include_cards", "1"),
    ("include_ext_alt_text", "true"),
    ("include_quote_count", "true"),
    ("include_reply_count", "1"),
    ("tweet_mode", "extended"),
    ("include_entities", "true"),
    ("include_user_entities", "true"),
    ("include_ext_media_color", "true"),
    ("include_ext_media_availability", "true"),
    ("send_error_codes", "true"),
    ("simple_quoted_tweet", "true"),
];

/// The endpoints that answer with the shared timeline envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Latest tweets matching a search query
    SearchTweets,
    /// Accounts matching a search query
    SearchAccounts,
    /// Tweets of one account, subject is the numeric user id
    UserTimeline,
}

impl Endpoint {
    pub fn operation_name(&self) -> &'static str {
        match self {
            Endpoint::SearchTweets => "search_tweets",
            Endpoint::SearchAccounts => "search_accounts",
            Endpoint::UserTimeline => "user_timeline",
        }
    }

    /// Builds the request URL for one page.
    ///
    /// `page_size` is clamped to [`MAX_PAGE_SIZE`]; `cursor` is omitted when
    /// `None` or empty.
    pub fn build_url(
        &self,
        api_base: &str,
        subject: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<Url, ScrapeError> {
        let mut url = Url::parse(api_base)
            .map_err(|e| ScrapeError::Config(format!("Invalid API base '{}': {}", api_base, e)))?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ScrapeError::Config(format!("API base '{}' cannot take a path", api_base))
            })?;
            segments.pop_if_empty();
            match self {
                Endpoint::SearchTweets | Endpoint::SearchAccounts => {
                    segments.extend(["2", "search", "adaptive.json"]);
                }
                Endpoint::UserTimeline => {
                    let file = format!("{}.json", subject);
                    segments.extend(["2", "timeline", "profile", file.as_str()]);
                }
            }
        }

        let count = page_size.min(MAX_PAGE_SIZE).to_string();
        {
            let mut query = url.query_pairs_mut();
            query.extend_pairs(COMMON_PARAMS.iter().copied());
            match self {
                Endpoint::SearchTweets | Endpoint::SearchAccounts => {
                    query
                        .append_pair("q", subject)
                        .append_pair("query_source", "typed_query")
                        .append_pair("pc", "1")
                        .append_pair("spelling_corrections", "1");
                    if *self == Endpoint::SearchTweets {
                        query.append_pair("tweet_search_mode", "live");
                    } else {
                        query.append_pair("result_filter", "user");
                    }
                }
                Endpoint::UserTimeline => {
                    query
                        .append_pair("userId", subject)
                        .append_pair("include_tweet_replies", "false");
                }
            }
            query.append_pair("count", &count);
            if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
                query.append_pair("cursor", cursor);
            }
        }

        Ok(url)
    }
}

/// HTTP client for the frontend API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: ScraperConfig,
}

impl ApiClient {
    /// Creates a client whose requests time out after the configured duration.
    pub fn new(config: ScraperConfig) -> Result<Self, ScrapeError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(ApiClient { http, config })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// A page fetcher bound to one endpoint.
    pub fn fetcher(&self, endpoint: Endpoint) -> ApiFetcher<'_> {
        ApiFetcher {
            client: self,
            endpoint,
        }
    }

    /// Fetches one page and returns its body.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The response body on a success status
    /// - `Err(ScrapeError::Http)`: If the request could not be sent or timed out
    /// - `Err(ScrapeError::Status)`: If the API answered with a non-success status
    pub async fn fetch_page(
        &self,
        endpoint: Endpoint,
        subject: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<String, ScrapeError> {
        let operation_name = endpoint.operation_name();
        let url = endpoint.build_url(&self.config.api_base, subject, page_size, cursor)?;
        info!("Making request for operation: {}", operation_name);
        debug!("Request URL for '{}': {}", operation_name, url);

        let mut request = self
            .http
            .get(url)
            .header(
                "Authorization",
                build_bearer_auth_header(&self.config.bearer_token),
            )
            .header("x-twitter-active-user", "yes")
            .header("x-twitter-client-language", "en");
        if let Some(guest_token) = &self.config.guest_token {
            request = request.header("x-guest-token", guest_token);
        }
        if let Some(csrf_token) = &self.config.csrf_token {
            request = request.header("x-csrf-token", csrf_token);
        }

        let response = request.send().await?;
        let status = response.status();
        info!(
            "Received response with status: {} for operation: {}",
            status, operation_name
        );

        if status.is_success() {
            let response_text = response.text().await?;
            debug!(
                "Response summary for '{}': {} bytes received",
                operation_name,
                response_text.len()
            );
            return Ok(response_text);
        }

        let error_text = response.text().await.unwrap_or_default();
        error!("Operation '{}' failed - Status: {}", operation_name, status);
        debug!(
            "Error response for '{}': {}",
            operation_name,
            sanitize_for_logging(&error_text, 200)
        );
        Err(ScrapeError::Status {
            status: status.as_u16(),
            operation: operation_name.to_string(),
        })
    }
}

/// [`PageFetcher`] backed by an [`ApiClient`] and one endpoint.
#[derive(Debug, Clone, Copy)]
pub struct ApiFetcher<'a> {
    client: &'a ApiClient,
    endpoint: Endpoint,
}

#[async_trait]
impl<'a> PageFetcher for ApiFetcher<'a> {
    async fn fetch(
        &self,
        subject: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<String, ScrapeError> {
        self.client
            .fetch_page(self.endpoint, subject, page_size, cursor)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn params(url: &Url) -> HashMap<String, String> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_search_tweets_url() {
        let url = Endpoint::SearchTweets
            .build_url("https://twitter.com/i/api", "joko widodo", 20, None)
            .unwrap();
        assert_eq!(url.path(), "/i/api/2/search/adaptive.json");

        let params = params(&url);
        assert_eq!(params["q"], "joko widodo");
        assert_eq!(params["count"], "20");
        assert_eq!(params["tweet_search_mode"], "live");
        assert_eq!(params["tweet_mode"], "extended");
        assert!(!params.contains_key("cursor"));
        assert!(!params.contains_key("result_filter"));
    }

    #[test]
    fn test_search_accounts_url_clamps_count() {
        let url = Endpoint::SearchAccounts
            .build_url("https://twitter.com/i/api/", "rust", 250, Some("scroll:abc"))
            .unwrap();
        assert_eq!(url.path(), "/i/api/2/search/adaptive.json");

        let params = params(&url);
        assert_eq!(params["count"], "40");
        assert_eq!(params["result_filter"], "user");
        assert_eq!(params["cursor"], "scroll:abc");
    }

    #[test]
    fn test_user_timeline_url() {
        let url = Endpoint::UserTimeline
            .build_url("https://api.twitter.com", "783214", 40, Some(""))
            .unwrap();
        assert_eq!(url.path(), "/2/timeline/profile/783214.json");

        let params = params(&url);
        assert_eq!(params["userId"], "783214");
        assert!(!params.contains_key("cursor"));
    }

    #[test]
    fn test_invalid_base_is_a_config_error() {
        assert!(matches!(
            Endpoint::SearchTweets.build_url("not a url", "q", 10, None),
            Err(ScrapeError::Config(_))
        ));
    }

    #[test]
    fn test_sanitize_for_logging() {
        assert_eq!(sanitize_for_logging("a\nb\tc\u{7}", 100), "a b c?");
        let long = "x".repeat(50);
        assert_eq!(
            sanitize_for_logging(&long, 10),
            "xxxxxxxxxx... [truncated, 50 total bytes]"
        );
    }

    #[test]
    fn test_build_bearer_auth_header() {
        assert_eq!(build_bearer_auth_header("abc"), "Bearer abc");
    }
}
