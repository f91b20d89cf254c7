//! # Twitter Scraper Library
//!
//! Retrieves search results and profile timelines from the undocumented
//! Twitter/X frontend API and normalizes them into tweets, accounts and
//! pagination cursors.
//!
//! ## Features
//!
//! - Lenient decoding of the `globalObjects` / `timeline` response envelope
//! - Normalized `Tweet`, `Video` and `Account` values
//! - Cursor pagination with deduplication, a 40-item page ceiling and
//!   partial results on failure
//! - HTTP service exposing the operations as JSON
//! - Structured logging
//!
//! ## Configuration
//!
//! - `xapi_bearer_token`: Bearer token of the web client (required)
//! - `xapi_guest_token` / `xapi_csrf_token`: Session tokens (optional)
//! - `XAPI_BASE_URL`: API base URL (defaults to `https://twitter.com/i/api`)
//! - `XAPI_TIMEOUT_SECS`: Per-request timeout (defaults to 30)
//! - `PORT`: Server port (defaults to 3000)
//!
//! ## API Endpoints
//!
//! - `GET /`: Returns a welcome message
//! - `GET /health`: Returns service health status
//! - `GET /search/tweets?q=&max=&cursor=`: Tweet search
//! - `GET /search/accounts?q=&max=&cursor=`: Account search
//! - `GET /timeline/{user_id}?max=&cursor=`: Profile timeline

pub mod config;
pub mod error;
pub mod handlers;
pub mod twitter;

// Re-export commonly used types and functions
pub use config::{get_server_port, ScraperConfig};
pub use error::ScrapeError;
pub use handlers::{create_router, handle_health, handle_root, AppState};
pub use twitter::{
    search_accounts, search_tweets, user_timeline, Account, ApiClient, Collected, Endpoint,
    PageFetcher, Tweet, Video,
};

#[cfg(test)]
mod tests;
