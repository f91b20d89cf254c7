//! Error types for the scraper.

use thiserror::Error;

/// Errors that can end a scrape.
///
/// Field-level schema drift is not represented here: mistyped or missing
/// fields decode to their defaults and never abort a page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Twitter API error for operation '{operation}' ({status})")]
    Status { status: u16, operation: String },

    /// Response body could not be decoded as a timeline
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Upstream reported an error object instead of a timeline
    #[error("Twitter API returned error {code}: {message}")]
    Api { code: i64, message: String },

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cancellation was requested between two page fetches
    #[error("Scrape cancelled")]
    Cancelled,

    /// Any other failure reported by a page fetcher
    #[error("{0}")]
    Fetch(String),
}

impl ScrapeError {
    /// Whether this error was caused by cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScrapeError::Cancelled)
    }
}
