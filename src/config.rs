//! Configuration module for the scraper service.
//!
//! This module contains the configuration structure and environment variable
//! handling for requests against the Twitter/X frontend API.

use log::{debug, error, info, warn};
use std::env;
use std::time::Duration;

use crate::error::ScrapeError;

/// Default base URL of the frontend API.
pub const DEFAULT_API_BASE: &str = "https://twitter.com/i/api";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for requests against the frontend API.
///
/// Session management is out of scope: the tokens are supplied as-is and sent
/// with every page request.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Bearer token of the web client, sent as `Authorization: Bearer ...`
    pub bearer_token: String,
    /// Guest token, sent as `x-guest-token` when present
    pub guest_token: Option<String>,
    /// CSRF token, sent as `x-csrf-token` when present
    pub csrf_token: Option<String>,
    /// Base URL the endpoint paths are appended to
    pub api_base: String,
    /// Timeout applied to each page request
    pub request_timeout: Duration,
}

/// Masks a secret for logging, keeping at most its first and last 8 characters.
pub(crate) fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let len = chars.len();
    if len > 16 {
        let prefix: String = chars[..8].iter().collect();
        let suffix: String = chars[len - 8..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        let prefix: String = chars[..len.min(8)].iter().collect();
        format!("{}...", prefix)
    }
}

fn optional_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            info!("Found {} environment variable", name);
            debug!("{} (masked): {}", name, mask_token(&value));
            Some(value)
        }
        Ok(_) => {
            warn!("{} is set but empty, ignoring it", name);
            None
        }
        Err(_) => {
            info!("No {} found in environment variables", name);
            None
        }
    }
}

impl ScraperConfig {
    /// Creates a configuration with the default base URL and timeout.
    pub fn new(bearer_token: impl Into<String>) -> Self {
        ScraperConfig {
            bearer_token: bearer_token.into(),
            guest_token: None,
            csrf_token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Points the configuration at another base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Creates a new `ScraperConfig` from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `xapi_bearer_token`: Bearer token of the web client
    ///
    /// # Optional Environment Variables
    ///
    /// - `xapi_guest_token`: Guest token for unauthenticated sessions
    /// - `xapi_csrf_token`: CSRF token for cookie-backed sessions
    /// - `XAPI_BASE_URL`: Base URL of the API (defaults to `https://twitter.com/i/api`)
    /// - `XAPI_TIMEOUT_SECS`: Per-request timeout in seconds (defaults to 30)
    ///
    /// # Returns
    ///
    /// - `Ok(ScraperConfig)`: If the bearer token is present and the optional values parse
    /// - `Err(ScrapeError::Config)`: If the bearer token is missing or a value is invalid
    ///
    /// # Example
    ///
    /// ```rust
    /// use twitter_scraper::ScraperConfig;
    ///
    /// std::env::set_var("xapi_bearer_token", "your_bearer_token");
    /// let config = ScraperConfig::from_env().unwrap();
    /// assert_eq!(config.bearer_token, "your_bearer_token");
    /// ```
    pub fn from_env() -> Result<Self, ScrapeError> {
        info!("Loading scraper configuration from environment variables");

        let bearer_token = match env::var("xapi_bearer_token") {
            Ok(token) if !token.trim().is_empty() => {
                info!(
                    "Found xapi_bearer_token environment variable with length: {}",
                    token.len()
                );
                debug!("Bearer token (masked): {}", mask_token(&token));
                token
            }
            Ok(_) => {
                error!("Bearer token is empty");
                return Err(ScrapeError::Config(
                    "xapi_bearer_token cannot be empty".to_string(),
                ));
            }
            Err(e) => {
                error!("Failed to load xapi_bearer_token from environment: {}", e);
                return Err(ScrapeError::Config(format!(
                    "Missing xapi_bearer_token environment variable: {}",
                    e
                )));
            }
        };

        let api_base = match env::var("XAPI_BASE_URL") {
            Ok(base) if !base.trim().is_empty() => {
                url::Url::parse(&base).map_err(|e| {
                    ScrapeError::Config(format!("XAPI_BASE_URL '{}' is not a valid URL: {}", base, e))
                })?;
                info!("Using API base URL {}", base);
                base
            }
            _ => DEFAULT_API_BASE.to_string(),
        };

        let request_timeout = match env::var("XAPI_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    ScrapeError::Config(format!("XAPI_TIMEOUT_SECS '{}' is not a number", raw))
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let config = ScraperConfig {
            bearer_token,
            guest_token: optional_var("xapi_guest_token"),
            csrf_token: optional_var("xapi_csrf_token"),
            api_base,
            request_timeout,
        };

        if config.guest_token.is_none() && config.csrf_token.is_none() {
            warn!("Neither guest token nor CSRF token configured - the API may reject requests");
        }
        info!("Scraper configuration loaded successfully");

        Ok(config)
    }
}

/// Gets the server port from environment variables or returns the default.
///
/// This function reads the `PORT` environment variable and parses it as a u16.
/// If the environment variable is not set, it defaults to 3000.
///
/// # Panics
///
/// This function will panic if the `PORT` environment variable is set to a value
/// that cannot be parsed as a valid port number.
///
/// # Example
///
/// ```rust
/// use twitter_scraper::get_server_port;
///
/// std::env::remove_var("PORT");
/// assert_eq!(get_server_port(), 3000);
/// ```
pub fn get_server_port() -> u16 {
    env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .expect("PORT must be a valid number")
}
