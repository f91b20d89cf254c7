//! # Twitter Scraper
//!
//! HTTP service exposing tweet search, account search and profile timelines
//! scraped from the Twitter/X frontend API.
//!
//! ## Environment Variables
//!
//! - `xapi_bearer_token`: Bearer token of the web client (required)
//! - `xapi_guest_token`: Guest token (optional)
//! - `xapi_csrf_token`: CSRF token (optional)
//! - `XAPI_BASE_URL`: API base URL (optional)
//! - `XAPI_TIMEOUT_SECS`: Per-request timeout in seconds (defaults to 30)
//! - `PORT`: Server port (defaults to 3000)

use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use twitter_scraper::{create_router, get_server_port, ApiClient, ScraperConfig};

/// Main entry point for the scraper web service.
///
/// Initializes logging, loads the configuration, and serves the routes until
/// terminated or interrupted with Ctrl-C.
///
/// # Example Usage
///
/// ```bash
/// # Run with default port 3000
/// xapi_bearer_token=... cargo run
///
/// # Run with debug logging on a custom port
/// RUST_LOG=debug PORT=8080 xapi_bearer_token=... cargo run
/// ```
#[tokio::main]
async fn main() {
    // Initialize the logging system
    env_logger::init();

    let config = match ScraperConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    let client = match ApiClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let app = create_router(Arc::new(client))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let port = get_server_port();
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!("Starting twitter-scraper server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!("HTTP server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }
}
