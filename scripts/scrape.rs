//! One-shot Scraping Script
//!
//! This script runs a single search or timeline scrape against the frontend
//! API and prints the collected items as JSON.
//!
//! Usage:
//!
//! ```text
//! scrape tweets   "<query>"  [max] [cursor]
//! scrape accounts "<query>"  [max] [cursor]
//! scrape timeline <user_id>  [max] [cursor]
//! ```
//!
//! Requires `xapi_bearer_token` (and usually `xapi_guest_token`) in the
//! environment.

use serde::Serialize;
use std::process::ExitCode;

use twitter_scraper::{ApiClient, Collected, ScraperConfig};

fn usage() -> ExitCode {
    eprintln!("Usage: scrape <tweets|accounts|timeline> <query-or-user-id> [max] [cursor]");
    ExitCode::from(2)
}

/// Prints the collected items and reports whether every page succeeded.
fn report<T: Serialize>(collected: Collected<T>) -> ExitCode {
    match serde_json::to_string_pretty(&collected) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("❌ Failed to serialize results: {}", e);
            return ExitCode::FAILURE;
        }
    }

    eprintln!("📦 {} items collected", collected.items.len());
    if let Some(cursor) = &collected.next_cursor {
        eprintln!("➡️  Resume with cursor: {}", cursor);
    }
    match &collected.error {
        None => ExitCode::SUCCESS,
        Some(e) => {
            eprintln!("❌ Scrape stopped early: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        return usage();
    }
    let mode = args[0].as_str();
    let subject = args[1].as_str();
    let max_results = match args.get(2).map(|m| m.parse::<usize>()) {
        None => 20,
        Some(Ok(max)) => max,
        Some(Err(_)) => {
            eprintln!("❌ max must be a number, got '{}'", args[2]);
            return usage();
        }
    };
    let cursor = args.get(3).map(String::as_str).unwrap_or("");

    let client = match ScraperConfig::from_env().and_then(ApiClient::new) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    eprintln!("🔍 Scraping {} for '{}' (max {})", mode, subject, max_results);
    match mode {
        "tweets" => report(client.search_tweets(subject, max_results, cursor).await),
        "accounts" => report(client.search_accounts(subject, max_results, cursor).await),
        "timeline" => report(client.user_timeline(subject, max_results, cursor).await),
        _ => usage(),
    }
}
