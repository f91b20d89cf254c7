//! Cursor-driven pagination over an injected page fetcher.
//!
//! The driver asks for one page at a time, decodes it, projects it onto
//! domain entities and feeds the page's bottom cursor into the next request.
//! Tweets and accounts go through the same loop and differ only in the
//! [`Projection`] used.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

use crate::error::ScrapeError;

use super::cursor::resolve_instructions;
use super::model::{Account, Collected, Identified, Page, Tweet};
use super::normalize::{normalize_account, normalize_tweet};
use super::raw::RawResponse;

/// Largest page the frontend API serves per request.
pub const MAX_PAGE_SIZE: usize = 40;

/// Fetches one raw page.
///
/// Implementations own everything about the request: endpoint, headers,
/// authentication, timeouts and retries. `cursor` is `None` for the first page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(
        &self,
        subject: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<String, ScrapeError>;
}

/// Turns a decoded page into ordered domain entities.
pub trait Projection: Send + Sync {
    type Item: Identified + Send;

    fn project(&self, raw: &RawResponse) -> Page<Self::Item>;
}

/// Projects a page onto its tweets.
///
/// A pinned tweet is placed first, but only on pages that also carry ordinary
/// tweets, so that a final page repeating just the pinned tweet counts as
/// empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct TweetProjection;

impl Projection for TweetProjection {
    type Item = Tweet;

    fn project(&self, raw: &RawResponse) -> Page<Tweet> {
        let resolved = resolve_instructions(&raw.timeline.instructions);
        let objects = &raw.global_objects;
        let lookup = |id: &str| {
            let tweet = objects.tweets.get(id)?;
            normalize_tweet(id, tweet, objects.users.get(&tweet.user_id_str))
        };

        let mut seen = HashSet::new();
        let mut items: Vec<Tweet> = Vec::new();
        for id in resolved.tweet_ids() {
            if !seen.insert(id) {
                continue;
            }
            match lookup(id) {
                Some(tweet) => items.push(tweet),
                None => debug!("Entry references tweet {} missing from the page", id),
            }
        }

        if let Some(pinned_id) = &resolved.pinned_tweet {
            if !items.is_empty() {
                if let Some(mut pinned) = lookup(pinned_id.as_str()) {
                    pinned.is_pinned = true;
                    items.retain(|t| t.id != pinned.id);
                    items.insert(0, pinned);
                }
            }
        }

        Page {
            items,
            next_cursor: resolved.bottom_cursor,
        }
    }
}

/// Projects a page onto its accounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountProjection;

impl Projection for AccountProjection {
    type Item = Account;

    fn project(&self, raw: &RawResponse) -> Page<Account> {
        let resolved = resolve_instructions(&raw.timeline.instructions);
        let users = &raw.global_objects.users;

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for id in resolved.user_ids() {
            if !seen.insert(id) {
                continue;
            }
            match users.get(id).and_then(|user| normalize_account(id, user)) {
                Some(account) => items.push(account),
                None => debug!("Entry references user {} missing from the page", id),
            }
        }

        Page {
            items,
            next_cursor: resolved.bottom_cursor,
        }
    }
}

/// Collects up to `max_results` entities for `subject`, starting at `cursor`
/// (`None` or empty for the beginning).
///
/// Each request asks for at most [`MAX_PAGE_SIZE`] items. Paging stops when
/// enough entities were collected, when a page has no bottom cursor or repeats
/// the cursor it was fetched with, or when a page adds no entity that was not
/// already collected. Entities are deduplicated by identifier across pages.
/// When `max_results` is reached partway through a page, the rest of that page
/// is dropped and `next_cursor` points past it, so resuming from that cursor
/// does not return the dropped entities.
///
/// Cancellation is checked before each fetch. A failed fetch, an undecodable
/// page or a cancellation stops paging; the entities collected so far are
/// returned together with the error, and `next_cursor` is the cursor of the
/// page that was not obtained.
pub async fn collect_pages<F, P>(
    fetcher: &F,
    projection: &P,
    subject: &str,
    max_results: usize,
    cursor: Option<&str>,
    cancel: &CancellationToken,
) -> Collected<P::Item>
where
    F: PageFetcher + ?Sized,
    P: Projection,
{
    let mut items: Vec<P::Item> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut cursor = cursor.filter(|c| !c.is_empty()).map(str::to_string);
    let mut page_number = 0usize;

    while items.len() < max_results {
        if cancel.is_cancelled() {
            warn!(
                "Scrape for '{}' cancelled after {} pages ({} items)",
                subject,
                page_number,
                items.len()
            );
            return Collected {
                items,
                next_cursor: cursor,
                error: Some(ScrapeError::Cancelled),
            };
        }

        page_number += 1;
        let page_size = (max_results - items.len()).min(MAX_PAGE_SIZE);
        info!(
            "Fetching page {} for '{}' (page size {}, cursor present: {})",
            page_number,
            subject,
            page_size,
            cursor.is_some()
        );

        let page = match fetcher.fetch(subject, page_size, cursor.as_deref()).await {
            Ok(body) => match RawResponse::from_body(&body) {
                Ok(raw) => projection.project(&raw),
                Err(e) => {
                    error!("Failed to decode page {} for '{}': {}", page_number, subject, e);
                    return Collected {
                        items,
                        next_cursor: cursor,
                        error: Some(e),
                    };
                }
            },
            Err(e) => {
                error!("Failed to fetch page {} for '{}': {}", page_number, subject, e);
                return Collected {
                    items,
                    next_cursor: cursor,
                    error: Some(e),
                };
            }
        };

        let fetched = page.items.len();
        let mut added = 0usize;
        for item in page.items {
            if items.len() >= max_results {
                break;
            }
            if seen.insert(item.id().to_string()) {
                items.push(item);
                added += 1;
            }
        }
        debug!(
            "Page {} for '{}': {} entities, {} new, {} total",
            page_number,
            subject,
            fetched,
            added,
            items.len()
        );

        if added == 0 {
            info!("Page {} for '{}' added nothing new, stopping", page_number, subject);
            cursor = None;
            break;
        }

        match page.next_cursor {
            Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
            Some(_) => {
                info!("Cursor for '{}' did not advance, stopping", subject);
                cursor = None;
                break;
            }
            None => {
                info!("No further pages for '{}'", subject);
                cursor = None;
                break;
            }
        }
    }

    info!(
        "Collected {} items for '{}' in {} pages",
        items.len(),
        subject,
        page_number
    );
    Collected {
        items,
        next_cursor: cursor,
        error: None,
    }
}
