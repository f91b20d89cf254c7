//! Search and timeline operations.
//!
//! Each operation is the pagination driver paired with one projection. The
//! free functions accept any [`PageFetcher`] already bound to the right
//! endpoint; the [`ApiClient`] methods bind the fetcher for you.

use log::info;
use tokio_util::sync::CancellationToken;

use super::api::{ApiClient, Endpoint};
use super::model::{Account, Collected, Tweet};
use super::paginate::{collect_pages, AccountProjection, PageFetcher, TweetProjection};

/// Searches tweets matching `query`, newest first.
///
/// Collects at most `max_results` tweets starting from `cursor` (empty for the
/// first page). Any failure is returned in [`Collected::error`] next to the
/// tweets gathered before it.
///
/// # Example
///
/// ```rust,no_run
/// use twitter_scraper::{search_tweets, ApiClient, Endpoint, ScraperConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let client = ApiClient::new(ScraperConfig::from_env().unwrap()).unwrap();
///     let fetcher = client.fetcher(Endpoint::SearchTweets);
///     let collected = search_tweets(&fetcher, "#rustlang", 100, "").await;
///     for tweet in &collected.items {
///         println!("{}: {}", tweet.username, tweet.text);
///     }
/// }
/// ```
pub async fn search_tweets<F>(
    fetcher: &F,
    query: &str,
    max_results: usize,
    cursor: &str,
) -> Collected<Tweet>
where
    F: PageFetcher + ?Sized,
{
    search_tweets_cancellable(fetcher, query, max_results, cursor, &CancellationToken::new())
        .await
}

/// [`search_tweets`] that stops before the next page once `cancel` fires.
pub async fn search_tweets_cancellable<F>(
    fetcher: &F,
    query: &str,
    max_results: usize,
    cursor: &str,
    cancel: &CancellationToken,
) -> Collected<Tweet>
where
    F: PageFetcher + ?Sized,
{
    info!("Searching up to {} tweets for '{}'", max_results, query);
    collect_pages(fetcher, &TweetProjection, query, max_results, Some(cursor), cancel).await
}

/// Searches accounts matching `query`.
///
/// Same paging and error contract as [`search_tweets`].
pub async fn search_accounts<F>(
    fetcher: &F,
    query: &str,
    max_results: usize,
    cursor: &str,
) -> Collected<Account>
where
    F: PageFetcher + ?Sized,
{
    search_accounts_cancellable(fetcher, query, max_results, cursor, &CancellationToken::new())
        .await
}

/// [`search_accounts`] that stops before the next page once `cancel` fires.
pub async fn search_accounts_cancellable<F>(
    fetcher: &F,
    query: &str,
    max_results: usize,
    cursor: &str,
    cancel: &CancellationToken,
) -> Collected<Account>
where
    F: PageFetcher + ?Sized,
{
    info!("Searching up to {} accounts for '{}'", max_results, query);
    collect_pages(fetcher, &AccountProjection, query, max_results, Some(cursor), cancel).await
}

/// Collects tweets from the profile timeline of the account `user_id`.
///
/// The account's pinned tweet, if any, comes first with `is_pinned` set.
pub async fn user_timeline<F>(
    fetcher: &F,
    user_id: &str,
    max_results: usize,
    cursor: &str,
) -> Collected<Tweet>
where
    F: PageFetcher + ?Sized,
{
    user_timeline_cancellable(fetcher, user_id, max_results, cursor, &CancellationToken::new())
        .await
}

/// [`user_timeline`] that stops before the next page once `cancel` fires.
pub async fn user_timeline_cancellable<F>(
    fetcher: &F,
    user_id: &str,
    max_results: usize,
    cursor: &str,
    cancel: &CancellationToken,
) -> Collected<Tweet>
where
    F: PageFetcher + ?Sized,
{
    info!("Fetching up to {} timeline tweets of user {}", max_results, user_id);
    collect_pages(fetcher, &TweetProjection, user_id, max_results, Some(cursor), cancel).await
}

impl ApiClient {
    pub async fn search_tweets(
        &self,
        query: &str,
        max_results: usize,
        cursor: &str,
    ) -> Collected<Tweet> {
        search_tweets(&self.fetcher(Endpoint::SearchTweets), query, max_results, cursor).await
    }

    pub async fn search_accounts(
        &self,
        query: &str,
        max_results: usize,
        cursor: &str,
    ) -> Collected<Account> {
        search_accounts(&self.fetcher(Endpoint::SearchAccounts), query, max_results, cursor).await
    }

    pub async fn user_timeline(
        &self,
        user_id: &str,
        max_results: usize,
        cursor: &str,
    ) -> Collected<Tweet> {
        user_timeline(&self.fetcher(Endpoint::UserTimeline), user_id, max_results, cursor).await
    }
}
