//! Normalized domain entities produced from raw API pages.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::ScrapeError;

/// Anything that can be deduplicated across pages by its identifier.
pub trait Identified {
    fn id(&self) -> &str;
}

/// A video attached to a tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Video {
    pub id: String,
    /// Preview image shown before playback
    pub preview: String,
    /// Playable URL of the chosen variant
    pub url: String,
}

/// A normalized tweet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tweet {
    pub id: String,
    pub conversation_id: String,
    pub user_id: String,
    /// Screen name of the author, empty when the author was not in the page
    pub username: String,
    pub text: String,
    /// Text with hashtags, mentions and links rendered as anchors
    pub html: String,
    /// `created_at` parsed as wall-clock time, `None` when unparseable
    pub time_parsed: Option<DateTime<Utc>>,
    /// Epoch seconds as reported by the API, or derived from `created_at`
    pub timestamp: i64,
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
    pub is_retweet: bool,
    pub is_reply: bool,
    pub is_quoted: bool,
    pub is_pinned: bool,
    pub photos: Vec<String>,
    pub videos: Vec<Video>,
    pub hashtags: Vec<String>,
    pub urls: Vec<String>,
    pub permanent_url: String,
}

impl Identified for Tweet {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A normalized account profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: String,
    pub screen_name: String,
    pub name: String,
    pub description: String,
    pub location: String,
    pub created_at: String,
    pub profile_image_url: String,
    pub profile_banner_url: String,
    /// Expanded profile link, falling back to the raw `url` field
    pub url: String,
    pub followers_count: u64,
    pub friends_count: u64,
    pub statuses_count: u64,
    pub favourites_count: u64,
    pub listed_count: u64,
    pub media_count: u64,
    pub protected: bool,
    pub verified: bool,
    pub pinned_tweet_ids: Vec<String>,
    /// Variable-shape fields passed through untouched
    pub lang: Option<Value>,
    pub can_dm: Option<Value>,
    pub following: Option<Value>,
    pub require_some_consent: Option<Value>,
}

impl Identified for Account {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Which way a cursor pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorKind {
    /// Older content; the only kind used for forward paging
    Bottom,
    /// Newer content
    Top,
    Other(String),
}

impl CursorKind {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("bottom") {
            CursorKind::Bottom
        } else if raw.eq_ignore_ascii_case("top") {
            CursorKind::Top
        } else {
            CursorKind::Other(raw.to_string())
        }
    }
}

/// Entities decoded from one raw response, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Bottom cursor for the next page, `None` when there is none
    pub next_cursor: Option<String>,
}

/// Entities accumulated across pages.
///
/// A failed or cancelled page does not discard what earlier pages produced:
/// `items` holds everything collected so far and `error` says why paging
/// stopped early.
#[derive(Debug, Serialize)]
pub struct Collected<T> {
    pub items: Vec<T>,
    /// Cursor to resume from, `None` once the timeline is exhausted
    pub next_cursor: Option<String>,
    #[serde(skip)]
    pub error: Option<ScrapeError>,
}

impl<T> Collected<T> {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Drops partial results if any page failed.
    pub fn into_result(self) -> Result<Vec<T>, ScrapeError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.items),
        }
    }
}
