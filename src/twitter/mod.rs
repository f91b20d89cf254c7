//! Twitter/X frontend API scraping module.
//!
//! Pages from the frontend API carry entities in two maps (`tweets`, `users`)
//! and display order in a separate `instructions` list. The submodules decode
//! that envelope, resolve the instructions, normalize entities and drive
//! cursor pagination.

mod api;
mod cursor;
mod model;
mod normalize;
mod paginate;
pub mod raw;
mod search;

// Re-export public API
pub use api::{build_bearer_auth_header, ApiClient, ApiFetcher, Endpoint};
pub use cursor::{resolve_instructions, EntryRef, Resolved};
pub use model::{Account, Collected, CursorKind, Identified, Page, Tweet, Video};
pub use normalize::{
    normalize_account, normalize_tweet, parse_created_at, render_html, select_video_variant,
};
pub use paginate::{
    collect_pages, AccountProjection, PageFetcher, Projection, TweetProjection, MAX_PAGE_SIZE,
};
pub use raw::{Opaque, RawResponse};
pub use search::{
    search_accounts, search_accounts_cancellable, search_tweets, search_tweets_cancellable,
    user_timeline, user_timeline_cancellable,
};

// Crate-internal re-exports
pub(crate) use api::sanitize_for_logging;
