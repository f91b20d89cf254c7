//! Mapping of raw API entities onto the domain model.
//!
//! Everything here is a pure function of its inputs: normalizing the same raw
//! entity twice yields equal values.

use chrono::{DateTime, Utc};
use log::warn;
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::OnceLock;

use super::model::{Account, Tweet, Video};
use super::raw::{RawMedia, RawTweet, RawUser, RawVariant};

/// `created_at` layout used by the frontend API, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Epoch values above this are taken to be milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Parses the API's `created_at` string.
pub fn parse_created_at(created_at: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(created_at, CREATED_AT_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn epoch_seconds(value: &Value) -> Option<i64> {
    let raw = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    if raw > MILLIS_THRESHOLD {
        Some(raw / 1000)
    } else {
        Some(raw)
    }
}

/// Strips the `?tag=N` marker the API appends to video variant URLs.
fn strip_media_tag(url: &str) -> &str {
    match url.find("?tag=") {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Chooses the playable variant of a video.
///
/// The variant with the highest declared bitrate wins; among equal bitrates
/// the first one listed wins. When no variant declares a bitrate (streaming
/// playlists only) the first listed variant is used. Variants without a URL
/// are never chosen.
pub fn select_video_variant(variants: &[RawVariant]) -> Option<&RawVariant> {
    let playable = || variants.iter().filter(|v| !v.url.is_empty());

    let mut best: Option<(&RawVariant, u64)> = None;
    for variant in playable() {
        if let Some(bitrate) = variant.bitrate {
            if best.map_or(true, |(_, top)| bitrate > top) {
                best = Some((variant, bitrate));
            }
        }
    }

    best.map(|(variant, _)| variant)
        .or_else(|| playable().next())
}

fn is_video(media: &RawMedia) -> bool {
    media.kind == "video" || media.kind == "animated_gif"
}

fn tweet_media(raw: &RawTweet) -> &[RawMedia] {
    // extended_entities lists every attachment, entities only the first one
    if raw.extended_entities.media.is_empty() {
        &raw.entities.media
    } else {
        &raw.extended_entities.media
    }
}

fn link_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(https?://t\.co/\w+)|\B#(\w+)|\B@(\w+)").ok())
        .as_ref()
}

/// Renders tweet text as HTML.
///
/// Hashtags and mentions become profile/search links, `t.co` links are
/// replaced by their expanded target or, for photo attachments, by the image.
pub fn render_html(raw: &RawTweet, text: &str) -> String {
    let linked = match link_regex() {
        Some(re) => re
            .replace_all(text, |caps: &Captures| {
                if let Some(short) = caps.get(1) {
                    let short = short.as_str();
                    if let Some(link) = raw.entities.urls.iter().find(|u| u.url == short) {
                        return format!(
                            "<a href=\"{0}\">{0}</a>",
                            link.expanded_url
                        );
                    }
                    let photos: Vec<&RawMedia> = tweet_media(raw)
                        .iter()
                        .filter(|m| m.url == short && m.kind == "photo")
                        .collect();
                    if !photos.is_empty() {
                        return photos
                            .iter()
                            .map(|m| {
                                format!(
                                    "<br><a href=\"{0}\"><img src=\"{1}\"/></a>",
                                    short, m.media_url_https
                                )
                            })
                            .collect();
                    }
                    format!("<a href=\"{0}\">{0}</a>", short)
                } else if let Some(tag) = caps.get(2) {
                    format!(
                        "<a href=\"https://twitter.com/hashtag/{0}\">#{0}</a>",
                        tag.as_str()
                    )
                } else if let Some(user) = caps.get(3) {
                    format!("<a href=\"https://twitter.com/{0}\">@{0}</a>", user.as_str())
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned(),
        None => text.to_string(),
    };
    linked.replace('\n', "<br>")
}

/// Normalizes one entry of the `tweets` map.
///
/// `key` is the map key the tweet was stored under; it is the tweet's
/// identifier, with `id_str` as fallback. Returns `None` only when neither is
/// set. `author` is the matching entry of the `users` map, if the page had one.
pub fn normalize_tweet(key: &str, raw: &RawTweet, author: Option<&RawUser>) -> Option<Tweet> {
    let id: &str = if key.is_empty() { &raw.id_str } else { key };
    if id.is_empty() {
        warn!("Skipping tweet without identifier");
        return None;
    }

    let text = if raw.full_text.is_empty() {
        raw.text.clone()
    } else {
        raw.full_text.clone()
    };

    let time_parsed = parse_created_at(&raw.created_at);
    if time_parsed.is_none() && !raw.created_at.is_empty() {
        warn!(
            "Unparseable created_at '{}' on tweet {}",
            raw.created_at, id
        );
    }
    let timestamp = raw
        .time
        .as_ref()
        .and_then(epoch_seconds)
        .or_else(|| raw.timestamp_ms.as_ref().and_then(epoch_seconds))
        .or_else(|| time_parsed.map(|t| t.timestamp()))
        .unwrap_or_default();

    let media = tweet_media(raw);
    let photos = media
        .iter()
        .filter(|m| m.kind == "photo" && !m.media_url_https.is_empty())
        .map(|m| m.media_url_https.clone())
        .collect();
    let videos = media
        .iter()
        .filter(|m| is_video(m))
        .map(|m| Video {
            id: m.id_str.clone(),
            preview: m.media_url_https.clone(),
            url: select_video_variant(&m.video_info.variants)
                .map(|v| strip_media_tag(&v.url).to_string())
                .unwrap_or_default(),
        })
        .collect();

    let username = author.map(|u| u.screen_name.clone()).unwrap_or_default();
    let is_pinned = author.map_or(false, |u| u.pinned_tweet_ids_str.iter().any(|p| p == id));

    Some(Tweet {
        id: id.to_string(),
        conversation_id: raw.conversation_id_str.clone(),
        user_id: raw.user_id_str.clone(),
        permanent_url: format!("https://twitter.com/{}/status/{}", username, id),
        username,
        html: render_html(raw, &text),
        text,
        time_parsed,
        timestamp,
        likes: raw.favorite_count,
        retweets: raw.retweet_count,
        replies: raw.reply_count,
        is_retweet: !raw.retweeted_status_id_str.is_empty(),
        is_reply: !raw.in_reply_to_status_id_str.is_empty(),
        is_quoted: !raw.quoted_status_id_str.is_empty(),
        is_pinned,
        photos,
        videos,
        hashtags: raw
            .entities
            .hashtags
            .iter()
            .map(|h| h.text.clone())
            .collect(),
        urls: raw
            .entities
            .urls
            .iter()
            .map(|u| u.expanded_url.clone())
            .collect(),
    })
}

/// Normalizes one entry of the `users` map.
///
/// The map key is the account identifier, with `id_str` as fallback. Returns
/// `None` only when neither is set.
pub fn normalize_account(key: &str, raw: &RawUser) -> Option<Account> {
    let id: &str = if key.is_empty() { &raw.id_str } else { key };
    if id.is_empty() {
        warn!(
            "Skipping account '{}' without identifier",
            raw.screen_name
        );
        return None;
    }

    let url = raw
        .entities
        .url
        .urls
        .first()
        .map(|u| u.expanded_url.clone())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| raw.url.clone());

    Some(Account {
        id: id.to_string(),
        screen_name: raw.screen_name.clone(),
        name: raw.name.clone(),
        description: raw.description.clone(),
        location: raw.location.clone(),
        created_at: raw.created_at.clone(),
        profile_image_url: raw.profile_image_url_https.clone(),
        profile_banner_url: raw.profile_banner_url.clone(),
        url,
        followers_count: raw.followers_count,
        friends_count: raw.friends_count,
        statuses_count: raw.statuses_count,
        favourites_count: raw.favourites_count,
        listed_count: raw.listed_count,
        media_count: raw.media_count,
        protected: raw.protected,
        verified: raw.verified,
        pinned_tweet_ids: raw.pinned_tweet_ids_str.clone(),
        lang: raw.lang.clone(),
        can_dm: raw.can_dm.clone(),
        following: raw.following.clone(),
        require_some_consent: raw.require_some_consent.clone(),
    })
}
