//! Structural mirror of the frontend API's timeline JSON.
//!
//! Search (`2/search/adaptive.json`) and profile timelines
//! (`2/timeline/profile/{id}.json`) answer with the same envelope: entity maps
//! under `globalObjects` and display instructions under `timeline`. Both decode
//! into [`RawResponse`].
//!
//! The upstream schema is undocumented and drifts, so every field decodes
//! leniently: a missing, `null` or differently typed value becomes the field's
//! default instead of failing the page. Elements of maps and arrays are decoded
//! one by one for the same reason.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ScrapeError;

/// A field whose shape the API does not guarantee.
///
/// `None` when the field is absent or `null`, otherwise the JSON value as sent.
pub type Opaque = Option<Value>;

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let values: Vec<Value> = lenient(deserializer)?;
    Ok(values
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap_or_default())
        .collect())
}

fn lenient_map<'de, D, T>(deserializer: D) -> Result<HashMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let values: HashMap<String, Value> = lenient(deserializer)?;
    Ok(values
        .into_iter()
        .map(|(k, v)| (k, serde_json::from_value(v).unwrap_or_default()))
        .collect())
}

/// One decoded page from the frontend API.
#[derive(Debug, Default, Deserialize)]
pub struct RawResponse {
    #[serde(rename = "globalObjects", default, deserialize_with = "lenient")]
    pub global_objects: GlobalObjects,
    #[serde(default, deserialize_with = "lenient")]
    pub timeline: RawTimeline,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub errors: Vec<RawApiError>,
}

impl RawResponse {
    /// Decodes a response body.
    ///
    /// Fails only when the body is not JSON or not a JSON object, or when the
    /// API sent an error list and no entities.
    pub fn from_body(body: &str) -> Result<Self, ScrapeError> {
        let value: Value = serde_json::from_str(body)?;
        if !value.is_object() {
            return Err(ScrapeError::Decode(serde::de::Error::custom(
                "expected a JSON object at the top level",
            )));
        }
        let response: RawResponse = serde_json::from_value(value)?;

        if let Some(first) = response.errors.first() {
            if response.global_objects.is_empty() && response.timeline.instructions.is_empty() {
                return Err(ScrapeError::Api {
                    code: first.code,
                    message: first.message.clone(),
                });
            }
        }

        Ok(response)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawApiError {
    #[serde(default, deserialize_with = "lenient")]
    pub code: i64,
    #[serde(default, deserialize_with = "lenient")]
    pub message: String,
}

/// The two disjoint entity maps, keyed by the entity's string id.
#[derive(Debug, Default, Deserialize)]
pub struct GlobalObjects {
    #[serde(default, deserialize_with = "lenient_map")]
    pub tweets: HashMap<String, RawTweet>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub users: HashMap<String, RawUser>,
}

impl GlobalObjects {
    pub fn is_empty(&self) -> bool {
        self.tweets.is_empty() && self.users.is_empty()
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawTweet {
    #[serde(default, deserialize_with = "lenient")]
    pub id_str: String,
    #[serde(default, deserialize_with = "lenient")]
    pub conversation_id_str: String,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: String,
    /// Numeric epoch reported next to `created_at` (seconds or milliseconds).
    #[serde(default)]
    pub time: Opaque,
    #[serde(default)]
    pub timestamp_ms: Opaque,
    #[serde(default, deserialize_with = "lenient")]
    pub full_text: String,
    #[serde(default, deserialize_with = "lenient")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient")]
    pub favorite_count: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub reply_count: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub retweet_count: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub in_reply_to_status_id_str: String,
    #[serde(default, deserialize_with = "lenient")]
    pub retweeted_status_id_str: String,
    #[serde(default, deserialize_with = "lenient")]
    pub quoted_status_id_str: String,
    #[serde(default, deserialize_with = "lenient")]
    pub user_id_str: String,
    #[serde(default, deserialize_with = "lenient")]
    pub entities: TweetEntities,
    #[serde(default, deserialize_with = "lenient")]
    pub extended_entities: ExtendedEntities,
    #[serde(default)]
    pub lang: Opaque,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TweetEntities {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub hashtags: Vec<RawHashtag>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub media: Vec<RawMedia>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub urls: Vec<RawUrl>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawHashtag {
    #[serde(default, deserialize_with = "lenient")]
    pub text: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawUrl {
    #[serde(default, deserialize_with = "lenient")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient")]
    pub expanded_url: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExtendedEntities {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub media: Vec<RawMedia>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawMedia {
    #[serde(default, deserialize_with = "lenient")]
    pub id_str: String,
    #[serde(default, deserialize_with = "lenient")]
    pub media_url_https: String,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: String,
    /// The `t.co` link that stands for this media in the tweet text.
    #[serde(default, deserialize_with = "lenient")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient")]
    pub video_info: VideoInfo,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct VideoInfo {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub variants: Vec<RawVariant>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawVariant {
    /// Absent on streaming playlists (`application/x-mpegURL`).
    #[serde(default, deserialize_with = "lenient")]
    pub bitrate: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub content_type: String,
    #[serde(default, deserialize_with = "lenient")]
    pub url: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawUser {
    #[serde(default, deserialize_with = "lenient")]
    pub id_str: String,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub entities: UserEntities,
    #[serde(default, deserialize_with = "lenient")]
    pub favourites_count: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub followers_count: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub friends_count: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub listed_count: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub statuses_count: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub media_count: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient")]
    pub pinned_tweet_ids_str: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub profile_banner_url: String,
    #[serde(default, deserialize_with = "lenient")]
    pub profile_image_url_https: String,
    #[serde(default, deserialize_with = "lenient")]
    pub protected: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub screen_name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient")]
    pub verified: bool,
    #[serde(default)]
    pub lang: Opaque,
    #[serde(default)]
    pub can_dm: Opaque,
    #[serde(default)]
    pub following: Opaque,
    #[serde(default)]
    pub require_some_consent: Opaque,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UserEntities {
    #[serde(default, deserialize_with = "lenient")]
    pub url: UrlList,
    #[serde(default, deserialize_with = "lenient")]
    pub description: UrlList,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UrlList {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub urls: Vec<RawUrl>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawTimeline {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub instructions: Vec<Instruction>,
}

/// One display instruction. Only one of the three payloads is normally set;
/// the others decode to empty defaults.
#[derive(Debug, Default, Deserialize)]
pub struct Instruction {
    #[serde(rename = "addEntries", default, deserialize_with = "lenient")]
    pub add_entries: AddEntries,
    #[serde(rename = "pinEntry", default, deserialize_with = "lenient")]
    pub pin_entry: SingleEntry,
    #[serde(rename = "replaceEntry", default, deserialize_with = "lenient")]
    pub replace_entry: SingleEntry,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddEntries {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub entries: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SingleEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub entry: Entry,
}

#[derive(Debug, Default, Deserialize)]
pub struct Entry {
    #[serde(rename = "entryId", default, deserialize_with = "lenient")]
    pub entry_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub content: EntryContent,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntryContent {
    #[serde(default, deserialize_with = "lenient")]
    pub item: Item,
    #[serde(default, deserialize_with = "lenient")]
    pub operation: Operation,
    #[serde(rename = "timelineModule", default, deserialize_with = "lenient")]
    pub timeline_module: TimelineModule,
}

#[derive(Debug, Default, Deserialize)]
pub struct Item {
    #[serde(default, deserialize_with = "lenient")]
    pub content: ItemContent,
    #[serde(rename = "clientEventInfo", default)]
    pub client_event_info: Opaque,
}

impl Item {
    /// Name of the trend this item advertises, if it is a trend item.
    pub fn trend_name(&self) -> Option<&str> {
        self.client_event_info
            .as_ref()?
            .pointer("/details/guideDetails/transparentGuideDetails/trendMetadata/trendName")?
            .as_str()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemContent {
    #[serde(default, deserialize_with = "lenient")]
    pub tweet: EntityRef,
    #[serde(default, deserialize_with = "lenient")]
    pub user: EntityRef,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntityRef {
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Operation {
    #[serde(default, deserialize_with = "lenient")]
    pub cursor: RawCursor,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawCursor {
    #[serde(default, deserialize_with = "lenient")]
    pub value: String,
    #[serde(rename = "cursorType", default, deserialize_with = "lenient")]
    pub cursor_type: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimelineModule {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub items: Vec<ModuleItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ModuleItem {
    #[serde(rename = "entryId", default, deserialize_with = "lenient")]
    pub entry_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub item: Item,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mistyped_fields_fall_back_to_defaults() {
        let body = r#"{
            "globalObjects": {
                "tweets": {
                    "1": {"id_str": 1, "full_text": "hi", "favorite_count": "lots", "reply_count": -3},
                    "2": "not an object"
                },
                "users": null
            },
            "timeline": {"instructions": [{"addEntries": {"entries": [42, {"entryId": "x"}]}}]}
        }"#;
        let response = RawResponse::from_body(body).unwrap();

        let tweet = &response.global_objects.tweets["1"];
        assert_eq!(tweet.id_str, "");
        assert_eq!(tweet.full_text, "hi");
        assert_eq!(tweet.favorite_count, 0);
        assert_eq!(tweet.reply_count, 0);
        assert_eq!(response.global_objects.tweets["2"].full_text, "");
        assert!(response.global_objects.users.is_empty());

        let entries = &response.timeline.instructions[0].add_entries.entries;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].entry_id, "x");
    }

    #[test]
    fn test_opaque_fields_keep_their_shape() {
        let body = r#"{"globalObjects": {"users": {"9": {
            "lang": null, "can_dm": true, "following": {"nested": [1, 2]}
        }}}}"#;
        let response = RawResponse::from_body(body).unwrap();
        let user = &response.global_objects.users["9"];
        assert_eq!(user.lang, None);
        assert_eq!(user.can_dm, Some(Value::Bool(true)));
        assert_eq!(user.following, Some(serde_json::json!({"nested": [1, 2]})));
        assert_eq!(user.require_some_consent, None);
    }

    #[test]
    fn test_non_object_body_is_a_decode_error() {
        assert!(matches!(
            RawResponse::from_body("[]"),
            Err(ScrapeError::Decode(_))
        ));
        assert!(matches!(
            RawResponse::from_body("<html>"),
            Err(ScrapeError::Decode(_))
        ));
    }

    #[test]
    fn test_error_payload_without_entities() {
        let body = r#"{"errors": [{"code": 88, "message": "Rate limit exceeded"}]}"#;
        match RawResponse::from_body(body) {
            Err(ScrapeError::Api { code, message }) => {
                assert_eq!(code, 88);
                assert_eq!(message, "Rate limit exceeded");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_trend_name_lookup() {
        let body = r#"{"timeline": {"instructions": [{"addEntries": {"entries": [{
            "content": {"timelineModule": {"items": [{"item": {"clientEventInfo": {"details":
                {"guideDetails": {"transparentGuideDetails": {"trendMetadata": {"trendName": "Rust"}}}}
            }}}]}}
        }]}}]}}"#;
        let response = RawResponse::from_body(body).unwrap();
        let module = &response.timeline.instructions[0].add_entries.entries[0]
            .content
            .timeline_module;
        assert_eq!(module.items[0].item.trend_name(), Some("Rust"));
    }
}
