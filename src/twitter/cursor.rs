//! Resolution of the `instructions` array.
//!
//! Instructions describe what to display and in which order, separately from
//! the entity maps. This module walks them once and extracts the entity
//! references to surface, the pinned tweet and the forward-paging cursor.

use log::debug;

use super::model::CursorKind;
use super::raw::{Entry, Instruction, Item};

/// An entity referenced by a timeline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRef {
    Tweet(String),
    User(String),
}

/// What a page's instructions ask to display.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Referenced entities in instruction order, possibly with repeats
    pub entries: Vec<EntryRef>,
    /// Tweet referenced by a `pinEntry` instruction
    pub pinned_tweet: Option<String>,
    /// Token of the first bottom cursor
    pub bottom_cursor: Option<String>,
}

impl Resolved {
    pub fn tweet_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| match e {
            EntryRef::Tweet(id) => Some(id.as_str()),
            EntryRef::User(_) => None,
        })
    }

    pub fn user_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| match e {
            EntryRef::User(id) => Some(id.as_str()),
            EntryRef::Tweet(_) => None,
        })
    }

    fn push_item(&mut self, item: &Item) -> bool {
        let content = &item.content;
        if !content.tweet.id.is_empty() {
            self.entries.push(EntryRef::Tweet(content.tweet.id.clone()));
            true
        } else if !content.user.id.is_empty() {
            self.entries.push(EntryRef::User(content.user.id.clone()));
            true
        } else {
            false
        }
    }

    fn offer_cursor(&mut self, entry: &Entry) {
        let cursor = &entry.content.operation.cursor;
        if cursor.value.is_empty() || CursorKind::parse(&cursor.cursor_type) != CursorKind::Bottom {
            return;
        }
        // Only one bottom cursor is expected per page. If the API ever sends
        // more, the first one in instruction order is used.
        if self.bottom_cursor.is_none() {
            self.bottom_cursor = Some(cursor.value.clone());
        } else if self.bottom_cursor.as_deref() != Some(cursor.value.as_str()) {
            debug!(
                "Ignoring extra bottom cursor in entry '{}'",
                entry.entry_id
            );
        }
    }

    fn visit_entry(&mut self, entry: &Entry) {
        self.push_item(&entry.content.item);
        self.offer_cursor(entry);

        for module_item in &entry.content.timeline_module.items {
            if !self.push_item(&module_item.item) {
                if let Some(trend) = module_item.item.trend_name() {
                    debug!("Skipping trend module item '{}'", trend);
                }
            }
        }
    }
}

/// Walks `instructions` in order.
///
/// `addEntries` contribute item references (including items nested in
/// timeline modules) and cursors, `replaceEntry` only cursors, `pinEntry` the
/// pinned tweet. Entries that reference neither a tweet nor a user, such as
/// trend modules, contribute nothing. Only bottom cursors are considered and
/// the first one encountered wins.
pub fn resolve_instructions(instructions: &[Instruction]) -> Resolved {
    let mut resolved = Resolved::default();

    for instruction in instructions {
        for entry in &instruction.add_entries.entries {
            resolved.visit_entry(entry);
        }

        let pinned = &instruction.pin_entry.entry.content.item.content.tweet.id;
        if !pinned.is_empty() && resolved.pinned_tweet.is_none() {
            resolved.pinned_tweet = Some(pinned.clone());
        }

        resolved.offer_cursor(&instruction.replace_entry.entry);
    }

    debug!(
        "Resolved {} entries, pinned: {:?}, bottom cursor present: {}",
        resolved.entries.len(),
        resolved.pinned_tweet,
        resolved.bottom_cursor.is_some()
    );
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitter::raw::RawTimeline;

    fn instructions(json: serde_json::Value) -> Vec<Instruction> {
        let timeline: RawTimeline =
            serde_json::from_value(serde_json::json!({ "instructions": json })).unwrap();
        timeline.instructions
    }

    fn tweet_entry(id: &str) -> serde_json::Value {
        serde_json::json!({
            "entryId": format!("tweet-{}", id),
            "content": {"item": {"content": {"tweet": {"id": id}}}}
        })
    }

    fn cursor_entry(value: &str, kind: &str) -> serde_json::Value {
        serde_json::json!({
            "entryId": format!("cursor-{}", kind),
            "content": {"operation": {"cursor": {"value": value, "cursorType": kind}}}
        })
    }

    #[test]
    fn test_entries_in_order_with_bottom_cursor() {
        let resolved = resolve_instructions(&instructions(serde_json::json!([
            {"addEntries": {"entries": [
                cursor_entry("refresh", "Top"),
                tweet_entry("3"),
                tweet_entry("1"),
                {"entryId": "user-9", "content": {"item": {"content": {"user": {"id": "9"}}}}},
                tweet_entry("2"),
                cursor_entry("older", "Bottom")
            ]}}
        ])));

        assert_eq!(resolved.tweet_ids().collect::<Vec<_>>(), vec!["3", "1", "2"]);
        assert_eq!(resolved.user_ids().collect::<Vec<_>>(), vec!["9"]);
        assert_eq!(resolved.bottom_cursor.as_deref(), Some("older"));
        assert_eq!(resolved.pinned_tweet, None);
    }

    #[test]
    fn test_first_bottom_cursor_wins() {
        let resolved = resolve_instructions(&instructions(serde_json::json!([
            {"addEntries": {"entries": [cursor_entry("first", "Bottom")]}},
            {"replaceEntry": {"entry": {"content": {"operation": {"cursor":
                {"value": "second", "cursorType": "Bottom"}}}}}}
        ])));
        assert_eq!(resolved.bottom_cursor.as_deref(), Some("first"));
    }

    #[test]
    fn test_replace_entry_cursor() {
        let resolved = resolve_instructions(&instructions(serde_json::json!([
            {"addEntries": {"entries": [tweet_entry("5")]}},
            {"replaceEntry": {"entryIdToReplace": "sq-cursor-bottom", "entry": {
                "entryId": "sq-cursor-bottom",
                "content": {"operation": {"cursor": {"value": "scroll:next", "cursorType": "Bottom"}}}
            }}}
        ])));
        assert_eq!(resolved.bottom_cursor.as_deref(), Some("scroll:next"));
        assert_eq!(resolved.tweet_ids().collect::<Vec<_>>(), vec!["5"]);
    }

    #[test]
    fn test_top_cursor_only_means_no_next_page() {
        let resolved = resolve_instructions(&instructions(serde_json::json!([
            {"addEntries": {"entries": [cursor_entry("newer", "Top"), tweet_entry("1")]}}
        ])));
        assert_eq!(resolved.bottom_cursor, None);
    }

    #[test]
    fn test_cursor_type_is_case_insensitive() {
        let resolved = resolve_instructions(&instructions(serde_json::json!([
            {"addEntries": {"entries": [
                cursor_entry("", "Bottom"),
                cursor_entry("older", "bottom")
            ]}}
        ])));
        assert_eq!(resolved.bottom_cursor.as_deref(), Some("older"));
    }

    #[test]
    fn test_pin_entry() {
        let resolved = resolve_instructions(&instructions(serde_json::json!([
            {"addEntries": {"entries": [tweet_entry("1"), tweet_entry("2")]}},
            {"pinEntry": {"entry": {"content": {"item": {"content": {"tweet": {"id": "99"}}}}}}}
        ])));
        assert_eq!(resolved.pinned_tweet.as_deref(), Some("99"));
        assert_eq!(resolved.tweet_ids().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn test_trend_module_contributes_nothing() {
        let resolved = resolve_instructions(&instructions(serde_json::json!([
            {"addEntries": {"entries": [{
                "entryId": "trends",
                "content": {"timelineModule": {"items": [
                    {"entryId": "trend-1", "item": {"clientEventInfo": {"details": {"guideDetails":
                        {"transparentGuideDetails": {"trendMetadata": {"trendName": "#rustlang"}}}}}}}
                ]}}
            }]}}
        ])));
        assert!(resolved.entries.is_empty());
        assert_eq!(resolved.bottom_cursor, None);
    }

    #[test]
    fn test_module_items_referencing_tweets_are_surfaced() {
        let resolved = resolve_instructions(&instructions(serde_json::json!([
            {"addEntries": {"entries": [{
                "entryId": "conversation-1",
                "content": {"timelineModule": {"items": [
                    {"entryId": "c-1", "item": {"content": {"tweet": {"id": "10"}}}},
                    {"entryId": "c-2", "item": {"content": {"tweet": {"id": "11"}}}}
                ]}}
            }]}}
        ])));
        assert_eq!(resolved.tweet_ids().collect::<Vec<_>>(), vec!["10", "11"]);
    }
}
