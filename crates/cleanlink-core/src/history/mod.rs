//! Bounded history of cleaned links.
//!
//! Entries are stored oldest-first and capped at [`MAX_HISTORY`]; appending
//! past the cap evicts the oldest.

mod persist;

pub use persist::HistoryStore;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::scan::LinkScanResult;

pub const MAX_HISTORY: usize = 1000;

/// Note recorded on entries saved by a bulk clean.
pub const NOTE_BULK_CLEAN: &str = "bulk-clean";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    /// Unix milliseconds.
    pub time: i64,
    pub original: String,
    pub cleaned: String,
    #[serde(rename = "final")]
    pub final_url: String,
    pub expanded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
}

impl HistoryItem {
    /// Build an entry for a processed link. `site` is the cleaned URL's host.
    pub fn from_scan(link: &LinkScanResult, time: i64, bulk: bool) -> Self {
        let site = Url::parse(&link.cleaned)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        let notes = if bulk {
            Some(NOTE_BULK_CLEAN.to_string())
        } else {
            link.notes.clone()
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            time,
            original: link.original.clone(),
            cleaned: link.cleaned.clone(),
            final_url: link.final_target().to_string(),
            expanded: link.expanded.is_some(),
            notes,
            site,
        }
    }
}

/// Lenient on-disk shape; anything missing `original`/`cleaned` is dropped.
#[derive(Debug, Deserialize)]
struct StoredItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    time: Option<i64>,
    original: String,
    cleaned: String,
    #[serde(rename = "final", default)]
    final_url: Option<String>,
    #[serde(default)]
    expanded: Option<bool>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    site: Option<String>,
}

impl From<StoredItem> for HistoryItem {
    fn from(s: StoredItem) -> Self {
        Self {
            id: s.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            time: s.time.unwrap_or(0),
            final_url: s.final_url.unwrap_or_else(|| s.cleaned.clone()),
            original: s.original,
            cleaned: s.cleaned,
            expanded: s.expanded.unwrap_or(false),
            notes: s.notes,
            site: s.site,
        }
    }
}

/// Keep well-formed entries from arbitrary JSON; non-arrays yield nothing.
pub(crate) fn normalize(value: serde_json::Value) -> Vec<HistoryItem> {
    let serde_json::Value::Array(entries) = value else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|e| serde_json::from_value::<StoredItem>(e).ok())
        .map(HistoryItem::from)
        .collect()
}

/// Keep the newest `MAX_HISTORY` entries of an oldest-first list.
pub(crate) fn cap(mut items: Vec<HistoryItem>) -> Vec<HistoryItem> {
    if items.len() > MAX_HISTORY {
        items.drain(..items.len() - MAX_HISTORY);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_drops_malformed_and_defaults_final() {
        let items = normalize(json!([
            {"original": "https://a/", "cleaned": "https://a/"},
            {"original": 5, "cleaned": "x"},
            "nope",
            {"cleaned": "only"},
            {"id": "k", "time": 7, "original": "o", "cleaned": "c", "final": "f", "expanded": true}
        ]));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].final_url, "https://a/");
        assert!(!items[0].expanded);
        assert!(!items[0].id.is_empty());
        assert_eq!(items[1].id, "k");
        assert_eq!(items[1].final_url, "f");
        assert!(items[1].expanded);
    }

    #[test]
    fn normalize_non_array_is_empty() {
        assert!(normalize(json!({"history": []})).is_empty());
        assert!(normalize(serde_json::Value::Null).is_empty());
    }

    #[test]
    fn cap_keeps_newest() {
        let items: Vec<HistoryItem> = (0..MAX_HISTORY + 5)
            .map(|i| HistoryItem {
                id: i.to_string(),
                time: i as i64,
                original: String::new(),
                cleaned: String::new(),
                final_url: String::new(),
                expanded: false,
                notes: None,
                site: None,
            })
            .collect();
        let capped = cap(items);
        assert_eq!(capped.len(), MAX_HISTORY);
        assert_eq!(capped[0].id, "5");
    }

    #[test]
    fn from_scan_fills_site_and_final() {
        let link = LinkScanResult {
            original: "https://bit.ly/x?utm_source=a".into(),
            cleaned: "https://bit.ly/x".into(),
            removed: vec!["utm_source".into()],
            preserved: Vec::new(),
            final_url: Some("https://bit.ly/x".into()),
            expanded: Some("https://dest.example/".into()),
            notes: None,
        };
        let item = HistoryItem::from_scan(&link, 42, true);
        assert_eq!(item.site.as_deref(), Some("bit.ly"));
        assert_eq!(item.final_url, "https://dest.example/");
        assert!(item.expanded);
        assert_eq!(item.notes.as_deref(), Some(NOTE_BULK_CLEAN));
        assert_eq!(item.time, 42);
    }
}
