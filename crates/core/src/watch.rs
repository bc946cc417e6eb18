//! Watch-line decoding: newline-delimited `{"type": ..., "object": ...}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Event type as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Added,
    Modified,
    Deleted,
    Bookmark,
}

/// Checkpoint event carrying only the latest resourceVersion.
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    pub metadata: BookmarkMeta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkMeta {
    pub resource_version: String,
}

// Servers nest the version under `metadata`; some emit it bare. Either way
// the rest of the object is ignored.
impl<'de> serde::Deserialize<'de> for Bookmark {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let resource_version = value
            .get("metadata")
            .and_then(|m| m.get("resourceVersion"))
            .or_else(|| value.get("resourceVersion"))
            .and_then(|v| v.as_str());
        match resource_version {
            Some(rv) => {
                Ok(Bookmark { metadata: BookmarkMeta { resource_version: rv.to_string() } })
            }
            None => Err(serde::de::Error::custom("bookmark carries no resourceVersion")),
        }
    }
}

/// One decoded watch event.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent<K> {
    Added(K),
    Modified(K),
    Deleted(K),
    /// Stream position checkpoint; no object change happened.
    Bookmark(Bookmark),
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    object: serde_json::Value,
}

impl<K: DeserializeOwned> WatchEvent<K> {
    /// Decode one line of a watch stream.
    ///
    /// Any malformed line — invalid JSON, unknown event type, or an object
    /// that does not match the expected payload — is a `WatchDecode` error,
    /// and the stream that produced it must be treated as dead. Resumption
    /// is the caller's job, using the last observed resourceVersion.
    pub fn decode_line(line: &str) -> Result<Self> {
        let raw: RawEvent = serde_json::from_str(line)
            .map_err(|e| Error::WatchDecode { reason: format!("invalid event: {e}") })?;
        match raw.event_type.as_str() {
            "ADDED" => Ok(WatchEvent::Added(decode_object(raw.object)?)),
            "MODIFIED" => Ok(WatchEvent::Modified(decode_object(raw.object)?)),
            "DELETED" => Ok(WatchEvent::Deleted(decode_object(raw.object)?)),
            "BOOKMARK" => {
                // Bookmarks are metadata-only; resource body fields are ignored.
                let bookmark: Bookmark = serde_json::from_value(raw.object).map_err(|e| {
                    Error::WatchDecode { reason: format!("invalid bookmark object: {e}") }
                })?;
                Ok(WatchEvent::Bookmark(bookmark))
            }
            other => Err(Error::WatchDecode { reason: format!("unknown event type {other:?}") }),
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            WatchEvent::Added(_) => EventType::Added,
            WatchEvent::Modified(_) => EventType::Modified,
            WatchEvent::Deleted(_) => EventType::Deleted,
            WatchEvent::Bookmark(_) => EventType::Bookmark,
        }
    }
}

fn decode_object<K: DeserializeOwned>(object: serde_json::Value) -> Result<K> {
    serde_json::from_value(object)
        .map_err(|e| Error::WatchDecode { reason: format!("invalid object payload: {e}") })
}
