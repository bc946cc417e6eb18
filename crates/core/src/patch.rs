//! Patch negotiation: variant → wire media type and body encoding.

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const APPLY_PATCH_MIME: &str = "application/apply-patch+yaml";
pub const MERGE_PATCH_MIME: &str = "application/merge-patch+json";
pub const STRATEGIC_MERGE_PATCH_MIME: &str = "application/strategic-merge-patch+json";
pub const JSON_PATCH_MIME: &str = "application/json-patch+json";

/// A partial-update request.
///
/// The media type is a pure function of the variant; callers never choose
/// it. The enum is closed, so an unsupported patch kind is unrepresentable.
#[derive(Debug, Clone)]
pub enum Patch<P> {
    /// Server-side apply: the full desired object, YAML-encoded. Fields the
    /// caller left unset are omitted from the document.
    Apply(P),
    /// RFC 7386 merge patch carrying only the supplied fields.
    Merge(P),
    /// Strategic merge patch carrying only the supplied fields.
    StrategicMerge(P),
    /// RFC 6902 operation list.
    Json(Vec<PatchOperation>),
}

impl<P: Serialize> Patch<P> {
    pub fn content_type(&self) -> &'static str {
        match self {
            Patch::Apply(_) => APPLY_PATCH_MIME,
            Patch::Merge(_) => MERGE_PATCH_MIME,
            Patch::StrategicMerge(_) => STRATEGIC_MERGE_PATCH_MIME,
            Patch::Json(_) => JSON_PATCH_MIME,
        }
    }

    /// Resolve the wire media type and serialized body.
    pub fn negotiate(&self) -> Result<(&'static str, Vec<u8>)> {
        let body = match self {
            Patch::Apply(body) => serde_yaml::to_string(body)?.into_bytes(),
            Patch::Merge(body) | Patch::StrategicMerge(body) => serde_json::to_vec(body)?,
            Patch::Json(ops) => serde_json::to_vec(ops)?,
        };
        Ok((self.content_type(), body))
    }
}

/// One RFC 6902 operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: serde_json::Value },
    Remove { path: String },
    Replace { path: String, value: serde_json::Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: serde_json::Value },
}
