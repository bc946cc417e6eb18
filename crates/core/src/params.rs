//! Per-verb operation options and their wire encoding.
//!
//! Every option is optional and emitted only when set. Encoding is pure;
//! the request builder decides which options a verb accepts.

use serde::{Deserialize, Serialize};

/// Query pairs in insertion order, keys unique.
pub type QueryPairs = Vec<(String, String)>;

fn push(pairs: &mut QueryPairs, key: &str, value: impl ToString) {
    pairs.push((key.to_string(), value.to_string()));
}

/// How a `resourceVersion` constraint is interpreted by list calls.
///
/// The enum value itself travels in the shared `resourceVersion` wire field;
/// it is mutually exclusive with an explicit version (the explicit value
/// wins when both are set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionMatch {
    Exact,
    NotOlderThan,
}

impl VersionMatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionMatch::Exact => "Exact",
            VersionMatch::NotOlderThan => "NotOlderThan",
        }
    }
}

/// Dependents handling for delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropagationPolicy {
    Background,
    Foreground,
    Orphan,
}

impl PropagationPolicy {
    fn as_str(&self) -> &'static str {
        match self {
            PropagationPolicy::Background => "Background",
            PropagationPolicy::Foreground => "Foreground",
            PropagationPolicy::Orphan => "Orphan",
        }
    }
}

/// Server-side handling of unknown/duplicate fields in mutating requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValidation {
    Ignore,
    Warn,
    Strict,
}

impl FieldValidation {
    fn as_str(&self) -> &'static str {
        match self {
            FieldValidation::Ignore => "Ignore",
            FieldValidation::Warn => "Warn",
            FieldValidation::Strict => "Strict",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetOptions {
    pub resource_version: Option<String>,
}

impl GetOptions {
    pub fn as_query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        if let Some(rv) = &self.resource_version {
            push(&mut pairs, "resourceVersion", rv);
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub label_selector: Option<String>,
    pub field_selector: Option<String>,
    pub timeout_seconds: Option<u32>,
    pub limit: Option<u32>,
    pub continue_token: Option<String>,
    pub resource_version: Option<String>,
    pub version_match: Option<VersionMatch>,
}

impl ListOptions {
    pub fn as_query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        if let Some(ls) = &self.label_selector {
            push(&mut pairs, "labelSelector", ls);
        }
        if let Some(fs) = &self.field_selector {
            push(&mut pairs, "fieldSelector", fs);
        }
        if let Some(timeout) = self.timeout_seconds {
            push(&mut pairs, "timeoutSeconds", timeout);
        }
        if let Some(limit) = self.limit {
            push(&mut pairs, "limit", limit);
        }
        if let Some(token) = &self.continue_token {
            push(&mut pairs, "continue", token);
        }
        // Explicit version and match constraint share one wire field.
        if let Some(rv) = &self.resource_version {
            push(&mut pairs, "resourceVersion", rv);
        } else if let Some(vm) = self.version_match {
            push(&mut pairs, "resourceVersion", vm.as_str());
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    pub label_selector: Option<String>,
    pub field_selector: Option<String>,
    pub timeout_seconds: Option<u32>,
    /// Ask the server to emit bookmark checkpoints.
    pub allow_bookmarks: bool,
    pub send_initial_events: Option<bool>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            label_selector: None,
            field_selector: None,
            timeout_seconds: None,
            allow_bookmarks: true,
            send_initial_events: None,
        }
    }
}

impl WatchOptions {
    /// Always carries `watch=true`; the continuation `resourceVersion` is
    /// supplied separately by the request builder.
    pub fn as_query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push(&mut pairs, "watch", "true");
        if let Some(ls) = &self.label_selector {
            push(&mut pairs, "labelSelector", ls);
        }
        if let Some(fs) = &self.field_selector {
            push(&mut pairs, "fieldSelector", fs);
        }
        if let Some(timeout) = self.timeout_seconds {
            push(&mut pairs, "timeoutSeconds", timeout);
        }
        if self.allow_bookmarks {
            push(&mut pairs, "allowWatchBookmarks", "true");
        }
        if let Some(initial) = self.send_initial_events {
            push(&mut pairs, "sendInitialEvents", initial);
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostOptions {
    pub dry_run: bool,
    pub field_manager: Option<String>,
    pub field_validation: Option<FieldValidation>,
}

impl PostOptions {
    pub fn as_query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        if self.dry_run {
            push(&mut pairs, "dryRun", "All");
        }
        if let Some(manager) = &self.field_manager {
            push(&mut pairs, "fieldManager", manager);
        }
        if let Some(validation) = self.field_validation {
            push(&mut pairs, "fieldValidation", validation.as_str());
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchOptions {
    pub dry_run: bool,
    pub field_manager: Option<String>,
    /// Server-side apply conflict override.
    pub force: bool,
    pub field_validation: Option<FieldValidation>,
}

impl PatchOptions {
    /// Conventional constructor for server-side apply.
    pub fn apply(field_manager: impl Into<String>) -> Self {
        Self { field_manager: Some(field_manager.into()), ..Self::default() }
    }

    pub fn as_query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        if self.dry_run {
            push(&mut pairs, "dryRun", "All");
        }
        if let Some(manager) = &self.field_manager {
            push(&mut pairs, "fieldManager", manager);
        }
        if self.force {
            push(&mut pairs, "force", "true");
        }
        if let Some(validation) = self.field_validation {
            push(&mut pairs, "fieldValidation", validation.as_str());
        }
        pairs
    }
}

/// Delete preconditions: at most one constraint is meaningful at a time,
/// which the enum makes structural.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preconditions {
    Uid(String),
    ResourceVersion(String),
}

impl Preconditions {
    fn as_json(&self) -> serde_json::Value {
        match self {
            Preconditions::Uid(uid) => serde_json::json!({ "uid": uid }),
            Preconditions::ResourceVersion(rv) => serde_json::json!({ "resourceVersion": rv }),
        }
    }
}

/// Delete options travel in the request body, not the query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOptions {
    pub dry_run: bool,
    pub grace_period_seconds: Option<u32>,
    pub propagation_policy: Option<PropagationPolicy>,
    pub preconditions: Option<Preconditions>,
}

impl DeleteOptions {
    /// Body-encode the options; `None` when nothing is set.
    pub fn as_request_body(&self) -> Option<Vec<u8>> {
        let mut body = serde_json::Map::new();
        if self.dry_run {
            body.insert("dryRun".into(), serde_json::json!(["All"]));
        }
        if let Some(grace) = self.grace_period_seconds {
            body.insert("gracePeriodSeconds".into(), serde_json::json!(grace));
        }
        if let Some(policy) = self.propagation_policy {
            body.insert("propagationPolicy".into(), serde_json::json!(policy.as_str()));
        }
        if let Some(preconditions) = &self.preconditions {
            body.insert("preconditions".into(), preconditions.as_json());
        }
        if body.is_empty() {
            return None;
        }
        // Serializing a Map of Values cannot fail.
        Some(serde_json::to_vec(&serde_json::Value::Object(body)).unwrap_or_default())
    }
}

/// Options for the `log` subresource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogOptions {
    pub container: Option<String>,
    /// Follow the stream; forced on by the streaming variant.
    pub follow: bool,
    pub limit_bytes: Option<i64>,
    pub pretty: bool,
    pub previous: bool,
    pub since_seconds: Option<i64>,
    pub tail_lines: Option<i64>,
    pub timestamps: bool,
}

impl LogOptions {
    pub fn as_query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        if let Some(container) = &self.container {
            push(&mut pairs, "container", container);
        }
        if self.follow {
            push(&mut pairs, "follow", "true");
        }
        if let Some(limit) = self.limit_bytes {
            push(&mut pairs, "limitBytes", limit);
        }
        if self.pretty {
            push(&mut pairs, "pretty", "true");
        }
        if self.previous {
            push(&mut pairs, "previous", "true");
        }
        if let Some(since) = self.since_seconds {
            push(&mut pairs, "sinceSeconds", since);
        }
        if let Some(tail) = self.tail_lines {
            push(&mut pairs, "tailLines", tail);
        }
        if self.timestamps {
            push(&mut pairs, "timestamps", "true");
        }
        pairs
    }
}
