//! Error taxonomy shared by every crate in the workspace.

use crate::meta::Status;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures a client operation can surface.
///
/// Scope and namespace violations are detected locally, before any network
/// interaction, and are never retried. Transport, decode and credential
/// failures surface to the caller as-is; resuming a watch or retrying a
/// request is the caller's decision.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} is cluster-scoped but a namespace was supplied")]
    ScopeMismatch { kind: &'static str },

    #[error("namespace is required for namespaced kind {kind}")]
    NamespaceRequired { kind: &'static str },

    #[error("namespace is not allowed for cluster-scoped kind {kind}")]
    NamespaceNotAllowed { kind: &'static str },

    /// A watch line failed to decode; the stream is closed after this.
    #[error("watch decode failed: {reason}")]
    WatchDecode { reason: String },

    /// A token source failed; the cache stays stale so the next attempt
    /// retries the source.
    #[error("credential refresh failed: {0}")]
    CredentialRefresh(String),

    /// Non-2xx response, classified by the taxonomy.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("transport: {0}")]
    Transport(String),

    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("serialize yaml: {0}")]
    SerializeYaml(#[from] serde_yaml::Error),
}

/// Error kind derived from the transport status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    Gone,
    UnprocessableEntity,
    /// Any other 4xx/5xx.
    Other,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ApiErrorKind::BadRequest,
            401 => ApiErrorKind::Unauthorized,
            403 => ApiErrorKind::Forbidden,
            404 => ApiErrorKind::NotFound,
            405 => ApiErrorKind::MethodNotAllowed,
            409 => ApiErrorKind::Conflict,
            410 => ApiErrorKind::Gone,
            422 => ApiErrorKind::UnprocessableEntity,
            _ => ApiErrorKind::Other,
        }
    }
}

/// What the server said, when it said anything parseable.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    /// The body was a well-formed `Status` object.
    Status(Status),
    /// Anything else: the raw decoded text.
    Raw(String),
}

/// A non-2xx response with enough structure for programmatic handling.
#[derive(Debug)]
pub struct ApiError {
    pub status: u16,
    pub kind: ApiErrorKind,
    pub body: ErrorBody,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "api error {} ({:?})", self.status, self.kind)?;
        match &self.body {
            ErrorBody::Status(status) => {
                if let Some(detail) = status.message.as_deref().or(status.reason.as_deref()) {
                    write!(f, ": {detail}")?;
                }
            }
            ErrorBody::Raw(text) if !text.is_empty() => write!(f, ": {text}")?,
            ErrorBody::Raw(_) => {}
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Classify a non-2xx response.
    ///
    /// Body parsing never fails: a body that is not a `Status` object is
    /// attached as raw text instead.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        let body = match serde_json::from_slice::<Status>(body) {
            Ok(parsed) if parsed.kind.as_deref() == Some("Status") => ErrorBody::Status(parsed),
            _ => ErrorBody::Raw(text.into_owned()),
        };
        Self { status, kind: ApiErrorKind::from_status(status), body }
    }
}
