//! Krait auth: bearer-token cache and pluggable token sources.
//!
//! The cache hands out ready-to-use `Authorization` values and refreshes
//! the underlying token single-flight: readers holding a still-valid token
//! never contend, and at most one refresh runs while everyone else waits
//! for its result.

#![forbid(unsafe_code)]

use std::fmt;
use std::time::{Duration, Instant};

use krait_core::{Error, Result};
use tokio::sync::RwLock;
use tracing::debug;

pub mod exec;
pub mod file;
pub mod oidc;

pub use exec::{ExecConfig, ExecInteractiveMode, ExecTokenSource};
pub use file::FileTokenSource;
pub use oidc::{OidcConfig, OidcTokenSource};

/// Tokens inside this window of their expiry count as stale.
const EXPIRY_LOOKAHEAD: Duration = Duration::from_secs(10);

/// Fallback lifetime when a source cannot say how long its token lives.
pub(crate) const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60);

/// A bearer token and when it stops being trustworthy.
///
/// Owned by the cache; only rendered header strings leave this crate.
#[derive(Clone)]
pub struct Credential {
    token: String,
    expires_at: Option<Instant>,
}

impl Credential {
    /// A token that never goes stale (static configuration).
    pub fn perpetual(token: impl Into<String>) -> Self {
        Self { token: token.into(), expires_at: None }
    }

    pub fn expiring_in(token: impl Into<String>, ttl: Duration) -> Self {
        Self { token: token.into(), expires_at: Some(Instant::now() + ttl) }
    }

    fn is_stale(&self) -> bool {
        match self.expires_at {
            None => false,
            Some(at) => Instant::now() + EXPIRY_LOOKAHEAD >= at,
        }
    }

    fn header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A strategy producing bearer tokens.
///
/// The cache serializes calls: `fetch` is never invoked concurrently.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch(&self) -> Result<Credential>;
}

/// A literal token from configuration; nothing to refresh.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticTokenSource {
    async fn fetch(&self) -> Result<Credential> {
        if self.token.is_empty() {
            return Err(Error::CredentialRefresh("static token is empty".into()));
        }
        Ok(Credential::perpetual(self.token.clone()))
    }
}

/// Concurrency-safe, auto-refreshing credential provider.
///
/// Reads of a valid token go through the shared guard and never contend.
/// A stale reader takes the exclusive guard, re-checks (someone else may
/// have refreshed while it queued), and refreshes at most once; late
/// arrivals block on the guard and pick up the fresh value. A failed
/// refresh leaves the slot stale so the next caller retries the source.
pub struct CredentialCache {
    source: Box<dyn TokenSource>,
    slot: RwLock<Option<Credential>>,
}

impl CredentialCache {
    pub fn new(source: impl TokenSource + 'static) -> Self {
        Self { source: Box::new(source), slot: RwLock::new(None) }
    }

    /// Render the `Authorization` header value, refreshing when stale.
    pub async fn header_value(&self) -> Result<String> {
        {
            let slot = self.slot.read().await;
            if let Some(credential) = slot.as_ref() {
                if !credential.is_stale() {
                    return Ok(credential.header_value());
                }
            }
        }

        let mut slot = self.slot.write().await;
        if let Some(credential) = slot.as_ref() {
            if !credential.is_stale() {
                return Ok(credential.header_value());
            }
        }
        debug!("credential stale, refreshing");
        let credential = self.source.fetch().await?;
        let header = credential.header_value();
        *slot = Some(credential);
        Ok(header)
    }
}
