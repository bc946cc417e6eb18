//! Static file token source (service-account style).

use std::path::PathBuf;

use krait_core::{Error, Result};
use tracing::debug;

use crate::{Credential, TokenSource};

/// Lifetime attached to each read; combined with the cache this re-reads
/// the file at most once per interval.
const FILE_TOKEN_TTL: std::time::Duration = std::time::Duration::from_secs(60);

pub struct FileTokenSource {
    path: PathBuf,
}

impl FileTokenSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl TokenSource for FileTokenSource {
    async fn fetch(&self) -> Result<Credential> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::CredentialRefresh(format!("reading token file {}: {e}", self.path.display()))
        })?;
        let token = raw.trim();
        if token.is_empty() {
            return Err(Error::CredentialRefresh(format!(
                "token file {} is empty",
                self.path.display()
            )));
        }
        debug!(path = %self.path.display(), "token file read");
        Ok(Credential::expiring_in(token, FILE_TOKEN_TTL))
    }
}
