//! Exec-plugin token source: an external command produces the credential.

use std::io::IsTerminal;
use std::process::Stdio;

use chrono::{DateTime, Utc};
use krait_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Credential, TokenSource, DEFAULT_TOKEN_TTL};

/// Whether the plugin may talk to the user on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecInteractiveMode {
    Never,
    IfAvailable,
    Always,
}

/// How to launch the credential plugin.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    pub command: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    /// `apiVersion` echoed into the `ExecCredential` handed to the plugin.
    pub api_version: String,
    pub interactive_mode: ExecInteractiveMode,
}

impl ExecConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: Vec::new(),
            api_version: "client.authentication.k8s.io/v1".into(),
            interactive_mode: ExecInteractiveMode::IfAvailable,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecCredentialRequest {
    api_version: String,
    kind: &'static str,
    spec: ExecCredentialSpec,
}

#[derive(Debug, Serialize)]
struct ExecCredentialSpec {
    interactive: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecCredential {
    #[serde(default)]
    status: Option<ExecCredentialStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecCredentialStatus {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expiration_timestamp: Option<String>,
}

pub struct ExecTokenSource {
    config: ExecConfig,
}

impl ExecTokenSource {
    pub fn new(config: ExecConfig) -> Self {
        Self { config }
    }

    fn resolve_interactive(&self) -> Result<bool> {
        let isatty = std::io::stdin().is_terminal();
        match self.config.interactive_mode {
            ExecInteractiveMode::Never => Ok(false),
            ExecInteractiveMode::IfAvailable => Ok(isatty),
            ExecInteractiveMode::Always if isatty => Ok(true),
            ExecInteractiveMode::Always => Err(Error::CredentialRefresh(
                "exec plugin requires an interactive terminal and stdin is not one".into(),
            )),
        }
    }
}

#[async_trait::async_trait]
impl TokenSource for ExecTokenSource {
    async fn fetch(&self) -> Result<Credential> {
        let interactive = self.resolve_interactive()?;
        let request = ExecCredentialRequest {
            api_version: self.config.api_version.clone(),
            kind: "ExecCredential",
            spec: ExecCredentialSpec { interactive },
        };
        let exec_info = serde_json::to_string(&request)?;

        let mut command = tokio::process::Command::new(&self.config.command);
        command
            .args(&self.config.args)
            .envs(self.config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .env("KUBERNETES_EXEC_INFO", exec_info)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if !interactive {
            command.stdin(Stdio::null());
        }

        debug!(command = %self.config.command, interactive, "running exec credential plugin");
        let output = command.output().await.map_err(|e| {
            Error::CredentialRefresh(format!("spawning {}: {e}", self.config.command))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut message =
                format!("exec plugin {} exited with {}", self.config.command, output.status);
            if !stderr.trim().is_empty() {
                message.push_str(&format!(": {}", stderr.trim()));
            }
            return Err(Error::CredentialRefresh(message));
        }

        let credential: ExecCredential = serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::CredentialRefresh(format!("invalid exec plugin output: {e}")))?;
        let status = credential.status.ok_or_else(|| {
            Error::CredentialRefresh("exec plugin output carries no status".into())
        })?;
        let token = status.token.ok_or_else(|| {
            Error::CredentialRefresh("exec plugin output carries no token".into())
        })?;

        let ttl = match status.expiration_timestamp.as_deref() {
            Some(ts) => {
                let expiry = DateTime::parse_from_rfc3339(ts).map_err(|e| {
                    Error::CredentialRefresh(format!("invalid expirationTimestamp {ts:?}: {e}"))
                })?;
                let remaining = expiry.with_timezone(&Utc) - Utc::now();
                remaining.to_std().unwrap_or(std::time::Duration::ZERO)
            }
            None => DEFAULT_TOKEN_TTL,
        };
        Ok(Credential::expiring_in(token, ttl))
    }
}
