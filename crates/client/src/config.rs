//! Client configuration, consumed read-only.
//!
//! Sourcing these values (kubeconfig files, in-cluster environment) is the
//! embedding application's responsibility; the engine only consumes the
//! result. Built once at startup and treated as immutable afterwards.

use krait_auth::{ExecConfig, OidcConfig};
use std::path::PathBuf;

/// Selected bearer-token strategy.
#[derive(Debug, Clone, Default)]
pub enum AuthMode {
    /// No Authorization header (mTLS-only or unauthenticated setups).
    #[default]
    None,
    /// Literal token from configuration.
    StaticToken(String),
    /// Token file re-read periodically (service-account style).
    TokenFile(PathBuf),
    /// External credential plugin.
    Exec(ExecConfig),
    /// OIDC refresh-token flow.
    Oidc(OidcConfig),
}

#[derive(Debug, Clone)]
pub struct ClientConfiguration {
    /// Server base URL, e.g. `https://10.0.0.1:6443`.
    pub base_url: String,
    /// Namespace used by `Api::default_namespaced`.
    pub default_namespace: String,
    /// PEM-encoded trust anchors; system roots when absent.
    pub root_ca_pem: Option<Vec<u8>>,
    /// PEM-encoded client certificate + key for mTLS.
    pub identity_pem: Option<Vec<u8>>,
    pub accept_invalid_certs: bool,
    /// Surface API `Warning:` headers through tracing.
    pub log_api_warnings: bool,
    pub auth: AuthMode,
}

impl ClientConfiguration {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_namespace: "default".into(),
            root_ca_pem: None,
            identity_pem: None,
            accept_invalid_certs: false,
            log_api_warnings: true,
            auth: AuthMode::None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }

    pub fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }
}
