//! OIDC refresh-token source: discovery, then refresh-token exchange.

use krait_core::{Error, Result};
use serde::Deserialize;
use std::sync::Mutex;
use tracing::debug;

use crate::{Credential, TokenSource, DEFAULT_TOKEN_TTL};

const DISCOVERY_SUFFIX: &str = ".well-known/openid-configuration";

/// Client credentials and issuer location for the refresh flow.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    pub issuer_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Where the client credentials travel in the token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthStyle {
    Header,
    Params,
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    token_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

pub struct OidcTokenSource {
    config: OidcConfig,
    http: reqwest::Client,
    /// Discovered once, cached for the provider's lifetime.
    token_endpoint: tokio::sync::OnceCell<String>,
    /// Which auth style the server accepted last time.
    auth_style: Mutex<Option<AuthStyle>>,
}

impl OidcTokenSource {
    pub fn new(config: OidcConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::CredentialRefresh(format!("building oidc http client: {e}")))?;
        Ok(Self {
            config,
            http,
            token_endpoint: tokio::sync::OnceCell::new(),
            auth_style: Mutex::new(None),
        })
    }

    async fn discover(&self) -> Result<&str> {
        self.token_endpoint
            .get_or_try_init(|| async {
                let url = format!(
                    "{}/{}",
                    self.config.issuer_url.trim_end_matches('/'),
                    DISCOVERY_SUFFIX
                );
                debug!(url = %url, "discovering oidc token endpoint");
                let response = self
                    .http
                    .get(&url)
                    .header("Accept", "application/json")
                    .send()
                    .await
                    .map_err(|e| Error::CredentialRefresh(format!("oidc discovery: {e}")))?;
                if !response.status().is_success() {
                    return Err(Error::CredentialRefresh(format!(
                        "oidc discovery returned {}",
                        response.status()
                    )));
                }
                let document: DiscoveryDocument = response
                    .json()
                    .await
                    .map_err(|e| Error::CredentialRefresh(format!("oidc discovery body: {e}")))?;
                Ok(document.token_endpoint)
            })
            .await
            .map(String::as_str)
    }

    async fn exchange(&self, endpoint: &str, style: AuthStyle) -> Result<TokenResponse> {
        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", &self.config.refresh_token),
        ];
        let mut request = self.http.post(endpoint).header("Accept", "application/json");
        match style {
            AuthStyle::Header => {
                request =
                    request.basic_auth(&self.config.client_id, Some(&self.config.client_secret));
            }
            AuthStyle::Params => {
                form.push(("client_id", &self.config.client_id));
                form.push(("client_secret", &self.config.client_secret));
            }
        }
        let response = request
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::CredentialRefresh(format!("oidc token exchange: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::CredentialRefresh(format!(
                "oidc token endpoint returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| Error::CredentialRefresh(format!("oidc token response: {e}")))
    }

    fn cached_style(&self) -> Option<AuthStyle> {
        self.auth_style.lock().ok().and_then(|guard| *guard)
    }

    fn remember_style(&self, style: AuthStyle) {
        if let Ok(mut guard) = self.auth_style.lock() {
            *guard = Some(style);
        }
    }
}

#[async_trait::async_trait]
impl TokenSource for OidcTokenSource {
    async fn fetch(&self) -> Result<Credential> {
        let endpoint = self.discover().await?.to_string();

        let response = match self.cached_style() {
            Some(style) => self.exchange(&endpoint, style).await?,
            None => {
                // Header-based client auth first; some servers only accept
                // credentials embedded in the body.
                match self.exchange(&endpoint, AuthStyle::Header).await {
                    Ok(response) => {
                        self.remember_style(AuthStyle::Header);
                        response
                    }
                    Err(header_err) => {
                        debug!(error = %header_err, "header auth rejected, trying body credentials");
                        let response = self.exchange(&endpoint, AuthStyle::Params).await?;
                        self.remember_style(AuthStyle::Params);
                        response
                    }
                }
            }
        };

        let token = response.id_token.or(response.access_token).ok_or_else(|| {
            Error::CredentialRefresh("oidc token response carries no token".into())
        })?;
        let ttl = response
            .expires_in
            .map(std::time::Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_TTL);
        Ok(Credential::expiring_in(token, ttl))
    }
}
