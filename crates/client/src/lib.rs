//! Krait client (Milestone 0) – transport wiring and request orchestration.
//!
//! The client owns the only mutable state in the engine (the credential
//! cache), injects `Authorization` headers before handing requests to the
//! transport, and classifies every non-2xx response through the error
//! taxonomy before the caller sees it.

#![forbid(unsafe_code)]

pub mod config;
pub mod testkit;
pub mod transport;
pub mod watch;

use std::sync::Arc;
use std::time::Instant;

use krait_auth::{
    CredentialCache, ExecTokenSource, FileTokenSource, OidcTokenSource, StaticTokenSource,
};
use krait_core::request::HEADER_AUTHORIZATION;
use krait_core::{ApiError, Request, Response, Result};
use metrics::{counter, histogram};
use serde::de::DeserializeOwned;
use tracing::debug;

pub use config::{AuthMode, ClientConfiguration};
pub use transport::{HttpTransport, LineStream, Transport};
pub use watch::WatchStream;

struct ClientInner {
    transport: Box<dyn Transport>,
    credentials: Option<CredentialCache>,
    default_namespace: String,
}

/// Cheaply cloneable handle; concurrent operations share only the
/// credential cache.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    pub fn new(config: ClientConfiguration) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        let credentials = match config.auth {
            AuthMode::None => None,
            AuthMode::StaticToken(token) => {
                Some(CredentialCache::new(StaticTokenSource::new(token)))
            }
            AuthMode::TokenFile(path) => Some(CredentialCache::new(FileTokenSource::new(path))),
            AuthMode::Exec(exec) => Some(CredentialCache::new(ExecTokenSource::new(exec))),
            AuthMode::Oidc(oidc) => Some(CredentialCache::new(OidcTokenSource::new(oidc)?)),
        };
        Ok(Self {
            inner: Arc::new(ClientInner {
                transport: Box::new(transport),
                credentials,
                default_namespace: config.default_namespace,
            }),
        })
    }

    /// Test seam: any transport, no credentials.
    pub fn with_transport(
        transport: impl Transport + 'static,
        default_namespace: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport: Box::new(transport),
                credentials: None,
                default_namespace: default_namespace.into(),
            }),
        }
    }

    /// Test seam: any transport plus a credential cache.
    pub fn with_transport_and_credentials(
        transport: impl Transport + 'static,
        credentials: CredentialCache,
        default_namespace: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport: Box::new(transport),
                credentials: Some(credentials),
                default_namespace: default_namespace.into(),
            }),
        }
    }

    pub fn default_namespace(&self) -> &str {
        &self.inner.default_namespace
    }

    async fn authorize(&self, request: &mut Request) -> Result<()> {
        if let Some(cache) = &self.inner.credentials {
            let header = cache.header_value().await?;
            request.headers.push((HEADER_AUTHORIZATION, header));
        }
        Ok(())
    }

    /// Send one request; non-2xx responses come back classified.
    pub async fn request(&self, mut request: Request) -> Result<Response> {
        let t0 = Instant::now();
        let method = request.method.as_str();
        let path = request.path.clone();
        self.authorize(&mut request).await?;
        counter!("client_requests", 1u64);
        let response = self.inner.transport.send(request).await?;
        histogram!("client_request_latency_ms", t0.elapsed().as_secs_f64() * 1000.0);
        if response.status >= 400 {
            counter!("client_request_errors", 1u64);
            debug!(method, path = %path, status = response.status, took_ms = %t0.elapsed().as_millis(), "request failed");
            return Err(ApiError::from_response(response.status, &response.body).into());
        }
        debug!(method, path = %path, status = response.status, took_ms = %t0.elapsed().as_millis(), "request ok");
        Ok(response)
    }

    pub async fn request_json<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let response = self.request(request).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// For text subresources (logs).
    pub async fn request_text(&self, request: Request) -> Result<String> {
        Ok(self.request(request).await?.text())
    }

    /// Open a line stream (watches, followed logs).
    pub async fn stream_lines(&self, mut request: Request) -> Result<LineStream> {
        self.authorize(&mut request).await?;
        counter!("client_streams", 1u64);
        self.inner.transport.stream(request).await
    }

    /// Typed watch stream from an already-built watch request.
    pub async fn watch<K: DeserializeOwned>(&self, request: Request) -> Result<WatchStream<K>> {
        Ok(WatchStream::new(self.stream_lines(request).await?))
    }
}
