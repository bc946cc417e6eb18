//! Transport boundary and the reqwest-backed implementation.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use krait_core::{ApiError, Error, Method, Request, Response, Result};
use tracing::warn;

use crate::config::ClientConfiguration;

/// Lazily produced lines of a streaming response.
pub type LineStream = BoxStream<'static, Result<String>>;

/// Boundary to the HTTP layer.
///
/// Implementations never attach `Authorization` — the client injects it
/// into the request headers before calling in.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// One-shot request; returns the response whatever its status.
    async fn send(&self, request: Request) -> Result<Response>;

    /// Open a line stream. Non-2xx responses are classified and returned
    /// as errors here, since the body is consumed by the stream itself.
    async fn stream(&self, request: Request) -> Result<LineStream>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: Request) -> Result<Response> {
        (**self).send(request).await
    }

    async fn stream(&self, request: Request) -> Result<LineStream> {
        (**self).stream(request).await
    }
}

/// Production transport over reqwest.
pub struct HttpTransport {
    base_url: String,
    http: reqwest::Client,
    log_api_warnings: bool,
}

impl HttpTransport {
    pub fn new(config: &ClientConfiguration) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(pem) = &config.root_ca_pem {
            let certificate = reqwest::Certificate::from_pem(pem)
                .map_err(|e| Error::Transport(format!("invalid root CA: {e}")))?;
            builder = builder.add_root_certificate(certificate);
        }
        if let Some(pem) = &config.identity_pem {
            let identity = reqwest::Identity::from_pem(pem)
                .map_err(|e| Error::Transport(format!("invalid client identity: {e}")))?;
            builder = builder.identity(identity);
        }
        let http =
            builder.build().map_err(|e| Error::Transport(format!("building http client: {e}")))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            log_api_warnings: config.log_api_warnings,
        })
    }

    fn prepare(&self, request: &Request) -> Result<reqwest::RequestBuilder> {
        let mut url = reqwest::Url::parse(&format!("{}{}", self.base_url, request.path))
            .map_err(|e| Error::Transport(format!("invalid request url: {e}")))?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.http.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        Ok(builder)
    }

    fn surface_warnings(&self, headers: &reqwest::header::HeaderMap) {
        if !self.log_api_warnings {
            return;
        }
        for value in headers.get_all("warning") {
            if let Ok(text) = value.to_str() {
                warn!(warning = %text, "api warning");
            }
        }
    }
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let response = self
            .prepare(&request)?
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        self.surface_warnings(response.headers());
        let headers = collect_headers(response.headers());
        let body =
            response.bytes().await.map_err(|e| Error::Transport(e.to_string()))?.to_vec();
        Ok(Response { status, headers, body })
    }

    async fn stream(&self, request: Request) -> Result<LineStream> {
        let response = self
            .prepare(&request)?
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        self.surface_warnings(response.headers());
        if status >= 400 {
            let body =
                response.bytes().await.map_err(|e| Error::Transport(e.to_string()))?;
            return Err(ApiError::from_response(status, &body).into());
        }

        let stream = futures::stream::try_unfold(
            LineState { body: response.bytes_stream().fuse().boxed(), buffer: LineBuffer::default() },
            |mut state| async move {
                loop {
                    if let Some(line) = state.buffer.pop() {
                        return Ok(Some((line, state)));
                    }
                    match state.body.next().await {
                        Some(Ok(chunk)) => state.buffer.extend(&chunk),
                        Some(Err(e)) => return Err(Error::Transport(e.to_string())),
                        None => {
                            return Ok(state.buffer.finish().map(|line| (line, state)));
                        }
                    }
                }
            },
        );
        Ok(stream.boxed())
    }
}

struct LineState {
    body: BoxStream<'static, std::result::Result<bytes::Bytes, reqwest::Error>>,
    buffer: LineBuffer,
}

/// Incremental newline splitter over arbitrary byte chunks.
///
/// Buffers at most the current incomplete line plus whatever complete lines
/// the last chunk contained.
#[derive(Default)]
struct LineBuffer {
    pending: std::collections::VecDeque<String>,
    partial: Vec<u8>,
}

impl LineBuffer {
    fn extend(&mut self, chunk: &[u8]) {
        for byte in chunk {
            if *byte == b'\n' {
                let mut line = std::mem::take(&mut self.partial);
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                self.pending.push_back(String::from_utf8_lossy(&line).into_owned());
            } else {
                self.partial.push(*byte);
            }
        }
    }

    fn pop(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    /// Leftover bytes at end of stream, when the last line had no newline.
    fn finish(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.partial);
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::LineBuffer;

    #[test]
    fn splits_lines_across_chunks() {
        let mut buffer = LineBuffer::default();
        buffer.extend(b"{\"a\":1}\n{\"b\"");
        assert_eq!(buffer.pop().as_deref(), Some("{\"a\":1}"));
        assert_eq!(buffer.pop(), None);
        buffer.extend(b":2}\n");
        assert_eq!(buffer.pop().as_deref(), Some("{\"b\":2}"));
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn strips_carriage_returns_and_flushes_the_tail() {
        let mut buffer = LineBuffer::default();
        buffer.extend(b"one\r\ntwo");
        assert_eq!(buffer.pop().as_deref(), Some("one"));
        assert_eq!(buffer.finish().as_deref(), Some("two"));
        assert_eq!(buffer.finish(), None);
    }
}
