//! In-memory transport for tests: scripted responses, recorded requests.

use std::collections::VecDeque;
use std::sync::Mutex;

use futures::StreamExt;
use krait_core::{Error, Request, Response, Result};

use crate::transport::{LineStream, Transport};

/// Scripted transport. Push responses/line scripts in the order the code
/// under test will consume them; every request is recorded.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<Response>>,
    streams: Mutex<VecDeque<Vec<Result<String>>>>,
    requests: Mutex<Vec<Request>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .expect("fake transport poisoned")
            .push_back(Response { status, headers: Vec::new(), body: body.into() });
    }

    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push_response(status, body.to_string().into_bytes());
    }

    pub fn push_lines(&self, lines: impl IntoIterator<Item = impl Into<String>>) {
        self.push_stream(lines.into_iter().map(|l| Ok(l.into())).collect());
    }

    pub fn push_stream(&self, items: Vec<Result<String>>) {
        self.streams.lock().expect("fake transport poisoned").push_back(items);
    }

    /// Requests seen so far, oldest first.
    pub fn recorded(&self) -> Vec<Request> {
        self.requests.lock().expect("fake transport poisoned").clone()
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        self.requests.lock().expect("fake transport poisoned").push(request);
        self.responses
            .lock()
            .expect("fake transport poisoned")
            .pop_front()
            .ok_or_else(|| Error::Transport("no scripted response".into()))
    }

    async fn stream(&self, request: Request) -> Result<LineStream> {
        self.requests.lock().expect("fake transport poisoned").push(request);
        let items = self
            .streams
            .lock()
            .expect("fake transport poisoned")
            .pop_front()
            .ok_or_else(|| Error::Transport("no scripted stream".into()))?;
        Ok(futures::stream::iter(items).boxed())
    }
}
