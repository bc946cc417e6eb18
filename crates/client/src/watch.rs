//! Typed watch stream over a transport line stream.

use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::Stream;
use futures::StreamExt;
use krait_core::{Result, WatchEvent};
use serde::de::DeserializeOwned;

use crate::transport::LineStream;

/// Lazy, single-pass sequence of watch events.
///
/// Events come out in transport order, one line buffered at a time. The
/// stream ends on transport close or after yielding the first decode error;
/// dropping it closes the underlying transport stream. Resuming is the
/// caller's job, via the last observed resourceVersion.
pub struct WatchStream<K> {
    lines: LineStream,
    closed: bool,
    _marker: PhantomData<fn() -> K>,
}

impl<K> WatchStream<K> {
    pub fn new(lines: LineStream) -> Self {
        Self { lines, closed: false, _marker: PhantomData }
    }
}

impl<K: DeserializeOwned> Stream for WatchStream<K> {
    type Item = Result<WatchEvent<K>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(None);
        }
        loop {
            match this.lines.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(line))) => {
                    // Keep-alive blank lines are not events.
                    if line.trim().is_empty() {
                        continue;
                    }
                    return match WatchEvent::decode_line(&line) {
                        Ok(event) => Poll::Ready(Some(Ok(event))),
                        Err(e) => {
                            this.closed = true;
                            Poll::Ready(Some(Err(e)))
                        }
                    };
                }
                Poll::Ready(Some(Err(e))) => {
                    this.closed = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.closed = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
