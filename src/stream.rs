//! Streaming response reader.
//!
//! [`StreamingResponseReader`] consumes one chunked response body, decodes
//! its SSE framing and pushes each text delta to a caller-supplied sink
//! until the `[DONE]` sentinel, the end of the body, a failure, or
//! cancellation.
//!
//! ```text
//! Idle -> Reading -> Completed | Cancelled | Failed
//! ```

use std::fmt::Display;
use std::ops::ControlFlow;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::client::ClientError;
use crate::model::StreamPayload;
use crate::sse::{is_done_marker, SseDecoder, StreamFrame};

/// Lifecycle of a reader. The last three states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Idle,
    Reading,
    Completed,
    Cancelled,
    Failed,
}

/// How a successful stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The `[DONE]` sentinel was received.
    Sentinel,
    /// The body ended without a sentinel.
    Closed,
}

/// Result of a successful streaming session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamCompletion {
    /// Concatenation of every delta, in arrival order.
    pub text: String,
    pub termination: Termination,
    /// Number of deltas handed to the sink.
    pub deltas: usize,
}

/// Reads one streamed response. Single use.
#[derive(Debug)]
pub struct StreamingResponseReader {
    decoder: SseDecoder,
    accumulated: String,
    state: ReaderState,
    deltas: usize,
    skipped: usize,
}

impl Default for StreamingResponseReader {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingResponseReader {
    pub fn new() -> Self {
        Self {
            decoder: SseDecoder::new(),
            accumulated: String::new(),
            state: ReaderState::Idle,
            deltas: 0,
            skipped: 0,
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Text accumulated so far. After a cancellation or failure this is the partial reply.
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// Number of malformed frames skipped.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Consume `body`, pushing every delta to `sink`.
    ///
    /// The body is dropped before this returns on every path, which for an
    /// HTTP body releases the connection. `sink` is never called once this
    /// returns, and never after `cancel` has fired.
    ///
    /// # Errors
    /// - [`ClientError::StreamCancelled`] when `cancel` fires
    /// - [`ClientError::Transport`] when the body yields an error
    /// - [`ClientError::Decode`] when the body is not valid UTF-8
    /// - [`ClientError::InvalidState`] when the reader was already used
    pub async fn read<S, B, E, F>(
        &mut self,
        body: S,
        mut sink: F,
        cancel: &CancellationToken,
    ) -> Result<StreamCompletion, ClientError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
        F: FnMut(&str),
    {
        if self.state != ReaderState::Idle {
            return Err(ClientError::InvalidState(format!(
                "reader already used ({:?})",
                self.state
            )));
        }
        self.state = ReaderState::Reading;
        tracing::debug!("stream started");

        let mut body = Box::pin(body);
        let result = self.drive(body.as_mut(), &mut sink, cancel).await;
        drop(body);

        self.state = match &result {
            Ok(completion) => {
                tracing::debug!(
                    termination = ?completion.termination,
                    deltas = completion.deltas,
                    skipped = self.skipped,
                    "stream completed"
                );
                ReaderState::Completed
            }
            Err(ClientError::StreamCancelled) => {
                tracing::debug!(deltas = self.deltas, "stream cancelled");
                ReaderState::Cancelled
            }
            Err(e) => {
                tracing::warn!(error = %e, deltas = self.deltas, "stream failed");
                ReaderState::Failed
            }
        };

        result
    }

    async fn drive<S, B, E, F>(
        &mut self,
        mut body: std::pin::Pin<&mut S>,
        sink: &mut F,
        cancel: &CancellationToken,
    ) -> Result<StreamCompletion, ClientError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
        F: FnMut(&str),
    {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::StreamCancelled),
                next = body.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    for frame in self.decoder.feed(chunk.as_ref())? {
                        if cancel.is_cancelled() {
                            return Err(ClientError::StreamCancelled);
                        }
                        if self.apply(&frame, sink).is_break() {
                            return Ok(self.completion(Termination::Sentinel));
                        }
                    }
                }
                Some(Err(e)) => return Err(ClientError::Transport(e.to_string())),
                None => {
                    if let Some(frame) = self.decoder.finish()? {
                        if cancel.is_cancelled() {
                            return Err(ClientError::StreamCancelled);
                        }
                        if self.apply(&frame, sink).is_break() {
                            return Ok(self.completion(Termination::Sentinel));
                        }
                    }
                    return Ok(self.completion(Termination::Closed));
                }
            }
        }
    }

    fn apply<F: FnMut(&str)>(&mut self, frame: &StreamFrame, sink: &mut F) -> ControlFlow<()> {
        let Some(payload) = frame.payload() else {
            return ControlFlow::Continue(());
        };

        if is_done_marker(payload) {
            return ControlFlow::Break(());
        }

        match StreamPayload::parse(payload) {
            Ok(StreamPayload { content: Some(content) }) if !content.is_empty() => {
                self.accumulated.push_str(&content);
                self.deltas += 1;
                sink(&content);
            }
            Ok(_) => {}
            Err(e) => {
                self.skipped += 1;
                tracing::warn!(error = %e, payload, "skipping malformed stream frame");
            }
        }

        ControlFlow::Continue(())
    }

    fn completion(&self, termination: Termination) -> StreamCompletion {
        StreamCompletion {
            text: self.accumulated.clone(),
            termination,
            deltas: self.deltas,
        }
    }
}
