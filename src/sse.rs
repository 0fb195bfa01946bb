//! Server-Sent Events (SSE) framing.
//!
//! Turns raw response-body chunks into [`StreamFrame`]s. Chunk boundaries
//! are arbitrary: a multi-byte character or a whole line may be split
//! across two chunks, so both the UTF-8 decoding and the line splitting
//! carry state from one chunk to the next.
//!
//! SSE format:
//! ```text
//! data: {"content": "Hel"}
//!
//! data: {"content": "lo"}
//!
//! data: [DONE]
//! ```

use bytes::BytesMut;

use crate::client::ClientError;

/// Prefix marking a line that carries an event payload.
pub const DATA_PREFIX: &str = "data: ";

/// Payload marking the protocol-level end of the stream.
pub const DONE_MARKER: &str = "[DONE]";

/// Payload of a `data: ` line, trimmed, or `None` for any other line.
///
/// Comment lines (`: ping`), `event:`/`id:` fields and blank separators all
/// yield `None`; the reader ignores them.
///
/// ```
/// use eimemes::sse::parse_sse_line;
///
/// assert_eq!(parse_sse_line("data: {\"content\":\"hi\"}"), Some("{\"content\":\"hi\"}"));
/// assert_eq!(parse_sse_line(": keep-alive"), None);
/// assert_eq!(parse_sse_line(""), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX).map(|s| s.trim())
}

/// True only for the exact `[DONE]` sentinel payload.
///
/// A JSON payload whose `content` happens to read `[DONE]` is ordinary text.
///
/// ```
/// use eimemes::sse::is_done_marker;
///
/// assert!(is_done_marker("[DONE]"));
/// assert!(!is_done_marker("{\"content\":\"[DONE]\"}"));
/// ```
pub fn is_done_marker(data: &str) -> bool {
    data == DONE_MARKER
}

/// One decoded line of the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFrame {
    raw: String,
    payload: Option<String>,
}

impl StreamFrame {
    /// Build a frame from one line, without its line terminator.
    pub fn from_line(line: &str) -> Self {
        Self {
            raw: line.to_string(),
            payload: parse_sse_line(line).map(str::to_string),
        }
    }

    /// The line as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The payload after the `data: ` prefix, if the line carries one.
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Whether this frame is the `[DONE]` sentinel.
    pub fn is_done(&self) -> bool {
        self.payload().is_some_and(is_done_marker)
    }
}

/// Stateful UTF-8 decoder.
///
/// Holds back an incomplete multi-byte sequence at the end of a chunk
/// until the bytes completing it arrive.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: BytesMut,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `chunk` (plus any held-back bytes) as forms complete characters.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, ClientError> {
        self.pending.extend_from_slice(chunk);

        match std::str::from_utf8(&self.pending).map(str::to_string) {
            Ok(text) => {
                self.pending.clear();
                Ok(text)
            }
            Err(e) if e.error_len().is_some() => Err(ClientError::Decode(format!(
                "invalid UTF-8 sequence at byte {} of buffered input",
                e.valid_up_to()
            ))),
            Err(e) => {
                // Incomplete sequence at the end: emit the valid prefix, keep the tail.
                let complete = self.pending.split_to(e.valid_up_to());
                String::from_utf8(complete.to_vec())
                    .map_err(|e| ClientError::Decode(e.to_string()))
            }
        }
    }

    /// Check that no partial character is left over at end of input.
    pub fn finish(&mut self) -> Result<(), ClientError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            let len = self.pending.len();
            self.pending.clear();
            Err(ClientError::Decode(format!(
                "stream ended inside a multi-byte character ({} byte(s) pending)",
                len
            )))
        }
    }

    /// Number of bytes held back waiting for the rest of a character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Incremental SSE line decoder.
///
/// Feed it body chunks in arrival order; it returns every line completed by
/// that chunk and buffers the unterminated remainder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    utf8: Utf8Decoder,
    buffer: String,
    // Prefix of `buffer` already searched for a line break.
    scanned: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk and return the lines it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<StreamFrame>, ClientError> {
        let text = self.utf8.decode(chunk)?;
        self.buffer.push_str(&text);

        let mut frames = Vec::new();
        let mut consumed = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.buffer[search_from..].find('\n') {
            let end = search_from + offset;
            let line = &self.buffer[consumed..end];
            frames.push(StreamFrame::from_line(line.strip_suffix('\r').unwrap_or(line)));
            consumed = end + 1;
            search_from = consumed;
        }
        self.buffer.drain(..consumed);
        self.scanned = self.buffer.len();

        Ok(frames)
    }

    /// Flush at end of input.
    ///
    /// Returns the unterminated final line, if any, as a frame.
    pub fn finish(&mut self) -> Result<Option<StreamFrame>, ClientError> {
        self.utf8.finish()?;
        self.scanned = 0;

        if self.buffer.is_empty() {
            return Ok(None);
        }

        let line = std::mem::take(&mut self.buffer);
        Ok(Some(StreamFrame::from_line(
            line.strip_suffix('\r').unwrap_or(&line),
        )))
    }

    /// Text of the incomplete line buffered so far.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }
}
