//! Fragment sources
//!
//! The two transport shapes that can feed a processor:
//! - [`FragmentSource::EventEmitter`]: a byte stream that pushes each newly
//!   arrived chunk (a streaming HTTP body)
//! - [`FragmentSource::Pollable`]: a growing response-text buffer plus a
//!   readiness notification, where the reader has to find the new suffix
//!   itself on every notification
//!
//! Both are turned into one stream of text fragments by
//! [`FragmentSource::into_fragments`].

use std::sync::{Arc, Mutex, MutexGuard};

use futures::stream::{self, BoxStream};
use futures::StreamExt;
use tokio::sync::watch;

use crate::error::StreamError;
use crate::traits::ByteStream;

/// Content type served by SSE endpoints.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Where new text for a processor comes from.
pub enum FragmentSource {
    /// Chunks pushed by the transport as they arrive.
    EventEmitter(ByteStream),
    /// A polled, monotonically growing response buffer.
    Pollable(PollableSource),
}

impl std::fmt::Debug for FragmentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FragmentSource::EventEmitter(_) => f.write_str("FragmentSource::EventEmitter"),
            FragmentSource::Pollable(source) => {
                f.debug_tuple("FragmentSource::Pollable").field(source).finish()
            }
        }
    }
}

impl FragmentSource {
    /// Flatten the source into text fragments, in arrival order.
    ///
    /// A transport error is yielded once as `ConnectionLost` and ends the
    /// stream.
    pub fn into_fragments(self) -> BoxStream<'static, Result<String, StreamError>> {
        match self {
            FragmentSource::EventEmitter(body) => stream::unfold(
                (body, Utf8ChunkDecoder::new(), false),
                |(mut body, mut decoder, done)| async move {
                    if done {
                        return None;
                    }
                    match body.next().await {
                        Some(Ok(chunk)) => {
                            let text = decoder.decode(&chunk);
                            Some((Ok(text), (body, decoder, false)))
                        }
                        Some(Err(e)) => {
                            let err = StreamError::ConnectionLost {
                                message: e.to_string(),
                            };
                            Some((Err(err), (body, decoder, true)))
                        }
                        None => {
                            let tail = decoder.finish();
                            if tail.is_empty() {
                                None
                            } else {
                                Some((Ok(tail), (body, decoder, true)))
                            }
                        }
                    }
                },
            )
            .boxed(),
            FragmentSource::Pollable(source) => stream::unfold(source, |mut source| async move {
                source.next_fragment().await.map(|text| (Ok(text), source))
            })
            .boxed(),
        }
    }
}

impl From<ByteStream> for FragmentSource {
    fn from(body: ByteStream) -> Self {
        FragmentSource::EventEmitter(body)
    }
}

impl From<PollableSource> for FragmentSource {
    fn from(source: PollableSource) -> Self {
        FragmentSource::Pollable(source)
    }
}

/// Check a response content type against the SSE media type.
///
/// A missing content type is accepted; parameters such as `charset` are
/// ignored.
pub fn is_event_stream(content_type: Option<&str>) -> bool {
    match content_type {
        None => true,
        Some(value) => value
            .split(';')
            .next()
            .map(|media| media.trim().eq_ignore_ascii_case(EVENT_STREAM_CONTENT_TYPE))
            .unwrap_or(false),
    }
}

// ---------------------------------------------------------------------------
// UTF-8 decoding across chunk boundaries
// ---------------------------------------------------------------------------

/// Decodes byte chunks to text, holding back a multi-byte character that
/// was cut by a chunk boundary until the rest of it arrives.
///
/// Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `chunk` (plus any held-back bytes) as possible.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::with_capacity(self.pending.len());

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        // Incomplete character at the end, wait for more
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush held-back bytes at end of input.
    pub fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}

// ---------------------------------------------------------------------------
// Poll-based source
// ---------------------------------------------------------------------------

/// Readiness of a poll-based response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// More text may still arrive.
    Loading,
    /// The response is complete.
    Done,
}

/// Create a linked writer/source pair around a shared response buffer.
pub fn pollable_channel() -> (ResponseTextWriter, PollableSource) {
    let text = Arc::new(Mutex::new(String::new()));
    let (ready_tx, ready_rx) = watch::channel(ReadyState::Loading);
    (
        ResponseTextWriter {
            text: text.clone(),
            ready: ready_tx,
        },
        PollableSource {
            text,
            readiness: ready_rx,
            offset: 0,
        },
    )
}

fn lock_text(text: &Mutex<String>) -> MutexGuard<'_, String> {
    text.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Transport side of a poll-based source: appends response text and fires
/// readiness notifications.
#[derive(Debug)]
pub struct ResponseTextWriter {
    text: Arc<Mutex<String>>,
    ready: watch::Sender<ReadyState>,
}

impl ResponseTextWriter {
    /// Append text and notify the reader.
    pub fn append(&self, fragment: &str) {
        lock_text(&self.text).push_str(fragment);
        self.ready.send_replace(ReadyState::Loading);
    }

    /// Mark the response complete.
    pub fn finish(&self) {
        self.ready.send_replace(ReadyState::Done);
    }

    /// Total length of the response text so far.
    pub fn len(&self) -> usize {
        lock_text(&self.text).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reader side of a poll-based source.
///
/// Tracks the offset already consumed so each readiness change yields only
/// the newly appended suffix.
#[derive(Debug)]
pub struct PollableSource {
    text: Arc<Mutex<String>>,
    readiness: watch::Receiver<ReadyState>,
    offset: usize,
}

impl PollableSource {
    /// Bytes of the response already handed out.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Take the text appended since the last call, if any.
    pub fn take_new_text(&mut self) -> Option<String> {
        let text = lock_text(&self.text);
        if text.len() < self.offset {
            tracing::warn!(
                "Response buffer shrank from {} to {} bytes, resynchronizing",
                self.offset,
                text.len()
            );
            self.offset = text.len();
            return None;
        }
        if text.len() == self.offset {
            return None;
        }
        let suffix = text[self.offset..].to_string();
        self.offset = text.len();
        Some(suffix)
    }

    /// Wait for the next readiness change and return the new suffix.
    ///
    /// Returns `None` once the response is done (or the writer is gone) and
    /// all text has been consumed.
    pub async fn next_fragment(&mut self) -> Option<String> {
        loop {
            // Mark the state seen before reading, so an append racing with
            // the read still wakes the next `changed()`.
            let state = *self.readiness.borrow_and_update();
            if let Some(text) = self.take_new_text() {
                return Some(text);
            }
            if state == ReadyState::Done {
                return None;
            }
            if self.readiness.changed().await.is_err() {
                return self.take_new_text();
            }
        }
    }
}
