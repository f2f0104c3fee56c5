//! SSE (Server-Sent Events) device event stream
//!
//! Reassembles device events from the cloud's SSE stream, however the
//! transport chops it up.
//! Lines of interest:
//! - `event: <name>` - names the next record
//! - `data: <json>` - completes the record; the payload must be a JSON object
//! - anything else (comments, `id:`, `retry:`, blank lines) - ignored
//!
//! # Module structure
//! - `events` - Record and line types, processor state and counters
//! - `parser` - Stateless line classification and record completion
//! - `processor` - The incremental, bounded processor
//! - `source` - Push-based and poll-based fragment sources
//! - `stream` - `EventStream` and the `watch` helper

mod events;
mod parser;
mod processor;
mod source;
mod stream;

pub use events::{EventRecord, ProcessorState, ProcessorStats, SseLine};
pub use parser::{complete_record, parse_sse_line, DATA_PREFIX, EVENT_PREFIX};
pub use processor::{
    BufferLimits, StreamEventProcessor, DEFAULT_MAX_BUFFERED_BYTES, DEFAULT_MAX_BUFFERED_LINES,
};
pub use source::{
    is_event_stream, pollable_channel, FragmentSource, PollableSource, ReadyState,
    ResponseTextWriter, Utf8ChunkDecoder, EVENT_STREAM_CONTENT_TYPE,
};
pub use stream::{watch, EventStream};
