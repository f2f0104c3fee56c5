//! Incremental SSE record reassembly
//!
//! [`StreamEventProcessor`] turns raw text fragments, split wherever the
//! transport happened to split them, into complete [`EventRecord`]s.
//!
//! Two buffers are kept between calls:
//! - the line carry: the unterminated tail of the latest fragment, glued
//!   onto the front of the next one before it is split into lines
//! - the pending record buffer: trimmed, non-empty lines seen since the
//!   last completed record
//!
//! A record completes on its `data:` line, and a line is only looked at once
//! its newline (or the end of the stream) has arrived. Both buffers are bounded by
//! [`BufferLimits`]; hitting a limit resets the buffer and the stream goes on.

use crate::error::StreamError;
use crate::sse::events::{EventRecord, ProcessorState, ProcessorStats};
use crate::sse::parser::{complete_record, is_data_line};

/// Default cap on lines buffered for a single record.
pub const DEFAULT_MAX_BUFFERED_LINES: usize = 1024;

/// Default cap on bytes held by either buffer.
pub const DEFAULT_MAX_BUFFERED_BYTES: usize = 1_048_576; // 1 MB

/// Memory bounds for one processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLimits {
    /// Maximum number of lines in the pending record buffer.
    pub max_lines: usize,
    /// Maximum bytes in the pending record buffer, and separately in the
    /// line carry.
    pub max_bytes: usize,
}

impl Default for BufferLimits {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_BUFFERED_LINES,
            max_bytes: DEFAULT_MAX_BUFFERED_BYTES,
        }
    }
}

impl BufferLimits {
    pub fn new(max_lines: usize, max_bytes: usize) -> Self {
        Self {
            max_lines,
            max_bytes,
        }
    }
}

/// Stateful processor that reassembles SSE records from text fragments.
///
/// One instance serves exactly one stream. Every entry point is synchronous:
/// records completed by a fragment are handed out before the call returns,
/// in arrival order.
///
/// # Example
///
/// ```
/// use spark_cloud::sse::StreamEventProcessor;
///
/// let mut processor = StreamEventProcessor::new();
/// assert!(processor.feed("event: status\nda").is_empty());
///
/// let records = processor.feed("ta: {\"ok\":true}\n");
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].name(), Some("status"));
/// assert_eq!(records[0].get("ok"), Some(&serde_json::json!(true)));
/// ```
#[derive(Debug, Default)]
pub struct StreamEventProcessor {
    /// Unterminated tail of the latest fragment
    carry: String,
    /// Set after the carry overflowed; the rest of that line is dropped
    discarding: bool,
    /// Lines of the record being assembled
    pending: Vec<String>,
    pending_bytes: usize,
    limits: BufferLimits,
    stats: ProcessorStats,
}

impl StreamEventProcessor {
    /// Create a processor with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor with explicit limits.
    pub fn with_limits(limits: BufferLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> BufferLimits {
        self.limits
    }

    pub fn stats(&self) -> ProcessorStats {
        self.stats
    }

    pub fn state(&self) -> ProcessorState {
        if self.pending.is_empty() {
            ProcessorState::Idle
        } else {
            ProcessorState::Accumulating
        }
    }

    /// Number of lines buffered for the record being assembled.
    pub fn pending_lines(&self) -> usize {
        self.pending.len()
    }

    /// Feed one fragment, returning the records it completed.
    pub fn feed(&mut self, fragment: &str) -> Vec<EventRecord> {
        let mut records = Vec::new();
        self.on_fragment(fragment, |record| records.push(record));
        records
    }

    /// Feed one fragment, calling `observer` for each completed record.
    pub fn on_fragment<F>(&mut self, fragment: &str, mut observer: F)
    where
        F: FnMut(EventRecord),
    {
        let mut rest = fragment;

        while let Some(newline_pos) = rest.find('\n') {
            let head = &rest[..newline_pos];
            rest = &rest[newline_pos + 1..];

            if self.discarding {
                self.discarding = false;
                continue;
            }

            if self.carry.is_empty() {
                self.process_line(head, &mut observer);
            } else {
                self.carry.push_str(head);
                let line = std::mem::take(&mut self.carry);
                self.process_line(&line, &mut observer);
            }
        }

        if rest.is_empty() || self.discarding {
            return;
        }

        self.carry.push_str(rest);
        if self.carry.len() > self.limits.max_bytes {
            self.overflow(StreamError::BufferOverflow {
                buffer: "line carry",
                limit: self.limits.max_bytes,
            });
            self.carry.clear();
            self.discarding = true;
        }
    }

    /// The transport closed: treat the carry as a final complete line.
    ///
    /// An incomplete record left in the pending buffer is dropped.
    pub fn finish(&mut self) -> Vec<EventRecord> {
        let mut records = Vec::new();
        let line = std::mem::take(&mut self.carry);

        if self.discarding {
            self.discarding = false;
        } else if !line.is_empty() {
            self.process_line(&line, &mut |record| records.push(record));
        }

        if !self.pending.is_empty() {
            tracing::debug!(
                "Stream finished with {} line(s) of an incomplete record",
                self.pending.len()
            );
            self.clear_pending();
        }

        records
    }

    /// Drop all buffered text. Limits and statistics are kept.
    pub fn reset(&mut self) {
        self.carry.clear();
        self.discarding = false;
        self.clear_pending();
    }

    fn process_line<F>(&mut self, raw: &str, observer: &mut F)
    where
        F: FnMut(EventRecord),
    {
        let line = raw.trim();
        if line.is_empty() {
            return;
        }

        if self.pending.len() >= self.limits.max_lines {
            self.overflow(StreamError::BufferOverflow {
                buffer: "record lines",
                limit: self.limits.max_lines,
            });
            self.clear_pending();
        }
        if self.pending_bytes + line.len() > self.limits.max_bytes {
            self.overflow(StreamError::BufferOverflow {
                buffer: "record bytes",
                limit: self.limits.max_bytes,
            });
            self.clear_pending();
            if line.len() > self.limits.max_bytes {
                return;
            }
        }

        self.pending_bytes += line.len();
        self.pending.push(line.to_string());

        if is_data_line(line) {
            let lines = std::mem::take(&mut self.pending);
            self.pending_bytes = 0;
            self.emit(&lines, observer);
        }
    }

    fn emit<F>(&mut self, lines: &[String], observer: &mut F)
    where
        F: FnMut(EventRecord),
    {
        match complete_record(lines) {
            Ok(Some(record)) => {
                self.stats.records_emitted += 1;
                tracing::debug!(
                    "Emitting event record {:?} ({} field(s))",
                    record.name(),
                    record.fields.len()
                );
                observer(record);
            }
            Ok(None) => {}
            Err(err) => {
                self.stats.records_skipped += 1;
                tracing::warn!("[{}] Skipping event record: {}", err.error_code(), err);
            }
        }
    }

    fn overflow(&mut self, err: StreamError) {
        self.stats.overflows += 1;
        tracing::warn!("[{}] {}, resetting buffer", err.error_code(), err);
    }

    fn clear_pending(&mut self) {
        self.pending.clear();
        self.pending_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feed_all(processor: &mut StreamEventProcessor, fragments: &[&str]) -> Vec<EventRecord> {
        let mut records = Vec::new();
        for fragment in fragments {
            records.extend(processor.feed(fragment));
        }
        records
    }

    fn names(records: &[EventRecord]) -> Vec<Option<&str>> {
        records.iter().map(|r| r.name()).collect()
    }

    const TWO_RECORDS: &str =
        "event: a\ndata: {\"x\":1}\n\nevent: b\ndata: {\"x\":2,\"name\":\"inner\"}\n\n";

    #[test]
    fn test_event_then_data_in_separate_fragments() {
        let mut processor = StreamEventProcessor::new();
        let records = feed_all(&mut processor, &["event: status\n", "data: {\"ok\":true}\n"]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), Some("status"));
        assert_eq!(records[0].get("ok"), Some(&json!(true)));
    }

    #[test]
    fn test_two_records_in_one_fragment() {
        let mut processor = StreamEventProcessor::new();
        let records =
            processor.feed("event: a\ndata: {\"x\":1}\nevent: b\ndata: {\"x\":2}\n");
        assert_eq!(names(&records), vec![Some("a"), Some("b")]);
        assert_eq!(records[0].get("x"), Some(&json!(1)));
        assert_eq!(records[1].get("x"), Some(&json!(2)));
    }

    #[test]
    fn test_last_event_line_wins() {
        let mut processor = StreamEventProcessor::new();
        let records = processor.feed("event: first\nevent: second\ndata: {}\n");
        assert_eq!(names(&records), vec![Some("second")]);
    }

    #[test]
    fn test_name_does_not_leak_into_next_record() {
        let mut processor = StreamEventProcessor::new();
        let records = processor.feed("event: a\ndata: {\"x\":1}\ndata: {\"x\":2}\n");
        assert_eq!(names(&records), vec![Some("a"), None]);
    }

    #[test]
    fn test_event_line_after_data_belongs_to_next_record() {
        let mut processor = StreamEventProcessor::new();
        let first = processor.feed("data: {\"x\":1}\nevent: late\n");
        assert_eq!(names(&first), vec![None]);
        assert_eq!(processor.state(), ProcessorState::Accumulating);

        let second = processor.feed("data: {\"x\":2}\n");
        assert_eq!(names(&second), vec![Some("late")]);
    }

    #[test]
    fn test_event_prefix_beats_payload_name() {
        let mut processor = StreamEventProcessor::new();
        let records = processor.feed(TWO_RECORDS);
        assert_eq!(records[1].name(), Some("b"));
        assert!(records[1].get("name").is_none());
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let with_blanks = "\n\n  \nevent: a\n\n\r\ndata: {\"x\":1}\n\n\n";
        let without = "event: a\ndata: {\"x\":1}\n";

        let mut p1 = StreamEventProcessor::new();
        let mut p2 = StreamEventProcessor::new();
        assert_eq!(p1.feed(with_blanks), p2.feed(without));
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut processor = StreamEventProcessor::new();
        let records = processor.feed("event: a\r\ndata: {\"x\":1}\r\n\r\n");
        assert_eq!(names(&records), vec![Some("a")]);
    }

    #[test]
    fn test_split_data_prefix_across_fragments() {
        let mut processor = StreamEventProcessor::new();
        let records = feed_all(&mut processor, &["event: a\nda", "ta", ": {\"x\"", ":1}\n"]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), Some("a"));
        assert_eq!(records[0].get("x"), Some(&json!(1)));
    }

    #[test]
    fn test_split_event_prefix_across_fragments() {
        let mut processor = StreamEventProcessor::new();
        let records = feed_all(&mut processor, &["ev", "ent: spl", "it\ndata: {}\n"]);
        assert_eq!(names(&records), vec![Some("split")]);
    }

    #[test]
    fn test_every_two_cut_split_matches_whole() {
        let whole = StreamEventProcessor::new().feed(TWO_RECORDS);
        assert_eq!(whole.len(), 2);

        let boundaries: Vec<usize> = (0..=TWO_RECORDS.len())
            .filter(|i| TWO_RECORDS.is_char_boundary(*i))
            .collect();
        for &i in &boundaries {
            for &j in boundaries.iter().filter(|&&j| j >= i) {
                let mut processor = StreamEventProcessor::new();
                let records = feed_all(
                    &mut processor,
                    &[&TWO_RECORDS[..i], &TWO_RECORDS[i..j], &TWO_RECORDS[j..]],
                );
                assert_eq!(records, whole, "split at {i}/{j}");
            }
        }
    }

    #[test]
    fn test_one_fragment_per_character_matches_whole() {
        let whole = StreamEventProcessor::new().feed(TWO_RECORDS);

        let mut processor = StreamEventProcessor::new();
        let mut records = Vec::new();
        let mut buf = [0u8; 4];
        for ch in TWO_RECORDS.chars() {
            records.extend(processor.feed(ch.encode_utf8(&mut buf)));
        }
        assert_eq!(records, whole);
    }

    #[test]
    fn test_multibyte_payload_per_character() {
        let input = "event: greet\ndata: {\"text\":\"héllo ✓\"}\n";
        let mut processor = StreamEventProcessor::new();
        let mut records = Vec::new();
        let mut buf = [0u8; 4];
        for ch in input.chars() {
            records.extend(processor.feed(ch.encode_utf8(&mut buf)));
        }
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("text"), Some(&json!("héllo ✓")));
    }

    #[test]
    fn test_malformed_json_is_skipped() {
        let mut processor = StreamEventProcessor::new();
        let records = processor.feed("event: bad\ndata: {oops\nevent: good\ndata: {\"x\":1}\n");
        assert_eq!(names(&records), vec![Some("good")]);
        assert_eq!(processor.stats().records_skipped, 1);
        assert_eq!(processor.stats().records_emitted, 1);
        assert_eq!(processor.state(), ProcessorState::Idle);
    }

    #[test]
    fn test_non_object_payload_is_skipped() {
        let mut processor = StreamEventProcessor::new();
        let records = processor.feed("data: 42\ndata: [1]\ndata: {\"x\":1}\n");
        assert_eq!(records.len(), 1);
        assert_eq!(processor.stats().records_skipped, 2);
    }

    #[test]
    fn test_unterminated_data_line_waits_for_newline() {
        let mut processor = StreamEventProcessor::new();
        assert!(processor.feed("event: a\ndata: {\"x\":1}").is_empty());

        let records = processor.feed("\n");
        assert_eq!(names(&records), vec![Some("a")]);
        assert_eq!(processor.stats().records_emitted, 1);
    }

    #[test]
    fn test_trailing_whitespace_after_payload() {
        let mut processor = StreamEventProcessor::new();
        assert!(processor.feed("data: {\"x\":1}").is_empty());
        assert!(processor.feed("  ").is_empty());
        assert_eq!(processor.feed("\r\ndata: {\"x\":2}\n").len(), 2);
        assert_eq!(processor.stats().records_emitted, 2);
    }

    #[test]
    fn test_text_after_closing_brace_makes_line_malformed() {
        let input = "event: a\ndata: {\"x\":1}junk\n";
        let mut whole = StreamEventProcessor::new();
        let whole_records = whole.feed(input);

        let cut = input.find("junk").unwrap();
        let mut split = StreamEventProcessor::new();
        let split_records = feed_all(&mut split, &[&input[..cut], &input[cut..]]);

        assert!(whole_records.is_empty());
        assert_eq!(split_records, whole_records);
        assert_eq!(split.stats(), whole.stats());
        assert_eq!(split.stats().records_skipped, 1);
    }

    #[test]
    fn test_every_two_cut_split_with_malformed_line_matches_whole() {
        const MIXED: &str =
            "event: a\ndata: {\"x\":1}junk\nevent: b\ndata: {\"x\":2}\ndata: [3]\ndata: {\"x\":4}";

        let mut reference = StreamEventProcessor::new();
        let mut whole = reference.feed(MIXED);
        whole.extend(reference.finish());
        assert_eq!(names(&whole), vec![Some("b"), None]);
        assert_eq!(reference.stats().records_skipped, 2);

        let boundaries: Vec<usize> = (0..=MIXED.len())
            .filter(|i| MIXED.is_char_boundary(*i))
            .collect();
        for &i in &boundaries {
            for &j in boundaries.iter().filter(|&&j| j >= i) {
                let mut processor = StreamEventProcessor::new();
                let mut records =
                    feed_all(&mut processor, &[&MIXED[..i], &MIXED[i..j], &MIXED[j..]]);
                records.extend(processor.finish());
                assert_eq!(records, whole, "split at {i}/{j}");
                assert_eq!(processor.stats(), reference.stats(), "split at {i}/{j}");
            }
        }
    }

    #[test]
    fn test_nested_object_prefix_waits_for_more_text() {
        let mut processor = StreamEventProcessor::new();
        assert!(processor.feed("data: {\"a\":{}").is_empty());
        let records = processor.feed("}\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("a"), Some(&json!({})));
    }

    #[test]
    fn test_finish_completes_unterminated_data_line() {
        let mut processor = StreamEventProcessor::new();
        assert!(processor.feed("event: a\ndata: {\"x\":").is_empty());
        assert!(processor.feed("1}").is_empty());
        let records = processor.finish();
        assert_eq!(names(&records), vec![Some("a")]);
    }

    #[test]
    fn test_finish_processes_unterminated_line() {
        let mut processor = StreamEventProcessor::new();
        processor.feed("event: a\ndata: not json");
        assert!(processor.finish().is_empty());
        assert_eq!(processor.stats().records_skipped, 1);
        assert_eq!(processor.state(), ProcessorState::Idle);
    }

    #[test]
    fn test_finish_drops_incomplete_record() {
        let mut processor = StreamEventProcessor::new();
        processor.feed("event: a\n");
        assert_eq!(processor.pending_lines(), 1);
        assert!(processor.finish().is_empty());
        assert_eq!(processor.pending_lines(), 0);
    }

    #[test]
    fn test_state_transitions() {
        let mut processor = StreamEventProcessor::new();
        assert_eq!(processor.state(), ProcessorState::Idle);

        processor.feed("\n\n");
        assert_eq!(processor.state(), ProcessorState::Idle);

        processor.feed(": keepalive\n");
        assert_eq!(processor.state(), ProcessorState::Accumulating);

        processor.feed("event: a\n");
        assert_eq!(processor.pending_lines(), 2);

        processor.feed("data: {}\n");
        assert_eq!(processor.state(), ProcessorState::Idle);
    }

    #[test]
    fn test_on_fragment_calls_observer_in_order() {
        let mut processor = StreamEventProcessor::new();
        let mut seen = Vec::new();
        processor.on_fragment(
            "event: a\ndata: {}\nevent: b\ndata: {}\nevent: c\ndata: {}\n",
            |record| seen.push(record.name.clone()),
        );
        assert_eq!(
            seen,
            vec![
                Some("a".to_string()),
                Some("b".to_string()),
                Some("c".to_string())
            ]
        );
    }

    #[test]
    fn test_line_limit_resets_buffer() {
        let mut processor = StreamEventProcessor::with_limits(BufferLimits::new(3, 1024));
        let records = processor.feed(": 1\n: 2\n: 3\nevent: a\ndata: {}\n");
        // The fourth line overflowed the buffer; the record still completes
        // with what came after the reset.
        assert_eq!(names(&records), vec![Some("a")]);
        assert_eq!(processor.stats().overflows, 1);
    }

    #[test]
    fn test_line_limit_never_sees_data_line_bounds_memory() {
        let mut processor = StreamEventProcessor::with_limits(BufferLimits::new(8, 1024));
        for _ in 0..100 {
            processor.feed("event: noise\n");
            assert!(processor.pending_lines() <= 8);
        }
        assert!(processor.stats().overflows > 0);
        assert_eq!(processor.feed("data: {}\n").len(), 1);
    }

    #[test]
    fn test_byte_limit_on_pending_lines() {
        let mut processor = StreamEventProcessor::with_limits(BufferLimits::new(100, 16));
        let records = processor.feed("event: aaaaaaaaaa\nevent: b\ndata: {}\n");
        assert_eq!(processor.stats().overflows, 1);
        assert_eq!(names(&records), vec![Some("b")]);
    }

    #[test]
    fn test_oversized_line_is_dropped() {
        let mut processor = StreamEventProcessor::with_limits(BufferLimits::new(100, 16));
        let records = processor.feed("data: {\"long\":\"xxxxxxxxxxxxxxxx\"}\ndata: {}\n");
        assert_eq!(records.len(), 1);
        assert!(records[0].fields.is_empty());
    }

    #[test]
    fn test_carry_limit_discards_rest_of_line() {
        let mut processor = StreamEventProcessor::with_limits(BufferLimits::new(100, 16));
        assert!(processor.feed("data: {\"long\":\"").is_empty());
        assert!(processor.feed("xxxxxxxxxxxxxxxxxxxx").is_empty());
        assert_eq!(processor.stats().overflows, 1);
        assert!(processor.feed("yyyy\"}").is_empty());

        let records = processor.feed("\nevent: ok\ndata: {}\n");
        assert_eq!(names(&records), vec![Some("ok")]);
        assert_eq!(processor.stats().records_skipped, 0);
    }

    #[test]
    fn test_reset_clears_buffers_but_keeps_stats() {
        let mut processor = StreamEventProcessor::new();
        processor.feed("data: {}\nevent: a\ndata: {\"x\":");
        processor.reset();
        assert_eq!(processor.state(), ProcessorState::Idle);
        assert_eq!(processor.stats().records_emitted, 1);
        assert_eq!(names(&processor.feed("1}\ndata: {}\n")), vec![None]);
    }

    #[test]
    fn test_default_limits() {
        let processor = StreamEventProcessor::new();
        assert_eq!(processor.limits(), BufferLimits::default());
        assert_eq!(processor.limits().max_lines, DEFAULT_MAX_BUFFERED_LINES);
        assert_eq!(processor.limits().max_bytes, DEFAULT_MAX_BUFFERED_BYTES);
    }
}
