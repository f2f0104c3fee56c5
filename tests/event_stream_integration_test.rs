//! Event stream integration tests
//!
//! Drive the processor through the public API the way the client does:
//! from byte chunks, from a polled response buffer and from a mocked
//! subscription.

mod common;

use bytes::Bytes;
use common::{mock_client, split_every, test_url, MockHttpConfig, MockResponse};
use futures::StreamExt;
use serde_json::json;
use spark_cloud::error::StreamError;
use spark_cloud::sse::{
    pollable_channel, watch, BufferLimits, EventStream, FragmentSource, StreamEventProcessor,
};
use spark_cloud::traits::{ByteStream, HttpError};
use spark_cloud::EventFilter;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

const TRANSCRIPT: &str = "\
:ok\n\
\n\
event: temperature\n\
data: {\"data\":\"21.5\",\"ttl\":\"60\",\"published_at\":\"2014-03-05T16:34:03.000Z\",\"coreid\":\"53ff6c\"}\n\
\n\
event: motion\n\
data: {\"data\":\"détecté\",\"ttl\":\"60\",\"published_at\":\"2014-03-05T16:34:04.000Z\",\"coreid\":\"53ff6c\"}\n\
\n\
data: {\"name\":\"spark/status\",\"data\":\"online\",\"ttl\":\"60\",\"published_at\":\"2014-03-05T16:34:05.000Z\",\"coreid\":\"48ff6e\"}\n\
\n";

fn names(processor: &mut StreamEventProcessor, fragments: &[String]) -> Vec<Option<String>> {
    let mut names = Vec::new();
    for fragment in fragments {
        processor.on_fragment(fragment, |record| {
            names.push(record.name().map(str::to_string))
        });
    }
    names.extend(processor.finish().iter().map(|r| r.name().map(str::to_string)));
    names
}

fn expected_names() -> Vec<Option<String>> {
    vec![
        Some("temperature".to_string()),
        Some("motion".to_string()),
        // A `name` key in the payload alone does not name the record
        None,
    ]
}

fn byte_source(chunks: Vec<Vec<u8>>) -> FragmentSource {
    let items: Vec<Result<Bytes, HttpError>> =
        chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
    let body: ByteStream = Box::pin(futures::stream::iter(items));
    FragmentSource::EventEmitter(body)
}

#[test]
fn test_whole_transcript_in_one_fragment() {
    let mut processor = StreamEventProcessor::new();
    assert_eq!(
        names(&mut processor, &[TRANSCRIPT.to_string()]),
        expected_names()
    );
    assert_eq!(processor.stats().records_emitted, 3);
    assert_eq!(processor.pending_lines(), 0);
}

#[test]
fn test_arbitrary_fragment_boundaries() {
    for size in 1..=40 {
        let mut processor = StreamEventProcessor::new();
        let fragments = split_every(TRANSCRIPT, size);
        assert_eq!(
            names(&mut processor, &fragments),
            expected_names(),
            "fragment size {}",
            size
        );
        assert_eq!(processor.stats().records_skipped, 0, "fragment size {}", size);
    }
}

#[test]
fn test_payload_fields_survive_splitting() {
    let mut processor = StreamEventProcessor::new();
    let mut records = Vec::new();
    for fragment in split_every(TRANSCRIPT, 7) {
        records.extend(processor.feed(&fragment));
    }
    records.extend(processor.finish());

    assert_eq!(records.len(), 3);
    assert_eq!(records[1].data(), Some("détecté"));
    assert_eq!(records[0].ttl(), Some(60));
    assert!(records[2].published_at().is_some());
    assert_eq!(records[2].coreid(), Some("48ff6e"));
}

#[test]
fn test_event_name_overrides_payload_name() {
    let mut processor = StreamEventProcessor::new();
    let records = processor.feed("event: outer\ndata: {\"name\":\"inner\",\"data\":\"x\"}\n");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name(), Some("outer"));
    assert_eq!(records[0].data(), Some("x"));
}

#[test]
fn test_malformed_record_does_not_stop_stream() {
    let mut processor = StreamEventProcessor::new();
    let records = processor.feed("event: a\ndata: {oops\nevent: b\ndata: {\"data\":\"1\"}\n");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name(), Some("b"));
    assert_eq!(processor.stats().records_skipped, 1);
}

#[tokio::test]
async fn test_utf8_split_inside_multibyte_char() {
    let bytes = TRANSCRIPT.as_bytes();
    let chunks: Vec<Vec<u8>> = bytes.chunks(5).map(|c| c.to_vec()).collect();

    let records: Vec<_> = EventStream::new(byte_source(chunks), StreamEventProcessor::new())
        .collect()
        .await;

    assert_eq!(records.len(), 3);
    assert_eq!(records[1].as_ref().unwrap().data(), Some("détecté"));
}

#[tokio::test]
async fn test_pollable_source_emits_as_lines_complete() {
    let (writer, source) = pollable_channel();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = watch(
        FragmentSource::Pollable(source),
        StreamEventProcessor::new(),
        move |record| {
            let _ = tx.send(record);
        },
    );

    writer.append("event: first\ndata: {\"n\":1}\n");
    let first = rx.recv().await.unwrap();
    assert_eq!(first.name(), Some("first"));
    assert_eq!(first.get("n"), Some(&json!(1)));

    writer.append("event: second\ndata: {\"n\":2}");
    writer.append("\n");
    let second = rx.recv().await.unwrap();
    assert_eq!(second.name(), Some("second"));

    writer.finish();
    let stats = handle.await.unwrap();
    assert_eq!(stats.records_emitted, 2);
    assert_eq!(stats.records_skipped, 0);
}

#[tokio::test]
async fn test_pollable_source_split_record() {
    let (writer, source) = pollable_channel();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let handle = watch(
        FragmentSource::Pollable(source),
        StreamEventProcessor::new(),
        move |record| sink.lock().unwrap().push(record),
    );

    for fragment in split_every(TRANSCRIPT, 11) {
        writer.append(&fragment);
        tokio::task::yield_now().await;
    }
    writer.finish();

    let stats = handle.await.unwrap();
    assert_eq!(stats.records_emitted, 3);
    let names: Vec<_> = seen
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.name().map(str::to_string))
        .collect();
    assert_eq!(names, expected_names());
}

#[test]
fn test_oversized_line_is_dropped_and_stream_recovers() {
    let mut processor = StreamEventProcessor::with_limits(BufferLimits::new(16, 64));
    let huge = format!("data: {{\"data\":\"{}\"}}", "x".repeat(200));

    assert!(processor.feed(&huge[..100]).is_empty());
    assert!(processor.feed(&huge[100..]).is_empty());
    let records = processor.feed("\nevent: ok\ndata: {}\n");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name(), Some("ok"));
    assert!(processor.stats().overflows >= 1);
}

#[tokio::test]
async fn test_subscription_through_mock_client() {
    let url = test_url("/v1/devices/events");
    let chunks = split_every(TRANSCRIPT, 13);
    let chunk_refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
    let http = MockHttpConfig::new()
        .with_event_stream(&url, &chunk_refs)
        .build();
    let client = mock_client(http.clone());

    let records: Vec<_> = client
        .get_event_stream(&EventFilter::mine())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(records.len(), 3);
    let request = http.last_request().unwrap();
    assert_eq!(request.url, url);
    assert_eq!(
        request.headers.get("Accept").map(String::as_str),
        Some("text/event-stream")
    );
}

#[tokio::test]
async fn test_subscription_transport_failure() {
    let url = test_url("/v1/events");
    let http = MockHttpConfig::new().build();
    http.set_response(
        &url,
        MockResponse::StreamError {
            chunks: vec![Bytes::from_static(b"event: a\ndata: {}\n")],
            error: HttpError::Io("connection reset by peer".to_string()),
        },
    );
    let client = mock_client(http);

    let mut events = client.get_event_stream(&EventFilter::all()).await.unwrap();

    assert_eq!(events.next().await.unwrap().unwrap().name(), Some("a"));
    let err = events.next().await.unwrap().unwrap_err();
    assert!(matches!(err, StreamError::ConnectionLost { .. }));
    assert!(err.is_retryable());
    assert!(events.next().await.is_none());
}

#[tokio::test]
async fn test_on_event_observer() {
    let url = test_url("/v1/events/temp");
    let http = MockHttpConfig::new()
        .with_event_stream(&url, &["event: temp\ndata: {\"data\":\"1\"}\n", "event: temp\ndata: {\"data\":\"2\"}\n"])
        .build();
    let client = mock_client(http);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let stats = client
        .on_event(Some("temp"), move |record| {
            sink.lock().unwrap().push(record.data().map(str::to_string));
        })
        .await
        .unwrap()
        .await
        .unwrap();

    assert_eq!(stats.records_emitted, 2);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some("1".to_string()), Some("2".to_string())]
    );
}
