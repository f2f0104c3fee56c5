//! Async event streams
//!
//! [`EventStream`] drives a [`StreamEventProcessor`] from a
//! [`FragmentSource`] and exposes the completed records as a
//! `futures::Stream`. [`watch`] is the push-style equivalent: it spawns a
//! task that hands every record to an observer.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;

use crate::error::StreamError;
use crate::sse::events::{EventRecord, ProcessorStats};
use crate::sse::processor::StreamEventProcessor;
use crate::sse::source::FragmentSource;

/// A stream of records parsed from one transport.
///
/// Yields `Err` at most once, when the transport fails; records completed
/// before the failure are yielded first and the stream then ends.
pub struct EventStream {
    fragments: BoxStream<'static, Result<String, StreamError>>,
    processor: StreamEventProcessor,
    ready: VecDeque<EventRecord>,
    error: Option<StreamError>,
    finished: bool,
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("processor", &self.processor)
            .field("ready", &self.ready.len())
            .field("finished", &self.finished)
            .finish()
    }
}

impl EventStream {
    pub fn new(source: FragmentSource, processor: StreamEventProcessor) -> Self {
        Self::from_fragments(source.into_fragments(), processor)
    }

    /// Build a stream over any fragment stream.
    pub fn from_fragments(
        fragments: BoxStream<'static, Result<String, StreamError>>,
        processor: StreamEventProcessor,
    ) -> Self {
        Self {
            fragments,
            processor,
            ready: VecDeque::new(),
            error: None,
            finished: false,
        }
    }

    /// A stream that ends immediately without yielding anything.
    pub fn empty() -> Self {
        Self::from_fragments(stream::empty().boxed(), StreamEventProcessor::new())
    }

    /// Processor counters so far.
    pub fn stats(&self) -> ProcessorStats {
        self.processor.stats()
    }

    /// Consume the stream on a background task, calling `observer` for every
    /// record. The task resolves to the final statistics.
    pub fn watch<F>(mut self, mut observer: F) -> JoinHandle<ProcessorStats>
    where
        F: FnMut(EventRecord) + Send + 'static,
    {
        tokio::spawn(async move {
            while let Some(item) = self.next().await {
                match item {
                    Ok(record) => observer(record),
                    Err(err) => {
                        tracing::warn!("[{}] Event stream ended: {}", err.error_code(), err)
                    }
                }
            }
            let stats = self.stats();
            tracing::debug!(
                "Event stream watcher done: {} emitted, {} skipped, {} overflow(s)",
                stats.records_emitted,
                stats.records_skipped,
                stats.overflows
            );
            stats
        })
    }

    fn close(&mut self) {
        let records = self.processor.finish();
        self.ready.extend(records);
        self.finished = true;
    }
}

impl Stream for EventStream {
    type Item = Result<EventRecord, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(record) = this.ready.pop_front() {
                return Poll::Ready(Some(Ok(record)));
            }
            if this.finished {
                return Poll::Ready(this.error.take().map(Err));
            }

            match this.fragments.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(fragment))) => {
                    let ready = &mut this.ready;
                    this.processor
                        .on_fragment(&fragment, |record| ready.push_back(record));
                }
                Poll::Ready(Some(Err(err))) => {
                    this.error = Some(err);
                    this.close();
                }
                Poll::Ready(None) => {
                    tracing::debug!("Event stream transport closed");
                    this.close();
                }
            }
        }
    }
}

/// Attach `processor` to `source` and call `observer` for every record,
/// in order, on a background task.
pub fn watch<F>(
    source: FragmentSource,
    processor: StreamEventProcessor,
    observer: F,
) -> JoinHandle<ProcessorStats>
where
    F: FnMut(EventRecord) + Send + 'static,
{
    EventStream::new(source, processor).watch(observer)
}
