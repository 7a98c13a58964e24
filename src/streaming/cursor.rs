use futures::Stream;

use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::models::ChatEvent;
use crate::source::ByteSource;
use crate::stats::StreamStats;

use super::accumulator::AnswerAccumulator;
use super::decoder::{EventDecoder, LineOutcome};
use super::framer::LineFramer;

/// Pull-based cursor over one streaming chat response
///
/// Owns the transport and its line buffer. Drive it with [`ChatStream::next`]
/// from a single task; wrap calls in `tokio::time::timeout` or cancel the
/// originating request to bound waiting.
pub struct ChatStream<S> {
    /// `None` once the transport has been released
    framer: Option<LineFramer<S>>,
    decoder: EventDecoder,
    stats: StreamStats,
}

impl<S: ByteSource> ChatStream<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, &StreamConfig::default())
    }

    pub fn with_config(source: S, config: &StreamConfig) -> Self {
        Self {
            framer: Some(LineFramer::with_config(source, config)),
            decoder: EventDecoder::new(),
            stats: StreamStats::new(),
        }
    }

    /// Advance to the next event.
    ///
    /// Returns `Ok(None)` on every call after `message_end` has been
    /// returned. Any error is fatal: the transport is released and later
    /// calls return [`StreamError::Closed`].
    pub async fn next(&mut self) -> Result<Option<ChatEvent>> {
        if self.decoder.is_terminated() {
            self.release();
            return Ok(None);
        }

        let Some(framer) = self.framer.as_mut() else {
            return Err(StreamError::Closed);
        };

        let result = Self::advance(framer, &mut self.decoder, &mut self.stats).await;
        match result {
            Ok(event) => Ok(Some(event)),
            Err(e) => {
                self.release();
                Err(e)
            }
        }
    }

    async fn advance(
        framer: &mut LineFramer<S>,
        decoder: &mut EventDecoder,
        stats: &mut StreamStats,
    ) -> Result<ChatEvent> {
        loop {
            let Some(line) = framer.next_line().await? else {
                return Err(StreamError::unexpected_eof(framer.buffered()));
            };
            stats.record_line();

            match decoder.decode_line(&line)? {
                LineOutcome::Event(event) => {
                    stats.record_event(event.kind().is_some());
                    return Ok(event);
                }
                LineOutcome::KeepAlive => stats.record_keep_alive(),
                LineOutcome::Noise => stats.record_noise(),
            }
        }
    }

    /// Release the transport. Safe to call any number of times.
    pub fn close(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(framer) = self.framer.take() {
            self.stats.bytes_read = framer.bytes_read();
            tracing::debug!(
                bytes_read = self.stats.bytes_read,
                events = self.stats.events,
                finished = self.decoder.is_terminated(),
                "Releasing stream transport"
            );
        }
    }

    /// True once `message_end` has been returned
    pub fn is_finished(&self) -> bool {
        self.decoder.is_terminated()
    }

    /// True once the transport has been released
    pub fn is_closed(&self) -> bool {
        self.framer.is_none()
    }

    pub fn stats(&self) -> StreamStats {
        match &self.framer {
            Some(framer) => StreamStats {
                bytes_read: framer.bytes_read(),
                ..self.stats
            },
            None => self.stats,
        }
    }

    /// Read to the end of the stream, folding every event into one answer.
    ///
    /// Stops early without error if the service reports an `error` event.
    pub async fn collect_answer(&mut self) -> Result<AnswerAccumulator> {
        let mut answer = AnswerAccumulator::new();
        while let Some(event) = self.next().await? {
            answer.push(&event);
            if answer.upstream_error().is_some() {
                self.close();
                break;
            }
        }
        Ok(answer)
    }

    /// Adapt the cursor into a `futures::Stream`; the stream ends after the
    /// terminal event or the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<ChatEvent>> {
        futures::stream::unfold(Some(self), |state| async move {
            let mut stream = state?;
            match stream.next().await {
                Ok(Some(event)) => Some((Ok(event), Some(stream))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}
