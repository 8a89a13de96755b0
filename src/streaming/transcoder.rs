//! # Stream Transcoder
//!
//! Drives a [`FrameDecoder`] over the backend's byte stream and yields
//! [`TranslatedChunk`]s. The stream is pull-based: the backend body is only
//! read when the consumer asks for the next chunk. A cancelled token ends
//! the stream at the next suspension point and drops the backend body.

use super::core::{StreamingState, TranslatedChunk};
use super::frames::{Frame, FrameDecoder, DEFAULT_MAX_FRAME_BYTES};
use crate::error::GatewayError;
use bytes::Bytes;
use futures_util::{
    stream::{self, BoxStream},
    Stream, StreamExt, TryStreamExt,
};
use std::collections::VecDeque;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Caller-facing chunk stream.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<TranslatedChunk, GatewayError>> + Send>>;

pub struct StreamTranscoder {
    state: StreamingState,
    cancel: CancellationToken,
    max_frame_bytes: usize,
}

impl StreamTranscoder {
    pub fn new(model: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            state: StreamingState::new(model),
            cancel,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// Cap on a single backend line; longer lines are dropped as malformed.
    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    pub fn request_id(&self) -> &str {
        &self.state.request_id
    }

    /// Transcode a backend body into chunks. Exactly one chunk has
    /// `finished = true` unless the stream is cancelled or the transport fails.
    pub fn transcode<S, E>(self, body: S) -> ChunkStream
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        let run = TranscodeRun {
            body: body.map_err(|e| e.to_string()).boxed(),
            decoder: FrameDecoder::with_max_frame_bytes(self.max_frame_bytes),
            ready: VecDeque::new(),
            chunks: self.state,
            cancel: self.cancel,
        };

        Box::pin(stream::unfold(run, |mut run| async move {
            loop {
                if let Some(chunk) = run.ready.pop_front() {
                    return Some((Ok(chunk), run));
                }
                if run.chunks.is_finished {
                    debug!(
                        "Stream {} completed after {} chunks ({} malformed frames skipped)",
                        run.chunks.request_id,
                        run.chunks.chunk_index,
                        run.decoder.malformed_frames()
                    );
                    return None;
                }

                let next = tokio::select! {
                    biased;
                    _ = run.cancel.cancelled() => {
                        debug!("Stream {} cancelled by caller", run.chunks.request_id);
                        return None;
                    }
                    next = run.body.next() => next,
                };

                match next {
                    Some(Ok(bytes)) => {
                        let frames = run.decoder.push(&bytes);
                        run.absorb(frames);
                    }
                    Some(Err(e)) => {
                        warn!("Backend stream {} failed: {}", run.chunks.request_id, e);
                        run.chunks.is_finished = true;
                        return Some((
                            Err(GatewayError::Upstream(format!("backend stream interrupted: {}", e))),
                            run,
                        ));
                    }
                    None => {
                        let frames = run.decoder.finish();
                        run.absorb(frames);
                        run.close();
                    }
                }
            }
        }))
    }
}

struct TranscodeRun {
    body: BoxStream<'static, Result<Bytes, String>>,
    decoder: FrameDecoder,
    ready: VecDeque<TranslatedChunk>,
    chunks: StreamingState,
    cancel: CancellationToken,
}

impl TranscodeRun {
    fn absorb(&mut self, frames: Vec<Frame>) {
        for frame in frames {
            if self.chunks.is_finished {
                break;
            }
            match frame {
                Frame::Event(event) => {
                    let text = event.text().unwrap_or_default().to_string();
                    if event.done {
                        let chunk = self.chunks.next_chunk(text, true);
                        self.ready.push_back(chunk);
                    } else if !text.is_empty() {
                        let chunk = self.chunks.next_chunk(text, false);
                        self.ready.push_back(chunk);
                    }
                }
                Frame::Done => self.close(),
            }
        }
    }

    /// Emit the synthetic final chunk if the backend never sent `done: true`.
    fn close(&mut self) {
        if !self.chunks.is_finished {
            let chunk = self.chunks.next_chunk(String::new(), true);
            self.ready.push_back(chunk);
        }
    }
}
