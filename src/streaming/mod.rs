//! # Streaming Module
//!
//! Translation of the backend's `data: {text, done}` event stream into
//! OpenAI-compatible output, either chunk by chunk or aggregated.
//!
//! ## Pieces:
//! - [`frames`]: carried-buffer line splitting and frame parsing
//! - [`transcoder`]: async, cancellable chunk stream over a backend body
//! - [`aggregator`]: drives the transcoder to completion for non-streaming calls
//! - `core`: chunk/response types and their wire shapes

pub mod aggregator;
pub mod core;
pub mod frames;
pub mod transcoder;

pub use aggregator::ResponseAggregator;
pub use self::core::{
    current_timestamp, AggregatedResponse, StreamingState, TranslatedChunk, FINISH_REASON_STOP,
};
pub use frames::{DecoderState, Frame, FrameDecoder};
pub use transcoder::{ChunkStream, StreamTranscoder};
