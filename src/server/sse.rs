//! # SSE Rendering
//!
//! Turns the gateway's chunk stream into `text/event-stream` frames.

use crate::{
    error::GatewayError,
    schemas::{ErrorDetails, StreamingError},
    streaming::{ChunkStream, TranslatedChunk},
};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::{stream, Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::error;

/// Sent when an error frame itself cannot be serialized.
const FALLBACK_ERROR_FRAME: &str =
    r#"{"error":{"message":"Internal error","type":"internal_error","code":null}}"#;

/// Render chunks as SSE. The returned body owns a drop guard for `cancel`,
/// so a caller disconnect (body dropped) cancels the backend read loop.
pub fn chunk_stream_to_sse(
    chunks: ChunkStream,
    cancel: CancellationToken,
    keep_alive: Duration,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    let guard = cancel.drop_guard();

    let events = chunks
        .flat_map(|item| stream::iter(render(item)))
        .map(move |event| {
            let _guard = &guard;
            Ok::<_, Infallible>(event)
        });

    Sse::new(events).keep_alive(KeepAlive::new().interval(keep_alive))
}

fn render(item: Result<TranslatedChunk, GatewayError>) -> Vec<Event> {
    match item {
        Ok(chunk) if chunk.finished => vec![chunk_event(&chunk), done_event()],
        Ok(chunk) => vec![chunk_event(&chunk)],
        Err(error) => vec![error_event(&error)],
    }
}

pub fn chunk_event(chunk: &TranslatedChunk) -> Event {
    Event::default().data(chunk_json(chunk))
}

pub fn error_event(error: &GatewayError) -> Event {
    Event::default().data(error_json(error))
}

/// OpenAI clients expect a closing `[DONE]` frame.
pub fn done_event() -> Event {
    Event::default().data("[DONE]")
}

fn chunk_json(chunk: &TranslatedChunk) -> String {
    match serde_json::to_string(&chunk.to_wire()) {
        Ok(json) => json,
        Err(e) => error_json(&GatewayError::from(e)),
    }
}

fn error_json(error: &GatewayError) -> String {
    let body = StreamingError {
        error: ErrorDetails {
            message: error.to_string(),
            r#type: error.error_type().to_string(),
            code: error.backend_status(),
        },
    };
    serde_json::to_string(&body).unwrap_or_else(|e| {
        error!("Failed to serialize stream error frame: {}", e);
        FALLBACK_ERROR_FRAME.to_string()
    })
}
