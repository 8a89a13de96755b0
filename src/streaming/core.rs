//! # Core Streaming Types
//!
//! Per-request chunk bookkeeping and the two output shapes of the
//! transcoder: incremental [`TranslatedChunk`]s and the single
//! [`AggregatedResponse`].

use crate::schemas::{
    AssistantMessage, ChatCompletionChunk, ChatCompletionResponse, Choice, StreamChoice,
    StreamDelta, Usage,
};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub const FINISH_REASON_STOP: &str = "stop";
const ASSISTANT_ROLE: &str = "assistant";

/// Streaming response state management
#[derive(Debug, Clone)]
pub struct StreamingState {
    /// Unique request identifier shared by every chunk
    pub request_id: String,
    /// Model echoed back to the caller
    pub model: String,
    /// Unix timestamp fixed at stream start
    pub created: i64,
    /// Number of chunks produced so far
    pub chunk_index: usize,
    /// Whether the finished chunk has been produced
    pub is_finished: bool,
}

impl StreamingState {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            request_id: format!("chatcmpl-{}", Uuid::new_v4().simple()),
            model: model.into(),
            created: current_timestamp(),
            chunk_index: 0,
            is_finished: false,
        }
    }

    /// Build the next chunk. A finished chunk closes the state.
    pub fn next_chunk(&mut self, delta_text: impl Into<String>, finished: bool) -> TranslatedChunk {
        self.chunk_index += 1;
        if finished {
            self.is_finished = true;
        }
        TranslatedChunk {
            id: self.request_id.clone(),
            created_at: self.created,
            model: self.model.clone(),
            delta_text: delta_text.into(),
            finished,
        }
    }
}

/// One unit of caller-facing streaming output.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedChunk {
    pub id: String,
    pub created_at: i64,
    pub model: String,
    pub delta_text: String,
    pub finished: bool,
}

impl TranslatedChunk {
    /// OpenAI `chat.completion.chunk` representation.
    pub fn to_wire(&self) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk".to_string(),
            created: self.created_at,
            model: self.model.clone(),
            choices: vec![StreamChoice {
                index: 0,
                delta: StreamDelta {
                    role: Some(ASSISTANT_ROLE.to_string()),
                    content: Some(self.delta_text.clone()),
                },
                finish_reason: self.finished.then(|| FINISH_REASON_STOP.to_string()),
            }],
        }
    }
}

/// The whole completion, assembled from a finished stream.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedResponse {
    pub id: String,
    pub created_at: i64,
    pub model: String,
    pub full_text: String,
    pub finish_reason: String,
}

impl AggregatedResponse {
    /// OpenAI `chat.completion` representation; usage is never computed.
    pub fn into_completion(self) -> ChatCompletionResponse {
        ChatCompletionResponse {
            id: self.id,
            object: "chat.completion".to_string(),
            created: self.created_at,
            model: self.model,
            choices: vec![Choice {
                index: 0,
                message: AssistantMessage {
                    role: ASSISTANT_ROLE.to_string(),
                    content: self.full_text,
                },
                finish_reason: self.finish_reason,
            }],
            usage: Usage::default(),
        }
    }
}

pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0)
}
