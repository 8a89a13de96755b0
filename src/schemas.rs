//! # Schemas Module
//!
//! Wire types for both sides of the gateway: the OpenAI-compatible
//! chat-completions surface exposed to callers, and the `chat-stream`
//! protocol spoken by the backend.

use serde::{Deserialize, Serialize};

// =============================================================================
// CALLER-FACING TYPES
// =============================================================================

/// # Chat Completion Request
///
/// OpenAI-compatible request body. Fields other than `model`, `messages` and
/// `stream` are accepted and ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatCompletionRequest {
    /// Model identifier (falls back to the configured default when absent)
    #[serde(default)]
    pub model: Option<String>,
    /// Conversation so far; required
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
    /// Whether the caller wants a Server-Sent Events response
    #[serde(default)]
    pub stream: Option<bool>,
}

impl ChatCompletionRequest {
    pub fn wants_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }
}

/// A single conversation turn. `content` is forwarded to the backend verbatim,
/// so both plain strings and content-part arrays survive.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Message {
    pub role: String,
    #[serde(default)]
    pub content: serde_json::Value,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: serde_json::Value::String(content.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

/// Token usage. Never computed by this gateway: every counter is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// # Chat Completion Chunk (SSE Format)
///
/// One `data:` frame of a streaming chat completion.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    /// Always "chat.completion.chunk"
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StreamChoice {
    pub index: u32,
    pub delta: StreamDelta,
    /// null until the final chunk
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StreamDelta {
    pub role: Option<String>,
    pub content: Option<String>,
}

/// Error frame emitted in place of a chunk when the backend stream fails.
#[derive(Debug, Serialize)]
pub struct StreamingError {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub message: String,
    pub r#type: String,
    pub code: Option<u16>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelCard>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelCard {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

// =============================================================================
// BACKEND-FACING TYPES
// =============================================================================

/// Backend operating mode, derived from the requested model name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Chat,
    Agent,
}

impl Mode {
    /// `Agent` iff the model name contains "agent" (case-sensitive).
    pub fn for_model(model: &str) -> Self {
        if model.contains("agent") {
            Mode::Agent
        } else {
            Mode::Chat
        }
    }
}

/// Body of `POST <endpoint>chat-stream`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendPayload {
    pub messages: Vec<Message>,
    pub mode: Mode,
    pub model: String,
}

/// One parsed `data:` frame of the backend stream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BackendEvent {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub done: bool,
}

impl BackendEvent {
    /// Text carried by this event, if non-empty.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}
