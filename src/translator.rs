//! # Request Translator
//!
//! Maps an OpenAI-style chat request plus a picked credential onto the
//! backend's `chat-stream` call. Pure: no I/O happens here.

use crate::{
    credentials::Credential,
    error::GatewayError,
    schemas::{BackendPayload, ChatCompletionRequest, Mode},
};
use url::Url;

/// Path appended to a credential's endpoint.
pub const CHAT_STREAM_PATH: &str = "chat-stream";

/// Everything needed to issue one backend call.
#[derive(Clone, PartialEq)]
pub struct BackendCall {
    pub url: Url,
    pub bearer: String,
    pub payload: BackendPayload,
}

impl std::fmt::Debug for BackendCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendCall")
            .field("url", &self.url.as_str())
            .field("bearer", &"<redacted>")
            .field("payload", &self.payload)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RequestTranslator {
    default_model: String,
}

impl RequestTranslator {
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            default_model: default_model.into(),
        }
    }

    /// Model the request resolves to (request value, else the configured default).
    pub fn resolve_model(&self, request: &ChatCompletionRequest) -> String {
        request
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model)
            .to_string()
    }

    pub fn translate(
        &self,
        request: &ChatCompletionRequest,
        credential: &Credential,
    ) -> Result<BackendCall, GatewayError> {
        let messages = request
            .messages
            .clone()
            .ok_or_else(|| GatewayError::MalformedRequest("`messages` is required".to_string()))?;

        let model = self.resolve_model(request);
        let mode = Mode::for_model(&model);

        Ok(BackendCall {
            url: chat_stream_url(&credential.endpoint)?,
            bearer: credential.secret.clone(),
            payload: BackendPayload {
                messages,
                mode,
                model,
            },
        })
    }
}

/// `<endpoint>chat-stream`, treating the endpoint as a directory.
pub fn chat_stream_url(endpoint: &Url) -> Result<Url, url::ParseError> {
    let mut base = endpoint.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(CHAT_STREAM_PATH)
}
