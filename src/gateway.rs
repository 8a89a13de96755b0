//! # Gateway
//!
//! Composition root for one chat request: pick a credential, translate the
//! request, call the backend, then either hand back the live chunk stream or
//! aggregate it into a single response.

use crate::{
    config::Config,
    core::http_client::HttpClientBuilder,
    credentials::{CredentialPool, CredentialStore},
    error::GatewayError,
    schemas::ChatCompletionRequest,
    streaming::{AggregatedResponse, ChunkStream, ResponseAggregator, StreamTranscoder},
    translator::{BackendCall, RequestTranslator},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome of a successful chat request.
pub enum GatewayResponse {
    /// Chunks are produced as the backend body is read.
    Stream(ChunkStream),
    Complete(AggregatedResponse),
}

impl std::fmt::Debug for GatewayResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayResponse::Stream(_) => f.write_str("GatewayResponse::Stream(..)"),
            GatewayResponse::Complete(response) => {
                f.debug_tuple("GatewayResponse::Complete").field(response).finish()
            }
        }
    }
}

#[derive(Clone)]
pub struct Gateway {
    pool: CredentialPool,
    translator: RequestTranslator,
    client: reqwest::Client,
    max_error_body_bytes: usize,
    max_frame_bytes: usize,
}

impl Gateway {
    pub fn new(config: &Config, store: Arc<dyn CredentialStore>) -> Result<Self, GatewayError> {
        let client = HttpClientBuilder::from_config(config)
            .build()
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(Self::with_client(config, store, client))
    }

    pub fn with_client(
        config: &Config,
        store: Arc<dyn CredentialStore>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            pool: CredentialPool::new(store),
            translator: RequestTranslator::new(config.default_model.clone()),
            client,
            max_error_body_bytes: config.max_error_body_bytes,
            max_frame_bytes: config.max_frame_bytes,
        }
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    pub fn translator(&self) -> &RequestTranslator {
        &self.translator
    }

    /// Handle one chat request. `cancel` is observed while waiting on the
    /// backend and for the whole lifetime of the returned chunk stream.
    pub async fn handle_chat_request(
        &self,
        request: ChatCompletionRequest,
        cancel: CancellationToken,
    ) -> Result<GatewayResponse, GatewayError> {
        let credential = self
            .pool
            .pick_random()
            .await
            .map_err(|_| GatewayError::NoBackendAvailable)?;

        let call = self.translator.translate(&request, &credential)?;
        info!(
            "Forwarding {} message(s) to '{}' (model={}, mode={:?}, stream={})",
            call.payload.messages.len(),
            credential.label,
            call.payload.model,
            call.payload.mode,
            request.wants_stream()
        );

        let response = self.send(&call, &cancel).await?;

        let transcoder = StreamTranscoder::new(call.payload.model, cancel)
            .with_max_frame_bytes(self.max_frame_bytes);
        let body = response.bytes_stream();

        if request.wants_stream() {
            Ok(GatewayResponse::Stream(transcoder.transcode(body)))
        } else {
            let aggregated = ResponseAggregator::aggregate(transcoder, body).await?;
            Ok(GatewayResponse::Complete(aggregated))
        }
    }

    async fn send(
        &self,
        call: &BackendCall,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, GatewayError> {
        let request_id = Uuid::new_v4().to_string();
        let pending = self
            .client
            .post(call.url.clone())
            .bearer_auth(&call.bearer)
            .header("x-request-id", &request_id)
            .json(&call.payload)
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(GatewayError::Upstream("request cancelled before the backend answered".to_string()));
            }
            response = pending => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response, self.max_error_body_bytes).await;
            warn!(
                "Backend {} answered HTTP {} (request {})",
                call.url,
                status.as_u16(),
                request_id
            );
            return Err(GatewayError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

/// Read at most `max` bytes of an error body; the rest is never pulled.
async fn read_error_body(mut response: reqwest::Response, max: usize) -> String {
    let mut raw = Vec::new();
    while raw.len() < max {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let room = max - raw.len();
                raw.extend_from_slice(&chunk[..chunk.len().min(room)]);
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read backend error body: {}", e);
                break;
            }
        }
    }
    truncate_body(String::from_utf8_lossy(&raw).into_owned(), max)
}

/// Cut `body` to at most `max` bytes on a character boundary.
fn truncate_body(mut body: String, max: usize) -> String {
    if body.len() <= max {
        return body;
    }
    let mut cut = max;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    body.truncate(cut);
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body_respects_char_boundary() {
        assert_eq!(truncate_body("short".to_string(), 10), "short");
        assert_eq!(truncate_body("abcdef".to_string(), 3), "abc");
        // 'é' is two bytes; cutting inside it backs off.
        assert_eq!(truncate_body("aé".to_string(), 2), "a");
    }
}
