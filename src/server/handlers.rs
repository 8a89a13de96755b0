//! # Server Handlers
//!
//! HTTP route handlers for the gateway.

use super::{sse::chunk_stream_to_sse, AppState};
use crate::{
    error::GatewayError,
    gateway::GatewayResponse,
    schemas::{ChatCompletionRequest, ModelCard, ModelList},
    streaming::current_timestamp,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json as JsonResponse, Response},
    Json,
};

/// Model ids accepted by the backend. Names containing `agent` run in agent mode.
pub const SUPPORTED_MODELS: &[&str] = &[
    "claude-3.7-chat",
    "claude-3.7-agent",
    "claude-4-chat",
    "claude-4-agent",
];

/// Chat completions handler
pub async fn chat_completions(
    State(state): State<AppState>,
    payload: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(req) = payload.map_err(|rejection| GatewayError::MalformedRequest(rejection.body_text()))?;

    let cancel = state.request_token();
    match state.gateway().handle_chat_request(req, cancel.clone()).await? {
        GatewayResponse::Stream(chunks) => {
            Ok(chunk_stream_to_sse(chunks, cancel, state.keep_alive_interval()).into_response())
        }
        GatewayResponse::Complete(aggregated) => {
            Ok(Json(aggregated.into_completion()).into_response())
        }
    }
}

/// Static model catalog
pub async fn list_models() -> Json<ModelList> {
    let created = current_timestamp();
    Json(ModelList {
        object: "list".to_string(),
        data: SUPPORTED_MODELS
            .iter()
            .map(|id| ModelCard {
                id: id.to_string(),
                object: "model".to_string(),
                created,
                owned_by: "augment".to_string(),
            })
            .collect(),
    })
}

/// Health check handler
pub async fn health_check() -> impl IntoResponse {
    let health_status = serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "augment-gateway",
        "version": env!("CARGO_PKG_VERSION")
    });

    (StatusCode::OK, JsonResponse(health_status))
}
