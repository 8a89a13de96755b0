//! Bearer-token check for the `/v1` routes.

use super::AppState;
use crate::error::GatewayError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::warn;

/// Reject requests whose `Authorization: Bearer` value is not the unified token.
/// Passes everything through when no token is configured.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if let Some(expected) = state.config().unified_token.as_deref().filter(|t| !t.is_empty()) {
        let presented = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        if presented != Some(expected) {
            warn!(
                "Rejected {} {}: {}",
                request.method(),
                request.uri().path(),
                if presented.is_some() { "invalid token" } else { "missing bearer token" }
            );
            return Err(GatewayError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}
