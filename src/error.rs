//! # Gateway Errors
//!
//! Error taxonomy shared by the credential pool, the translator, the
//! transcoder and the HTTP layer. Frame-level parse failures never appear
//! here: the transcoder absorbs them.

#[cfg(feature = "server")]
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
#[cfg(feature = "server")]
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or invalid caller shared secret.
    #[error("Unauthorized: invalid or missing bearer token")]
    Unauthorized,
    /// The credential pool has zero active entries.
    #[error("No backend available: credential pool exhausted")]
    NoBackendAvailable,
    /// Inbound request is missing a required field or is not valid JSON.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    /// Backend answered with a non-success status.
    #[error("Backend error: HTTP {status}: {body}")]
    Backend { status: u16, body: String },
    /// Transport failure while reaching or reading the backend.
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GatewayError {
    /// Error `type` string used in OpenAI-style error bodies.
    pub fn error_type(&self) -> &'static str {
        match self {
            GatewayError::Unauthorized => "authentication_error",
            GatewayError::NoBackendAvailable => "service_unavailable",
            GatewayError::MalformedRequest(_) => "invalid_request_error",
            GatewayError::Backend { .. } => "backend_error",
            GatewayError::Upstream(_) => "api_error",
            GatewayError::Internal(_) => "internal_error",
            GatewayError::Serialization(_) => "serialization_error",
        }
    }

    /// Backend status carried for diagnostics, if any.
    pub fn backend_status(&self) -> Option<u16> {
        match self {
            GatewayError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[cfg(feature = "server")]
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::NoBackendAvailable => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Backend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) | GatewayError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(feature = "server")]
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": self.error_type(),
                "code": self.backend_status(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Upstream("Request timeout - backend did not respond in time".to_string())
        } else if err.is_connect() {
            GatewayError::Upstream("Connection failed - unable to reach backend".to_string())
        } else if err.is_builder() {
            GatewayError::Internal(format!("Invalid backend request: {}", err))
        } else if let Some(status) = err.status() {
            GatewayError::Backend {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            GatewayError::Upstream(format!("HTTP client error: {}", err))
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::Internal(format!("Invalid backend URL: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_carries_status() {
        let err = GatewayError::Backend {
            status: 429,
            body: "slow down".to_string(),
        };
        assert_eq!(err.backend_status(), Some(429));
        assert_eq!(err.to_string(), "Backend error: HTTP 429: slow down");
    }

    #[cfg(feature = "server")]
    #[test]
    fn test_status_mapping() {
        assert_eq!(GatewayError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            GatewayError::NoBackendAvailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            GatewayError::MalformedRequest("messages".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::Backend { status: 401, body: String::new() }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let converted: GatewayError = err.into();
        assert!(matches!(converted, GatewayError::Serialization(_)));
    }
}
