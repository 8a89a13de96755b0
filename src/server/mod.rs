//! # Server Module
//!
//! HTTP surface of the gateway: routes, handlers, bearer auth and the
//! middleware stack.

pub mod auth;
pub mod handlers;
pub mod sse;
pub mod state;

pub use handlers::{chat_completions, health_check, list_models};
pub use state::AppState;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::{self, TraceLayer},
};
use tracing::{warn, Level};

/// Create router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/models", get(list_models))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    let cors = cors_layer(&state.config().cors_origin);

    Router::new()
        .route("/health", get(health_check))
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(CompressionLayer::new())
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static("x-request-session-id"),
            HeaderName::from_static("x-api-version"),
        ])
        .max_age(Duration::from_secs(86_400));

    if origin == "*" {
        return layer.allow_origin(Any);
    }

    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!("Invalid CORS origin '{}', allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}
