//! # Augment Gateway
//!
//! An OpenAI-compatible chat completions gateway in front of the Augment
//! backend. Requests arrive in the OpenAI chat format, are forwarded to a
//! backend `chat-stream` endpoint with a credential drawn at random from a
//! pool, and the backend's `data: {text, done}` stream is relayed back either
//! as OpenAI SSE chunks or as one aggregated completion.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use augment_gateway::{create_router, AppState, Config, GracefulShutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::for_test(); // or Config::parse_args() for CLI
//!     let shutdown = GracefulShutdown::new();
//!
//!     let state = AppState::new(config, shutdown.token()).await?;
//!     let app = create_router(state);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app)
//!         .with_graceful_shutdown(shutdown.signal())
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`config`] - CLI/environment configuration and logging setup
//! - [`credentials`] - credential rows, the store boundary and the random pool
//! - [`translator`] - OpenAI request to backend payload
//! - [`streaming`] - frame decoding, chunk transcoding and aggregation
//! - [`gateway`] - the per-request pipeline tying the above together
//! - [`server`] - axum routes, bearer auth and SSE rendering
//! - [`error`] - the gateway error taxonomy

// Core infrastructure
pub mod config;
pub mod core;
pub mod error;
pub mod graceful_shutdown;
pub mod schemas;

// Domain modules
pub mod credentials;
pub mod gateway;
pub mod streaming;
pub mod translator;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types for convenience
pub use config::Config;
pub use credentials::{
    Credential, CredentialPool, CredentialRow, CredentialStatus, CredentialStore,
    MemoryCredentialStore,
};
pub use error::GatewayError;
pub use gateway::{Gateway, GatewayResponse};
pub use graceful_shutdown::GracefulShutdown;
pub use schemas::{ChatCompletionRequest, ChatCompletionResponse, Message, Mode};
pub use streaming::{AggregatedResponse, StreamTranscoder, TranslatedChunk};
pub use translator::RequestTranslator;

#[cfg(feature = "server")]
pub use server::{create_router, AppState};

/// The result type used throughout the library
pub type Result<T> = std::result::Result<T, GatewayError>;
