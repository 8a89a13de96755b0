//! # Application State
//!
//! Shared state handed to every HTTP handler.

use crate::{
    config::Config,
    credentials::{CredentialStore, MemoryCredentialStore},
    error::GatewayError,
    gateway::Gateway,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gateway: Gateway,
    /// Server-wide token; each request works under a child of it
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Build state with the in-memory store described by `config`.
    pub async fn new(config: Config, shutdown: CancellationToken) -> Result<Self, GatewayError> {
        let store = MemoryCredentialStore::from_config(&config)
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        Self::with_store(config, Arc::new(store), shutdown)
    }

    /// Build state over an arbitrary credential store.
    pub fn with_store(
        config: Config,
        store: Arc<dyn CredentialStore>,
        shutdown: CancellationToken,
    ) -> Result<Self, GatewayError> {
        let gateway = Gateway::new(&config, store)?;
        Ok(Self {
            config: Arc::new(config),
            gateway,
            shutdown,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Fresh per-request token, cancelled on shutdown or when the caller goes away.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.config.streaming_keep_alive_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialRow;

    #[tokio::test]
    async fn test_app_state_creation() {
        let state = AppState::new(Config::for_test(), CancellationToken::new())
            .await
            .unwrap();
        assert!(state.config().auth_enabled());
        assert!(state.gateway().pool().list_active().await.is_empty());
    }

    #[tokio::test]
    async fn test_request_token_follows_shutdown() {
        let shutdown = CancellationToken::new();
        let store = Arc::new(MemoryCredentialStore::with_rows(vec![CredentialRow::new(
            "tok",
            "https://tenant.example.com/",
        )]));
        let state = AppState::with_store(Config::for_test(), store, shutdown.clone()).unwrap();

        let token = state.request_token();
        assert!(!token.is_cancelled());
        shutdown.cancel();
        assert!(token.is_cancelled());
    }
}
