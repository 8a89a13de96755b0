//! # HTTP Client Factory
//!
//! Builds the reqwest client used for backend `chat-stream` calls.

use crate::config::Config;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(120);
const TCP_KEEPALIVE: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("Failed to build HTTP client: {0}")]
    BuildError(#[from] reqwest::Error),
}

/// Backend client settings taken from [`Config`].
#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    /// Whole-request timeout; must cover a full streamed completion
    timeout: Duration,
    connect_timeout: Duration,
    max_idle_per_host: usize,
}

impl HttpClientBuilder {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Duration::from_secs(config.http_client_timeout),
            connect_timeout: Duration::from_secs(config.http_client_connect_timeout),
            max_idle_per_host: config.http_client_max_connections_per_host,
        }
    }

    pub fn build(self) -> Result<Client, HttpClientError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .pool_max_idle_per_host(self.max_idle_per_host)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE)
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("augment-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(client)
    }
}
