//! Credential store boundary and an in-memory implementation.

use super::CredentialRow;
use crate::config::Config;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
    #[error("credential row {id} is invalid: {reason}")]
    InvalidRow { id: String, reason: String },
    #[error("credential row {0} not found")]
    NotFound(String),
    #[error("failed to load credentials: {0}")]
    Load(String),
}

/// External lookup service holding credential rows.
///
/// Implementations may be backed by a database or a remote KV; the gateway
/// only calls [`CredentialStore::list`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn list(&self) -> Result<Vec<CredentialRow>, StoreError>;

    async fn insert(&self, row: CredentialRow) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    rows: RwLock<Vec<CredentialRow>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<CredentialRow>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Load rows from a JSON array file.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Load(format!("{}: {}", path.display(), e)))?;
        let rows: Vec<CredentialRow> = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Load(format!("{}: {}", path.display(), e)))?;

        info!("Loaded {} credential rows from {}", rows.len(), path.display());
        Ok(Self::with_rows(rows))
    }

    /// Rows from `credentials_file` plus the `backend_url`/`backend_token` seed.
    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        let store = match &config.credentials_file {
            Some(path) => Self::from_json_file(path).await?,
            None => Self::new(),
        };

        if let Some((token, url)) = config.seed_credential() {
            store
                .insert(CredentialRow::new(token, url).with_remark("seed"))
                .await?;
        }

        if store.is_empty().await {
            warn!("Credential store is empty; chat requests will fail until credentials are added");
        }
        Ok(store)
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn list(&self) -> Result<Vec<CredentialRow>, StoreError> {
        Ok(self.rows.read().await.clone())
    }

    async fn insert(&self, row: CredentialRow) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        if let Some(existing) = rows.iter_mut().find(|r| r.id == row.id) {
            warn!("Replacing existing credential row {}", row.id);
            *existing = row;
        } else {
            rows.push(row);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
