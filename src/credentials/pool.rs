//! # Credential Pool
//!
//! Stateless selection over the active credentials of a store. Every call
//! queries the store afresh; nothing is leased or locked, so two concurrent
//! requests may receive the same credential.

use super::{Credential, CredentialStore};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool exhausted")]
    Exhausted,
}

#[derive(Clone)]
pub struct CredentialPool {
    store: Arc<dyn CredentialStore>,
}

impl CredentialPool {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Active, well-formed credentials currently in the store.
    ///
    /// Store failures degrade to an empty list and are only logged.
    pub async fn list_active(&self) -> Vec<Credential> {
        let rows = match self.store.list().await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Credential store lookup failed, treating pool as empty: {}", e);
                return Vec::new();
            }
        };

        rows.into_iter()
            .filter_map(|row| match Credential::try_from(row) {
                Ok(cred) => Some(cred),
                Err(e) => {
                    warn!("Skipping credential: {}", e);
                    None
                }
            })
            .filter(Credential::is_active)
            .collect()
    }

    /// Pick one active credential uniformly at random.
    pub async fn pick_random(&self) -> Result<Credential, PoolError> {
        let active = self.list_active().await;
        let picked = select_random(&active).cloned().ok_or(PoolError::Exhausted)?;
        debug!(
            "Selected credential '{}' ({} of {} active)",
            picked.label,
            picked.masked_secret(),
            active.len()
        );
        Ok(picked)
    }
}

/// Uniform choice over an in-memory snapshot of active credentials.
pub fn select_random(active: &[Credential]) -> Option<&Credential> {
    if active.is_empty() {
        return None;
    }
    active.get(fastrand::usize(..active.len()))
}
