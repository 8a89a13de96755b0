//! # Credentials Module
//!
//! Backend credentials, the external store they live in, and the pool that
//! picks one per request.
//!
//! The gateway only ever reads credentials. Rows are created, disabled and
//! deleted by an administrative surface that sits outside this crate; the
//! in-memory store here is what the binary and the tests use in its place.

pub mod pool;
pub mod store;

pub use pool::{select_random, CredentialPool, PoolError};
pub use store::{CredentialStore, MemoryCredentialStore, StoreError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    Active,
    Disabled,
}

/// Record shape of the external credential store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRow {
    #[serde(default = "new_row_id")]
    pub id: String,
    pub token: String,
    pub tenant_url: String,
    pub status: CredentialStatus,
    #[serde(default)]
    pub remark: String,
    #[serde(default = "now")]
    pub created_at: DateTime<Utc>,
}

fn new_row_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

impl CredentialRow {
    pub fn new(token: impl Into<String>, tenant_url: impl Into<String>) -> Self {
        Self {
            id: new_row_id(),
            token: token.into(),
            tenant_url: tenant_url.into(),
            status: CredentialStatus::Active,
            remark: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: CredentialStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }
}

/// A validated backend credential: secret, endpoint and status.
#[derive(Clone, PartialEq)]
pub struct Credential {
    pub secret: String,
    pub endpoint: Url,
    pub status: CredentialStatus,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    pub fn is_active(&self) -> bool {
        self.status == CredentialStatus::Active
    }

    /// Secret prefix safe for logs.
    pub fn masked_secret(&self) -> String {
        let prefix: String = self.secret.chars().take(6).collect();
        format!("{}...", prefix)
    }
}

// Never print the secret.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("secret", &self.masked_secret())
            .field("endpoint", &self.endpoint.as_str())
            .field("status", &self.status)
            .field("label", &self.label)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl TryFrom<CredentialRow> for Credential {
    type Error = StoreError;

    fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
        let secret = row.token.trim().to_string();
        if secret.is_empty() {
            return Err(StoreError::InvalidRow {
                id: row.id,
                reason: "token is empty".to_string(),
            });
        }

        let tenant_url = row.tenant_url.trim();
        if tenant_url.is_empty() {
            return Err(StoreError::InvalidRow {
                id: row.id,
                reason: "tenant_url is empty".to_string(),
            });
        }

        let endpoint = Url::parse(tenant_url).map_err(|e| StoreError::InvalidRow {
            id: row.id.clone(),
            reason: format!("tenant_url is not a valid URL: {}", e),
        })?;
        if !["http", "https"].contains(&endpoint.scheme()) {
            return Err(StoreError::InvalidRow {
                id: row.id,
                reason: format!("unsupported URL scheme '{}'", endpoint.scheme()),
            });
        }

        let label = if row.remark.is_empty() { row.id } else { row.remark };

        Ok(Self {
            secret,
            endpoint,
            status: row.status,
            label,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_converts_to_credential() {
        let row = CredentialRow::new("abcdef123456", "https://d1.api.example.com/")
            .with_remark("primary");
        let cred = Credential::try_from(row).unwrap();
        assert_eq!(cred.label, "primary");
        assert_eq!(cred.endpoint.as_str(), "https://d1.api.example.com/");
        assert!(cred.is_active());
    }

    #[test]
    fn test_row_label_falls_back_to_id() {
        let row = CredentialRow::new("secret", "https://example.com/");
        let id = row.id.clone();
        let cred = Credential::try_from(row).unwrap();
        assert_eq!(cred.label, id);
    }

    #[test]
    fn test_row_rejects_empty_fields() {
        assert!(Credential::try_from(CredentialRow::new("", "https://example.com/")).is_err());
        assert!(Credential::try_from(CredentialRow::new("secret", "  ")).is_err());
        assert!(Credential::try_from(CredentialRow::new("secret", "not a url")).is_err());
        assert!(Credential::try_from(CredentialRow::new("secret", "ftp://example.com/")).is_err());
    }

    #[test]
    fn test_debug_masks_secret() {
        let cred = Credential::try_from(CredentialRow::new(
            "0123456789abcdef",
            "https://example.com/",
        ))
        .unwrap();
        let printed = format!("{:?}", cred);
        assert!(printed.contains("012345..."));
        assert!(!printed.contains("0123456789abcdef"));
    }

    #[test]
    fn test_row_json_shape() {
        let row: CredentialRow = serde_json::from_str(
            r#"{"token":"t","tenant_url":"https://e.com/","status":"disabled","remark":"old"}"#,
        )
        .unwrap();
        assert_eq!(row.status, CredentialStatus::Disabled);
        assert_eq!(row.remark, "old");
        assert!(!row.id.is_empty());
    }
}
