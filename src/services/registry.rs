use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::normalize::{cell_text, normalize_str, normalize_text, parse_bool_like};
use crate::store::{RecordStore, Row, StoreError};

pub mod columns {
    pub const EMAIL: &str = "email";
    pub const PASSWORD: &str = "password";
    pub const STATUS: &str = "status";
}

/// Prefix marking a stored secret as a hex SHA-256 digest
pub const SHA256_PREFIX: &str = "sha256$";

const ACTIVE_STATUSES: &[&str] = &["ativo", "ativa", "active"];

#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub email: String,
    pub secret: String,
}

impl UserRecord {
    pub fn verify(&self, given: &str) -> bool {
        verify_secret(&self.secret, given)
    }
}

pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    format!("{}{:x}", SHA256_PREFIX, hasher.finalize())
}

pub fn verify_secret(stored: &str, given: &str) -> bool {
    match stored.strip_prefix(SHA256_PREFIX) {
        Some(_) => hash_secret(given) == stored,
        None => stored == given,
    }
}

pub fn is_active_license(status: &str) -> bool {
    let n = normalize_str(status);
    ACTIVE_STATUSES.contains(&n.as_str()) || parse_bool_like(&Value::String(n))
}

/// Central user and license lookups, keyed by normalized email
#[async_trait]
pub trait UserRegistry: Send + Sync {
    async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn license_status(&self, email: &str) -> Result<Option<String>, StoreError>;
}

/// Registry backed by two record-store tables (users and licenses)
pub struct TableRegistry {
    store: Arc<dyn RecordStore>,
    users_table: String,
    licenses_table: String,
}

impl TableRegistry {
    pub fn new(store: Arc<dyn RecordStore>, users_table: impl Into<String>, licenses_table: impl Into<String>) -> Self {
        Self {
            store,
            users_table: users_table.into(),
            licenses_table: licenses_table.into(),
        }
    }

    async fn find_row(&self, table: &str, email: &str) -> Result<Option<Row>, StoreError> {
        let wanted = normalize_str(email);
        let t = match self.store.read_table(table).await {
            Ok(t) => t,
            Err(StoreError::TableNotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(t.rows.into_iter().find(|r| {
            normalize_text(r.get(columns::EMAIL).unwrap_or(&Value::Null)) == wanted
        }))
    }
}

#[async_trait]
impl UserRegistry for TableRegistry {
    async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.find_row(&self.users_table, email).await?.map(|r| UserRecord {
            email: normalize_str(email),
            secret: cell_text(r.get(columns::PASSWORD).unwrap_or(&Value::Null)),
        }))
    }

    async fn license_status(&self, email: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .find_row(&self.licenses_table, email)
            .await?
            .map(|r| cell_text(r.get(columns::STATUS).unwrap_or(&Value::Null))))
    }
}
