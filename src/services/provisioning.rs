use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::info;

use crate::normalize::{cell_text, normalize_str, normalize_text};
use crate::store::{RecordStore, Row, StoreError};

pub mod columns {
    pub const EMAIL: &str = "email";
    pub const TABLE: &str = "table";
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("Template table not found: {0}")]
    TemplateNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves the tenant store of an identity, creating it on first use
#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn resolve_or_provision(&self, identity: &str) -> Result<String, ProvisionError>;
}

/// Copies a template table into a fresh per-user table and records the
/// mapping in a tenants table.
pub struct TemplateProvisioner {
    store: Arc<dyn RecordStore>,
    tenants_table: String,
    template_table: String,
    // serializes provisioning so concurrent first logins create one table
    provisioning: Mutex<()>,
}

impl TemplateProvisioner {
    pub fn new(store: Arc<dyn RecordStore>, tenants_table: impl Into<String>, template_table: impl Into<String>) -> Self {
        Self {
            store,
            tenants_table: tenants_table.into(),
            template_table: template_table.into(),
            provisioning: Mutex::new(()),
        }
    }

    /// Hash identity to a stable table name
    pub fn tenant_table_name(identity: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(normalize_str(identity).as_bytes());
        let hash_str = format!("{:x}", hasher.finalize());
        format!("tenant_{}", &hash_str[..16])
    }

    async fn lookup(&self, identity: &str) -> Result<Option<String>, StoreError> {
        let wanted = normalize_str(identity);
        let table = match self.store.read_table(&self.tenants_table).await {
            Ok(t) => t,
            Err(StoreError::TableNotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(table
            .rows
            .iter()
            .find(|r| normalize_text(r.get(columns::EMAIL).unwrap_or(&Value::Null)) == wanted)
            .map(|r| cell_text(r.get(columns::TABLE).unwrap_or(&Value::Null)))
            .filter(|t| !t.is_empty()))
    }

    async fn copy_template(&self, target: &str) -> Result<(), ProvisionError> {
        let template = match self.store.read_table(&self.template_table).await {
            Ok(t) => t,
            Err(StoreError::TableNotFound(_)) => {
                return Err(ProvisionError::TemplateNotFound(self.template_table.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        self.store.create_table(target, &template.headers, &template.rows).await?;
        info!("Provisioned {} from template {}", target, self.template_table);
        Ok(())
    }

    async fn record_mapping(&self, identity: &str, table: &str) -> Result<(), StoreError> {
        if !self.store.table_exists(&self.tenants_table).await? {
            let headers = vec![columns::EMAIL.to_string(), columns::TABLE.to_string()];
            self.store.create_table(&self.tenants_table, &headers, &[]).await?;
        }
        let mut row = Row::new();
        row.insert(columns::EMAIL.into(), Value::String(normalize_str(identity)));
        row.insert(columns::TABLE.into(), Value::String(table.to_string()));
        self.store.append_row(&self.tenants_table, &row).await
    }
}

#[async_trait]
impl Provisioner for TemplateProvisioner {
    async fn resolve_or_provision(&self, identity: &str) -> Result<String, ProvisionError> {
        if let Some(table) = self.lookup(identity).await? {
            if self.store.table_exists(&table).await? {
                return Ok(table);
            }
        }

        let _guard = self.provisioning.lock().await;

        // another login may have finished provisioning while we waited
        let mapped = self.lookup(identity).await?;
        let table = mapped.clone().unwrap_or_else(|| Self::tenant_table_name(identity));

        if !self.store.table_exists(&table).await? {
            self.copy_template(&table).await?;
        }
        if mapped.is_none() {
            self.record_mapping(identity, &table).await?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{columns as tx_columns, default_headers};
    use crate::store::{MemoryRecordStore, Table};
    use serde_json::json;

    async fn store_with_template() -> Arc<MemoryRecordStore> {
        let store = Arc::new(MemoryRecordStore::new());
        let mut template = Table::new(default_headers());
        template.rows.push(Row::from_iter([(tx_columns::DESCRIPTION.to_string(), json!("Exemplo"))]));
        store.insert_table("template_lancamentos", template).await;
        store
    }

    #[test]
    fn table_name_is_stable_and_normalized() {
        let a = TemplateProvisioner::tenant_table_name("Ana@Example.com");
        let b = TemplateProvisioner::tenant_table_name(" ana@example.com");
        assert_eq!(a, b);
        assert!(a.starts_with("tenant_"));
        assert_eq!(a.len(), "tenant_".len() + 16);
    }

    #[tokio::test]
    async fn provisions_once_then_resolves() {
        let store = store_with_template().await;
        let p = TemplateProvisioner::new(store.clone(), "tenants", "template_lancamentos");

        let first = p.resolve_or_provision("ana@example.com").await.unwrap();
        let second = p.resolve_or_provision("ANA@example.com").await.unwrap();
        assert_eq!(first, second);

        let copied = store.read_table(&first).await.unwrap();
        assert_eq!(copied.headers, default_headers());
        assert_eq!(copied.rows.len(), 1);
        assert_eq!(store.row_count("tenants").await, Some(1));
    }

    #[tokio::test]
    async fn uses_existing_mapping() {
        let store = store_with_template().await;
        store.insert_table("legacy_table", Table::new(default_headers())).await;
        let mut tenants = Table::new(vec![columns::EMAIL.into(), columns::TABLE.into()]);
        tenants.rows.push(Row::from_iter([
            (columns::EMAIL.to_string(), json!("bia@example.com")),
            (columns::TABLE.to_string(), json!("legacy_table")),
        ]));
        store.insert_table("tenants", tenants).await;

        let p = TemplateProvisioner::new(store.clone(), "tenants", "template_lancamentos");
        assert_eq!(p.resolve_or_provision("bia@example.com").await.unwrap(), "legacy_table");
        assert_eq!(store.row_count("tenants").await, Some(1));
    }

    #[tokio::test]
    async fn missing_template_is_reported() {
        let p = TemplateProvisioner::new(Arc::new(MemoryRecordStore::new()), "tenants", "nope");
        assert!(matches!(
            p.resolve_or_provision("ana@example.com").await,
            Err(ProvisionError::TemplateNotFound(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_first_logins_create_one_table() {
        let store = store_with_template().await;
        let p = Arc::new(TemplateProvisioner::new(store.clone(), "tenants", "template_lancamentos"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let p = p.clone();
                tokio::spawn(async move { p.resolve_or_provision("carla@example.com").await.unwrap() })
            })
            .collect();
        let mut names = Vec::new();
        for h in handles {
            names.push(h.await.unwrap());
        }
        names.dedup();
        assert_eq!(names.len(), 1);
        assert_eq!(store.row_count("tenants").await, Some(1));
    }
}
