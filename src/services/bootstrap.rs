use serde_json::Value;
use tracing::info;

use crate::config::StoreConfig;
use crate::ledger::default_headers;
use crate::normalize::normalize_str;
use crate::store::{RecordStore, Row, StoreError};

use super::provisioning::columns as tenant_columns;
use super::registry::{columns, hash_secret};

/// Initial account created at startup when the store has none for it
#[derive(Debug, Clone)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
}

impl SeedUser {
    /// Read `SEED_USER_EMAIL` / `SEED_USER_PASSWORD`; both must be set.
    pub fn from_env() -> Option<Self> {
        let email = std::env::var("SEED_USER_EMAIL").ok().filter(|s| !s.trim().is_empty())?;
        let password = std::env::var("SEED_USER_PASSWORD").ok().filter(|s| !s.is_empty())?;
        Some(Self { email, password })
    }
}

async fn ensure_table(store: &dyn RecordStore, name: &str, headers: Vec<String>) -> Result<bool, StoreError> {
    if store.table_exists(name).await? {
        return Ok(false);
    }
    store.create_table(name, &headers, &[]).await?;
    info!("Created table {}", name);
    Ok(true)
}

/// Make sure the registry, tenant-mapping and template tables exist, then
/// register `seed` with an active license if it is not yet known.
pub async fn bootstrap(store: &dyn RecordStore, cfg: &StoreConfig, seed: Option<&SeedUser>) -> Result<(), StoreError> {
    ensure_table(store, &cfg.users_table, vec![columns::EMAIL.into(), columns::PASSWORD.into()]).await?;
    ensure_table(store, &cfg.licenses_table, vec![columns::EMAIL.into(), columns::STATUS.into()]).await?;
    ensure_table(
        store,
        &cfg.tenants_table,
        vec![tenant_columns::EMAIL.into(), tenant_columns::TABLE.into()],
    )
    .await?;
    ensure_table(store, &cfg.template_table, default_headers()).await?;

    let Some(seed) = seed else {
        return Ok(());
    };

    let email = normalize_str(&seed.email);
    let users = store.read_table(&cfg.users_table).await?;
    let known = users
        .rows
        .iter()
        .any(|r| r.get(columns::EMAIL).and_then(Value::as_str).map(normalize_str).as_deref() == Some(email.as_str()));
    if known {
        return Ok(());
    }

    let user = Row::from_iter([
        (columns::EMAIL.to_string(), Value::String(email.clone())),
        (columns::PASSWORD.to_string(), Value::String(hash_secret(&seed.password))),
    ]);
    let license = Row::from_iter([
        (columns::EMAIL.to_string(), Value::String(email.clone())),
        (columns::STATUS.to_string(), Value::String("ativo".to_string())),
    ]);
    store.append_row(&cfg.users_table, &user).await?;
    store.append_row(&cfg.licenses_table, &license).await?;
    info!("Seeded user {}", email);
    Ok(())
}
