use std::sync::Arc;
use std::time::Duration;

use crate::cache::{MemoryCache, ResultCache};
use crate::config::{AppConfig, AppInfoConfig, StoreBackend};
use crate::services::{LedgerService, PageLimits, TableRegistry, TemplateProvisioner, TenantLocks};
use crate::session::{MemorySessionStore, SessionManager};
use crate::store::RecordStore;

/// Shared handles for request handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub ledger: Arc<LedgerService>,
    pub info: Arc<AppInfoConfig>,
    pub backend: StoreBackend,
}

impl AppState {
    /// Wire the in-process cache and session tables over `store`.
    pub fn build(cfg: &AppConfig, store: Arc<dyn RecordStore>) -> Self {
        let registry = TableRegistry::new(
            store.clone(),
            cfg.store.users_table.clone(),
            cfg.store.licenses_table.clone(),
        );
        let provisioner = TemplateProvisioner::new(
            store.clone(),
            cfg.store.tenants_table.clone(),
            cfg.store.template_table.clone(),
        );
        let sessions = SessionManager::new(
            Arc::new(registry),
            Arc::new(provisioner),
            Arc::new(MemorySessionStore::new()),
            Duration::from_secs(cfg.session.lifetime_minutes * 60),
            cfg.session.jwt_secret.clone(),
        );

        let cache = ResultCache::new(
            Arc::new(MemoryCache::new(cfg.cache.max_payload_bytes)),
            Duration::from_secs(cfg.cache.ttl_secs),
            cfg.cache.enabled,
        );
        let ledger = LedgerService::new(
            store,
            cache,
            TenantLocks::new(Duration::from_secs(cfg.mutation.lock_timeout_secs)),
            PageLimits {
                default_size: cfg.query.default_page_size,
                max_size: cfg.query.max_page_size,
            },
            cfg.cache.invalidate_on_write,
        );

        Self {
            sessions: Arc::new(sessions),
            ledger: Arc::new(ledger),
            info: Arc::new(cfg.app.clone()),
            backend: cfg.store.backend,
        }
    }
}
