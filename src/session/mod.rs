//! Login, session resolution and logout.
//!
//! A session is honoured only while both its JWT validates and the
//! server-side record keyed by that token is still live.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::auth::{generate_jwt, validate_jwt, Claims, JwtError};
use crate::normalize::normalize_str;
use crate::services::provisioning::{ProvisionError, Provisioner};
use crate::services::registry::{is_active_license, UserRegistry};
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub identity: String,
    pub tenant_ref: String,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, token: &str, record: SessionRecord, ttl: Duration);

    /// Live record for `token`, if any
    async fn get(&self, token: &str) -> Option<SessionRecord>;

    async fn remove(&self, token: &str);
}

struct SessionEntry {
    record: SessionRecord,
    expires_at: Instant,
}

/// In-process session table with fixed (non-sliding) expiry
#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, SessionEntry>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, token: &str, record: SessionRecord, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(token.to_string(), SessionEntry { record, expires_at: now + ttl });
    }

    async fn get(&self, token: &str) -> Option<SessionRecord> {
        let entries = self.entries.read().await;
        entries
            .get(token)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.record.clone())
    }

    async fn remove(&self, token: &str) {
        self.entries.write().await.remove(token);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid email or password")]
    Auth,
    #[error("License is not active")]
    License,
    #[error("Session expired or invalid")]
    Expired,
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Token(#[from] JwtError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub token: String,
    pub identity: String,
    pub tenant_ref: String,
}

/// Identity attached to an authenticated request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub identity: String,
    pub tenant_ref: String,
}

pub struct SessionManager {
    registry: Arc<dyn UserRegistry>,
    provisioner: Arc<dyn Provisioner>,
    store: Arc<dyn SessionStore>,
    lifetime: Duration,
    secret: String,
}

impl SessionManager {
    pub fn new(
        registry: Arc<dyn UserRegistry>,
        provisioner: Arc<dyn Provisioner>,
        store: Arc<dyn SessionStore>,
        lifetime: Duration,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            provisioner,
            store,
            lifetime,
            secret: secret.into(),
        }
    }

    pub async fn login(&self, identity: &str, secret: &str) -> Result<LoginResult, SessionError> {
        if identity.trim().is_empty() || secret.is_empty() {
            return Err(SessionError::Validation("Email and password are required".to_string()));
        }
        let identity = normalize_str(identity);

        let user = self.registry.find_user(&identity).await?.ok_or(SessionError::Auth)?;
        if !user.verify(secret) {
            debug!("Rejected login for {}: bad secret", identity);
            return Err(SessionError::Auth);
        }

        match self.registry.license_status(&identity).await? {
            Some(status) if is_active_license(&status) => {}
            _ => return Err(SessionError::License),
        }

        let tenant_ref = self.provisioner.resolve_or_provision(&identity).await?;

        let issued_at = Utc::now();
        let expires_at = issued_at
            + chrono::Duration::from_std(self.lifetime).unwrap_or_else(|_| chrono::Duration::minutes(120));
        let claims = Claims::new(identity.clone(), tenant_ref.clone(), issued_at, expires_at);
        let token = generate_jwt(&claims, &self.secret)?;

        self.store
            .insert(
                &token,
                SessionRecord { identity: identity.clone(), tenant_ref: tenant_ref.clone() },
                self.lifetime,
            )
            .await;

        info!("Login for {} on {}", identity, tenant_ref);
        Ok(LoginResult { token, identity, tenant_ref })
    }

    pub async fn resolve_session(&self, token: &str) -> Result<AuthSession, SessionError> {
        let claims = validate_jwt(token, &self.secret).map_err(|_| SessionError::Expired)?;
        let record = self.store.get(token).await.ok_or(SessionError::Expired)?;

        // forged claims cannot point a live record at another tenant
        if record.identity != claims.sub || record.tenant_ref != claims.tenant {
            return Err(SessionError::Expired);
        }

        Ok(AuthSession { identity: record.identity, tenant_ref: record.tenant_ref })
    }

    pub async fn logout(&self, token: &str) {
        self.store.remove(token).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::registry::UserRecord;

    struct FixedRegistry;

    #[async_trait]
    impl UserRegistry for FixedRegistry {
        async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
            Ok(match email {
                "ana@example.com" | "bia@example.com" => {
                    Some(UserRecord { email: email.to_string(), secret: "s3nha".to_string() })
                }
                _ => None,
            })
        }

        async fn license_status(&self, email: &str) -> Result<Option<String>, StoreError> {
            Ok(match email {
                "ana@example.com" => Some("ativo".to_string()),
                "bia@example.com" => Some("inativo".to_string()),
                _ => None,
            })
        }
    }

    struct EchoProvisioner;

    #[async_trait]
    impl Provisioner for EchoProvisioner {
        async fn resolve_or_provision(&self, identity: &str) -> Result<String, ProvisionError> {
            Ok(format!("tenant_{}", identity.len()))
        }
    }

    fn manager(lifetime: Duration) -> SessionManager {
        SessionManager::new(
            Arc::new(FixedRegistry),
            Arc::new(EchoProvisioner),
            Arc::new(MemorySessionStore::new()),
            lifetime,
            "test-secret",
        )
    }

    #[tokio::test]
    async fn login_then_resolve() {
        let m = manager(Duration::from_secs(7200));
        let login = m.login(" Ana@Example.com", "s3nha").await.unwrap();
        assert_eq!(login.identity, "ana@example.com");

        let session = m.resolve_session(&login.token).await.unwrap();
        assert_eq!(session.identity, "ana@example.com");
        assert_eq!(session.tenant_ref, login.tenant_ref);
    }

    #[tokio::test]
    async fn login_failures() {
        let m = manager(Duration::from_secs(60));
        assert!(matches!(m.login("", "x").await, Err(SessionError::Validation(_))));
        assert!(matches!(m.login("ana@example.com", "").await, Err(SessionError::Validation(_))));
        assert!(matches!(m.login("ana@example.com", "wrong").await, Err(SessionError::Auth)));
        assert!(matches!(m.login("zed@example.com", "s3nha").await, Err(SessionError::Auth)));
        assert!(matches!(m.login("bia@example.com", "s3nha").await, Err(SessionError::License)));
    }

    #[tokio::test]
    async fn unknown_and_forged_tokens_are_expired() {
        let m = manager(Duration::from_secs(60));
        assert!(matches!(m.resolve_session("garbage").await, Err(SessionError::Expired)));

        // valid signature but never stored server-side
        let now = Utc::now();
        let claims = Claims::new("ana@example.com".into(), "tenant_x".into(), now, now + chrono::Duration::minutes(5));
        let token = generate_jwt(&claims, "test-secret").unwrap();
        assert!(matches!(m.resolve_session(&token).await, Err(SessionError::Expired)));
    }

    #[tokio::test]
    async fn logout_ends_the_session() {
        let m = manager(Duration::from_secs(60));
        let login = m.login("ana@example.com", "s3nha").await.unwrap();
        m.logout(&login.token).await;
        assert!(matches!(m.resolve_session(&login.token).await, Err(SessionError::Expired)));
    }

    #[tokio::test(start_paused = true)]
    async fn session_records_expire() {
        let store = MemorySessionStore::new();
        let record = SessionRecord { identity: "a".into(), tenant_ref: "t".into() };
        store.insert("tok", record.clone(), Duration::from_secs(120)).await;
        assert_eq!(store.get("tok").await, Some(record));

        tokio::time::advance(Duration::from_secs(121)).await;
        assert_eq!(store.get("tok").await, None);
    }
}
