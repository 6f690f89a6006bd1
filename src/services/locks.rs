use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-tenant exclusive locks with a bounded wait. The guard releases the
/// lock when dropped.
pub struct TenantLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
#[error("Timed out after {waited:?} waiting for the lock on {tenant}")]
pub struct LockTimeout {
    pub tenant: String,
    pub waited: Duration,
}

impl TenantLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub async fn acquire(&self, tenant: &str) -> Result<OwnedMutexGuard<()>, LockTimeout> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(tenant.to_string()).or_default().clone()
        };

        tokio::time::timeout(self.timeout, lock.lock_owned())
            .await
            .map_err(|_| LockTimeout {
                tenant: tenant.to_string(),
                waited: self.timeout,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn second_holder_times_out() {
        let locks = TenantLocks::new(Duration::from_secs(20));
        let _held = locks.acquire("tenant_a").await.unwrap();

        let err = locks.acquire("tenant_a").await.unwrap_err();
        assert_eq!(err.tenant, "tenant_a");
        assert_eq!(err.waited, Duration::from_secs(20));
    }

    #[tokio::test]
    async fn tenants_do_not_block_each_other() {
        let locks = TenantLocks::new(Duration::from_millis(50));
        let _a = locks.acquire("tenant_a").await.unwrap();
        assert!(locks.acquire("tenant_b").await.is_ok());
    }

    #[tokio::test]
    async fn dropping_the_guard_releases() {
        let locks = TenantLocks::new(Duration::from_millis(50));
        drop(locks.acquire("tenant_a").await.unwrap());
        assert!(locks.acquire("tenant_a").await.is_ok());
    }
}
