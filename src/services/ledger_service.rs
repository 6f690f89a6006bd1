use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::cache::{cache_key, CacheOp, ResultCache};
use crate::filter::{filter_and_sort, paginate_with_limits, FilterSpec, Page};
use crate::ledger::{filter_options, FilterOptions, Transaction, TransactionInput};
use crate::metrics::{aggregate, MetricsResult};
use crate::store::{RecordStore, Row, StoreError, Table};

use super::locks::{LockTimeout, TenantLocks};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    LockTimeout(#[from] LockTimeout),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a mutation. A missing record is reported here, not raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl MutationResult {
    fn ok() -> Self {
        Self { ok: true, msg: None }
    }

    fn not_found(key: &str) -> Self {
        Self {
            ok: false,
            msg: Some(format!("Transaction not found: {}", key)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_size: usize,
    pub max_size: usize,
}

/// Reads, aggregates and mutates one tenant's transaction table
pub struct LedgerService {
    store: Arc<dyn RecordStore>,
    cache: ResultCache,
    locks: TenantLocks,
    limits: PageLimits,
    invalidate_on_write: bool,
}

impl LedgerService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        cache: ResultCache,
        locks: TenantLocks,
        limits: PageLimits,
        invalidate_on_write: bool,
    ) -> Self {
        Self {
            store,
            cache,
            locks,
            limits,
            invalidate_on_write,
        }
    }

    async fn rows(&self, tenant_ref: &str) -> Result<Vec<Row>, LedgerError> {
        match self.store.read_table(tenant_ref).await {
            Ok(table) => Ok(table.rows),
            Err(e) => {
                error!("Failed to read {}: {}", tenant_ref, e);
                Err(e.into())
            }
        }
    }

    pub async fn list_transactions(&self, tenant_ref: &str, spec: &FilterSpec) -> Result<Page<Transaction>, LedgerError> {
        let key = cache_key(CacheOp::Query, tenant_ref, spec);
        if let Some(page) = self.cache.get_json(&key).await {
            return Ok(page);
        }
        debug!("Cache miss: {}", key);

        let rows = self.rows(tenant_ref).await?;
        let page = paginate_with_limits(
            filter_and_sort(&rows, spec),
            spec.page,
            spec.page_size,
            self.limits.default_size,
            self.limits.max_size,
        );
        self.cache.put_json(&key, &page).await;
        Ok(page)
    }

    pub async fn get_metrics(&self, tenant_ref: &str, spec: &FilterSpec) -> Result<MetricsResult, LedgerError> {
        let spec = spec.without_pagination();
        let key = cache_key(CacheOp::Metrics, tenant_ref, &spec);
        if let Some(metrics) = self.cache.get_json(&key).await {
            return Ok(metrics);
        }

        let rows = self.rows(tenant_ref).await?;
        let metrics = aggregate(&filter_and_sort(&rows, &spec));
        self.cache.put_json(&key, &metrics).await;
        Ok(metrics)
    }

    pub async fn get_filter_options(&self, tenant_ref: &str) -> Result<FilterOptions, LedgerError> {
        let key = cache_key(CacheOp::FilterOptions, tenant_ref, &FilterSpec::default());
        if let Some(options) = self.cache.get_json(&key).await {
            return Ok(options);
        }

        let rows = self.rows(tenant_ref).await?;
        let transactions: Vec<Transaction> = rows.iter().map(Transaction::from_row).collect();
        let options = filter_options(&transactions);
        self.cache.put_json(&key, &options).await;
        Ok(options)
    }

    /// Overwrite the first row sharing the input's identity key, or append.
    pub async fn upsert(&self, tenant_ref: &str, input: &TransactionInput) -> Result<MutationResult, LedgerError> {
        let _guard = self.lock(tenant_ref).await?;

        let table = self.store.read_table(tenant_ref).await?;
        let key = input.identity_key();
        let incoming = input.to_row();

        match find_by_key(&table, &key) {
            Some(index) => {
                let mut merged = table.rows[index - 1].clone();
                merged.extend(incoming);
                self.store.write_row(tenant_ref, index, &table.conform(&merged)).await?;
                info!("Updated row {} in {}", index, tenant_ref);
            }
            None => {
                self.store.append_row(tenant_ref, &table.conform(&incoming)).await?;
                info!("Appended row to {}", tenant_ref);
            }
        }

        self.after_write(tenant_ref).await;
        Ok(MutationResult::ok())
    }

    pub async fn delete(&self, tenant_ref: &str, key: &str) -> Result<MutationResult, LedgerError> {
        let _guard = self.lock(tenant_ref).await?;

        let table = self.store.read_table(tenant_ref).await?;
        let Some(index) = find_by_key(&table, key) else {
            return Ok(MutationResult::not_found(key));
        };

        self.store.delete_row(tenant_ref, index).await?;
        info!("Deleted row {} from {}", index, tenant_ref);

        self.after_write(tenant_ref).await;
        Ok(MutationResult::ok())
    }

    async fn lock(&self, tenant_ref: &str) -> Result<tokio::sync::OwnedMutexGuard<()>, LedgerError> {
        self.locks.acquire(tenant_ref).await.map_err(|e| {
            warn!("{}", e);
            e.into()
        })
    }

    async fn after_write(&self, tenant_ref: &str) {
        if self.invalidate_on_write {
            self.cache.invalidate_tenant(tenant_ref).await;
        }
    }
}

/// 1-based index of the first row whose identity key equals `key`
fn find_by_key(table: &Table, key: &str) -> Option<usize> {
    table
        .rows
        .iter()
        .position(|r| Transaction::from_row(r).key == key)
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::ledger::{columns, default_headers};
    use crate::store::MemoryRecordStore;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;
    use std::time::Duration;

    const TENANT: &str = "tenant_test";

    fn row(date: &str, desc: &str, value: &str, kind: &str, category: &str) -> Row {
        Row::from_iter([
            (columns::DATE.to_string(), json!(date)),
            (columns::DESCRIPTION.to_string(), json!(desc)),
            (columns::TOTAL_VALUE.to_string(), json!(value)),
            (columns::KIND.to_string(), json!(kind)),
            (columns::CATEGORY.to_string(), json!(category)),
        ])
    }

    fn input(date: &str, desc: &str, value: &str, category: &str) -> TransactionInput {
        TransactionInput {
            date: json!(date),
            description: json!(desc),
            total_value: json!(value),
            kind: json!("saida"),
            category: json!(category),
            installment: json!("sim"),
            status: json!("true"),
            ..Default::default()
        }
    }

    async fn service_with(rows: Vec<Row>, cache_enabled: bool, invalidate: bool) -> (LedgerService, Arc<MemoryRecordStore>) {
        let store = Arc::new(MemoryRecordStore::new());
        let mut table = Table::new(default_headers());
        table.rows = rows.iter().map(|r| table.conform(r)).collect();
        store.insert_table(TENANT, table).await;

        let cache = ResultCache::new(Arc::new(MemoryCache::new(1 << 20)), Duration::from_secs(30), cache_enabled);
        let service = LedgerService::new(
            store.clone(),
            cache,
            TenantLocks::new(Duration::from_millis(100)),
            PageLimits { default_size: 200, max_size: 1000 },
            invalidate,
        );
        (service, store)
    }

    #[tokio::test]
    async fn upsert_overwrites_matching_key_in_place() {
        let (svc, store) = service_with(
            vec![
                row("01/01/2024", "Aluguel", "1500,00", "saida", "Moradia"),
                row("02/01/2024", "Mercado", "200", "saida", "Alimentação"),
            ],
            false,
            false,
        )
        .await;

        let res = svc.upsert(TENANT, &input("01/01/2024", "Aluguel", "1.500,00", "Casa")).await.unwrap();
        assert_eq!(res, MutationResult { ok: true, msg: None });

        let t = store.read_table(TENANT).await.unwrap();
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0][columns::CATEGORY], json!("Casa"));
        assert_eq!(t.rows[0][columns::INSTALLMENT], json!("Sim"));
        assert_eq!(t.rows[0][columns::STATUS], json!(true));
        assert_eq!(t.rows[0][columns::TOTAL_VALUE], json!("1500"));
        assert_eq!(t.rows[1][columns::DESCRIPTION], json!("Mercado"));
    }

    #[tokio::test]
    async fn upsert_appends_new_key_with_all_columns() {
        let (svc, store) = service_with(vec![row("01/01/2024", "Aluguel", "1500", "saida", "Moradia")], false, false).await;

        svc.upsert(TENANT, &input("05/01/2024", "Farmácia", "42,90", "Saúde")).await.unwrap();

        let t = store.read_table(TENANT).await.unwrap();
        assert_eq!(t.rows.len(), 2);
        let added = &t.rows[1];
        assert_eq!(added.len(), default_headers().len());
        assert_eq!(added[columns::NOTES], json!(""));
        assert_eq!(Transaction::from_row(added).value, Decimal::from_str("42.90").unwrap());
    }

    #[tokio::test]
    async fn repeated_upsert_of_large_amount_stays_one_row() {
        let (svc, store) = service_with(vec![], false, false).await;
        let big = input("01/01/2024", "X", "12345678901234567,89", "");

        svc.upsert(TENANT, &big).await.unwrap();
        svc.upsert(TENANT, &big).await.unwrap();
        assert_eq!(store.read_table(TENANT).await.unwrap().rows.len(), 1);

        let key = big.identity_key();
        assert_eq!(key, "01/01/2024|X|12345678901234567.89");
        assert!(svc.delete(TENANT, &key).await.unwrap().ok);
        assert!(store.read_table(TENANT).await.unwrap().rows.is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_key_leaves_table_alone() {
        let rows = vec![row("01/01/2024", "Aluguel", "1500", "saida", "Moradia")];
        let (svc, store) = service_with(rows, false, false).await;
        let before = store.read_table(TENANT).await.unwrap();

        let res = svc.delete(TENANT, "nope|nope|0").await.unwrap();
        assert!(!res.ok);
        assert!(res.msg.is_some());
        assert_eq!(store.read_table(TENANT).await.unwrap(), before);
    }

    #[tokio::test]
    async fn delete_removes_the_matching_row() {
        let rows = vec![
            row("01/01/2024", "Aluguel", "1500", "saida", "Moradia"),
            row("02/01/2024", "Mercado", "200", "saida", "Alimentação"),
        ];
        let (svc, store) = service_with(rows, false, false).await;
        let key = svc.list_transactions(TENANT, &FilterSpec::default()).await.unwrap().items[1].key.clone();

        assert!(svc.delete(TENANT, &key).await.unwrap().ok);
        let t = store.read_table(TENANT).await.unwrap();
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.rows[0][columns::DESCRIPTION], json!("Mercado"));
    }

    #[tokio::test]
    async fn mutations_time_out_while_locked() {
        let (svc, _) = service_with(vec![], false, false).await;
        let _held = svc.locks.acquire(TENANT).await.unwrap();

        let err = svc.upsert(TENANT, &input("01/01/2024", "x", "1", "")).await.unwrap_err();
        assert!(matches!(err, LedgerError::LockTimeout(_)));
        let err = svc.delete(TENANT, "k").await.unwrap_err();
        assert!(matches!(err, LedgerError::LockTimeout(_)));
    }

    #[tokio::test]
    async fn list_caps_page_size_and_reports_total() {
        let rows: Vec<Row> = (1..=1200).map(|i| row("01/01/2024", &i.to_string(), "1", "saida", "X")).collect();
        let (svc, _) = service_with(rows, false, false).await;

        let spec = FilterSpec { page_size: Some(5000), ..Default::default() };
        let page = svc.list_transactions(TENANT, &spec).await.unwrap();
        assert_eq!(page.page_size, 1000);
        assert_eq!(page.items.len(), 1000);
        assert_eq!(page.total, 1200);
    }

    #[tokio::test]
    async fn cached_reads_are_stale_until_invalidated() {
        let rows = vec![row("01/01/2024", "Aluguel", "1500", "saida", "Moradia")];

        let (svc, _) = service_with(rows.clone(), true, false).await;
        assert_eq!(svc.get_metrics(TENANT, &FilterSpec::default()).await.unwrap().sample, 1);
        svc.upsert(TENANT, &input("03/01/2024", "Luz", "90", "Moradia")).await.unwrap();
        assert_eq!(svc.get_metrics(TENANT, &FilterSpec::default()).await.unwrap().sample, 1);

        let (svc, _) = service_with(rows, true, true).await;
        assert_eq!(svc.get_metrics(TENANT, &FilterSpec::default()).await.unwrap().sample, 1);
        svc.upsert(TENANT, &input("03/01/2024", "Luz", "90", "Moradia")).await.unwrap();
        assert_eq!(svc.get_metrics(TENANT, &FilterSpec::default()).await.unwrap().sample, 2);
    }

    #[tokio::test]
    async fn filter_options_reflect_table() {
        let rows = vec![
            row("01/01/2024", "a", "1", "saida", "Moradia"),
            row("01/02/2023", "b", "1", "entrada", "Salário"),
        ];
        let (svc, _) = service_with(rows, true, false).await;
        let opts = svc.get_filter_options(TENANT).await.unwrap();
        assert_eq!(opts.years, vec![2024, 2023]);
        assert_eq!(opts.categories, vec!["Moradia".to_string(), "Salário".to_string()]);
    }

    #[tokio::test]
    async fn missing_tenant_table_is_a_store_error() {
        let (svc, _) = service_with(vec![], false, false).await;
        let err = svc.list_transactions("tenant_missing", &FilterSpec::default()).await.unwrap_err();
        assert!(matches!(err, LedgerError::Store(StoreError::TableNotFound(_))));
    }
}
