use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{conform_row, RecordStore, Row, StoreError, Table};

/// In-process table store. Backs the `memory` backend and the test suites.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table directly, replacing any existing one.
    pub async fn insert_table(&self, name: impl Into<String>, table: Table) {
        self.tables.write().await.insert(name.into(), table);
    }

    pub async fn row_count(&self, name: &str) -> Option<usize> {
        self.tables.read().await.get(name).map(|t| t.rows.len())
    }
}

fn check_index(table: &str, rows: usize, index: usize) -> Result<usize, StoreError> {
    if index == 0 || index > rows {
        return Err(StoreError::RowOutOfRange { table: table.to_string(), index });
    }
    Ok(index - 1)
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn read_table(&self, table: &str) -> Result<Table, StoreError> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    async fn write_row(&self, table: &str, index: usize, row: &Row) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let pos = check_index(table, t.rows.len(), index)?;
        t.rows[pos] = t.conform(row);
        Ok(())
    }

    async fn append_row(&self, table: &str, row: &Row) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let conformed = t.conform(row);
        t.rows.push(conformed);
        Ok(())
    }

    async fn delete_row(&self, table: &str, index: usize) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let pos = check_index(table, t.rows.len(), index)?;
        t.rows.remove(pos);
        Ok(())
    }

    async fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
        Ok(self.tables.read().await.contains_key(table))
    }

    async fn create_table(&self, table: &str, headers: &[String], rows: &[Row]) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.contains_key(table) {
            return Err(StoreError::TableExists(table.to_string()));
        }
        let new_table = Table {
            headers: headers.to_vec(),
            rows: rows.iter().map(|r| conform_row(headers, r)).collect(),
        };
        tables.insert(table.to_string(), new_table);
        Ok(())
    }
}
