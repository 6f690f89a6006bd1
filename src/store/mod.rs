//! Record store adapter: ordered, header-keyed tables.
//!
//! Rows are addressed by 1-based index over the data rows (the header line is
//! not counted). Everything above this module works with typed records; the raw
//! header-keyed shape only exists here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

/// One table row keyed by header name
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: vec![] }
    }

    /// Project a row onto this table's headers, filling gaps with "".
    pub fn conform(&self, row: &Row) -> Row {
        conform_row(&self.headers, row)
    }
}

pub fn conform_row(headers: &[String], row: &Row) -> Row {
    headers
        .iter()
        .map(|h| {
            let v = row.get(h).cloned().unwrap_or(Value::Null);
            let v = if v.is_null() { Value::String(String::new()) } else { v };
            (h.clone(), v)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {0}")]
    TableExists(String),

    #[error("Row {index} out of range for table {table}")]
    RowOutOfRange { table: String, index: usize },

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Corrupt row data in {table}: {message}")]
    Corrupt { table: String, message: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn read_table(&self, table: &str) -> Result<Table, StoreError>;

    async fn write_row(&self, table: &str, index: usize, row: &Row) -> Result<(), StoreError>;

    async fn append_row(&self, table: &str, row: &Row) -> Result<(), StoreError>;

    async fn delete_row(&self, table: &str, index: usize) -> Result<(), StoreError>;

    async fn table_exists(&self, table: &str) -> Result<bool, StoreError>;

    /// Create `table` with the given headers and initial rows.
    async fn create_table(&self, table: &str, headers: &[String], rows: &[Row]) -> Result<(), StoreError>;
}

/// Table names end up in SQL identifiers for the Postgres backend.
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn conform_fills_missing_columns() {
        let headers = vec!["Data".to_string(), "Descrição".to_string(), "Observações".to_string()];
        let mut row = Row::new();
        row.insert("Data".into(), json!("01/01/2024"));
        row.insert("Extra".into(), json!("ignored"));
        row.insert("Observações".into(), Value::Null);

        let out = conform_row(&headers, &row);
        assert_eq!(out.len(), 3);
        assert_eq!(out["Data"], json!("01/01/2024"));
        assert_eq!(out["Descrição"], json!(""));
        assert_eq!(out["Observações"], json!(""));
        assert!(!out.contains_key("Extra"));
    }

    #[test]
    fn validates_table_names() {
        assert!(is_valid_table_name("tenant_0123abcd"));
        assert!(is_valid_table_name("users"));
        assert!(!is_valid_table_name("1users"));
        assert!(!is_valid_table_name("tenant-1"));
        assert!(!is_valid_table_name("x; DROP TABLE y"));
        assert!(!is_valid_table_name(""));
    }
}
