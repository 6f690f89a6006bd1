use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Row as _};
use tracing::info;

use super::{conform_row, is_valid_table_name, RecordStore, Row, StoreError, Table};
use crate::database::manager::DatabaseManager;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS record_tables (
        name TEXT PRIMARY KEY,
        headers JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS record_rows (
        table_name TEXT NOT NULL REFERENCES record_tables(name) ON DELETE CASCADE,
        row_index INTEGER NOT NULL,
        data JSONB NOT NULL,
        PRIMARY KEY (table_name, row_index)
    )
    "#,
];

/// Postgres-backed table store. Each logical table is a header list in
/// `record_tables` plus JSONB rows in `record_rows`, ordered by `row_index`.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect through the pool manager and make sure the schema exists.
    pub async fn connect() -> Result<Self, StoreError> {
        let pool = DatabaseManager::main_pool().await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for stmt in SCHEMA {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        info!("Record store schema ready");
        Ok(())
    }

    async fn headers(&self, table: &str) -> Result<Vec<String>, StoreError> {
        validate(table)?;
        let row = sqlx::query("SELECT headers FROM record_tables WHERE name = $1")
            .bind(table)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        let Json(headers): Json<Vec<String>> = row.try_get("headers")?;
        Ok(headers)
    }
}

fn validate(table: &str) -> Result<(), StoreError> {
    if is_valid_table_name(table) {
        Ok(())
    } else {
        Err(StoreError::InvalidTableName(table.to_string()))
    }
}

fn to_db_index(table: &str, index: usize) -> Result<i32, StoreError> {
    if index == 0 {
        return Err(StoreError::RowOutOfRange { table: table.to_string(), index });
    }
    i32::try_from(index).map_err(|_| StoreError::RowOutOfRange { table: table.to_string(), index })
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn read_table(&self, table: &str) -> Result<Table, StoreError> {
        let headers = self.headers(table).await?;

        let rows = sqlx::query("SELECT data FROM record_rows WHERE table_name = $1 ORDER BY row_index")
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            let Json(data): Json<Row> = r.try_get("data").map_err(|e| StoreError::Corrupt {
                table: table.to_string(),
                message: e.to_string(),
            })?;
            out.push(data);
        }

        Ok(Table { headers, rows: out })
    }

    async fn write_row(&self, table: &str, index: usize, row: &Row) -> Result<(), StoreError> {
        let headers = self.headers(table).await?;
        let db_index = to_db_index(table, index)?;

        let result = sqlx::query("UPDATE record_rows SET data = $3 WHERE table_name = $1 AND row_index = $2")
            .bind(table)
            .bind(db_index)
            .bind(Json(conform_row(&headers, row)))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowOutOfRange { table: table.to_string(), index });
        }
        Ok(())
    }

    async fn append_row(&self, table: &str, row: &Row) -> Result<(), StoreError> {
        let headers = self.headers(table).await?;

        sqlx::query(
            r#"
            INSERT INTO record_rows (table_name, row_index, data)
            SELECT $1, COALESCE(MAX(row_index), 0) + 1, $2
            FROM record_rows
            WHERE table_name = $1
            "#,
        )
        .bind(table)
        .bind(Json(conform_row(&headers, row)))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_row(&self, table: &str, index: usize) -> Result<(), StoreError> {
        validate(table)?;
        let db_index = to_db_index(table, index)?;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM record_rows WHERE table_name = $1 AND row_index = $2")
            .bind(table)
            .bind(db_index)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::RowOutOfRange { table: table.to_string(), index });
        }

        // Shift through negative indexes so the primary key never collides mid-update
        sqlx::query(
            "UPDATE record_rows SET row_index = -(row_index - 1) WHERE table_name = $1 AND row_index > $2",
        )
        .bind(table)
        .bind(db_index)
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE record_rows SET row_index = -row_index WHERE table_name = $1 AND row_index < 0")
            .bind(table)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
        validate(table)?;
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM record_tables WHERE name = $1")
            .bind(table)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    async fn create_table(&self, table: &str, headers: &[String], rows: &[Row]) -> Result<(), StoreError> {
        validate(table)?;
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query("INSERT INTO record_tables (name, headers) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
            .bind(table)
            .bind(Json(headers.to_vec()))
            .execute(&mut *tx)
            .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::TableExists(table.to_string()));
        }

        for (i, row) in rows.iter().enumerate() {
            let db_index = to_db_index(table, i + 1)?;
            sqlx::query("INSERT INTO record_rows (table_name, row_index, data) VALUES ($1, $2, $3)")
                .bind(table)
                .bind(db_index)
                .bind(Json(conform_row(headers, row)))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!("Created table {} with {} rows", table, rows.len());
        Ok(())
    }
}
