//! # Price Column Repository
//!
//! Persistence for the price column registry. The registry is small (a
//! handful of rows) and read on most catalog paths, so every query is a
//! straight table scan ordered by visual position.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use treadstock_core::PriceColumn;

/// Repository for price column database operations.
#[derive(Debug, Clone)]
pub struct PriceColumnRepository {
    pool: SqlitePool,
}

const COLUMN_COLUMNS: &str = "id, code, name, description, visual_order, active, is_public, \
     mode, base_code, operation, amount, created_at, updated_at";

impl PriceColumnRepository {
    /// Creates a new PriceColumnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PriceColumnRepository { pool }
    }

    /// Gets a column by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<PriceColumn>> {
        let column = sqlx::query_as::<_, PriceColumn>(&format!(
            "SELECT {COLUMN_COLUMNS} FROM price_columns WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(column)
    }

    /// Gets a column by code (codes are stored lowercase).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<PriceColumn>> {
        let column = sqlx::query_as::<_, PriceColumn>(&format!(
            "SELECT {COLUMN_COLUMNS} FROM price_columns WHERE code = ?1"
        ))
        .bind(code.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(column)
    }

    /// Lists all columns in visual order.
    pub async fn list(&self) -> DbResult<Vec<PriceColumn>> {
        let columns = sqlx::query_as::<_, PriceColumn>(&format!(
            "SELECT {COLUMN_COLUMNS} FROM price_columns ORDER BY visual_order ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(columns)
    }

    /// Inserts a new column and returns it with the generated id.
    pub async fn insert(&self, column: &PriceColumn) -> DbResult<PriceColumn> {
        debug!(code = %column.code, mode = ?column.mode, "Inserting price column");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO price_columns (
                code, name, description, visual_order, active, is_public,
                mode, base_code, operation, amount, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&column.code)
        .bind(&column.name)
        .bind(&column.description)
        .bind(column.visual_order)
        .bind(column.active)
        .bind(column.is_public)
        .bind(column.mode)
        .bind(&column.base_code)
        .bind(column.operation)
        .bind(column.amount)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let mut created = column.clone();
        created.id = result.last_insert_rowid();
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    /// Updates an existing column (the code is immutable).
    pub async fn update(&self, column: &PriceColumn) -> DbResult<()> {
        debug!(id = column.id, code = %column.code, "Updating price column");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE price_columns SET
                name = ?2,
                description = ?3,
                visual_order = ?4,
                active = ?5,
                is_public = ?6,
                mode = ?7,
                base_code = ?8,
                operation = ?9,
                amount = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(column.id)
        .bind(&column.name)
        .bind(&column.description)
        .bind(column.visual_order)
        .bind(column.active)
        .bind(column.is_public)
        .bind(column.mode)
        .bind(&column.base_code)
        .bind(column.operation)
        .bind(column.amount)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PriceColumn", column.id));
        }

        Ok(())
    }

    /// Deletes a column. Its tire price rows cascade at the schema level.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deleting price column");

        let result = sqlx::query("DELETE FROM price_columns WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PriceColumn", id));
        }

        Ok(())
    }
}
