//! # Price Level Repository
//!
//! Persistence for customer price levels. Levels are rewritten by the
//! column-delete transfer step, so `update` must accept code changes of the
//! referenced columns without further checks - the service validates.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use treadstock_core::{PriceLevel, PriceLevelFilter};

/// Repository for price level database operations.
#[derive(Debug, Clone)]
pub struct PriceLevelRepository {
    pool: SqlitePool,
}

const LEVEL_COLUMNS: &str = "id, code, name, description, discount_percentage, price_column, \
     reference_column, can_view_offers, created_at, updated_at";

impl PriceLevelRepository {
    /// Creates a new PriceLevelRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PriceLevelRepository { pool }
    }

    /// Gets a level by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<PriceLevel>> {
        let level = sqlx::query_as::<_, PriceLevel>(&format!(
            "SELECT {LEVEL_COLUMNS} FROM price_levels WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(level)
    }

    /// Gets a level by code (codes are stored lowercase).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<PriceLevel>> {
        let level = sqlx::query_as::<_, PriceLevel>(&format!(
            "SELECT {LEVEL_COLUMNS} FROM price_levels WHERE code = ?1"
        ))
        .bind(code.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(level)
    }

    /// Lists levels matching the filter, returning the page and total count.
    pub async fn list(&self, filter: &PriceLevelFilter) -> DbResult<(Vec<PriceLevel>, i64)> {
        let code = filter
            .code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_lowercase);

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM price_levels");
        if let Some(code) = &code {
            count_qb.push(" WHERE code = ");
            count_qb.push_bind(code.clone());
        }
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let limit = if filter.limit > 0 { filter.limit } else { 100 };
        let offset = filter.offset.max(0);

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {LEVEL_COLUMNS} FROM price_levels"));
        if let Some(code) = &code {
            qb.push(" WHERE code = ");
            qb.push_bind(code.clone());
        }
        qb.push(" ORDER BY code ASC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let levels = qb
            .build_query_as::<PriceLevel>()
            .fetch_all(&self.pool)
            .await?;

        Ok((levels, total))
    }

    /// Inserts a new level and returns it with the generated id.
    pub async fn insert(&self, level: &PriceLevel) -> DbResult<PriceLevel> {
        debug!(code = %level.code, "Inserting price level");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO price_levels (
                code, name, description, discount_percentage,
                price_column, reference_column, can_view_offers,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&level.code)
        .bind(&level.name)
        .bind(&level.description)
        .bind(level.discount_percentage)
        .bind(&level.price_column)
        .bind(&level.reference_column)
        .bind(level.can_view_offers)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let mut created = level.clone();
        created.id = result.last_insert_rowid();
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    /// Updates an existing level.
    pub async fn update(&self, level: &PriceLevel) -> DbResult<()> {
        debug!(id = level.id, code = %level.code, "Updating price level");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE price_levels SET
                code = ?2,
                name = ?3,
                description = ?4,
                discount_percentage = ?5,
                price_column = ?6,
                reference_column = ?7,
                can_view_offers = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(level.id)
        .bind(&level.code)
        .bind(&level.name)
        .bind(&level.description)
        .bind(level.discount_percentage)
        .bind(&level.price_column)
        .bind(&level.reference_column)
        .bind(level.can_view_offers)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PriceLevel", level.id));
        }

        Ok(())
    }

    /// Deletes a level.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM price_levels WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PriceLevel", id));
        }

        Ok(())
    }
}
