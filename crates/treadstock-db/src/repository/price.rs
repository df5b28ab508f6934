//! # Tire Price Repository
//!
//! The price store: one value per (tire, column) pair, written exclusively
//! through bulk upserts.
//!
//! ## Why Upsert-Only Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Derivation recomputes and admin edits both land here. With            │
//! │  INSERT .. ON CONFLICT(tire_id, column_id) DO UPDATE, concurrent       │
//! │  recomputations of DIFFERENT columns never deadlock; two recomputes    │
//! │  of the SAME column are last-writer-wins, which is safe because a      │
//! │  derived column is a pure function of its base column's current state. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use treadstock_core::TirePrice;

/// Repository for tire price database operations.
#[derive(Debug, Clone)]
pub struct PriceRepository {
    pool: SqlitePool,
}

impl PriceRepository {
    /// Creates a new PriceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PriceRepository { pool }
    }

    /// Bulk insert-or-update, keyed on (tire_id, column_id).
    ///
    /// An empty batch is a no-op. Pages from callers stay well under
    /// SQLite's bind-variable limit (5 binds per row).
    pub async fn upsert_many(&self, prices: &[TirePrice]) -> DbResult<()> {
        if prices.is_empty() {
            return Ok(());
        }

        debug!(rows = prices.len(), "Upserting tire prices");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO tire_prices (tire_id, column_id, price, created_at, updated_at) ",
        );

        qb.push_values(prices.iter(), |mut b, p| {
            b.push_bind(&p.tire_id);
            b.push_bind(p.column_id);
            b.push_bind(p.price);
            b.push_bind(p.created_at);
            b.push_bind(p.updated_at);
        });

        qb.push(
            " ON CONFLICT(tire_id, column_id) DO UPDATE SET \
             price = excluded.price, updated_at = excluded.updated_at",
        );

        qb.build().execute(&self.pool).await?;

        Ok(())
    }

    /// Lists all price rows for one tire.
    pub async fn list_by_tire_id(&self, tire_id: &str) -> DbResult<Vec<TirePrice>> {
        let prices = sqlx::query_as::<_, TirePrice>(
            r#"
            SELECT tire_id, column_id, price, created_at, updated_at
            FROM tire_prices
            WHERE tire_id = ?1
            "#,
        )
        .bind(tire_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(prices)
    }

    /// Lists all price rows for one column (one row per priced tire).
    ///
    /// This is the derivation engine's read path: the full base column.
    pub async fn list_by_column_id(&self, column_id: i64) -> DbResult<Vec<TirePrice>> {
        let prices = sqlx::query_as::<_, TirePrice>(
            r#"
            SELECT tire_id, column_id, price, created_at, updated_at
            FROM tire_prices
            WHERE column_id = ?1
            "#,
        )
        .bind(column_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(prices)
    }
}
