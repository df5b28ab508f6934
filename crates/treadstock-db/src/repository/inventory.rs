//! # Inventory Repository
//!
//! The inventory ledger: per-tire stock with reserve / release / confirm
//! operations driven by the order lifecycle.
//!
//! ## Ledger Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Stock Movement per Operation                        │
//! │                                                                         │
//! │  reserve_stock (order created)                                         │
//! │     quantity := MAX(0, quantity - N)     reserved := reserved + N      │
//! │                                                                         │
//! │  release_stock (order cancelled)                                       │
//! │     quantity := quantity + N             reserved := MAX(0, res - N)   │
//! │                                                                         │
//! │  confirm_sale (order delivered)                                        │
//! │     quantity unchanged (already taken)   reserved := MAX(0, res - N)   │
//! │                                                                         │
//! │  Each operation is ONE UPDATE statement: SQLite applies it atomically, │
//! │  which is the per-tire serialization point for concurrent orders on    │
//! │  the same SKU.                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbResult;
use treadstock_core::Inventory;

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Inserts or replaces the stock record for a tire.
    pub async fn upsert(&self, inventory: &Inventory) -> DbResult<()> {
        debug!(tire_id = %inventory.tire_id, quantity = inventory.quantity, "Upserting inventory");

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO inventory (id, tire_id, quantity, reserved, min_stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(tire_id) DO UPDATE SET
                quantity = excluded.quantity,
                reserved = excluded.reserved,
                min_stock = excluded.min_stock,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&inventory.id)
        .bind(&inventory.tire_id)
        .bind(inventory.quantity)
        .bind(inventory.reserved)
        .bind(inventory.min_stock)
        .bind(inventory.created_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets the stock record for a tire, if one exists.
    pub async fn get_by_tire_id(&self, tire_id: &str) -> DbResult<Option<Inventory>> {
        let inventory = sqlx::query_as::<_, Inventory>(
            r#"
            SELECT id, tire_id, quantity, reserved, min_stock, created_at, updated_at
            FROM inventory
            WHERE tire_id = ?1
            "#,
        )
        .bind(tire_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inventory)
    }

    /// Reserves stock when an order is created: moves N units from
    /// `quantity` into `reserved` in one atomic statement.
    pub async fn reserve_stock(&self, sku: &str, quantity: i64) -> DbResult<()> {
        debug!(sku = %sku, quantity = quantity, "Reserving stock");

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = MAX(0, quantity - ?2),
                reserved = reserved + ?2,
                updated_at = ?3
            WHERE tire_id = (SELECT id FROM tires WHERE sku = ?1)
            "#,
        )
        .bind(sku.trim())
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!(sku = %sku, quantity = quantity, "reserve_stock matched no inventory row");
        }

        Ok(())
    }

    /// Returns reserved stock when an order is cancelled.
    pub async fn release_stock(&self, sku: &str, quantity: i64) -> DbResult<()> {
        debug!(sku = %sku, quantity = quantity, "Releasing stock");

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = quantity + ?2,
                reserved = MAX(0, reserved - ?2),
                updated_at = ?3
            WHERE tire_id = (SELECT id FROM tires WHERE sku = ?1)
            "#,
        )
        .bind(sku.trim())
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!(sku = %sku, quantity = quantity, "release_stock matched no inventory row");
        }

        Ok(())
    }

    /// Clears the reservation when an order is delivered. `quantity` stays
    /// untouched: it was already decremented at reservation time.
    pub async fn confirm_sale(&self, sku: &str, quantity: i64) -> DbResult<()> {
        debug!(sku = %sku, quantity = quantity, "Confirming sale");

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET reserved = MAX(0, reserved - ?2),
                updated_at = ?3
            WHERE tire_id = (SELECT id FROM tires WHERE sku = ?1)
            "#,
        )
        .bind(sku.trim())
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!(sku = %sku, quantity = quantity, "confirm_sale matched no inventory row");
        }

        Ok(())
    }
}
