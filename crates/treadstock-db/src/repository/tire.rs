//! # Tire Repository
//!
//! Database operations for the tire catalog.
//!
//! ## Filtering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     How Tire Listing Works                              │
//! │                                                                         │
//! │  TireFilter { search, brand_id, width, ..., in_stock_only, sort }      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  push_filters() appends AND-combined WHERE clauses with bound args     │
//! │       │                                                                 │
//! │       ├── COUNT(*) query → total for pagination                        │
//! │       └── SELECT query + ORDER BY (closed sort enum) + LIMIT/OFFSET    │
//! │                                                                         │
//! │  The sort column is resolved from TireSortField, never from raw       │
//! │  request strings, so no caller-controlled SQL ever reaches ORDER BY.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use treadstock_core::{Tire, TireFilter, TireSortField, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Repository for tire database operations.
#[derive(Debug, Clone)]
pub struct TireRepository {
    pool: SqlitePool,
}

const TIRE_COLUMNS: &str = "t.id, t.sku, t.brand_id, t.model, t.width, t.profile, t.rim, \
     t.construction, t.tube_type, t.ply_rating, t.load_index, t.speed_index, \
     t.normalized_type_id, t.usage_abbr, t.description, t.public_price, t.image_url, \
     t.original_size, t.created_at, t.updated_at";

impl TireRepository {
    /// Creates a new TireRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TireRepository { pool }
    }

    /// Gets a tire by SKU (case-insensitive, the column collates NOCASE).
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Tire>> {
        let sku = sku.trim();

        let tire = sqlx::query_as::<_, Tire>(&format!(
            "SELECT {TIRE_COLUMNS} FROM tires t WHERE t.sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tire)
    }

    /// Gets a tire by its UUID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Tire>> {
        let tire = sqlx::query_as::<_, Tire>(&format!(
            "SELECT {TIRE_COLUMNS} FROM tires t WHERE t.id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tire)
    }

    /// Inserts a new tire.
    pub async fn insert(&self, tire: &Tire) -> DbResult<()> {
        debug!(sku = %tire.sku, "Inserting tire");

        sqlx::query(
            r#"
            INSERT INTO tires (
                id, sku, brand_id, model, width, profile, rim,
                construction, tube_type, ply_rating, load_index, speed_index,
                normalized_type_id, usage_abbr, description, public_price,
                image_url, original_size, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20
            )
            "#,
        )
        .bind(&tire.id)
        .bind(&tire.sku)
        .bind(tire.brand_id)
        .bind(&tire.model)
        .bind(tire.width)
        .bind(tire.profile)
        .bind(tire.rim)
        .bind(&tire.construction)
        .bind(&tire.tube_type)
        .bind(&tire.ply_rating)
        .bind(&tire.load_index)
        .bind(&tire.speed_index)
        .bind(tire.normalized_type_id)
        .bind(&tire.usage_abbr)
        .bind(&tire.description)
        .bind(tire.public_price)
        .bind(&tire.image_url)
        .bind(&tire.original_size)
        .bind(tire.created_at)
        .bind(tire.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing tire.
    pub async fn update(&self, tire: &Tire) -> DbResult<()> {
        debug!(id = %tire.id, sku = %tire.sku, "Updating tire");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE tires SET
                sku = ?2,
                brand_id = ?3,
                model = ?4,
                width = ?5,
                profile = ?6,
                rim = ?7,
                construction = ?8,
                tube_type = ?9,
                ply_rating = ?10,
                load_index = ?11,
                speed_index = ?12,
                normalized_type_id = ?13,
                usage_abbr = ?14,
                description = ?15,
                public_price = ?16,
                image_url = ?17,
                original_size = ?18,
                updated_at = ?19
            WHERE id = ?1
            "#,
        )
        .bind(&tire.id)
        .bind(&tire.sku)
        .bind(tire.brand_id)
        .bind(&tire.model)
        .bind(tire.width)
        .bind(tire.profile)
        .bind(tire.rim)
        .bind(&tire.construction)
        .bind(&tire.tube_type)
        .bind(&tire.ply_rating)
        .bind(&tire.load_index)
        .bind(&tire.speed_index)
        .bind(tire.normalized_type_id)
        .bind(&tire.usage_abbr)
        .bind(&tire.description)
        .bind(tire.public_price)
        .bind(&tire.image_url)
        .bind(&tire.original_size)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Tire", &tire.id));
        }

        Ok(())
    }

    /// Deletes a tire by SKU. The inventory row intentionally survives.
    pub async fn delete(&self, sku: &str) -> DbResult<()> {
        debug!(sku = %sku, "Deleting tire");

        let result = sqlx::query("DELETE FROM tires WHERE sku = ?1")
            .bind(sku.trim())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Tire", sku));
        }

        Ok(())
    }

    /// Lists tires matching the filter, returning the page and total count.
    pub async fn list(&self, filter: &TireFilter) -> DbResult<(Vec<Tire>, i64)> {
        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM tires t");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let limit = match filter.limit {
            n if n <= 0 => DEFAULT_PAGE_SIZE,
            n if n > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
            n => n,
        };
        let offset = filter.offset.max(0);

        let sort = filter.sort.unwrap_or_default();

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {TIRE_COLUMNS} FROM tires t"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY ");
        qb.push(sort_column(sort.field));
        qb.push(if sort.descending { " DESC" } else { " ASC" });
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let items = qb.build_query_as::<Tire>().fetch_all(&self.pool).await?;

        debug!(count = items.len(), total = total, "Listed tires");
        Ok((items, total))
    }
}

/// Maps a sort field to its SQL column. The enum is closed, so this match is
/// the complete mapping table.
fn sort_column(field: TireSortField) -> &'static str {
    match field {
        TireSortField::Sku => "t.sku",
        TireSortField::Model => "t.model",
        TireSortField::Price => "t.public_price",
        TireSortField::CreatedAt => "t.created_at",
    }
}

/// Appends the filter's WHERE clauses to a query builder.
///
/// Shared between the COUNT and the page SELECT so both always see the same
/// predicate.
fn push_filters(qb: &mut QueryBuilder<Sqlite>, filter: &TireFilter) {
    let mut sep = Separator::new();

    if let Some(search) = filter.search.as_deref() {
        let search = search.trim();
        if !search.is_empty() {
            let like = format!("%{}%", search.to_lowercase());
            sep.push(qb);
            qb.push("(LOWER(t.sku) LIKE ");
            qb.push_bind(like.clone());
            qb.push(" OR LOWER(t.model) LIKE ");
            qb.push_bind(like.clone());
            qb.push(" OR LOWER(t.description) LIKE ");
            qb.push_bind(like);
            qb.push(")");
        }
    }

    if let Some(brand_id) = filter.brand_id {
        sep.push(qb);
        qb.push("t.brand_id = ");
        qb.push_bind(brand_id);
    }

    if let Some(type_id) = filter.type_id {
        sep.push(qb);
        qb.push("t.normalized_type_id = ");
        qb.push_bind(type_id);
    }

    if let Some(abbr) = trimmed_upper(filter.usage_abbr.as_deref()) {
        sep.push(qb);
        qb.push("t.usage_abbr = ");
        qb.push_bind(abbr);
    }

    if let Some(width) = filter.width {
        sep.push(qb);
        qb.push("t.width = ");
        qb.push_bind(width);
    }

    if let Some(profile) = filter.profile {
        sep.push(qb);
        qb.push("t.profile = ");
        qb.push_bind(profile);
    }

    if let Some(rim) = filter.rim {
        sep.push(qb);
        qb.push("t.rim = ");
        qb.push_bind(rim);
    }

    if let Some(construction) = trimmed_upper(filter.construction.as_deref()) {
        sep.push(qb);
        qb.push("UPPER(TRIM(t.construction)) = ");
        qb.push_bind(construction);
    }

    if let Some(ply) = trimmed_upper(filter.ply_rating.as_deref()) {
        sep.push(qb);
        qb.push("UPPER(TRIM(t.ply_rating)) = ");
        qb.push_bind(ply);
    }

    if let Some(load) = trimmed_upper(filter.load_index.as_deref()) {
        sep.push(qb);
        qb.push("UPPER(TRIM(t.load_index)) = ");
        qb.push_bind(load);
    }

    if let Some(speed) = trimmed_upper(filter.speed_index.as_deref()) {
        sep.push(qb);
        qb.push("UPPER(TRIM(t.speed_index)) = ");
        qb.push_bind(speed);
    }

    if filter.in_stock_only {
        sep.push(qb);
        qb.push(
            "EXISTS (SELECT 1 FROM inventory inv WHERE inv.tire_id = t.id AND inv.quantity > 0)",
        );
    }
}

fn trimmed_upper(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(|v| v.to_uppercase())
}

/// Emits ` WHERE ` before the first clause and ` AND ` before the rest.
struct Separator {
    first: bool,
}

impl Separator {
    fn new() -> Self {
        Separator { first: true }
    }

    fn push(&mut self, qb: &mut QueryBuilder<Sqlite>) {
        if self.first {
            qb.push(" WHERE ");
            self.first = false;
        } else {
            qb.push(" AND ");
        }
    }
}
