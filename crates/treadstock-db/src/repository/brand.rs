//! # Brand Repository
//!
//! Brands and their importer aliases. Aliases resolve shorthand tokens from
//! supplier price lists (`BS` → Bridgestone) to a canonical brand row.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use treadstock_core::Brand;

/// Repository for brand database operations.
#[derive(Debug, Clone)]
pub struct BrandRepository {
    pool: SqlitePool,
}

impl BrandRepository {
    /// Creates a new BrandRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BrandRepository { pool }
    }

    /// Gets a brand by exact name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Brand>> {
        let brand = sqlx::query_as::<_, Brand>(
            "SELECT id, name, created_at, updated_at FROM brands WHERE name = ?1",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(brand)
    }

    /// Gets a brand by one of its aliases (aliases are stored uppercase).
    pub async fn get_by_alias(&self, alias: &str) -> DbResult<Option<Brand>> {
        let brand = sqlx::query_as::<_, Brand>(
            r#"
            SELECT b.id, b.name, b.created_at, b.updated_at
            FROM brands b
            INNER JOIN brand_aliases a ON a.brand_id = b.id
            WHERE a.alias = ?1
            "#,
        )
        .bind(alias.trim().to_uppercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(brand)
    }

    /// Gets a brand by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Brand>> {
        let brand = sqlx::query_as::<_, Brand>(
            "SELECT id, name, created_at, updated_at FROM brands WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(brand)
    }

    /// Creates a brand together with its aliases, in one transaction.
    ///
    /// Duplicate aliases are ignored so importer retries don't fail on
    /// half-registered brands.
    pub async fn create(&self, name: &str, aliases: &[String]) -> DbResult<Brand> {
        let name = name.trim();
        debug!(name = %name, aliases = aliases.len(), "Creating brand");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO brands (name, created_at, updated_at) VALUES (?1, ?2, ?3)",
        )
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let brand_id = result.last_insert_rowid();

        for alias in aliases {
            let alias = alias.trim().to_uppercase();
            if alias.is_empty() {
                continue;
            }
            sqlx::query(
                "INSERT OR IGNORE INTO brand_aliases (brand_id, alias, created_at) VALUES (?1, ?2, ?3)",
            )
            .bind(brand_id)
            .bind(alias)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Brand {
            id: brand_id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Lists all brands ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Brand>> {
        let brands = sqlx::query_as::<_, Brand>(
            "SELECT id, name, created_at, updated_at FROM brands ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(brands)
    }

    /// Lists the aliases of one brand.
    pub async fn list_aliases(&self, brand_id: i64) -> DbResult<Vec<String>> {
        let aliases: Vec<String> = sqlx::query_scalar(
            "SELECT alias FROM brand_aliases WHERE brand_id = ?1 ORDER BY alias",
        )
        .bind(brand_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(aliases)
    }

    /// Whether any tire references this brand.
    pub async fn has_tires(&self, brand_id: i64) -> DbResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tires WHERE brand_id = ?1")
                .bind(brand_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Deletes a brand (aliases cascade). Refused while tires reference it.
    pub async fn delete(&self, brand_id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM brands WHERE id = ?1")
            .bind(brand_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Brand", brand_id));
        }

        Ok(())
    }
}
