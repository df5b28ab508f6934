//! # Normalized Type Repository
//!
//! Lookup table of normalized tire types (Pasajero, Light Truck Radial, ...),
//! grown lazily as imports and admin upserts encounter new names.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::DbResult;
use treadstock_core::NormalizedType;

/// Repository for normalized tire types.
#[derive(Debug, Clone)]
pub struct NormalizedTypeRepository {
    pool: SqlitePool,
}

impl NormalizedTypeRepository {
    /// Creates a new NormalizedTypeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NormalizedTypeRepository { pool }
    }

    /// Gets a type by exact name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<NormalizedType>> {
        let entity = sqlx::query_as::<_, NormalizedType>(
            "SELECT id, name, description, created_at, updated_at FROM normalized_types WHERE name = ?1",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity)
    }

    /// Creates a new type.
    pub async fn create(&self, name: &str, description: &str) -> DbResult<NormalizedType> {
        let now = Utc::now();
        let name = name.trim();

        let result = sqlx::query(
            "INSERT INTO normalized_types (name, description, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(name)
        .bind(description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(NormalizedType {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Lists all types ordered by name.
    pub async fn list(&self) -> DbResult<Vec<NormalizedType>> {
        let types = sqlx::query_as::<_, NormalizedType>(
            "SELECT id, name, description, created_at, updated_at FROM normalized_types ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(types)
    }
}
