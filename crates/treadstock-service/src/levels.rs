//! # Price Level Service
//!
//! CRUD over customer price levels. Levels bind a tier code to the price
//! column a customer sees (and an optional reference column for "was/now"
//! display); the catalog projection resolves them at read time and falls
//! back to the static tier map when a code is unknown.
//!
//! Assigning users to levels belongs to the user-management subsystem and
//! is handled outside this service.

use tracing::info;

use treadstock_core::{
    validation::validate_name, PriceLevel, PriceLevelFilter, ValidationError,
};
use treadstock_db::Database;

use crate::error::{ServiceError, ServiceResult};

/// Application service for price levels.
#[derive(Debug, Clone)]
pub struct PriceLevelService {
    db: Database,
}

impl PriceLevelService {
    /// Creates a new PriceLevelService.
    pub fn new(db: Database) -> Self {
        PriceLevelService { db }
    }

    /// Registers a new price level.
    pub async fn create(&self, mut level: PriceLevel) -> ServiceResult<PriceLevel> {
        level.code = level.code.trim().to_lowercase();
        validate_level(&level)?;

        if self
            .db
            .price_levels()
            .get_by_code(&level.code)
            .await?
            .is_some()
        {
            return Err(ServiceError::conflict(format!(
                "a price level with code '{}' already exists",
                level.code
            )));
        }

        let created = self.db.price_levels().insert(&level).await?;
        info!(code = %created.code, column = %created.price_column, "Price level created");
        Ok(created)
    }

    /// Gets a level by id.
    pub async fn get_by_id(&self, id: i64) -> ServiceResult<PriceLevel> {
        if id <= 0 {
            return Err(ServiceError::validation("a level id is required"));
        }
        self.db
            .price_levels()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("PriceLevel", id))
    }

    /// Gets a level by code.
    pub async fn get_by_code(&self, code: &str) -> ServiceResult<PriceLevel> {
        let code = code.trim().to_lowercase();
        if code.is_empty() {
            return Err(ServiceError::validation("a level code is required"));
        }
        self.db
            .price_levels()
            .get_by_code(&code)
            .await?
            .ok_or_else(|| ServiceError::not_found("PriceLevel", code))
    }

    /// Lists levels matching the filter.
    pub async fn list(&self, filter: &PriceLevelFilter) -> ServiceResult<(Vec<PriceLevel>, i64)> {
        Ok(self.db.price_levels().list(filter).await?)
    }

    /// Updates an existing level. Code changes must not collide with
    /// another level.
    pub async fn update(&self, id: i64, mut level: PriceLevel) -> ServiceResult<PriceLevel> {
        if id <= 0 {
            return Err(ServiceError::validation("a level id is required"));
        }

        level.code = level.code.trim().to_lowercase();
        validate_level(&level)?;

        let existing = self
            .db
            .price_levels()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("PriceLevel", id))?;

        if level.code != existing.code {
            if let Some(other) = self.db.price_levels().get_by_code(&level.code).await? {
                if other.id != id {
                    return Err(ServiceError::conflict(format!(
                        "a price level with code '{}' already exists",
                        level.code
                    )));
                }
            }
        }

        level.id = id;
        level.created_at = existing.created_at;
        self.db.price_levels().update(&level).await?;
        Ok(level)
    }

    /// Deletes a level.
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if id <= 0 {
            return Err(ServiceError::validation("a level id is required"));
        }

        let level = self
            .db
            .price_levels()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("PriceLevel", id))?;

        self.db.price_levels().delete(id).await?;
        info!(code = %level.code, "Price level deleted");
        Ok(())
    }
}

fn validate_level(level: &PriceLevel) -> Result<(), ServiceError> {
    if level.code.is_empty() {
        return Err(ValidationError::required("code").into());
    }
    validate_name("name", &level.name)?;
    if level.price_column.trim().is_empty() {
        return Err(ValidationError::required("price_column").into());
    }
    Ok(())
}
