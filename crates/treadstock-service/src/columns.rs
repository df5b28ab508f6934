//! # Price Column Registry & Derivation Engine
//!
//! Create/update/delete for price columns, plus the recompute that keeps
//! derived columns consistent with their base.
//!
//! ## Delete Guard Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  delete_column(id, transfer_to_code?)                                  │
//! │                                                                         │
//! │  1. guard_protected_column        the `lista` column is undeletable    │
//! │  2. guard_not_base_of_derived     deleting a base would orphan its     │
//! │                                   derived columns (no transfer helps)  │
//! │  3. transfer_price_level_refs     levels pointing at the column must   │
//! │                                   be rewired to a caller-supplied      │
//! │                                   existing target first                │
//! │                                                                         │
//! │  The steps run in this exact order; the first failure wins.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::{debug, info};

use treadstock_core::{
    validation::{validate_column_code, validate_name, validate_visual_order},
    PriceColumn, PriceColumnCreate, PriceColumnMode, PriceColumnUpdate, PriceLevelFilter,
    PriceOperation, TireFilter, TirePrice, LIST_PRICE_CODE,
};

use crate::catalog::{normalized_base_code, CatalogService};
use crate::error::{ServiceError, ServiceResult};

/// Page size for the zero-price backfill of new fixed columns.
const BACKFILL_PAGE_SIZE: i64 = 200;

/// Parsed derivation settings shared by create and update validation.
struct DerivationConfig {
    base_code: Option<String>,
    operation: Option<PriceOperation>,
    amount: Option<f64>,
}

impl CatalogService {
    // =========================================================================
    // Registry Reads
    // =========================================================================

    /// Lists all price columns in visual order.
    pub async fn list_columns(&self) -> ServiceResult<Vec<PriceColumn>> {
        Ok(self.db.price_columns().list().await?)
    }

    /// Gets one price column by id.
    pub async fn get_column(&self, id: i64) -> ServiceResult<PriceColumn> {
        if id <= 0 {
            return Err(ServiceError::validation("a column id is required"));
        }
        self.db
            .price_columns()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("PriceColumn", id))
    }

    // =========================================================================
    // Registry Writes
    // =========================================================================

    /// Registers a new price column.
    ///
    /// Fixed columns are backfilled with a zero price row per existing tire
    /// (paginated); derived columns are recomputed immediately from their
    /// base column.
    pub async fn create_column(&self, cmd: PriceColumnCreate) -> ServiceResult<PriceColumn> {
        let code = validate_column_code("code", &cmd.code)?;
        validate_name("name", &cmd.name)?;
        validate_visual_order(cmd.visual_order)?;

        if self.db.price_columns().get_by_code(&code).await?.is_some() {
            return Err(ServiceError::conflict(format!(
                "a price column with code '{code}' already exists"
            )));
        }

        let mode = PriceColumnMode::parse(&cmd.mode)?;
        let derivation = self
            .validate_derivation(mode, &cmd.base_code, &cmd.operation, cmd.amount)
            .await?;

        let now = Utc::now();
        let column = PriceColumn {
            id: 0,
            code,
            name: cmd.name.trim().to_string(),
            description: cmd.description.trim().to_string(),
            visual_order: cmd.visual_order,
            active: cmd.active,
            is_public: cmd.is_public,
            mode,
            base_code: derivation.base_code,
            operation: derivation.operation,
            amount: derivation.amount,
            created_at: now,
            updated_at: now,
        };

        let created = self.db.price_columns().insert(&column).await?;
        info!(code = %created.code, mode = ?created.mode, "Price column created");

        // Initialize prices for the new column
        if created.is_derived() {
            self.recalculate_derived_column(&created).await?;
        } else {
            self.backfill_zero_prices(&created).await?;
        }

        Ok(created)
    }

    /// Updates an existing price column (the code is immutable).
    ///
    /// Derived columns are recomputed afterwards so configuration changes
    /// (base, operation, amount) take effect across every priced tire.
    pub async fn update_column(
        &self,
        id: i64,
        cmd: PriceColumnUpdate,
    ) -> ServiceResult<PriceColumn> {
        if id <= 0 {
            return Err(ServiceError::validation("a column id is required"));
        }

        let mut column = self
            .db
            .price_columns()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("PriceColumn", id))?;

        validate_name("name", &cmd.name)?;
        validate_visual_order(cmd.visual_order)?;

        let mode = PriceColumnMode::parse(&cmd.mode)?;
        let derivation = self
            .validate_derivation(mode, &cmd.base_code, &cmd.operation, cmd.amount)
            .await?;

        column.name = cmd.name.trim().to_string();
        column.description = cmd.description.trim().to_string();
        column.visual_order = cmd.visual_order;
        column.active = cmd.active;
        column.is_public = cmd.is_public;
        column.mode = mode;
        column.base_code = derivation.base_code;
        column.operation = derivation.operation;
        column.amount = derivation.amount;

        self.db.price_columns().update(&column).await?;
        info!(code = %column.code, mode = ?column.mode, "Price column updated");

        if column.is_derived() {
            self.recalculate_derived_column(&column).await?;
        }

        Ok(column)
    }

    /// Deletes a price column after the ordered guard pipeline passes.
    pub async fn delete_column(
        &self,
        id: i64,
        transfer_to_code: Option<&str>,
    ) -> ServiceResult<()> {
        if id <= 0 {
            return Err(ServiceError::validation("a column id is required"));
        }

        let column = self
            .db
            .price_columns()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("PriceColumn", id))?;

        guard_protected_column(&column)?;
        self.guard_not_base_of_derived(&column).await?;
        self.transfer_price_level_references(&column, transfer_to_code)
            .await?;

        self.db.price_columns().delete(id).await?;
        info!(code = %column.code, "Price column deleted");
        Ok(())
    }

    // =========================================================================
    // Derivation Engine
    // =========================================================================

    /// Recomputes every tire's price for a derived column from the base
    /// column's current values.
    ///
    /// Reads ALL price rows of the base column, applies the configured
    /// operation, and writes the results in one bulk upsert. A base column
    /// with zero priced tires is a no-op, not an error. Only one level of a
    /// derivation chain is resolved per call.
    pub async fn recalculate_derived_column(&self, column: &PriceColumn) -> ServiceResult<()> {
        if !column.is_derived() {
            return Err(ServiceError::validation(
                "recalculation requires a derived column",
            ));
        }

        let base_code = normalized_base_code(column).ok_or_else(|| {
            ServiceError::validation("derivation configuration incomplete: base column is required")
        })?;
        let amount = column.amount.ok_or_else(|| {
            ServiceError::validation("derivation configuration incomplete: amount is required")
        })?;

        let base_column = self
            .db
            .price_columns()
            .get_by_code(&base_code)
            .await?
            .ok_or_else(|| {
                ServiceError::validation(format!("base column '{base_code}' does not exist"))
            })?;

        let base_prices = self.db.prices().list_by_column_id(base_column.id).await?;
        if base_prices.is_empty() {
            return Ok(());
        }

        let operation = column.operation.unwrap_or_default();
        let now = Utc::now();

        let derived: Vec<TirePrice> = base_prices
            .iter()
            .map(|base| TirePrice {
                tire_id: base.tire_id.clone(),
                column_id: column.id,
                price: operation.apply(base.price, amount),
                created_at: now,
                updated_at: now,
            })
            .collect();

        debug!(
            code = %column.code,
            base = %base_code,
            rows = derived.len(),
            "Recomputed derived column"
        );

        Ok(self.db.prices().upsert_many(&derived).await?)
    }

    /// Seeds a zero price row for every existing tire, in pages, so a new
    /// fixed column shows up everywhere without unbounded memory use.
    async fn backfill_zero_prices(&self, column: &PriceColumn) -> ServiceResult<()> {
        let now = Utc::now();
        let mut offset = 0;

        loop {
            let (tires, total) = self
                .db
                .tires()
                .list(&TireFilter::page(BACKFILL_PAGE_SIZE, offset))
                .await?;
            if tires.is_empty() {
                break;
            }

            let prices: Vec<TirePrice> = tires
                .iter()
                .map(|tire| TirePrice {
                    tire_id: tire.id.clone(),
                    column_id: column.id,
                    price: 0.0,
                    created_at: now,
                    updated_at: now,
                })
                .collect();

            self.db.prices().upsert_many(&prices).await?;

            offset += tires.len() as i64;
            if offset >= total {
                break;
            }
        }

        Ok(())
    }

    // =========================================================================
    // Validation Helpers
    // =========================================================================

    /// Validates the derivation settings of a create/update command.
    ///
    /// Fixed columns carry no derivation fields; derived columns need a
    /// pattern-valid base code referencing an existing column, one of the
    /// four operations (defaulting to percent) and an amount.
    async fn validate_derivation(
        &self,
        mode: PriceColumnMode,
        base_code: &str,
        operation: &str,
        amount: Option<f64>,
    ) -> ServiceResult<DerivationConfig> {
        if mode != PriceColumnMode::Derived {
            return Ok(DerivationConfig {
                base_code: None,
                operation: None,
                amount: None,
            });
        }

        let base_code = validate_column_code("base_code", base_code)?;
        let operation = PriceOperation::parse(operation)?;
        let amount = amount.ok_or_else(|| {
            ServiceError::validation("amount is required for derived columns")
        })?;

        if self
            .db
            .price_columns()
            .get_by_code(&base_code)
            .await?
            .is_none()
        {
            return Err(ServiceError::validation(format!(
                "base column '{base_code}' does not exist"
            )));
        }

        Ok(DerivationConfig {
            base_code: Some(base_code),
            operation: Some(operation),
            amount: Some(amount),
        })
    }

    /// Guard 2: a column referenced as another derived column's base cannot
    /// be deleted, no matter what transfer target is supplied.
    async fn guard_not_base_of_derived(&self, column: &PriceColumn) -> ServiceResult<()> {
        let columns = self.db.price_columns().list().await?;
        for other in &columns {
            if other.id == column.id || !other.is_derived() {
                continue;
            }
            if normalized_base_code(other).as_deref() == Some(column.code.as_str()) {
                return Err(ServiceError::validation(format!(
                    "column '{}' is the base of derived column '{}' and cannot be deleted",
                    column.code, other.code
                )));
            }
        }
        Ok(())
    }

    /// Guard 3: price levels referencing the column (as main or reference)
    /// must be rewired to a different, existing column before deletion.
    async fn transfer_price_level_references(
        &self,
        column: &PriceColumn,
        transfer_to_code: Option<&str>,
    ) -> ServiceResult<()> {
        let filter = PriceLevelFilter {
            code: None,
            limit: 500,
            offset: 0,
        };
        let (levels, _) = self.db.price_levels().list(&filter).await?;

        let code = column.code.to_lowercase();
        let affected: Vec<_> = levels
            .into_iter()
            .filter(|level| {
                let main_matches = level.price_column.trim().to_lowercase() == code;
                let ref_matches = level
                    .reference_column
                    .as_deref()
                    .map(str::trim)
                    .map(str::to_lowercase)
                    == Some(code.clone());
                main_matches || ref_matches
            })
            .collect();

        if affected.is_empty() {
            return Ok(());
        }

        let dest_code = transfer_to_code
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                ServiceError::validation(format!(
                    "price levels reference column '{}'; supply a transfer target column",
                    column.code
                ))
            })?;

        if dest_code == code {
            return Err(ServiceError::validation(
                "the transfer target must differ from the column being deleted",
            ));
        }

        if self
            .db
            .price_columns()
            .get_by_code(&dest_code)
            .await?
            .is_none()
        {
            return Err(ServiceError::validation(format!(
                "transfer target column '{dest_code}' does not exist"
            )));
        }

        for mut level in affected {
            if level.price_column.trim().to_lowercase() == code {
                level.price_column = dest_code.clone();
            }
            if level
                .reference_column
                .as_deref()
                .map(str::trim)
                .map(str::to_lowercase)
                == Some(code.clone())
            {
                level.reference_column = Some(dest_code.clone());
            }
            self.db.price_levels().update(&level).await?;
        }

        Ok(())
    }
}

/// Guard 1: the list price column anchors the model and is undeletable.
fn guard_protected_column(column: &PriceColumn) -> Result<(), ServiceError> {
    if column.code.trim().to_lowercase() == LIST_PRICE_CODE {
        return Err(ServiceError::validation(
            "the list price column cannot be deleted",
        ));
    }
    Ok(())
}
