//! # Price Column Model
//!
//! The multi-tier price model: named price columns that are either `fixed`
//! (set independently per tire) or `derived` (computed from a base column
//! via a configured operation).
//!
//! ## Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Derived Columns Work                             │
//! │                                                                         │
//! │   lista (fixed)          mayoreo (fixed)       mayoreo_6 (derived)     │
//! │   ┌────────────┐         ┌────────────┐        base: mayoreo           │
//! │   │ T1: 2350.0 │         │ T1: 2100.0 │        op: percent, amount: 6  │
//! │   │ T2: 1890.0 │         │ T2: 1700.0 │        ┌────────────┐          │
//! │   └────────────┘         └─────┬──────┘        │ T1: 1974.0 │          │
//! │                                │               │ T2: 1598.0 │          │
//! │                                └──recompute──► └────────────┘          │
//! │                                                                         │
//! │  A recompute reads EVERY price row of the base column and bulk-upserts │
//! │  one derived row per priced tire. Chains (derived-of-derived) resolve  │
//! │  one level per trigger.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Percent Semantics
//! `percent` is a DISCOUNT, not a markup: `amount = 6` means 6% off the base
//! price (`base * (1 - 6/100)`). This sign convention is relied on by every
//! wholesale tier and must not change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Column Mode
// =============================================================================

/// How a price column gets its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PriceColumnMode {
    /// Prices are set independently per tire (admin edits, imports).
    Fixed,
    /// Prices are recomputed from a base column's current values.
    Derived,
}

impl Default for PriceColumnMode {
    fn default() -> Self {
        PriceColumnMode::Fixed
    }
}

impl PriceColumnMode {
    /// Parses a mode token from a command payload.
    ///
    /// Empty input falls back to `fixed`, anything else must match exactly.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw.trim().to_lowercase().as_str() {
            "" | "fixed" => Ok(PriceColumnMode::Fixed),
            "derived" => Ok(PriceColumnMode::Derived),
            _ => Err(ValidationError::NotAllowed {
                field: "mode".to_string(),
                allowed: vec!["fixed".to_string(), "derived".to_string()],
            }),
        }
    }
}

// =============================================================================
// Derivation Operation
// =============================================================================

/// Arithmetic applied to a base price to produce a derived price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PriceOperation {
    /// `base + amount`
    Add,
    /// `base - amount`
    Subtract,
    /// `base * amount`
    Multiply,
    /// `base * (1 - amount/100)`: amount is a discount percentage.
    Percent,
}

impl Default for PriceOperation {
    fn default() -> Self {
        PriceOperation::Percent
    }
}

impl PriceOperation {
    /// Applies the operation to a base price.
    ///
    /// No rounding is performed beyond f64's native precision: derived
    /// columns are display prices recomputed wholesale, never accumulated.
    #[inline]
    pub fn apply(self, base: f64, amount: f64) -> f64 {
        match self {
            PriceOperation::Add => base + amount,
            PriceOperation::Subtract => base - amount,
            PriceOperation::Multiply => base * amount,
            PriceOperation::Percent => base * (1.0 - amount / 100.0),
        }
    }

    /// Parses an operation token from a command payload.
    ///
    /// Empty input falls back to `percent` (the registry default for derived
    /// columns); anything else must be one of the four supported operations.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw.trim().to_lowercase().as_str() {
            "" | "percent" => Ok(PriceOperation::Percent),
            "add" => Ok(PriceOperation::Add),
            "subtract" => Ok(PriceOperation::Subtract),
            "multiply" => Ok(PriceOperation::Multiply),
            _ => Err(ValidationError::NotAllowed {
                field: "operation".to_string(),
                allowed: vec![
                    "add".to_string(),
                    "subtract".to_string(),
                    "multiply".to_string(),
                    "percent".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Price Column
// =============================================================================

/// A named price column in the registry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PriceColumn {
    pub id: i64,

    /// Unique lowercase code (`lista`, `mayoreo`, `mayoreo_6`, ...).
    pub code: String,

    /// Display name shown in the admin grid header.
    pub name: String,

    pub description: String,

    /// Position in admin/export layouts. Lower comes first.
    pub visual_order: i64,

    pub active: bool,

    /// Whether the column may be exposed to public price levels.
    pub is_public: bool,

    pub mode: PriceColumnMode,

    /// Code of the column this one derives from (derived mode only).
    pub base_code: Option<String>,

    /// Derivation operation (derived mode only).
    pub operation: Option<PriceOperation>,

    /// Derivation operand (derived mode only).
    pub amount: Option<f64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl PriceColumn {
    /// Whether this column's values are recomputed from a base column.
    #[inline]
    pub fn is_derived(&self) -> bool {
        self.mode == PriceColumnMode::Derived
    }
}

// =============================================================================
// Tire Price
// =============================================================================

/// One price value for one (tire, column) pair.
///
/// Owned collectively by the price store; written only via bulk upsert keyed
/// on the pair.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TirePrice {
    pub tire_id: String,
    pub column_id: i64,
    pub price: f64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Commands
// =============================================================================

/// Command payload for creating a price column.
///
/// Mode and operation arrive as raw tokens from the caller and are parsed
/// against the closed enums during validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceColumnCreate {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub visual_order: i64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub base_code: String,
    #[serde(default)]
    pub operation: String,
    pub amount: Option<f64>,
}

/// Command payload for updating a price column (code is immutable).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceColumnUpdate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub visual_order: i64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub base_code: String,
    #[serde(default)]
    pub operation: String,
    pub amount: Option<f64>,
}

// =============================================================================
// Unit Tests
// =============================================================================
