//! # Typed Filters and Sorts
//!
//! List filters for tires and orders, with sort keys modeled as closed
//! enums. Sort tokens arrive as strings (`"price"`, `"-created_at"`) and are
//! parsed against the enum; unrecognized tokens are rejected instead of
//! silently falling back to a default column.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::order::OrderStatus;

// =============================================================================
// Tire Sort
// =============================================================================

/// The closed set of tire list sort fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TireSortField {
    Sku,
    Model,
    Price,
    CreatedAt,
}

impl TireSortField {
    /// The canonical request token for this field.
    pub fn as_str(self) -> &'static str {
        match self {
            TireSortField::Sku => "sku",
            TireSortField::Model => "model",
            TireSortField::Price => "price",
            TireSortField::CreatedAt => "created_at",
        }
    }
}

/// A parsed sort directive: field + direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TireSort {
    pub field: TireSortField,
    pub descending: bool,
}

impl TireSort {
    /// Newest-first, the listing default.
    pub fn newest_first() -> Self {
        TireSort {
            field: TireSortField::CreatedAt,
            descending: true,
        }
    }

    /// Parses a request token.
    ///
    /// A leading `-` selects descending order (`"-price"`). Empty input
    /// yields the default sort; unknown field tokens are a validation error.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(TireSort::newest_first());
        }

        let (descending, key) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let field = match key.to_lowercase().as_str() {
            "sku" => TireSortField::Sku,
            "model" => TireSortField::Model,
            "price" => TireSortField::Price,
            "created_at" => TireSortField::CreatedAt,
            _ => {
                return Err(ValidationError::NotAllowed {
                    field: "sort".to_string(),
                    allowed: vec![
                        "sku".to_string(),
                        "model".to_string(),
                        "price".to_string(),
                        "created_at".to_string(),
                    ],
                })
            }
        };

        Ok(TireSort { field, descending })
    }
}

impl Default for TireSort {
    fn default() -> Self {
        TireSort::newest_first()
    }
}

// =============================================================================
// Tire Filter
// =============================================================================

/// Filter for tire listings. All criteria are AND-combined; exact-match
/// string fields compare case-insensitively after trimming.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TireFilter {
    /// Substring match over SKU, model and description.
    pub search: Option<String>,
    pub brand_id: Option<i64>,
    pub type_id: Option<i64>,
    pub usage_abbr: Option<String>,
    pub width: Option<i64>,
    pub profile: Option<i64>,
    pub rim: Option<f64>,
    pub construction: Option<String>,
    pub ply_rating: Option<String>,
    pub load_index: Option<String>,
    pub speed_index: Option<String>,
    /// Keep only tires whose inventory row has quantity > 0.
    #[serde(default)]
    pub in_stock_only: bool,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub sort: Option<TireSort>,
}

impl TireFilter {
    /// A filter selecting one page by limit/offset, other criteria empty.
    pub fn page(limit: i64, offset: i64) -> Self {
        TireFilter {
            limit,
            offset,
            ..TireFilter::default()
        }
    }
}

// =============================================================================
// Order Filter
// =============================================================================

/// Filter for order listings. Orders always list newest-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderFilter {
    pub user_id: Option<String>,
    pub status: Option<OrderStatus>,
    /// Substring match over the order number.
    pub search: Option<String>,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
