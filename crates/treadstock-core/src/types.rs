//! # Catalog Domain Types
//!
//! Tires, brands, normalized types, the inventory ledger record and the
//! read views assembled for admin and public catalog consumers.
//!
//! ## Dual-Key Identity Pattern
//! Tires have:
//! - `id`: UUID v4 - immutable, used for price/inventory relations
//! - `sku`: business identifier - human-entered, matched case-insensitively

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

// =============================================================================
// Brand / Normalized Type
// =============================================================================

/// A tire brand. Aliases (importer shorthands like `BS` for Bridgestone)
/// live in a companion table and resolve to one of these rows.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Brand {
    pub id: i64,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A normalized tire type (Pasajero, Light Truck Radial, ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct NormalizedType {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Tire
// =============================================================================

/// A tire in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Tire {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, unique case-insensitively.
    pub sku: String,

    pub brand_id: i64,

    pub model: String,

    /// Section width in mm (or converted from inches for flotation sizes).
    pub width: i64,

    /// Aspect ratio; absent for agricultural sizes.
    pub profile: Option<i64>,

    /// Rim diameter in inches (16, 16.5, ...).
    pub rim: f64,

    /// `R` (radial) or `D` (diagonal); empty when unknown.
    pub construction: String,

    /// `TL` (tubeless) or `TT` (tube type); empty when unknown.
    pub tube_type: String,

    /// Ply rating label (`10PR`, ...).
    pub ply_rating: String,

    pub load_index: String,

    pub speed_index: String,

    pub normalized_type_id: Option<i64>,

    /// Usage abbreviation shown in grids (`PS`, `LT`, `TBR`, ...).
    pub usage_abbr: String,

    pub description: String,

    /// Public catalog price, kept in sync with the `lista` price column.
    pub public_price: f64,

    pub image_url: String,

    /// The measurement string as originally entered (`205/55R16 91V ...`).
    pub original_size: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// SKU-keyed insert-or-update command for a tire, produced by the admin
/// form, the XLSX importer or the legacy CSV importer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TireUpsert {
    pub sku: String,
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub brand_alias: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub width: i64,
    pub profile: Option<i64>,
    #[serde(default)]
    pub rim: f64,
    #[serde(default)]
    pub construction: String,
    #[serde(default)]
    pub tube_type: String,
    #[serde(default)]
    pub ply_rating: String,
    #[serde(default)]
    pub load_index: String,
    #[serde(default)]
    pub speed_index: String,
    #[serde(default)]
    pub normalized_type: String,
    #[serde(default)]
    pub usage_abbr: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub public_price: f64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub original_size: String,
}

// =============================================================================
// Inventory
// =============================================================================

/// Per-tire stock record.
///
/// `quantity` is the sellable stock. Reservation moves units out of
/// `quantity` and into `reserved` in the same operation, so availability is
/// simply `quantity`; `reserved` exists for confirm/release bookkeeping of
/// in-flight orders, never for computing availability.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Inventory {
    pub id: String,
    pub tire_id: String,
    pub quantity: i64,
    pub reserved: i64,
    /// Reorder threshold used by the admin grid's low-stock highlight.
    pub min_stock: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Inventory {
    /// Units available to sell right now.
    #[inline]
    pub fn available(&self) -> i64 {
        self.quantity
    }

    /// Whether stock sits at or below the reorder threshold.
    pub fn is_low(&self) -> bool {
        self.quantity <= self.min_stock
    }
}

// =============================================================================
// Price Levels
// =============================================================================

/// A customer price level: maps a tier code (`empresa`, `distribuidor`, ...)
/// to the price column shown as the main price and an optional reference
/// column for "was/now" display.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PriceLevel {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub discount_percentage: f64,
    /// Code of the column whose price this level sees.
    pub price_column: String,
    /// Code of the optional strikethrough reference column.
    pub reference_column: Option<String>,
    pub can_view_offers: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Filter for price level listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceLevelFilter {
    pub code: Option<String>,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

// =============================================================================
// Read Views
// =============================================================================

/// Admin grid view: tire + inventory + one price per column code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AdminTire {
    pub tire: Tire,
    pub inventory: Option<Inventory>,
    /// Column code → price. Codes resolve through the registry's id→code
    /// table; prices whose column id is unknown are dropped.
    pub prices: HashMap<String, f64>,
    pub brand_name: Option<String>,
}

/// Public/levelled catalog view of one tire.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogItem {
    pub tire: Tire,
    /// The price for the resolved level's main column, falling back to the
    /// tire's stored public price, then 0.
    pub price: f64,
    /// Code of the column `price` came from.
    pub price_code: String,
    /// "Was" price for strikethrough display, when the level configures one.
    pub reference_price: Option<f64>,
    pub reference_code: Option<String>,
    pub stock: Option<i64>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_is_quantity_alone() {
        let now = chrono::Utc::now();
        let inv = Inventory {
            id: "inv-1".to_string(),
            tire_id: "tire-1".to_string(),
            quantity: 7,
            reserved: 3,
            min_stock: 4,
            created_at: now,
            updated_at: now,
        };
        // reserved units were already subtracted at reservation time
        assert_eq!(inv.available(), 7);
        assert!(!inv.is_low());
    }
}
