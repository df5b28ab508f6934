//! Shared fixtures for the service integration tests.
//!
//! Every test gets its own in-memory SQLite database with migrations
//! applied, so suites stay isolated and fast.

#![allow(dead_code)]

use std::collections::HashMap;

use treadstock_core::{PriceColumnCreate, Tire, TireUpsert};
use treadstock_db::{Database, DbConfig};
use treadstock_service::CatalogService;

/// Creates a fresh in-memory database with the schema applied.
pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// A minimal upsert command for one tire.
pub fn sample_tire(sku: &str) -> TireUpsert {
    TireUpsert {
        sku: sku.to_string(),
        brand_name: "Bridgestone".to_string(),
        model: "TURANZA T005".to_string(),
        width: 205,
        profile: Some(55),
        rim: 16.0,
        construction: "R".to_string(),
        normalized_type: "Pasajero".to_string(),
        usage_abbr: "PS".to_string(),
        original_size: "205/55R16".to_string(),
        ..TireUpsert::default()
    }
}

/// Creates a tire through the service and returns it.
pub async fn create_tire(catalog: &CatalogService, sku: &str) -> Tire {
    catalog
        .upsert_from_measurement(sample_tire(sku))
        .await
        .expect("tire upsert")
}

/// Command for a fixed price column.
pub fn fixed_column(code: &str, visual_order: i64) -> PriceColumnCreate {
    PriceColumnCreate {
        code: code.to_string(),
        name: format!("Column {code}"),
        visual_order,
        active: true,
        mode: "fixed".to_string(),
        ..PriceColumnCreate::default()
    }
}

/// Command for a derived price column.
pub fn derived_column(
    code: &str,
    base_code: &str,
    operation: &str,
    amount: f64,
) -> PriceColumnCreate {
    PriceColumnCreate {
        code: code.to_string(),
        name: format!("Column {code}"),
        visual_order: 50,
        active: true,
        mode: "derived".to_string(),
        base_code: base_code.to_string(),
        operation: operation.to_string(),
        amount: Some(amount),
        ..PriceColumnCreate::default()
    }
}

/// Sets one price for one tire through the admin update path.
pub async fn set_price(catalog: &CatalogService, sku: &str, code: &str, value: f64) {
    let mut prices = HashMap::new();
    prices.insert(code.to_string(), Some(value));
    catalog
        .update_admin(sku, None, &prices)
        .await
        .expect("admin price update");
}

/// Reads one tire's price for a column code, if present.
pub async fn price_of(db: &Database, tire_id: &str, code: &str) -> Option<f64> {
    let column = db
        .price_columns()
        .get_by_code(code)
        .await
        .expect("column lookup")?;
    db.prices()
        .list_by_tire_id(tire_id)
        .await
        .expect("price rows")
        .into_iter()
        .find(|p| p.column_id == column.id)
        .map(|p| p.price)
}
