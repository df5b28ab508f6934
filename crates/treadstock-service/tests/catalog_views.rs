//! Admin and public catalog projections.

mod common;

use std::collections::HashMap;

use common::*;
use treadstock_core::{Inventory, PriceLevel, TireFilter, TireSort};
use treadstock_service::{CatalogService, PriceLevelService, ServiceError};

#[tokio::test]
async fn admin_list_joins_inventory_and_code_keyed_prices() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-200").await;

    catalog
        .create_column(fixed_column("mayoreo", 3))
        .await
        .unwrap();

    let mut prices = HashMap::new();
    prices.insert("lista".to_string(), Some(2350.0));
    prices.insert("mayoreo".to_string(), Some(2100.0));
    prices.insert("ghost_code".to_string(), Some(999.0)); // unknown: dropped
    catalog
        .update_admin("LLA-200", Some(8), &prices)
        .await
        .unwrap();

    let (items, total) = catalog.admin_list(&TireFilter::default()).await.unwrap();
    assert_eq!(total, 1);
    let item = &items[0];

    assert_eq!(item.tire.id, tire.id);
    assert_eq!(item.brand_name.as_deref(), Some("Bridgestone"));
    assert_eq!(item.inventory.as_ref().map(|inv| inv.quantity), Some(8));
    assert_eq!(item.prices.get("lista"), Some(&2350.0));
    assert_eq!(item.prices.get("mayoreo"), Some(&2100.0));
    assert!(!item.prices.contains_key("ghost_code"));
}

#[tokio::test]
async fn catalog_defaults_to_the_list_price_with_public_fallback() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    // priced through lista
    create_tire(&catalog, "LLA-201").await;
    set_price(&catalog, "LLA-201", "lista", 1800.0).await;

    // unpriced, but with a stored public price
    let mut cmd = sample_tire("LLA-202");
    cmd.public_price = 1500.0;
    catalog.upsert_from_measurement(cmd).await.unwrap();

    // unpriced entirely
    create_tire(&catalog, "LLA-203").await;

    let (items, _) = catalog
        .list_catalog(&TireFilter::default(), "")
        .await
        .unwrap();
    let by_sku: HashMap<&str, &treadstock_core::CatalogItem> =
        items.iter().map(|i| (i.tire.sku.as_str(), i)).collect();

    let priced = by_sku["LLA-201"];
    assert_eq!(priced.price, 1800.0);
    assert_eq!(priced.price_code, "lista");
    assert!(priced.reference_price.is_none());

    assert_eq!(by_sku["LLA-202"].price, 1500.0);
    assert_eq!(by_sku["LLA-203"].price, 0.0);
}

#[tokio::test]
async fn catalog_levels_resolve_through_the_static_fallback() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    create_tire(&catalog, "LLA-204").await;
    catalog
        .create_column(fixed_column("mayoreo", 3))
        .await
        .unwrap();
    set_price(&catalog, "LLA-204", "lista", 2350.0).await;
    set_price(&catalog, "LLA-204", "mayoreo", 2100.0).await;
    catalog
        .create_column(derived_column("mayoreo_6", "mayoreo", "percent", 6.0))
        .await
        .unwrap();

    // distribuidor → mayoreo main, lista reference
    let (items, _) = catalog
        .list_catalog(&TireFilter::default(), "distribuidor")
        .await
        .unwrap();
    assert_eq!(items[0].price, 2100.0);
    assert_eq!(items[0].price_code, "mayoreo");
    assert_eq!(items[0].reference_price, Some(2350.0));
    assert_eq!(items[0].reference_code.as_deref(), Some("lista"));

    // mayorista → mayoreo_6 main (derived: 2100 * 0.94)
    let (items, _) = catalog
        .list_catalog(&TireFilter::default(), "mayorista")
        .await
        .unwrap();
    assert_eq!(items[0].price, 1974.0);
    assert_eq!(items[0].price_code, "mayoreo_6");

    // unknown levels read as public
    let (items, _) = catalog
        .list_catalog(&TireFilter::default(), "vip")
        .await
        .unwrap();
    assert_eq!(items[0].price_code, "lista");
    assert!(items[0].reference_price.is_none());
}

#[tokio::test]
async fn catalog_prefers_dynamic_price_levels_over_the_static_map() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());
    let levels = PriceLevelService::new(db.clone());

    create_tire(&catalog, "LLA-205").await;
    catalog
        .create_column(fixed_column("empresa", 2))
        .await
        .unwrap();
    set_price(&catalog, "LLA-205", "lista", 2350.0).await;
    set_price(&catalog, "LLA-205", "empresa", 2000.0).await;

    // a configured level named like a static tier wins over the static map
    let now = chrono::Utc::now();
    levels
        .create(PriceLevel {
            id: 0,
            code: "distribuidor".to_string(),
            name: "Distribuidor".to_string(),
            description: None,
            discount_percentage: 0.0,
            price_column: "empresa".to_string(),
            reference_column: None,
            can_view_offers: false,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    let (items, _) = catalog
        .list_catalog(&TireFilter::default(), "distribuidor")
        .await
        .unwrap();
    assert_eq!(items[0].price, 2000.0);
    assert_eq!(items[0].price_code, "empresa");
    assert!(items[0].reference_code.is_none());
}

#[tokio::test]
async fn catalog_reports_stock_from_the_ledger() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-206").await;
    let now = chrono::Utc::now();
    db.inventory()
        .upsert(&Inventory {
            id: "inv-206".to_string(),
            tire_id: tire.id.clone(),
            quantity: 6,
            reserved: 2,
            min_stock: 4,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    let (items, _) = catalog
        .list_catalog(&TireFilter::default(), "public")
        .await
        .unwrap();
    assert_eq!(items[0].stock, Some(6));
}

#[tokio::test]
async fn tire_filters_narrow_the_listing() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    let narrow = create_tire(&catalog, "LLA-207").await;
    let mut wide = sample_tire("LLA-208");
    wide.width = 265;
    wide.model = "DUELER AT".to_string();
    catalog.upsert_from_measurement(wide).await.unwrap();

    // dimensional exact match
    let (items, total) = catalog
        .list(&TireFilter {
            width: Some(265),
            ..TireFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].sku, "LLA-208");

    // substring search over sku/model/description
    let (items, _) = catalog
        .list(&TireFilter {
            search: Some("dueler".to_string()),
            ..TireFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].sku, "LLA-208");

    // in-stock-only hides tires without stock
    let now = chrono::Utc::now();
    db.inventory()
        .upsert(&Inventory {
            id: "inv-207".to_string(),
            tire_id: narrow.id.clone(),
            quantity: 3,
            reserved: 0,
            min_stock: 0,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
    let (items, _) = catalog
        .list(&TireFilter {
            in_stock_only: true,
            ..TireFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].sku, "LLA-207");
}

#[tokio::test]
async fn listings_honor_the_closed_sort_enum() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    create_tire(&catalog, "B-SKU").await;
    create_tire(&catalog, "A-SKU").await;

    let (items, _) = catalog
        .list(&TireFilter {
            sort: Some(TireSort::parse("sku").unwrap()),
            ..TireFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(items[0].sku, "A-SKU");
    assert_eq!(items[1].sku, "B-SKU");

    let (items, _) = catalog
        .list(&TireFilter {
            sort: Some(TireSort::parse("-sku").unwrap()),
            ..TireFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(items[0].sku, "B-SKU");

    // unknown sort tokens never reach the repository
    assert!(TireSort::parse("garbage").is_err());
}

#[tokio::test]
async fn get_and_delete_round_trip() {
    let db = test_db().await;
    let catalog = CatalogService::new(db);

    create_tire(&catalog, "LLA-209").await;

    // SKU lookup is case-insensitive
    let found = catalog.get("lla-209").await.unwrap();
    assert_eq!(found.sku, "LLA-209");

    catalog.delete("LLA-209").await.unwrap();
    let err = catalog.get("LLA-209").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }), "{err:?}");

    let err = catalog.delete("LLA-209").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }), "{err:?}");
}
