//! Price column registry and derivation engine, end to end against an
//! in-memory database.

mod common;

use std::collections::HashMap;

use common::*;
use treadstock_core::{PriceColumnUpdate, PriceLevel};
use treadstock_service::{CatalogService, PriceLevelService, ServiceError};

#[tokio::test]
async fn derived_percent_column_discounts_the_base() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-001").await;

    catalog
        .create_column(fixed_column("mayoreo", 3))
        .await
        .unwrap();
    set_price(&catalog, "LLA-001", "mayoreo", 100.0).await;

    // percent is a discount: 6 → 6% off
    catalog
        .create_column(derived_column("mayoreo_6", "mayoreo", "percent", 6.0))
        .await
        .unwrap();

    assert_eq!(price_of(&db, &tire.id, "mayoreo_6").await, Some(94.0));
}

#[tokio::test]
async fn derivation_covers_all_four_operations() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-002").await;

    catalog.create_column(fixed_column("base", 1)).await.unwrap();
    set_price(&catalog, "LLA-002", "base", 200.0).await;

    catalog
        .create_column(derived_column("plus", "base", "add", 15.5))
        .await
        .unwrap();
    catalog
        .create_column(derived_column("minus", "base", "subtract", 0.5))
        .await
        .unwrap();
    catalog
        .create_column(derived_column("doubled", "base", "multiply", 1.5))
        .await
        .unwrap();
    catalog
        .create_column(derived_column("promo", "base", "percent", 10.0))
        .await
        .unwrap();

    assert_eq!(price_of(&db, &tire.id, "plus").await, Some(215.5));
    assert_eq!(price_of(&db, &tire.id, "minus").await, Some(199.5));
    assert_eq!(price_of(&db, &tire.id, "doubled").await, Some(300.0));
    assert_eq!(price_of(&db, &tire.id, "promo").await, Some(180.0));
}

#[tokio::test]
async fn fixed_column_backfills_zero_rows_for_existing_tires() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    let first = create_tire(&catalog, "LLA-003").await;
    let second = create_tire(&catalog, "LLA-004").await;

    catalog
        .create_column(fixed_column("efectivo", 2))
        .await
        .unwrap();

    assert_eq!(price_of(&db, &first.id, "efectivo").await, Some(0.0));
    assert_eq!(price_of(&db, &second.id, "efectivo").await, Some(0.0));
}

#[tokio::test]
async fn derived_column_over_unpriced_base_is_a_noop() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    // no tires yet, so the base column has zero price rows
    catalog.create_column(fixed_column("base", 1)).await.unwrap();
    catalog
        .create_column(derived_column("promo", "base", "percent", 5.0))
        .await
        .unwrap();

    // a tire created afterwards has rows in neither column
    let tire = create_tire(&catalog, "LLA-005").await;
    assert_eq!(price_of(&db, &tire.id, "base").await, None);
    assert_eq!(price_of(&db, &tire.id, "promo").await, None);
}

#[tokio::test]
async fn admin_price_edit_recomputes_only_affected_derived_columns() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-006").await;

    catalog
        .create_column(fixed_column("mayoreo", 1))
        .await
        .unwrap();
    set_price(&catalog, "LLA-006", "mayoreo", 100.0).await;
    set_price(&catalog, "LLA-006", "lista", 500.0).await;

    catalog
        .create_column(derived_column("mayoreo_6", "mayoreo", "percent", 6.0))
        .await
        .unwrap();
    catalog
        .create_column(derived_column("lista_10", "lista", "percent", 10.0))
        .await
        .unwrap();

    assert_eq!(price_of(&db, &tire.id, "mayoreo_6").await, Some(94.0));
    assert_eq!(price_of(&db, &tire.id, "lista_10").await, Some(450.0));

    // Editing mayoreo refreshes mayoreo_6 but leaves lista_10 untouched
    set_price(&catalog, "LLA-006", "mayoreo", 200.0).await;

    assert_eq!(price_of(&db, &tire.id, "mayoreo_6").await, Some(188.0));
    assert_eq!(price_of(&db, &tire.id, "lista_10").await, Some(450.0));
}

#[tokio::test]
async fn inactive_derived_columns_are_skipped_by_targeted_recompute() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-007").await;

    catalog
        .create_column(fixed_column("mayoreo", 1))
        .await
        .unwrap();
    set_price(&catalog, "LLA-007", "mayoreo", 100.0).await;

    let derived = catalog
        .create_column(derived_column("mayoreo_6", "mayoreo", "percent", 6.0))
        .await
        .unwrap();
    assert_eq!(price_of(&db, &tire.id, "mayoreo_6").await, Some(94.0));

    // Deactivate, then edit the base: the derived value must stay stale
    catalog
        .update_column(
            derived.id,
            PriceColumnUpdate {
                name: derived.name.clone(),
                visual_order: derived.visual_order,
                active: false,
                mode: "derived".to_string(),
                base_code: "mayoreo".to_string(),
                operation: "percent".to_string(),
                amount: Some(6.0),
                ..PriceColumnUpdate::default()
            },
        )
        .await
        .unwrap();

    set_price(&catalog, "LLA-007", "mayoreo", 300.0).await;
    assert_eq!(price_of(&db, &tire.id, "mayoreo_6").await, Some(94.0));
}

#[tokio::test]
async fn updating_a_derived_column_recomputes_with_new_settings() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-008").await;

    catalog.create_column(fixed_column("base", 1)).await.unwrap();
    set_price(&catalog, "LLA-008", "base", 100.0).await;

    let column = catalog
        .create_column(derived_column("tier", "base", "percent", 6.0))
        .await
        .unwrap();
    assert_eq!(price_of(&db, &tire.id, "tier").await, Some(94.0));

    catalog
        .update_column(
            column.id,
            PriceColumnUpdate {
                name: column.name.clone(),
                visual_order: column.visual_order,
                active: true,
                mode: "derived".to_string(),
                base_code: "base".to_string(),
                operation: "add".to_string(),
                amount: Some(25.0),
                ..PriceColumnUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(price_of(&db, &tire.id, "tier").await, Some(125.0));
}

#[tokio::test]
async fn create_column_validation_and_conflicts() {
    let db = test_db().await;
    let catalog = CatalogService::new(db);

    // duplicate code (lista is seeded by the migration)
    let err = catalog
        .create_column(fixed_column("lista", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)), "{err:?}");

    // bad code pattern
    let err = catalog
        .create_column(fixed_column("bad code", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");

    // derived without amount
    let mut cmd = derived_column("promo", "lista", "percent", 0.0);
    cmd.amount = None;
    let err = catalog.create_column(cmd).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");

    // derived with an unknown operation
    let err = catalog
        .create_column(derived_column("promo", "lista", "divide", 2.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");

    // derived over a missing base column
    let err = catalog
        .create_column(derived_column("promo", "nope", "percent", 5.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn the_list_column_is_never_deletable() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    let lista = db
        .price_columns()
        .get_by_code("lista")
        .await
        .unwrap()
        .expect("lista seeded by migration");

    let err = catalog.delete_column(lista.id, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");

    // a transfer target doesn't help either
    let err = catalog
        .delete_column(lista.id, Some("efectivo"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn a_base_column_cannot_be_deleted_while_derivations_point_at_it() {
    let db = test_db().await;
    let catalog = CatalogService::new(db);

    let base = catalog
        .create_column(fixed_column("mayoreo", 1))
        .await
        .unwrap();
    catalog
        .create_column(derived_column("mayoreo_6", "mayoreo", "percent", 6.0))
        .await
        .unwrap();

    // rejected regardless of any transfer target
    let err = catalog
        .delete_column(base.id, Some("lista"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn deleting_a_column_referenced_by_levels_requires_a_transfer_target() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());
    let levels = PriceLevelService::new(db.clone());

    let column = catalog
        .create_column(fixed_column("empresa", 2))
        .await
        .unwrap();

    let now = chrono::Utc::now();
    levels
        .create(PriceLevel {
            id: 0,
            code: "empresa".to_string(),
            name: "Empresa".to_string(),
            description: None,
            discount_percentage: 0.0,
            price_column: "empresa".to_string(),
            reference_column: Some("lista".to_string()),
            can_view_offers: false,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    // without a transfer target the delete fails
    let err = catalog.delete_column(column.id, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");

    // the target must differ and must exist
    let err = catalog
        .delete_column(column.id, Some("empresa"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
    let err = catalog
        .delete_column(column.id, Some("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");

    // with a valid target the level is rewired and the column goes away
    catalog
        .delete_column(column.id, Some("lista"))
        .await
        .unwrap();

    let level = levels.get_by_code("empresa").await.unwrap();
    assert_eq!(level.price_column, "lista");
    assert!(db
        .price_columns()
        .get_by_code("empresa")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn editing_lista_syncs_the_public_price() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    create_tire(&catalog, "LLA-009").await;

    let mut prices = HashMap::new();
    prices.insert("lista".to_string(), Some(2350.0));
    let view = catalog
        .update_admin("LLA-009", None, &prices)
        .await
        .unwrap();

    assert_eq!(view.tire.public_price, 2350.0);
    assert_eq!(view.prices.get("lista"), Some(&2350.0));
}

#[tokio::test]
async fn registry_reads_return_columns_in_visual_order() {
    let db = test_db().await;
    let catalog = CatalogService::new(db);

    let efectivo = catalog
        .create_column(fixed_column("efectivo", 1))
        .await
        .unwrap();
    catalog
        .create_column(fixed_column("mayoreo", 2))
        .await
        .unwrap();

    let columns = catalog.list_columns().await.unwrap();
    let codes: Vec<&str> = columns.iter().map(|c| c.code.as_str()).collect();
    // lista is seeded at visual_order 0
    assert_eq!(codes, vec!["lista", "efectivo", "mayoreo"]);

    let fetched = catalog.get_column(efectivo.id).await.unwrap();
    assert_eq!(fetched.code, "efectivo");

    let err = catalog.get_column(9999).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn recalculate_rejects_fixed_columns() {
    let db = test_db().await;
    let catalog = CatalogService::new(db);

    let fixed = catalog
        .create_column(fixed_column("efectivo", 1))
        .await
        .unwrap();

    let err = catalog
        .recalculate_derived_column(&fixed)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
}
