//! Order lifecycle and inventory ledger, end to end against an in-memory
//! database.

mod common;

use common::*;
use treadstock_core::{
    CreateOrderItemRequest, CreateOrderRequest, Inventory, OrderStatus, PaymentMethod,
    ShippingAddress, UpdateStatusRequest,
};
use treadstock_db::Database;
use treadstock_service::{CatalogService, OrderService, ServiceError};

async fn seed_inventory(db: &Database, tire_id: &str, quantity: i64) {
    let now = chrono::Utc::now();
    db.inventory()
        .upsert(&Inventory {
            id: uuid_like(tire_id),
            tire_id: tire_id.to_string(),
            quantity,
            reserved: 0,
            min_stock: 0,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("inventory upsert");
}

fn uuid_like(seed: &str) -> String {
    format!("inv-{seed}")
}

fn order_request(sku: &str, quantity: i64) -> CreateOrderRequest {
    CreateOrderRequest {
        items: vec![CreateOrderItemRequest {
            tire_sku: sku.to_string(),
            tire_size: "205/55R16".to_string(),
            tire_brand: Some("Bridgestone".to_string()),
            tire_model: Some("TURANZA T005".to_string()),
            quantity,
            unit_price: 2350.0,
        }],
        shipping_address: ShippingAddress {
            street: "Av. Siempre Viva".to_string(),
            exterior_number: "742".to_string(),
            interior_number: None,
            neighborhood: "Centro".to_string(),
            postal_code: "06000".to_string(),
            city: "CDMX".to_string(),
            state: "CDMX".to_string(),
            reference: None,
            phone: "5512345678".to_string(),
        },
        payment_method: PaymentMethod::Transferencia,
        payment_mode: None,
        payment_installments: 0,
        payment_notes: None,
        requires_invoice: false,
        billing_info: None,
        customer_notes: None,
        subtotal: 0.0,
        tax: 0.0,
        total: 0.0,
    }
}

async fn stock(db: &Database, tire_id: &str) -> (i64, i64) {
    let inv = db
        .inventory()
        .get_by_tire_id(tire_id)
        .await
        .expect("inventory read")
        .expect("inventory row");
    (inv.quantity, inv.reserved)
}

#[tokio::test]
async fn creating_an_order_reserves_stock_per_item() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());
    let orders = OrderService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-100").await;
    seed_inventory(&db, &tire.id, 10).await;

    let order = orders
        .create("user-1", order_request("LLA-100", 3))
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Solicitado);
    assert!(order.order_number.starts_with("ORD-"));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.subtotal, 3.0 * 2350.0);

    assert_eq!(stock(&db, &tire.id).await, (7, 3));

    // the order number is a stable lookup key
    let by_number = orders
        .get_by_order_number(&order.order_number)
        .await
        .unwrap();
    assert_eq!(by_number.id, order.id);
    assert_eq!(by_number.items.len(), 1);
}

#[tokio::test]
async fn cancelling_an_order_restores_the_reservation() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());
    let orders = OrderService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-101").await;
    seed_inventory(&db, &tire.id, 10).await;

    let order = orders
        .create("user-1", order_request("LLA-101", 3))
        .await
        .unwrap();
    assert_eq!(stock(&db, &tire.id).await, (7, 3));

    orders
        .update_status(
            order.id,
            UpdateStatusRequest {
                status: OrderStatus::Cancelado,
                admin_notes: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(stock(&db, &tire.id).await, (10, 0));

    let cancelled = orders.get_by_id(order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelado);
    assert!(cancelled.cancelled_at.is_some());
}

#[tokio::test]
async fn delivering_an_order_clears_the_reservation_and_keeps_the_decrement() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());
    let orders = OrderService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-102").await;
    seed_inventory(&db, &tire.id, 10).await;

    let order = orders
        .create("user-1", order_request("LLA-102", 3))
        .await
        .unwrap();

    for (status, expect_stock) in [
        (OrderStatus::Preparando, (7, 3)),
        (OrderStatus::Enviado, (7, 3)),
        (OrderStatus::Entregado, (7, 0)),
    ] {
        orders
            .update_status(
                order.id,
                UpdateStatusRequest {
                    status,
                    admin_notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(stock(&db, &tire.id).await, expect_stock);
    }

    let delivered = orders.get_by_id(order.id).await.unwrap();
    assert_eq!(delivered.status, OrderStatus::Entregado);
    assert!(delivered.delivered_at.is_some());
}

#[tokio::test]
async fn illegal_transitions_are_rejected_before_any_ledger_effect() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());
    let orders = OrderService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-103").await;
    seed_inventory(&db, &tire.id, 10).await;

    let order = orders
        .create("user-1", order_request("LLA-103", 2))
        .await
        .unwrap();

    // skipping straight to delivered is never legal
    let err = orders
        .update_status(
            order.id,
            UpdateStatusRequest {
                status: OrderStatus::Entregado,
                admin_notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition { .. }), "{err:?}");

    // the rejected transition must not have touched stock
    assert_eq!(stock(&db, &tire.id).await, (8, 2));

    // terminal states have no outgoing edges
    orders
        .update_status(
            order.id,
            UpdateStatusRequest {
                status: OrderStatus::Cancelado,
                admin_notes: None,
            },
        )
        .await
        .unwrap();
    for next in [
        OrderStatus::Solicitado,
        OrderStatus::Preparando,
        OrderStatus::Enviado,
        OrderStatus::Entregado,
        OrderStatus::Cancelado,
    ] {
        let err = orders
            .update_status(
                order.id,
                UpdateStatusRequest {
                    status: next,
                    admin_notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }), "{err:?}");
    }

    // the single cancellation released stock exactly once
    assert_eq!(stock(&db, &tire.id).await, (10, 0));
}

#[tokio::test]
async fn reservations_clamp_at_zero_on_oversell() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());
    let orders = OrderService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-104").await;
    seed_inventory(&db, &tire.id, 2).await;

    let order = orders
        .create("user-1", order_request("LLA-104", 5))
        .await
        .unwrap();

    // quantity clamps at 0, the reservation records the full request
    assert_eq!(stock(&db, &tire.id).await, (0, 5));

    orders
        .update_status(
            order.id,
            UpdateStatusRequest {
                status: OrderStatus::Cancelado,
                admin_notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(stock(&db, &tire.id).await, (5, 0));
}

#[tokio::test]
async fn orders_without_an_inventory_row_still_succeed() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());
    let orders = OrderService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-105").await;

    // no inventory row exists: the reservation is a tolerated no-op
    let order = orders
        .create("user-1", order_request("LLA-105", 1))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Solicitado);
    assert!(db
        .inventory()
        .get_by_tire_id(&tire.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn order_creation_rejects_bad_requests() {
    let db = test_db().await;
    let orders = OrderService::new(db);

    let mut empty = order_request("LLA-106", 1);
    empty.items.clear();
    let err = orders.create("user-1", empty).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");

    let err = orders
        .create("user-1", order_request("LLA-106", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn updating_a_missing_order_is_not_found() {
    let db = test_db().await;
    let orders = OrderService::new(db);

    let err = orders
        .update_status(
            9999,
            UpdateStatusRequest {
                status: OrderStatus::Preparando,
                admin_notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn customers_may_cancel_only_their_own_requested_orders() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());
    let orders = OrderService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-107").await;
    seed_inventory(&db, &tire.id, 10).await;

    let order = orders
        .create("user-1", order_request("LLA-107", 2))
        .await
        .unwrap();

    // someone else's order reads as missing
    let err = orders
        .cancel_as_customer(order.id, "user-2")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }), "{err:?}");

    // once preparation starts, the customer can no longer cancel
    orders
        .update_status(
            order.id,
            UpdateStatusRequest {
                status: OrderStatus::Preparando,
                admin_notes: None,
            },
        )
        .await
        .unwrap();
    let err = orders
        .cancel_as_customer(order.id, "user-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");

    // a fresh order in solicitado cancels fine
    let fresh = orders
        .create("user-1", order_request("LLA-107", 1))
        .await
        .unwrap();
    orders.cancel_as_customer(fresh.id, "user-1").await.unwrap();
    let cancelled = orders.get_by_id(fresh.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelado);
}

#[tokio::test]
async fn order_listing_filters_by_user_and_status() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());
    let orders = OrderService::new(db.clone());

    let tire = create_tire(&catalog, "LLA-108").await;
    seed_inventory(&db, &tire.id, 20).await;

    let first = orders
        .create("user-1", order_request("LLA-108", 1))
        .await
        .unwrap();
    orders
        .create("user-2", order_request("LLA-108", 1))
        .await
        .unwrap();

    orders
        .update_status(
            first.id,
            UpdateStatusRequest {
                status: OrderStatus::Cancelado,
                admin_notes: Some("out of stock".to_string()),
            },
        )
        .await
        .unwrap();

    let (mine, total) = orders.list_by_user("user-1", 10, 0).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].user_id, "user-1");
    assert_eq!(mine[0].admin_notes.as_deref(), Some("out of stock"));

    let (cancelled, _) = orders
        .list(&treadstock_core::OrderFilter {
            status: Some(OrderStatus::Cancelado),
            ..treadstock_core::OrderFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id, first.id);
}
