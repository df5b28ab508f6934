//! # Order Service
//!
//! Order creation and the status lifecycle, with inventory side effects
//! driven off accepted transitions.
//!
//! ## Lifecycle & Stock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create()                 reserve_stock per item (once)                │
//! │  update_status(cancelado) release_stock per item (once)                │
//! │  update_status(entregado) confirm_sale per item (once)                 │
//! │  other transitions        no inventory effect                          │
//! │                                                                         │
//! │  The transition graph is validated BEFORE persistence and BEFORE any   │
//! │  ledger mutation, so terminal states can never double-release or       │
//! │  double-confirm.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ledger failures after a persisted transition are logged and tolerated:
//! an operator reconciles stock rather than leaving the order in a state
//! the customer already saw change.

use chrono::Utc;
use tracing::{info, warn};

use treadstock_core::{
    validation::{validate_quantity, validate_sku},
    CoreError, CreateOrderRequest, Order, OrderFilter, OrderItem, OrderStatus,
    UpdateStatusRequest,
};
use treadstock_db::Database;

use crate::error::{ServiceError, ServiceResult};

/// Application service for orders.
#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
}

impl OrderService {
    /// Creates a new OrderService.
    pub fn new(db: Database) -> Self {
        OrderService { db }
    }

    /// Creates an order in `solicitado` and reserves stock for every item.
    pub async fn create(&self, user_id: &str, req: CreateOrderRequest) -> ServiceResult<Order> {
        if req.items.is_empty() {
            return Err(CoreError::EmptyOrder.into());
        }

        for item in &req.items {
            validate_sku(&item.tire_sku)?;
            validate_quantity(item.quantity)?;
        }

        let now = Utc::now();
        let mut computed_subtotal = 0.0;
        let items: Vec<OrderItem> = req
            .items
            .iter()
            .map(|item| {
                let subtotal = item.quantity as f64 * item.unit_price;
                computed_subtotal += subtotal;
                OrderItem {
                    id: 0,
                    order_id: 0,
                    tire_sku: item.tire_sku.trim().to_string(),
                    tire_size: item.tire_size.trim().to_string(),
                    tire_brand: item.tire_brand.clone(),
                    tire_model: item.tire_model.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    subtotal,
                    created_at: now,
                }
            })
            .collect();

        // Storefront-computed totals win when present (they already include
        // IVA); otherwise fall back to the computed subtotal.
        let subtotal = if req.subtotal > 0.0 {
            req.subtotal
        } else {
            computed_subtotal
        };
        let tax = if req.tax > 0.0 { req.tax } else { 0.0 };
        let total = if req.total > 0.0 {
            req.total
        } else {
            computed_subtotal
        };

        let order = Order {
            id: 0,
            order_number: String::new(),
            user_id: user_id.to_string(),
            status: OrderStatus::Solicitado,
            shipping_address: req.shipping_address,
            payment_method: req.payment_method,
            payment_mode: req.payment_mode.unwrap_or_default(),
            payment_installments: req.payment_installments.max(1),
            payment_notes: req.payment_notes,
            requires_invoice: req.requires_invoice,
            billing_info: req.billing_info,
            items,
            subtotal,
            tax,
            shipping_cost: 0.0, // free shipping for now
            total,
            customer_notes: req.customer_notes,
            admin_notes: None,
            created_at: now,
            updated_at: now,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
        };

        let order = self.db.orders().create(order).await?;

        // Reserve stock for each item. A failed reservation is logged, not
        // fatal: the order already exists and stock reconciliation is an
        // operator workflow.
        for item in &order.items {
            if let Err(err) = self
                .db
                .inventory()
                .reserve_stock(&item.tire_sku, item.quantity)
                .await
            {
                warn!(sku = %item.tire_sku, error = %err, "Failed to reserve stock");
            }
        }

        info!(
            order_number = %order.order_number,
            items = order.items.len(),
            total = order.total,
            "Order created"
        );

        Ok(order)
    }

    /// Gets an order by id.
    pub async fn get_by_id(&self, id: i64) -> ServiceResult<Order> {
        self.db
            .orders()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", id))
    }

    /// Gets an order by its order number.
    pub async fn get_by_order_number(&self, order_number: &str) -> ServiceResult<Order> {
        self.db
            .orders()
            .get_by_order_number(order_number)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_number))
    }

    /// Lists orders matching the filter.
    pub async fn list(&self, filter: &OrderFilter) -> ServiceResult<(Vec<Order>, i64)> {
        Ok(self.db.orders().list(filter).await?)
    }

    /// Lists one user's orders.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<(Vec<Order>, i64)> {
        let filter = OrderFilter {
            user_id: Some(user_id.to_string()),
            limit,
            offset,
            ..OrderFilter::default()
        };
        self.list(&filter).await
    }

    /// Changes an order's status.
    ///
    /// The transition is validated against the graph, persisted together
    /// with the matching lifecycle timestamp, and then the inventory side
    /// effect keyed on the TARGET state runs once per item.
    pub async fn update_status(&self, id: i64, req: UpdateStatusRequest) -> ServiceResult<()> {
        let current = self
            .db
            .orders()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", id))?;

        current.status.ensure_transition(req.status)?;

        self.db
            .orders()
            .update_status(id, req.status, req.admin_notes.as_deref())
            .await?;

        match req.status {
            OrderStatus::Cancelado => {
                for item in &current.items {
                    if let Err(err) = self
                        .db
                        .inventory()
                        .release_stock(&item.tire_sku, item.quantity)
                        .await
                    {
                        warn!(sku = %item.tire_sku, error = %err, "Failed to release stock");
                    }
                }
            }
            OrderStatus::Entregado => {
                for item in &current.items {
                    if let Err(err) = self
                        .db
                        .inventory()
                        .confirm_sale(&item.tire_sku, item.quantity)
                        .await
                    {
                        warn!(sku = %item.tire_sku, error = %err, "Failed to confirm sale");
                    }
                }
            }
            _ => {}
        }

        info!(id = id, status = %req.status, "Order status updated");
        Ok(())
    }

    /// Customer-initiated cancellation: a policy layer above the state
    /// machine. Only the owning user may cancel, and only while the order
    /// is still in `solicitado`.
    pub async fn cancel_as_customer(&self, id: i64, user_id: &str) -> ServiceResult<()> {
        let order = self
            .db
            .orders()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", id))?;

        if order.user_id != user_id {
            // Don't reveal other users' orders
            return Err(ServiceError::not_found("Order", id));
        }

        if order.status != OrderStatus::Solicitado {
            return Err(ServiceError::validation(
                "only orders in solicitado can be cancelled by the customer",
            ));
        }

        self.update_status(
            id,
            UpdateStatusRequest {
                status: OrderStatus::Cancelado,
                admin_notes: None,
            },
        )
        .await
    }
}
