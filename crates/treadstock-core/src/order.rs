//! # Orders and the Status Transition Graph
//!
//! Order aggregate types plus the fixed state machine that gates every
//! status change. The state machine is the only authority on legal
//! transitions; the service layer drives inventory side effects off the
//! TARGET state after a transition is accepted.
//!
//! ## Transition Graph
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   solicitado ──► preparando ──► enviado ──► entregado (terminal)       │
//! │       │              │             │                                    │
//! │       └──────────────┴─────────────┴──────► cancelado (terminal)       │
//! │                                                                         │
//! │   Same-state "transitions" are never allowed.                          │
//! │                                                                         │
//! │   Inventory side effects (keyed on TARGET state only):                 │
//! │     cancelado  → release_stock per item                                │
//! │     entregado  → confirm_sale per item                                 │
//! │     all others → none                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of an order. Wire values are the lowercase Spanish
/// tokens persisted in storage and exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed by the customer, stock reserved.
    Solicitado,
    /// Accepted by the warehouse, being prepared.
    Preparando,
    /// Handed to the carrier.
    Enviado,
    /// Delivered to the customer. Terminal.
    Entregado,
    /// Cancelled, reserved stock released. Terminal.
    Cancelado,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Solicitado,
        OrderStatus::Preparando,
        OrderStatus::Enviado,
        OrderStatus::Entregado,
        OrderStatus::Cancelado,
    ];

    /// The wire token for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Solicitado => "solicitado",
            OrderStatus::Preparando => "preparando",
            OrderStatus::Enviado => "enviado",
            OrderStatus::Entregado => "entregado",
            OrderStatus::Cancelado => "cancelado",
        }
    }

    /// Whether the graph allows moving from `self` to `next`.
    ///
    /// Terminal states (`entregado`, `cancelado`) have no outgoing edges,
    /// and a state can never "transition" to itself.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Solicitado, Preparando)
                | (Solicitado, Cancelado)
                | (Preparando, Enviado)
                | (Preparando, Cancelado)
                | (Enviado, Entregado)
                | (Enviado, Cancelado)
        )
    }

    /// Validates a transition, returning the typed error on an illegal edge.
    pub fn ensure_transition(self, next: OrderStatus) -> Result<(), CoreError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Whether this status has no outgoing edges.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Entregado | OrderStatus::Cancelado)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Enums
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Transferencia,
    Tarjeta,
    Efectivo,
}

/// Payment modality (single payment, credit, installments, deposit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Contado,
    Credito,
    Parcialidades,
    Anticipo,
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Contado
    }
}

// =============================================================================
// Order Aggregate
// =============================================================================

/// A tire line in an order. Uses the snapshot pattern: SKU, size, brand and
/// model are frozen at order time so later catalog edits don't rewrite
/// history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub tire_sku: String,
    pub tire_size: String,
    pub tire_brand: Option<String>,
    pub tire_model: Option<String>,
    pub quantity: i64,
    pub unit_price: f64,
    pub subtotal: f64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Shipping address snapshot stored on the order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShippingAddress {
    pub street: String,
    pub exterior_number: String,
    pub interior_number: Option<String>,
    pub neighborhood: String,
    pub postal_code: String,
    pub city: String,
    pub state: String,
    pub reference: Option<String>,
    pub phone: String,
}

/// Invoicing data snapshot (RFC, CFDI fields) stored on the order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillingInfo {
    pub rfc: String,
    pub business_name: String,
    pub tax_regime: String,
    pub cfdi_use: String,
    pub postal_code: String,
    pub email: Option<String>,
}

/// A customer order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_mode: PaymentMode,
    pub payment_installments: i64,
    pub payment_notes: Option<String>,
    pub requires_invoice: bool,
    pub billing_info: Option<BillingInfo>,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    /// IVA amount (16%).
    pub tax: f64,
    pub shipping_cost: f64,
    pub total: f64,
    pub customer_notes: Option<String>,
    pub admin_notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Recalculates subtotal, IVA and total from the line items.
    pub fn calculate_totals(&mut self) {
        let subtotal: f64 = self.items.iter().map(|item| item.subtotal).sum();
        self.subtotal = subtotal;
        self.tax = subtotal * crate::TAX_RATE;
        self.total = subtotal + self.tax + self.shipping_cost;
    }
}

// =============================================================================
// Requests
// =============================================================================

/// One requested line in a new order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateOrderItemRequest {
    pub tire_sku: String,
    #[serde(default)]
    pub tire_size: String,
    pub tire_brand: Option<String>,
    pub tire_model: Option<String>,
    pub quantity: i64,
    pub unit_price: f64,
}

/// Request to create an order.
///
/// Totals may arrive pre-computed (storefront shows IVA before checkout);
/// zero/absent totals are recomputed from the items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateOrderRequest {
    pub items: Vec<CreateOrderItemRequest>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_mode: Option<PaymentMode>,
    #[serde(default)]
    pub payment_installments: i64,
    pub payment_notes: Option<String>,
    #[serde(default)]
    pub requires_invoice: bool,
    pub billing_info: Option<BillingInfo>,
    pub customer_notes: Option<String>,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub total: f64,
}

/// Request to change an order's status.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub admin_notes: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
