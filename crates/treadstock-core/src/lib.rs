//! # treadstock-core: Pure Business Logic for Treadstock
//!
//! This crate is the heart of the tire-retail backend. It contains the
//! pricing and inventory rules as pure types and functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Treadstock Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              HTTP handlers / Admin UI (other repos)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   treadstock-service                            │   │
//! │  │    CatalogService ── OrderService ── PriceLevelService          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ treadstock-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  types    │  │  pricing  │  │   order   │  │ validation│  │   │
//! │  │   │  Tire     │  │ PriceCol  │  │  Status   │  │   rules   │  │   │
//! │  │   │ Inventory │  │ Operation │  │   graph   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 treadstock-db (Database Layer)                  │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog domain types (Tire, Brand, Inventory, views)
//! - [`pricing`] - Price column model and derivation arithmetic
//! - [`order`] - Orders and the status transition graph
//! - [`filter`] - Typed list filters and closed sort enums
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Exact Price Math**: Derived prices are pure functions of their base
//!    column (`percent` is a discount: amount=10 means 10% off)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use treadstock_core::pricing::PriceOperation;
//! use treadstock_core::order::OrderStatus;
//!
//! // A 6% discount column over a 100.0 base price
//! assert_eq!(PriceOperation::Percent.apply(100.0, 6.0), 94.0);
//!
//! // Delivered orders are terminal
//! assert!(!OrderStatus::Entregado.can_transition_to(OrderStatus::Cancelado));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod filter;
pub mod order;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use treadstock_core::Tire` instead of
// `use treadstock_core::types::Tire`

pub use error::{CoreError, ValidationError};
pub use filter::{OrderFilter, TireFilter, TireSort, TireSortField};
pub use order::{
    BillingInfo, CreateOrderItemRequest, CreateOrderRequest, Order, OrderItem, OrderStatus,
    PaymentMethod, PaymentMode, ShippingAddress, UpdateStatusRequest,
};
pub use pricing::{
    PriceColumn, PriceColumnCreate, PriceColumnMode, PriceColumnUpdate, PriceOperation, TirePrice,
};
pub use types::{
    AdminTire, Brand, CatalogItem, Inventory, NormalizedType, PriceLevel, PriceLevelFilter, Tire,
    TireUpsert,
};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Code of the list price column.
///
/// ## Why a constant?
/// The `lista` column anchors the whole price model: it backs the public
/// catalog price, it is the default main column for unknown price levels,
/// and it can never be deleted.
pub const LIST_PRICE_CODE: &str = "lista";

/// IVA rate applied to order totals (16%).
pub const TAX_RATE: f64 = 0.16;

/// Default page size for list endpoints when the caller passes none.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Hard ceiling for list page sizes.
///
/// ## Business Reason
/// Bulk jobs (export, backfill) paginate explicitly; ad-hoc callers must not
/// be able to pull the whole table in one request.
pub const MAX_PAGE_SIZE: i64 = 10_000;
