//! # treadstock-db: Database Layer for Treadstock
//!
//! This crate provides database access for the tire-retail backend.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Treadstock Data Flow                               │
//! │                                                                         │
//! │  Service call (CatalogService::update_admin)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   treadstock-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (tire, ...)  │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ TireRepo      │    │ 001_init.sql │  │   │
//! │  │   │ WAL, FKs      │    │ PriceRepo     │    │ ...          │  │   │
//! │  │   │               │    │ InventoryRepo │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (file or :memory: in tests)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations per aggregate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use treadstock_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./treadstock.db")).await?;
//! let tire = db.tires().get_by_sku("LLA-001").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::brand::BrandRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::normalized_type::NormalizedTypeRepository;
pub use repository::order::OrderRepository;
pub use repository::price::PriceRepository;
pub use repository::price_column::PriceColumnRepository;
pub use repository::price_level::PriceLevelRepository;
pub use repository::tire::TireRepository;
