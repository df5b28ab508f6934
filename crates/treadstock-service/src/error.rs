//! # Service Error Type
//!
//! The caller-facing error taxonomy. Presentation handlers map variants to
//! HTTP statuses mechanically:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NotFound           → 404   tire / column / order / level absent       │
//! │  Validation         → 400   malformed command                          │
//! │  Conflict           → 409   duplicate column or level code             │
//! │  InvalidTransition  → 400   illegal order status change                │
//! │  Spreadsheet        → 500   export writer failure                      │
//! │  Db                 → 500   storage failure, propagated unchanged      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no automatic retry anywhere in this layer: a failed bulk upsert
//! mid-pagination leaves earlier pages committed and later pages
//! unprocessed, and the caller re-drives the operation.

use thiserror::Error;

use treadstock_core::{CoreError, OrderStatus, ValidationError};
use treadstock_db::DbError;

/// Errors returned by the application services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Entity not found (404).
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// Malformed command (400).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Uniqueness conflict, e.g. duplicate column code (409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Illegal order status change (400).
    #[error("Order cannot transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Spreadsheet writer failure during export (500).
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Storage failure, propagated unchanged (500).
    #[error(transparent)]
    Db(DbError),
}

impl ServiceError {
    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, key: impl std::fmt::Display) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            key: key.to_string(),
        }
    }

    /// Creates a Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    /// Creates a Conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ServiceError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ServiceError::Spreadsheet(err.to_string())
    }
}

/// Storage errors keep their taxonomy: row-missing surfaces as NotFound,
/// constraint hits as Conflict, everything else stays a storage failure.
impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::NotFound { entity, key: id },
            DbError::UniqueViolation { field } => {
                ServiceError::Conflict(format!("duplicate {field}"))
            }
            other => ServiceError::Db(other),
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidTransition { from, to } => {
                ServiceError::InvalidTransition { from, to }
            }
            CoreError::EmptyOrder => ServiceError::Validation(err.to_string()),
            CoreError::Validation(inner) => ServiceError::Validation(inner.to_string()),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
