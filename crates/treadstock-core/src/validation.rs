//! # Validation Module
//!
//! Input validation for commands entering the catalog and order services.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation (external HTTP handlers)                        │
//! │  ├── Type validation (deserialization into closed enums)               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use treadstock_core::validation::validate_sku;
///
/// assert!(validate_sku("LLA-20555R16").is_ok());
/// assert!(validate_sku("").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid_format(
            "sku",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Validates and canonicalizes a price column code.
///
/// ## Rules
/// - Must not be empty
/// - Letters, digits and underscores only (no spaces, no hyphens)
/// - Stored lowercase
///
/// ## Returns
/// The trimmed, lowercased code.
pub fn validate_column_code(field: &str, code: &str) -> ValidationResult<String> {
    let code = code.trim().to_lowercase();

    if code.is_empty() {
        return Err(ValidationError::required(field));
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::invalid_format(
            field,
            "must contain only letters, numbers and underscores, without spaces",
        ));
    }

    Ok(code)
}

/// Validates a display name (columns, levels).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a visual order position (must be zero or positive).
pub fn validate_visual_order(visual_order: i64) -> ValidationResult<()> {
    if visual_order < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "visual_order".to_string(),
        });
    }
    Ok(())
}

/// Validates an order item / ledger quantity (must be strictly positive).
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
