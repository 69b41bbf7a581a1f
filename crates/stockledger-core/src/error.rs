//! # Error Types
//!
//! Domain-specific error types for stockledger-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockledger-core errors (this file)                                   │
//! │  ├── CoreError        - Ledger rule violations, missing entities       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockledger-db errors (separate crate)                                │
//! │  └── DbError          - Database failures, wraps CoreError            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller's transport      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is an expected, local condition. None is retried here;
//! callers map [`CoreError::code`] onto their own status codes.

use thiserror::Error;

use crate::types::{ItemCategory, Pool, TransactionType};

// =============================================================================
// Core Error
// =============================================================================

/// Ledger errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No item with this code (or id).
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// No transaction with this id.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// No warehouse with this id.
    #[error("Warehouse not found: {0}")]
    WarehouseNotFound(String),

    /// No user with this id.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// No unit of measure with this id.
    #[error("Unit not found: {0}")]
    UnitNotFound(String),

    /// The acting user owns no warehouse and none could be resolved.
    ///
    /// ## When This Occurs
    /// - Operator without a bound warehouse
    /// - Superadmin without a bound warehouse who passed no explicit one
    #[error("No warehouse assigned to user {user_id}")]
    NoWarehouseAssigned { user_id: String },

    /// A non-elevated user tried to act on a warehouse they do not own.
    #[error("User {user_id} may not act on warehouse {warehouse_id}")]
    WarehouseAccessDenied {
        user_id: String,
        warehouse_id: String,
    },

    /// The item's category does not admit this transaction type.
    #[error("Transaction type {transaction_type} is not valid for {category} item {item_code}")]
    InvalidTransactionType {
        item_code: String,
        category: ItemCategory,
        transaction_type: TransactionType,
    },

    /// Not enough `available` stock for OUT, BORROW or MAINTENANCE.
    ///
    /// ## User Workflow
    /// ```text
    /// OUT (qty: 5)
    ///      │
    ///      ▼
    /// Check balance: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { item_code: "CBL-01", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {item_code}: available {available}, requested {requested}")]
    InsufficientStock {
        item_code: String,
        available: i64,
        requested: i64,
    },

    /// RETURN of more units than are currently borrowed.
    #[error("Cannot return {requested} of {item_code}: only {borrowed} borrowed")]
    OverReturn {
        item_code: String,
        borrowed: i64,
        requested: i64,
    },

    /// MAINTENANCE_RETURN of more units than are under maintenance.
    #[error(
        "Insufficient maintenance stock for {item_code}: under maintenance {under_maintenance}, requested {requested}"
    )]
    InsufficientMaintenanceStock {
        item_code: String,
        under_maintenance: i64,
        requested: i64,
    },

    /// Direct stock override below zero.
    #[error("Stock cannot be negative: {value}")]
    NegativeValueRejected { value: i64 },

    /// Applying a signed delta would drive a pool below zero.
    ///
    /// ## When This Occurs
    /// - Reversing an IN line whose units already left the warehouse
    /// - A concurrent writer consumed the stock between check and write
    #[error("{pool} stock would go negative: current {current}, change {change}")]
    StockUnderflow { pool: Pool, current: i64, change: i64 },

    /// Applying a signed delta would push a pool past
    /// [`crate::MAX_POOL_LEVEL`].
    #[error("{pool} stock would exceed its limit: current {current}, change {change}")]
    StockOverflow { pool: Pool, current: i64, change: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Machine-readable error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::ItemNotFound(_)
            | CoreError::TransactionNotFound(_)
            | CoreError::WarehouseNotFound(_)
            | CoreError::UserNotFound(_)
            | CoreError::UnitNotFound(_) => "NOT_FOUND",
            CoreError::NoWarehouseAssigned { .. } => "NO_WAREHOUSE_ASSIGNED",
            CoreError::WarehouseAccessDenied { .. } => "FORBIDDEN",
            CoreError::InvalidTransactionType { .. } => "INVALID_TRANSACTION_TYPE",
            CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CoreError::OverReturn { .. } => "OVER_RETURN",
            CoreError::InsufficientMaintenanceStock { .. } => "INSUFFICIENT_MAINTENANCE_STOCK",
            CoreError::NegativeValueRejected { .. } => "NEGATIVE_VALUE_REJECTED",
            CoreError::StockUnderflow { .. } => "STOCK_UNDERFLOW",
            CoreError::StockOverflow { .. } => "STOCK_OVERFLOW",
            CoreError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a request doesn't meet shape requirements.
/// They are raised before any ledger rule runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value exceeds its upper bound.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: i64 },

    /// Invalid format (e.g., invalid UUID, non-numeric stock).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., the same item twice in one transaction).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item_code: "CBL-01".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for CBL-01: available 3, requested 5"
        );

        let err = CoreError::InvalidTransactionType {
            item_code: "PAPER-A4".to_string(),
            category: ItemCategory::Consumable,
            transaction_type: TransactionType::Borrow,
        };
        assert_eq!(
            err.to_string(),
            "Transaction type BORROW is not valid for consumable item PAPER-A4"
        );

        let err = CoreError::StockUnderflow {
            pool: Pool::Borrowed,
            current: 1,
            change: -4,
        };
        assert_eq!(
            err.to_string(),
            "borrowed stock would go negative: current 1, change -4"
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CoreError::ItemNotFound("X".into()).code(), "NOT_FOUND");
        assert_eq!(
            CoreError::OverReturn {
                item_code: "X".into(),
                borrowed: 0,
                requested: 1
            }
            .code(),
            "OVER_RETURN"
        );
        assert_eq!(
            CoreError::NegativeValueRejected { value: -1 }.code(),
            "NEGATIVE_VALUE_REJECTED"
        );
        assert_eq!(
            CoreError::StockOverflow {
                pool: Pool::Available,
                current: 1,
                change: 1
            }
            .code(),
            "STOCK_OVERFLOW"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "item_code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.code(), "VALIDATION_ERROR");
    }
}
