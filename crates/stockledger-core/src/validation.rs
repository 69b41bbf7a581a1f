//! # Validation Module
//!
//! Request-shape validation for Stockledger.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (HTTP schema, out of scope)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - request shape                                  │
//! │  ├── lines present, quantities positive                                │
//! │  ├── text lengths                                                      │
//! │  └── one line per item                                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: rules module - ledger rules against balances                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: SQLite CHECK / UNIQUE / FOREIGN KEY constraints              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{NewTransaction, TransactionUpdate};
use crate::{
    MAX_ITEM_CODE_LEN, MAX_ITEM_NAME_LEN, MAX_LINE_DESCRIPTION_LEN, MAX_LINE_QUANTITY,
    MAX_POOL_LEVEL, MAX_TRANSACTION_DESCRIPTION_LEN,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item code (the scanned barcode).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - No whitespace
///
/// ## Example
/// ```rust
/// use stockledger_core::validation::validate_item_code;
///
/// assert!(validate_item_code("PRJ-EPSON-01").is_ok());
/// assert!(validate_item_code("").is_err());
/// assert!(validate_item_code("has space").is_err());
/// ```
pub fn validate_item_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "item_code".to_string(),
        });
    }

    if code.len() > MAX_ITEM_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "item_code".to_string(),
            max: MAX_ITEM_CODE_LEN,
        });
    }

    if code.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "item_code".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

/// Validates an item display name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_ITEM_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_ITEM_NAME_LEN,
        });
    }

    Ok(())
}

fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(text) if text.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - At most [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::TooLarge {
            field: "quantity".to_string(),
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Upper bound for a directly overridden stock level.
///
/// Negative values are a ledger rule (`NegativeValueRejected`), not a
/// shape error, and pass here.
pub fn validate_stock_level(value: i64) -> ValidationResult<()> {
    if value > MAX_POOL_LEVEL {
        return Err(ValidationError::TooLarge {
            field: "stock".to_string(),
            max: MAX_POOL_LEVEL,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use stockledger_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a submitted line set: non-empty, valid codes and quantities,
/// one line per item.
fn validate_lines<'a>(
    lines: impl ExactSizeIterator<Item = (&'a str, i64, Option<&'a str>)>,
) -> ValidationResult<()> {
    if lines.len() == 0 {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for (code, quantity, description) in lines {
        validate_item_code(code)?;
        validate_quantity(quantity)?;
        validate_optional_text("line description", description, MAX_LINE_DESCRIPTION_LEN)?;

        if !seen.insert(code.trim()) {
            return Err(ValidationError::Duplicate {
                field: "item_code".to_string(),
                value: code.trim().to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a `CreateTransaction` request before any ledger rule runs.
pub fn validate_new_transaction(request: &NewTransaction) -> ValidationResult<()> {
    validate_optional_text(
        "description",
        request.description.as_deref(),
        MAX_TRANSACTION_DESCRIPTION_LEN,
    )?;

    validate_lines(
        request
            .lines
            .iter()
            .map(|line| (line.item_code.as_str(), line.quantity, line.description.as_deref())),
    )
}

/// Validates an `UpdateTransaction` request before any ledger rule runs.
pub fn validate_transaction_update(request: &TransactionUpdate) -> ValidationResult<()> {
    if request.user_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "user_id".to_string(),
        });
    }

    validate_optional_text(
        "description",
        request.description.as_deref(),
        MAX_TRANSACTION_DESCRIPTION_LEN,
    )?;

    for line in &request.lines {
        if let Some(name) = &line.name {
            validate_item_name(name)?;
        }
    }

    validate_lines(
        request
            .lines
            .iter()
            .map(|line| (line.item_code.as_str(), line.quantity, line.description.as_deref())),
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
