//! # Transaction Codes
//!
//! Formatting half of the code generator. The ordinal comes from the
//! per-type counter in storage; this module only knows how to print it.
//!
//! ```text
//!   TRX - PJM - 004
//!    │     │     └── per-type ordinal, zero-padded to 3 digits
//!    │     └──────── per-type prefix
//!    └────────────── fixed marker
//! ```

use crate::types::TransactionType;

/// Marker every transaction code starts with.
pub const CODE_MARKER: &str = "TRX";

/// Prefix used for type names this build does not recognise.
pub const UNKNOWN_PREFIX: &str = "UNK";

/// Three-letter prefix for a transaction type.
pub const fn prefix(ty: TransactionType) -> &'static str {
    match ty {
        TransactionType::In => "MSK",
        TransactionType::Out => "KLR",
        TransactionType::Borrow => "PJM",
        TransactionType::Return => "KMB",
        TransactionType::Maintenance => "MTC",
        TransactionType::MaintenanceReturn => "FIX",
    }
}

/// Prefix for a raw type name as stored, falling back to [`UNKNOWN_PREFIX`].
///
/// Code generation itself goes through [`prefix`] with a parsed
/// [`TransactionType`], so the fallback is never hit there. This is for
/// type strings that arrive unparsed, such as legacy rows or imports
/// written before a type existed in this build.
///
/// ## Example
/// ```rust
/// use stockledger_core::code::code_prefix;
///
/// assert_eq!(code_prefix("BORROW"), "PJM");
/// assert_eq!(code_prefix("TRANSFER"), "UNK");
/// ```
pub fn code_prefix(raw: &str) -> &'static str {
    raw.parse::<TransactionType>()
        .map(prefix)
        .unwrap_or(UNKNOWN_PREFIX)
}

/// Formats a code from a type and its ordinal.
///
/// ## Example
/// ```rust
/// use stockledger_core::code::format_transaction_code;
/// use stockledger_core::TransactionType;
///
/// assert_eq!(format_transaction_code(TransactionType::Borrow, 4), "TRX-PJM-004");
/// ```
pub fn format_transaction_code(ty: TransactionType, ordinal: i64) -> String {
    format!("{}-{}-{:03}", CODE_MARKER, prefix(ty), ordinal)
}
