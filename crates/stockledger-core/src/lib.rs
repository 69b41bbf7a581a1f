//! # stockledger-core: Pure Ledger Rules for Stockledger
//!
//! This crate holds the stock ledger's rules as pure functions with zero
//! I/O dependencies: how each transaction type moves stock between pools,
//! which movements are legal, how codes look, and how an edited
//! transaction turns into stock moves.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockledger Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             Caller (HTTP, auth, scan front end)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            stockledger-db :: StockLedger service                │   │
//! │  │   create_transaction, update_transaction, lookup, overrides     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ stockledger-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────┐ │   │
//! │  │   │  ledger  │ │  rules   │ │reconcile │ │validation│ │ code │ │   │
//! │  │   │  apply   │ │ category │ │  plan    │ │ requests │ │ TRX- │ │   │
//! │  │   │  deltas  │ │ suffic.  │ │  moves   │ │ lengths  │ │      │ │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘ └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK-DRIVEN SEQUENCING             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, StockBalance, Transaction, requests)
//! - [`ledger`] - Stock Mutation Engine: the pool-delta table and `apply`
//! - [`rules`] - Validation Engine: category and sufficiency checks,
//!   warehouse resolution
//! - [`reconcile`] - Plans the stock moves for an updated transaction
//! - [`code`] - Transaction code formatting
//! - [`validation`] - Request-shape validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stockledger_core::ledger::apply;
//! use stockledger_core::{StockBalance, TransactionType};
//!
//! let start = StockBalance {
//!     item_id: "item".to_string(),
//!     warehouse_id: "wh".to_string(),
//!     available: 10,
//!     borrowed: 0,
//!     under_maintenance: 0,
//! };
//!
//! let lent = apply(&start, TransactionType::Borrow, 4).unwrap();
//! assert_eq!((lent.available, lent.borrowed), (6, 4));
//!
//! let back = apply(&lent, TransactionType::Return, 4).unwrap();
//! assert_eq!(back, start);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod code;
pub mod error;
pub mod ledger;
pub mod reconcile;
pub mod rules;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::PoolDelta;
pub use reconcile::{MoveKind, StockMove};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest accepted item code.
pub const MAX_ITEM_CODE_LEN: usize = 50;

/// Longest accepted item display name.
pub const MAX_ITEM_NAME_LEN: usize = 200;

/// Longest accepted transaction description.
pub const MAX_TRANSACTION_DESCRIPTION_LEN: usize = 255;

/// Longest accepted line description.
pub const MAX_LINE_DESCRIPTION_LEN: usize = 500;

/// Largest quantity a single line may move.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000_000;

/// Ceiling for any one pool counter.
///
/// Keeps pool arithmetic inside SQLite's integer range (and inside the
/// exactly representable range of a REAL), so a counter never silently
/// turns into a float.
pub const MAX_POOL_LEVEL: i64 = 1_000_000_000_000_000;
