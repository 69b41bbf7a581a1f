//! # Repository Module
//!
//! Database repository implementations for Stockledger.
//!
//! ## Two Ways In
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Standalone reads / reference data          Units of work               │
//! │  ─────────────────────────────────          ─────────────               │
//! │  db.items().get_by_code("CBL-01")           let mut tx = pool.begin()   │
//! │       │                                     item::find_by_code(         │
//! │       │  acquires a pooled connection           &mut *tx, "CBL-01")     │
//! │       ▼                                     balance::apply_change(...)  │
//! │  module-level fn(&mut SqliteConnection)  ◄──       │                    │
//! │                                                    ▼                    │
//! │                                             tx.commit()                 │
//! │                                                                         │
//! │  Every statement lives once, in a module-level function taking a       │
//! │  connection. Repository structs wrap them for pool-level callers;      │
//! │  the ledger calls them directly on its open transaction.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ItemRepository`](item::ItemRepository) - Items, units, scan lookup rows
//! - [`UserRepository`](user::UserRepository) - Acting users
//! - [`WarehouseRepository`](warehouse::WarehouseRepository) - Warehouses and ownership
//! - [`BalanceRepository`](balance::BalanceRepository) - Per-warehouse stock pools
//! - [`TransactionRepository`](transaction::TransactionRepository) - Headers,
//!   lines and code sequences

pub mod balance;
pub mod item;
pub mod transaction;
pub mod user;
pub mod warehouse;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
