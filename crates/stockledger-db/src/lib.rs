//! # stockledger-db: Storage Layer for Stockledger
//!
//! This crate runs the stock ledger against SQLite. It owns the schema, the
//! repositories, and the units of work that keep stock balances and the
//! transaction history in lock-step.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockledger Data Flow                            │
//! │                                                                         │
//! │  Caller (web handler, scanner endpoint, seed binary)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockledger-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  StockLedger  │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (ledger/)    │    │ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ create        │───►│ item, user    │    │ 001_initial  │  │   │
//! │  │   │ update        │    │ warehouse     │    │              │  │   │
//! │  │   │ override      │    │ balance       │    │              │  │   │
//! │  │   │ lookup        │    │ transaction   │    │              │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │ rules, ledger arithmetic, reconcile planning        │   │
//! │  │           ▼                                                     │   │
//! │  │   stockledger-core (pure)                                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - File and environment configuration
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage error types
//! - [`repository`] - Repository implementations (item, balance, etc.)
//! - [`ledger`] - The stock ledger's units of work
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockledger_db::{Database, LedgerConfig};
//!
//! let config = LedgerConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let record = db.ledger().create_transaction(&user_id, request).await?;
//! let scanned = db.ledger().lookup("PRJ-EPSON-01", Some(&user_id)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, LedgerConfig};
pub use error::{DbError, DbResult};
pub use ledger::StockLedger;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::balance::BalanceRepository;
pub use repository::item::ItemRepository;
pub use repository::transaction::TransactionRepository;
pub use repository::user::UserRepository;
pub use repository::warehouse::WarehouseRepository;
