//! # Domain Types
//!
//! Core domain types used throughout Stockledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │  StockBalance   │   │   Transaction   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  item_id  ┐ key │   │  id (UUID)      │       │
//! │  │  code (barcode) │   │  warehouse┘     │   │  code TRX-...   │       │
//! │  │  category       │   │  available      │   │  type           │       │
//! │  │  unit_id        │   │  borrowed       │   │  lines ──┐      │       │
//! │  └─────────────────┘   │  under_maint.   │   └──────────┼──────┘       │
//! │                        └─────────────────┘              ▼               │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ TransactionType │   │  ItemCategory   │   │ TransactionLine │       │
//! │  │  IN  OUT        │   │  Consumable     │   │  item, qty      │       │
//! │  │  BORROW RETURN  │   │  Asset          │   │  warehouse      │       │
//! │  │  MAINTENANCE(_R)│   └─────────────────┘   │  returned_at    │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (item code, transaction code) - human-readable

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Transaction Type
// =============================================================================

/// The kind of stock movement a transaction records.
///
/// Closed set: the pool-delta rule for each variant lives in
/// [`crate::ledger::POOL_DELTAS`], the code prefix in [`crate::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Goods received into the warehouse.
    In,
    /// Goods leaving the warehouse for good.
    Out,
    /// Asset lent out.
    Borrow,
    /// Borrowed asset handed back.
    Return,
    /// Asset sent to maintenance.
    Maintenance,
    /// Asset back from maintenance.
    MaintenanceReturn,
}

impl TransactionType {
    /// Every transaction type, in table order.
    pub const ALL: [TransactionType; 6] = [
        TransactionType::In,
        TransactionType::Out,
        TransactionType::Borrow,
        TransactionType::Return,
        TransactionType::Maintenance,
        TransactionType::MaintenanceReturn,
    ];

    /// Stable storage / wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            TransactionType::In => "IN",
            TransactionType::Out => "OUT",
            TransactionType::Borrow => "BORROW",
            TransactionType::Return => "RETURN",
            TransactionType::Maintenance => "MAINTENANCE",
            TransactionType::MaintenanceReturn => "MAINTENANCE_RETURN",
        }
    }

    /// Row index into the per-type lookup tables.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        TransactionType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == normalized)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "transaction_type".to_string(),
                allowed: TransactionType::ALL
                    .iter()
                    .map(|ty| ty.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Item Category
// =============================================================================

/// Item category; decides which transaction types an item admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    /// Used up: can only come in and go out.
    Consumable,
    /// Tracked equipment: lent, returned and maintained.
    Asset,
}

impl ItemCategory {
    /// Transaction types this category admits.
    pub const fn admitted_types(self) -> &'static [TransactionType] {
        match self {
            ItemCategory::Consumable => &[TransactionType::In, TransactionType::Out],
            ItemCategory::Asset => &[
                TransactionType::In,
                TransactionType::Borrow,
                TransactionType::Return,
                TransactionType::Maintenance,
                TransactionType::MaintenanceReturn,
            ],
        }
    }

    /// Checks whether `ty` is legal for items of this category.
    pub fn admits(self, ty: TransactionType) -> bool {
        self.admitted_types().contains(&ty)
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemCategory::Consumable => f.write_str("consumable"),
            ItemCategory::Asset => f.write_str("asset"),
        }
    }
}

// =============================================================================
// Stock Pool
// =============================================================================

/// One of the three per-(item, warehouse) counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pool {
    Available,
    Borrowed,
    UnderMaintenance,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pool::Available => f.write_str("available"),
            Pool::Borrowed => f.write_str("borrowed"),
            Pool::UnderMaintenance => f.write_str("under_maintenance"),
        }
    }
}

// =============================================================================
// Role / User / Warehouse / Unit
// =============================================================================

/// Role of an acting user, as resolved by the caller's auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Elevated: may act without a bound warehouse.
    Superadmin,
    /// Bound to the warehouse they own.
    Operator,
}

impl Role {
    #[inline]
    pub const fn is_elevated(self) -> bool {
        matches!(self, Role::Superadmin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Warehouse {
    pub id: String,
    pub name: String,
    /// Owning user; `None` for warehouses only elevated users act on.
    pub owner_id: Option<String>,
}

/// Unit of measure ("pcs", "box", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Unit {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Item
// =============================================================================

/// A physical item kind tracked by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business identifier, printed as the barcode.
    pub code: String,

    /// Display name.
    pub name: String,

    pub category: ItemCategory,

    /// Unit of measure reference.
    pub unit_id: Option<String>,

    /// Stored image reference for the scan front end.
    pub image_path: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Balance
// =============================================================================

/// Per-(item, warehouse) stock counters. All three are always >= 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockBalance {
    pub item_id: String,
    pub warehouse_id: String,
    pub available: i64,
    pub borrowed: i64,
    pub under_maintenance: i64,
}

impl StockBalance {
    /// Zero-initialised balance, as created on first movement.
    pub fn empty(item_id: impl Into<String>, warehouse_id: impl Into<String>) -> Self {
        StockBalance {
            item_id: item_id.into(),
            warehouse_id: warehouse_id.into(),
            available: 0,
            borrowed: 0,
            under_maintenance: 0,
        }
    }

    /// Reads one pool counter.
    #[inline]
    pub fn get(&self, pool: Pool) -> i64 {
        match pool {
            Pool::Available => self.available,
            Pool::Borrowed => self.borrowed,
            Pool::UnderMaintenance => self.under_maintenance,
        }
    }
}

// =============================================================================
// Transaction / Transaction Line
// =============================================================================

/// Transaction header.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub transaction_type: TransactionType,
    /// Generated code, e.g. `TRX-PJM-004`.
    pub code: String,
    #[ts(as = "String")]
    pub transaction_date: DateTime<Utc>,
    pub description: Option<String>,
    /// Owning user.
    pub user_id: String,
    /// Warehouse resolved for the owning user.
    pub warehouse_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One item + quantity entry in a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionLine {
    pub id: String,
    pub transaction_id: String,
    pub item_id: String,
    pub warehouse_id: String,
    /// Always positive.
    pub quantity: i64,
    /// Set only on RETURN lines.
    #[ts(as = "Option<String>")]
    pub returned_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A transaction header together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionRecord {
    pub transaction: Transaction,
    pub lines: Vec<TransactionLine>,
}

impl TransactionRecord {
    /// Finds the line booked for `item_id`.
    pub fn line_for(&self, item_id: &str) -> Option<&TransactionLine> {
        self.lines.iter().find(|line| line.item_id == item_id)
    }
}

// =============================================================================
// Requests
// =============================================================================

/// A submitted line of a new transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLine {
    pub item_code: String,
    pub quantity: i64,
    #[serde(default)]
    pub description: Option<String>,
}

/// `CreateTransaction` input. The acting user is passed separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub description: Option<String>,
    /// Explicit warehouse; honoured for elevated users only.
    #[serde(default)]
    pub warehouse_id: Option<String>,
    pub lines: Vec<NewLine>,
}

/// A submitted line of an updated transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineUpdate {
    pub item_code: String,
    pub quantity: i64,
    /// New display name for the item.
    #[serde(default)]
    pub name: Option<String>,
    /// New unit of measure for the item.
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// `UpdateTransaction` input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionUpdate {
    pub transaction_type: TransactionType,
    pub transaction_date: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    /// Acting user; becomes the transaction's owner.
    pub user_id: String,
    #[serde(default)]
    pub warehouse_id: Option<String>,
    pub lines: Vec<LineUpdate>,
}

// =============================================================================
// Item Attribute Override
// =============================================================================

/// Administrative override of a single item attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ItemAttribute {
    /// Replaces the `available` pool of one warehouse balance.
    Stock(i64),
    /// Replaces the item's display name.
    Name(String),
}

impl ItemAttribute {
    /// Parses a `(field, value)` pair as submitted by a form.
    pub fn parse(field: &str, value: &str) -> Result<Self, ValidationError> {
        match field.trim().to_ascii_lowercase().as_str() {
            "stock" => value
                .trim()
                .parse::<i64>()
                .map(ItemAttribute::Stock)
                .map_err(|_| ValidationError::InvalidFormat {
                    field: "stock".to_string(),
                    reason: "must be an integer".to_string(),
                }),
            "name" => Ok(ItemAttribute::Name(value.to_string())),
            _ => Err(ValidationError::NotAllowed {
                field: "field".to_string(),
                allowed: vec!["stock".to_string(), "name".to_string()],
            }),
        }
    }
}

/// Result of an [`ItemAttribute`] override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeChange {
    pub item_id: String,
    pub warehouse_id: String,
    pub attribute: ItemAttribute,
}

// =============================================================================
// Lookup Projection
// =============================================================================

/// Read-only item projection served to the barcode scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemLookup {
    pub code: String,
    pub name: String,
    pub category: ItemCategory,
    /// `available` in the caller's warehouse; 0 without a balance row.
    pub available_stock: i64,
    pub image_path: Option<String>,
    pub unit_name: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
