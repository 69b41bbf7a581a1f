//! # Stock Balance Repository
//!
//! Per-(item, warehouse) pool counters.
//!
//! ## Atomic Pool Change
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE stock_balances                                                  │
//! │     SET available = available + Δa, borrowed = borrowed + Δb, ...       │
//! │   WHERE item_id = ? AND warehouse_id = ?                                │
//! │     AND available + Δa BETWEEN 0 AND max AND ...                        │
//! │  RETURNING the new counters                                             │
//! │                                                                         │
//! │  row returned   → change applied                                        │
//! │  no row         → a pool would leave [0, max] (or no row): no write     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are created lazily with zero counters and never deleted.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockledger_core::{PoolDelta, StockBalance, MAX_POOL_LEVEL};

const BALANCE_COLUMNS: &str = "item_id, warehouse_id, available, borrowed, under_maintenance";

/// Repository for stock balance reads.
///
/// Writes only happen inside ledger units of work.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    pool: SqlitePool,
}

impl BalanceRepository {
    /// Creates a new BalanceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BalanceRepository { pool }
    }

    /// Gets the balance row for an item in a warehouse.
    pub async fn get(&self, item_id: &str, warehouse_id: &str) -> DbResult<Option<StockBalance>> {
        let mut conn = self.pool.acquire().await?;
        find(&mut conn, item_id, warehouse_id).await
    }

    /// All balance rows of one warehouse.
    pub async fn list_for_warehouse(&self, warehouse_id: &str) -> DbResult<Vec<StockBalance>> {
        let balances = sqlx::query_as::<_, StockBalance>(&format!(
            "SELECT {BALANCE_COLUMNS} FROM stock_balances WHERE warehouse_id = ?1 ORDER BY item_id"
        ))
        .bind(warehouse_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(balances)
    }
}

// =============================================================================
// Connection-level Statements
// =============================================================================

pub(crate) async fn find(
    conn: &mut SqliteConnection,
    item_id: &str,
    warehouse_id: &str,
) -> DbResult<Option<StockBalance>> {
    let balance = sqlx::query_as::<_, StockBalance>(&format!(
        "SELECT {BALANCE_COLUMNS} FROM stock_balances WHERE item_id = ?1 AND warehouse_id = ?2"
    ))
    .bind(item_id)
    .bind(warehouse_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(balance)
}

/// Creates the zero row if it does not exist yet.
pub(crate) async fn ensure(
    conn: &mut SqliteConnection,
    item_id: &str,
    warehouse_id: &str,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO stock_balances (item_id, warehouse_id, available, borrowed, under_maintenance, updated_at)
        VALUES (?1, ?2, 0, 0, 0, ?3)
        ON CONFLICT (item_id, warehouse_id) DO NOTHING
        "#,
    )
    .bind(item_id)
    .bind(warehouse_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        debug!(item_id = %item_id, warehouse_id = %warehouse_id, "Created stock balance row");
    }

    Ok(())
}

/// Adds `change` to the row if every pool stays within
/// `0..=MAX_POOL_LEVEL`.
///
/// Returns the new counters, or `None` when nothing was written.
pub(crate) async fn apply_change(
    conn: &mut SqliteConnection,
    item_id: &str,
    warehouse_id: &str,
    change: PoolDelta,
    now: DateTime<Utc>,
) -> DbResult<Option<StockBalance>> {
    debug!(
        item_id = %item_id,
        warehouse_id = %warehouse_id,
        available = change.available,
        borrowed = change.borrowed,
        under_maintenance = change.under_maintenance,
        "Applying pool change"
    );

    let balance = sqlx::query_as::<_, StockBalance>(
        r#"
        UPDATE stock_balances SET
            available = available + ?3,
            borrowed = borrowed + ?4,
            under_maintenance = under_maintenance + ?5,
            updated_at = ?6
        WHERE item_id = ?1 AND warehouse_id = ?2
          AND available + ?3 BETWEEN 0 AND ?7
          AND borrowed + ?4 BETWEEN 0 AND ?7
          AND under_maintenance + ?5 BETWEEN 0 AND ?7
        RETURNING item_id, warehouse_id, available, borrowed, under_maintenance
        "#,
    )
    .bind(item_id)
    .bind(warehouse_id)
    .bind(change.available)
    .bind(change.borrowed)
    .bind(change.under_maintenance)
    .bind(now)
    .bind(MAX_POOL_LEVEL)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(balance)
}

/// Overwrites the `available` pool. The row must exist.
pub(crate) async fn set_available(
    conn: &mut SqliteConnection,
    item_id: &str,
    warehouse_id: &str,
    available: i64,
    now: DateTime<Utc>,
) -> DbResult<StockBalance> {
    debug!(item_id = %item_id, warehouse_id = %warehouse_id, available, "Overriding available stock");

    let balance = sqlx::query_as::<_, StockBalance>(
        r#"
        UPDATE stock_balances SET available = ?3, updated_at = ?4
        WHERE item_id = ?1 AND warehouse_id = ?2
        RETURNING item_id, warehouse_id, available, borrowed, under_maintenance
        "#,
    )
    .bind(item_id)
    .bind(warehouse_id)
    .bind(available)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(balance)
}
