//! # Transaction Orchestrator
//!
//! Books a new transaction and all its stock movements as one unit of work.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate request shape                                                 │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │       ├── next ordinal for type          (first write: takes the lock)  │
//! │       ├── load acting user, resolve warehouse                           │
//! │       ├── insert header   TRX-<PREFIX>-<NNN>                            │
//! │       └── for each line, in order:                                      │
//! │             item by code ─► apply_move(Apply, +q) ─► insert line        │
//! │  COMMIT   (any error: ROLLBACK, nothing observable)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::info;

use super::{apply_move, finish, load_item, load_user, resolve_warehouse, returned_at_for, StockLedger};
use crate::error::DbResult;
use crate::repository::{generate_id, transaction};
use stockledger_core::code::format_transaction_code;
use stockledger_core::validation::validate_new_transaction;
use stockledger_core::{
    MoveKind, NewTransaction, StockMove, Transaction, TransactionLine, TransactionRecord,
};

impl StockLedger {
    /// Creates a transaction on behalf of `user_id`.
    ///
    /// Lines are booked in submission order; the first failing line aborts
    /// the whole transaction.
    pub async fn create_transaction(
        &self,
        user_id: &str,
        request: NewTransaction,
    ) -> DbResult<TransactionRecord> {
        validate_new_transaction(&request)?;

        let mut tx = self.pool.begin().await?;
        let result = create_in(&mut tx, user_id, &request).await;
        let record = finish(tx, result, "create_transaction").await?;

        info!(
            code = %record.transaction.code,
            transaction_type = %record.transaction.transaction_type,
            warehouse_id = %record.transaction.warehouse_id,
            lines = record.lines.len(),
            "Transaction created"
        );

        Ok(record)
    }
}

async fn create_in(
    conn: &mut SqliteConnection,
    user_id: &str,
    request: &NewTransaction,
) -> DbResult<TransactionRecord> {
    let ty = request.transaction_type;
    let now = Utc::now();

    let ordinal = transaction::next_ordinal(conn, ty).await?;

    let user = load_user(conn, user_id).await?;
    let warehouse = resolve_warehouse(conn, &user, request.warehouse_id.as_deref()).await?;

    let header = Transaction {
        id: generate_id(),
        transaction_type: ty,
        code: format_transaction_code(ty, ordinal),
        transaction_date: now,
        description: request.description.clone(),
        user_id: user.id.clone(),
        warehouse_id: warehouse.id.clone(),
        created_at: now,
        updated_at: now,
    };
    transaction::insert_header(conn, &header).await?;

    let mut lines = Vec::with_capacity(request.lines.len());
    for submitted in &request.lines {
        let item = load_item(conn, &submitted.item_code).await?;

        let mv = StockMove {
            item_id: item.id.clone(),
            warehouse_id: warehouse.id.clone(),
            transaction_type: ty,
            delta: submitted.quantity,
            kind: MoveKind::Apply,
        };
        apply_move(conn, &item, &mv, now).await?;

        let line = TransactionLine {
            id: generate_id(),
            transaction_id: header.id.clone(),
            item_id: item.id,
            warehouse_id: warehouse.id.clone(),
            quantity: submitted.quantity,
            returned_at: returned_at_for(ty, None, now),
            description: submitted.description.clone(),
            created_at: now,
            updated_at: now,
        };
        transaction::insert_line(conn, &line).await?;
        lines.push(line);
    }

    Ok(TransactionRecord {
        transaction: header,
        lines,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
