//! # Transaction Reconciliation
//!
//! Replaces a booked transaction's header and line set, moving only the
//! stock difference.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    touch header                    (first write; TransactionNotFound)   │
//! │    load previous record, user, warehouse                                │
//! │    resolve items; apply name / unit edits                               │
//! │    write new header                                                     │
//! │    reconcile::plan(previous, new type, warehouse, lines)                │
//! │       └── apply_move for every move, in plan order                      │
//! │    upsert submitted lines, delete removed ones                          │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A removed line is reversed exactly once: its row is deleted in the same
//! unit of work that hands its stock back.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::info;

use super::{apply_move, finish, load_item, load_user, resolve_warehouse, returned_at_for, StockLedger};
use crate::error::{DbError, DbResult};
use crate::repository::{generate_id, item, transaction};
use stockledger_core::reconcile::{plan, PlannedLine};
use stockledger_core::validation::{validate_transaction_update, validate_uuid};
use stockledger_core::{
    CoreError, Item, Transaction, TransactionLine, TransactionRecord, TransactionUpdate,
};

impl StockLedger {
    /// Rewrites transaction `transaction_id` to match `request`.
    ///
    /// The code and creation time are kept. Balances end up as if the
    /// transaction had been booked with the new content from the start.
    pub async fn update_transaction(
        &self,
        transaction_id: &str,
        request: TransactionUpdate,
    ) -> DbResult<TransactionRecord> {
        validate_uuid(transaction_id)?;
        validate_transaction_update(&request)?;

        let mut tx = self.pool.begin().await?;
        let result = update_in(&mut tx, transaction_id, &request).await;
        let moves = finish(tx, result, "update_transaction").await?;

        let record = self.find_transaction(transaction_id).await?;
        info!(
            code = %record.transaction.code,
            transaction_type = %record.transaction.transaction_type,
            lines = record.lines.len(),
            moves,
            "Transaction updated"
        );

        Ok(record)
    }
}

/// Runs the update; returns the number of stock moves applied.
async fn update_in(
    conn: &mut SqliteConnection,
    transaction_id: &str,
    request: &TransactionUpdate,
) -> DbResult<usize> {
    let now = Utc::now();
    let not_found = || DbError::from(CoreError::TransactionNotFound(transaction_id.to_string()));

    if !transaction::touch(conn, transaction_id, now).await? {
        return Err(not_found());
    }
    let previous = transaction::find_record(conn, transaction_id)
        .await?
        .ok_or_else(not_found)?;

    let user = load_user(conn, &request.user_id).await?;
    let warehouse = resolve_warehouse(conn, &user, request.warehouse_id.as_deref()).await?;
    let ty = request.transaction_type;

    // Resolve items and apply catalogue edits carried on the lines.
    let mut items: HashMap<String, Item> = HashMap::new();
    let mut planned = Vec::with_capacity(request.lines.len());
    for submitted in &request.lines {
        let found = load_item(conn, &submitted.item_code).await?;

        if let Some(name) = &submitted.name {
            if name.trim() != found.name {
                item::rename(conn, &found.id, name, now).await?;
            }
        }
        if let Some(unit_id) = &submitted.unit_id {
            if item::find_unit(conn, unit_id).await?.is_none() {
                return Err(CoreError::UnitNotFound(unit_id.clone()).into());
            }
            item::set_unit(conn, &found.id, unit_id, now).await?;
        }

        planned.push(PlannedLine {
            item_id: found.id.clone(),
            quantity: submitted.quantity,
        });
        items.insert(found.id.clone(), found);
    }

    let header = Transaction {
        transaction_type: ty,
        transaction_date: request.transaction_date,
        description: request.description.clone(),
        user_id: user.id.clone(),
        warehouse_id: warehouse.id.clone(),
        updated_at: now,
        ..previous.transaction.clone()
    };
    transaction::update_header(conn, &header).await?;

    let stock_plan = plan(&previous, ty, &warehouse.id, &planned);
    for mv in &stock_plan.moves {
        if !items.contains_key(&mv.item_id) {
            // Removed lines reference items the request no longer names.
            let removed = item::find_by_id(conn, &mv.item_id)
                .await?
                .ok_or_else(|| CoreError::ItemNotFound(mv.item_id.clone()))?;
            items.insert(removed.id.clone(), removed);
        }
        if let Some(target) = items.get(&mv.item_id) {
            apply_move(conn, target, mv, now).await?;
        }
    }

    for (submitted, line) in request.lines.iter().zip(&planned) {
        match previous.line_for(&line.item_id) {
            Some(old) => {
                let updated = TransactionLine {
                    warehouse_id: warehouse.id.clone(),
                    quantity: line.quantity,
                    returned_at: returned_at_for(ty, old.returned_at, now),
                    description: submitted.description.clone().or_else(|| old.description.clone()),
                    updated_at: now,
                    ..old.clone()
                };
                transaction::update_line(conn, &updated).await?;
            }
            None => {
                let inserted = TransactionLine {
                    id: generate_id(),
                    transaction_id: transaction_id.to_string(),
                    item_id: line.item_id.clone(),
                    warehouse_id: warehouse.id.clone(),
                    quantity: line.quantity,
                    returned_at: returned_at_for(ty, None, now),
                    description: submitted.description.clone(),
                    created_at: now,
                    updated_at: now,
                };
                transaction::insert_line(conn, &inserted).await?;
            }
        }
    }

    for line_id in &stock_plan.removed_line_ids {
        transaction::delete_line(conn, line_id).await?;
    }

    Ok(stock_plan.moves.len())
}

// =============================================================================
// Unit Tests
// =============================================================================
