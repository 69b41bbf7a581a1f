//! # Stock Ledger Service
//!
//! Runs the ledger's operations against SQLite, each as one database
//! transaction.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         StockLedger                                     │
//! │                                                                         │
//! │  create_transaction     (create.rs)     orchestrator                    │
//! │  update_transaction     (reconcile.rs)  reconciliation                  │
//! │  update_item_attribute  (this file)     administrative override         │
//! │  lookup                 (this file)     scanner projection, read-only   │
//! │  find_transaction       (this file)     header + lines, read-only       │
//! │                                                                         │
//! │  Every stock change goes through apply_move:                            │
//! │                                                                         │
//! │    ensure row ─► read ─► rules::check_delta ─► conditional UPDATE       │
//! │                                                  │                      │
//! │                               no row written ◄───┘                      │
//! │                               re-read, ledger::apply → precise error    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Lock Discipline
//! Each unit of work issues a write before its first read (sequence bump,
//! `updated_at` stamp). SQLite then holds its single write lock for the
//! rest of the unit, so two units touching the same balance never
//! interleave.

mod create;
mod reconcile;

#[cfg(test)]
pub(crate) mod test_support;

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{balance, item, transaction, user, warehouse};
use stockledger_core::ledger::apply;
use stockledger_core::rules::{check_delta, check_warehouse_access, resolve_acting_warehouse};
use stockledger_core::validation::{validate_item_name, validate_stock_level, validate_uuid};
use stockledger_core::{
    AttributeChange, CoreError, Item, ItemAttribute, ItemLookup, StockBalance, StockMove,
    TransactionRecord, TransactionType, User, Warehouse,
};

/// The stock ledger over one database pool.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    /// Creates a ledger over `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Loads a transaction with its lines.
    pub async fn find_transaction(&self, id: &str) -> DbResult<TransactionRecord> {
        validate_uuid(id)?;

        let mut conn = self.pool.acquire().await?;
        transaction::find_record(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()).into())
    }

    /// Scanner projection of an item.
    ///
    /// `available_stock` is read from the warehouse bound to `user_id`; it
    /// is 0 without a user, without a bound warehouse or without a balance
    /// row.
    pub async fn lookup(&self, item_code: &str, user_id: Option<&str>) -> DbResult<ItemLookup> {
        let mut conn = self.pool.acquire().await?;

        let row = item::find_with_unit(&mut conn, item_code)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(item_code.trim().to_string()))?;

        let bound = match user_id {
            Some(user_id) => warehouse::find_by_owner(&mut conn, user_id).await?,
            None => None,
        };

        let available_stock = match &bound {
            Some(wh) => balance::find(&mut conn, &row.id, &wh.id)
                .await?
                .map(|b| b.available)
                .unwrap_or(0),
            None => 0,
        };

        debug!(code = %row.code, available_stock, "Item lookup");

        Ok(ItemLookup {
            code: row.code,
            name: row.name,
            category: row.category,
            available_stock,
            image_path: row.image_path,
            unit_name: row.unit_name,
        })
    }

    /// Overrides one item attribute directly, outside the transaction rules.
    ///
    /// `Stock` replaces the `available` pool of the item's balance in
    /// `warehouse_id`; `Name` renames the item. Non-elevated actors must own
    /// the warehouse.
    pub async fn update_item_attribute(
        &self,
        item_id: &str,
        attribute: ItemAttribute,
        actor_id: &str,
        warehouse_id: &str,
    ) -> DbResult<AttributeChange> {
        match &attribute {
            ItemAttribute::Name(name) => validate_item_name(name)?,
            ItemAttribute::Stock(value) => validate_stock_level(*value)?,
        }

        let mut tx = self.pool.begin().await?;
        let result = override_attribute(&mut tx, item_id, &attribute, actor_id, warehouse_id).await;
        finish(tx, result, "update_item_attribute").await?;

        info!(
            item_id = %item_id,
            warehouse_id = %warehouse_id,
            attribute = ?attribute,
            "Item attribute overridden"
        );

        Ok(AttributeChange {
            item_id: item_id.to_string(),
            warehouse_id: warehouse_id.to_string(),
            attribute,
        })
    }
}

async fn override_attribute(
    conn: &mut SqliteConnection,
    item_id: &str,
    attribute: &ItemAttribute,
    actor_id: &str,
    warehouse_id: &str,
) -> DbResult<()> {
    let now = Utc::now();

    if !item::touch(conn, item_id, now).await? {
        return Err(CoreError::ItemNotFound(item_id.to_string()).into());
    }

    let target = warehouse::find(conn, warehouse_id)
        .await?
        .ok_or_else(|| CoreError::WarehouseNotFound(warehouse_id.to_string()))?;
    let actor = load_user(conn, actor_id).await?;
    check_warehouse_access(&actor, &target)?;

    match attribute {
        ItemAttribute::Stock(value) => {
            if *value < 0 {
                return Err(CoreError::NegativeValueRejected { value: *value }.into());
            }
            balance::ensure(conn, item_id, &target.id, now).await?;
            balance::set_available(conn, item_id, &target.id, *value, now).await?;
        }
        ItemAttribute::Name(name) => {
            item::rename(conn, item_id, name, now).await?;
        }
    }

    Ok(())
}

// =============================================================================
// Shared Unit-of-Work Steps
// =============================================================================

/// Commits on success, rolls back and logs on failure.
async fn finish<T>(
    tx: sqlx::Transaction<'_, Sqlite>,
    result: DbResult<T>,
    operation: &'static str,
) -> DbResult<T> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            Ok(value)
        }
        Err(err) => {
            warn!(operation, code = err.code(), error = %err, "Unit of work rolled back");
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            Err(err)
        }
    }
}

async fn load_user(conn: &mut SqliteConnection, user_id: &str) -> DbResult<User> {
    user::find(conn, user_id)
        .await?
        .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()).into())
}

async fn load_item(conn: &mut SqliteConnection, item_code: &str) -> DbResult<Item> {
    item::find_by_code(conn, item_code)
        .await?
        .ok_or_else(|| CoreError::ItemNotFound(item_code.trim().to_string()).into())
}

/// Warehouse `user` acts on, given an optional explicit choice.
async fn resolve_warehouse(
    conn: &mut SqliteConnection,
    user: &User,
    explicit_id: Option<&str>,
) -> DbResult<Warehouse> {
    let bound = warehouse::find_by_owner(conn, &user.id).await?;
    let explicit = match explicit_id {
        Some(id) => Some(
            warehouse::find(conn, id)
                .await?
                .ok_or_else(|| CoreError::WarehouseNotFound(id.to_string()))?,
        ),
        None => None,
    };

    let resolved = resolve_acting_warehouse(user, bound.as_ref(), explicit.as_ref())?;
    Ok(resolved.clone())
}

/// Return stamp for a line booked under `ty`.
fn returned_at_for(
    ty: TransactionType,
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match ty {
        TransactionType::Return => previous.or(Some(now)),
        _ => None,
    }
}

/// Applies one stock move to its balance row.
async fn apply_move(
    conn: &mut SqliteConnection,
    item: &Item,
    mv: &StockMove,
    now: DateTime<Utc>,
) -> DbResult<StockBalance> {
    balance::ensure(conn, &mv.item_id, &mv.warehouse_id, now).await?;

    if mv.needs_check() {
        let current = current_balance(conn, mv).await?;
        check_delta(item, mv.transaction_type, &current, mv.delta)?;
    }

    let Some(change) = mv.transaction_type.pool_delta().checked_scaled(mv.delta) else {
        return Err(explain_rejection(conn, mv).await);
    };
    if let Some(updated) =
        balance::apply_change(conn, &mv.item_id, &mv.warehouse_id, change, now).await?
    {
        return Ok(updated);
    }

    Err(explain_rejection(conn, mv).await)
}

/// Error for a move the balance row refused, against the row as it stands.
async fn explain_rejection(conn: &mut SqliteConnection, mv: &StockMove) -> DbError {
    let current = match current_balance(conn, mv).await {
        Ok(current) => current,
        Err(err) => return err,
    };
    match apply(&current, mv.transaction_type, mv.delta) {
        Err(rule) => rule.into(),
        Ok(_) => DbError::TransactionFailed(format!(
            "stock balance for item {} in warehouse {} changed concurrently",
            mv.item_id, mv.warehouse_id
        )),
    }
}

async fn current_balance(conn: &mut SqliteConnection, mv: &StockMove) -> DbResult<StockBalance> {
    Ok(balance::find(conn, &mv.item_id, &mv.warehouse_id)
        .await?
        .unwrap_or_else(|| StockBalance::empty(mv.item_id.as_str(), mv.warehouse_id.as_str())))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use stockledger_core::{ItemCategory, NewLine};

    #[tokio::test]
    async fn test_lookup_reads_bound_warehouse() {
        let fx = Fixture::new().await;
        let projector = fx.asset("PRJ-01", "Projector").await;
        fx.stock_in(&fx.operator.id, &projector.code, 7).await;

        let seen = fx
            .db
            .ledger()
            .lookup("PRJ-01", Some(&fx.operator.id))
            .await
            .unwrap();
        assert_eq!(seen.available_stock, 7);
        assert_eq!(seen.category, ItemCategory::Asset);
        assert_eq!(seen.unit_name.as_deref(), Some("pcs"));

        // No user, or a user without a warehouse, sees zero.
        let anonymous = fx.db.ledger().lookup("PRJ-01", None).await.unwrap();
        assert_eq!(anonymous.available_stock, 0);
        let admin_view = fx
            .db
            .ledger()
            .lookup("PRJ-01", Some(&fx.admin.id))
            .await
            .unwrap();
        assert_eq!(admin_view.available_stock, 0);
    }

    #[tokio::test]
    async fn test_lookup_without_balance_or_unit() {
        let fx = Fixture::new().await;
        fx.db
            .items()
            .create("TAPE-01", "Tape", ItemCategory::Consumable, None)
            .await
            .unwrap();

        let seen = fx
            .db
            .ledger()
            .lookup("TAPE-01", Some(&fx.operator.id))
            .await
            .unwrap();
        assert_eq!(seen.available_stock, 0);
        assert_eq!(seen.unit_name, None);

        let err = fx.db.ledger().lookup("NOPE", None).await.unwrap_err();
        assert!(matches!(err, DbError::Ledger(CoreError::ItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_stock_override() {
        let fx = Fixture::new().await;
        let paper = fx.consumable("PAPER-A4", "Paper A4").await;

        let change = fx
            .db
            .ledger()
            .update_item_attribute(&paper.id, ItemAttribute::Stock(40), &fx.operator.id, &fx.own.id)
            .await
            .unwrap();
        assert_eq!(change.attribute, ItemAttribute::Stock(40));
        assert_eq!(fx.balance(&paper.id, &fx.own.id).await.available, 40);

        let err = fx
            .db
            .ledger()
            .update_item_attribute(&paper.id, ItemAttribute::Stock(-1), &fx.operator.id, &fx.own.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Ledger(CoreError::NegativeValueRejected { value: -1 })
        ));
        assert_eq!(fx.balance(&paper.id, &fx.own.id).await.available, 40);
    }

    #[tokio::test]
    async fn test_override_requires_warehouse_ownership() {
        let fx = Fixture::new().await;
        let paper = fx.consumable("PAPER-A4", "Paper A4").await;

        let err = fx
            .db
            .ledger()
            .update_item_attribute(&paper.id, ItemAttribute::Stock(5), &fx.operator.id, &fx.central.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Ledger(CoreError::WarehouseAccessDenied { .. })));

        // Superadmin may override anywhere.
        fx.db
            .ledger()
            .update_item_attribute(&paper.id, ItemAttribute::Stock(5), &fx.admin.id, &fx.central.id)
            .await
            .unwrap();
        assert_eq!(fx.balance(&paper.id, &fx.central.id).await.available, 5);
    }

    #[tokio::test]
    async fn test_rename_override() {
        let fx = Fixture::new().await;
        let paper = fx.consumable("PAPER-A4", "Paper A4").await;

        fx.db
            .ledger()
            .update_item_attribute(
                &paper.id,
                ItemAttribute::Name("Paper A4 80gsm".to_string()),
                &fx.operator.id,
                &fx.own.id,
            )
            .await
            .unwrap();

        let renamed = fx.db.items().get_by_id(&paper.id).await.unwrap().unwrap();
        assert_eq!(renamed.name, "Paper A4 80gsm");

        let err = fx
            .db
            .ledger()
            .update_item_attribute(
                &paper.id,
                ItemAttribute::Name(String::new()),
                &fx.operator.id,
                &fx.own.id,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_override_missing_entities() {
        let fx = Fixture::new().await;
        let paper = fx.consumable("PAPER-A4", "Paper A4").await;
        let ledger = fx.db.ledger();

        let err = ledger
            .update_item_attribute("missing", ItemAttribute::Stock(1), &fx.admin.id, &fx.own.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Ledger(CoreError::ItemNotFound(_))));

        let err = ledger
            .update_item_attribute(&paper.id, ItemAttribute::Stock(1), &fx.admin.id, "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Ledger(CoreError::WarehouseNotFound(_))));

        let err = ledger
            .update_item_attribute(&paper.id, ItemAttribute::Stock(1), "missing", &fx.own.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Ledger(CoreError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_transaction() {
        let fx = Fixture::new().await;
        let paper = fx.consumable("PAPER-A4", "Paper A4").await;
        let created = fx.stock_in(&fx.operator.id, &paper.code, 3).await;

        let found = fx
            .db
            .ledger()
            .find_transaction(&created.transaction.id)
            .await
            .unwrap();
        assert_eq!(found.transaction.code, created.transaction.code);
        assert_eq!(found.lines.len(), 1);

        let err = fx
            .db
            .ledger()
            .find_transaction(&crate::repository::generate_id())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Ledger(CoreError::TransactionNotFound(_))));

        let err = fx.db.ledger().find_transaction("not-a-uuid").await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_user_is_rejected() {
        let fx = Fixture::new().await;
        fx.consumable("PAPER-A4", "Paper A4").await;

        let err = fx
            .db
            .ledger()
            .create_transaction("ghost", new_transaction(TransactionType::In, vec![NewLine {
                item_code: "PAPER-A4".to_string(),
                quantity: 1,
                description: None,
            }]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Ledger(CoreError::UserNotFound(_))));

        // A rolled-back create does not consume a code.
        assert_eq!(fx.db.transactions().last_ordinal(TransactionType::In).await.unwrap(), 0);
    }
}
