//! Shared fixtures for ledger tests.

use crate::{Database, DbConfig};
use stockledger_core::{
    Item, ItemCategory, NewLine, NewTransaction, Role, StockBalance, TransactionRecord,
    TransactionType, Unit, User, Warehouse,
};

/// One database with a unit, an operator bound to `own`, a superadmin
/// without a warehouse, and an unowned `central` warehouse.
pub(crate) struct Fixture {
    pub db: Database,
    pub pcs: Unit,
    pub operator: User,
    pub admin: User,
    pub own: Warehouse,
    pub central: Warehouse,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_config(DbConfig::in_memory()).await
    }

    /// Same fixture over any database, e.g. a file with a real pool.
    pub async fn with_config(config: DbConfig) -> Self {
        let db = Database::new(config).await.unwrap();
        let pcs = db.items().create_unit("pcs").await.unwrap();
        let operator = db.users().create("Operator", Role::Operator).await.unwrap();
        let admin = db.users().create("Admin", Role::Superadmin).await.unwrap();
        let own = db
            .warehouses()
            .create("Lab Storage", Some(&operator.id))
            .await
            .unwrap();
        let central = db.warehouses().create("Central", None).await.unwrap();

        Fixture {
            db,
            pcs,
            operator,
            admin,
            own,
            central,
        }
    }

    pub async fn asset(&self, code: &str, name: &str) -> Item {
        self.db
            .items()
            .create(code, name, ItemCategory::Asset, Some(&self.pcs.id))
            .await
            .unwrap()
    }

    pub async fn consumable(&self, code: &str, name: &str) -> Item {
        self.db
            .items()
            .create(code, name, ItemCategory::Consumable, Some(&self.pcs.id))
            .await
            .unwrap()
    }

    /// Books a single-line transaction that must succeed.
    pub async fn book(
        &self,
        user_id: &str,
        ty: TransactionType,
        item_code: &str,
        quantity: i64,
    ) -> TransactionRecord {
        self.db
            .ledger()
            .create_transaction(user_id, new_transaction(ty, vec![line(item_code, quantity)]))
            .await
            .unwrap()
    }

    pub async fn stock_in(&self, user_id: &str, item_code: &str, quantity: i64) -> TransactionRecord {
        self.book(user_id, TransactionType::In, item_code, quantity).await
    }

    /// Balance row, or a zero balance when none exists.
    pub async fn balance(&self, item_id: &str, warehouse_id: &str) -> StockBalance {
        self.db
            .balances()
            .get(item_id, warehouse_id)
            .await
            .unwrap()
            .unwrap_or_else(|| StockBalance::empty(item_id, warehouse_id))
    }

    pub async fn pools(&self, item_id: &str, warehouse_id: &str) -> (i64, i64, i64) {
        let b = self.balance(item_id, warehouse_id).await;
        (b.available, b.borrowed, b.under_maintenance)
    }
}

pub(crate) fn line(item_code: &str, quantity: i64) -> NewLine {
    NewLine {
        item_code: item_code.to_string(),
        quantity,
        description: None,
    }
}

pub(crate) fn new_transaction(ty: TransactionType, lines: Vec<NewLine>) -> NewTransaction {
    NewTransaction {
        transaction_type: ty,
        description: None,
        warehouse_id: None,
        lines,
    }
}
