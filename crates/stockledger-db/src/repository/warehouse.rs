//! # Warehouse Repository
//!
//! Warehouses and the user each one is bound to. An operator acts on the
//! warehouse they own; the schema allows at most one per owner.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::generate_id;
use crate::error::DbResult;
use stockledger_core::Warehouse;

/// Repository for warehouse database operations.
#[derive(Debug, Clone)]
pub struct WarehouseRepository {
    pool: SqlitePool,
}

impl WarehouseRepository {
    /// Creates a new WarehouseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WarehouseRepository { pool }
    }

    /// Registers a warehouse, optionally bound to an owner.
    pub async fn create(&self, name: &str, owner_id: Option<&str>) -> DbResult<Warehouse> {
        let warehouse = Warehouse {
            id: generate_id(),
            name: name.to_string(),
            owner_id: owner_id.map(str::to_string),
        };

        debug!(id = %warehouse.id, owner_id = ?owner_id, "Inserting warehouse");

        sqlx::query("INSERT INTO warehouses (id, name, owner_id) VALUES (?1, ?2, ?3)")
            .bind(&warehouse.id)
            .bind(&warehouse.name)
            .bind(&warehouse.owner_id)
            .execute(&self.pool)
            .await?;

        Ok(warehouse)
    }

    /// Gets a warehouse by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Warehouse>> {
        let mut conn = self.pool.acquire().await?;
        find(&mut conn, id).await
    }

    /// Gets the warehouse bound to a user.
    pub async fn get_bound_to(&self, user_id: &str) -> DbResult<Option<Warehouse>> {
        let mut conn = self.pool.acquire().await?;
        find_by_owner(&mut conn, user_id).await
    }
}

pub(crate) async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Warehouse>> {
    let warehouse =
        sqlx::query_as::<_, Warehouse>("SELECT id, name, owner_id FROM warehouses WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(warehouse)
}

pub(crate) async fn find_by_owner(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> DbResult<Option<Warehouse>> {
    let warehouse = sqlx::query_as::<_, Warehouse>(
        "SELECT id, name, owner_id FROM warehouses WHERE owner_id = ?1",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(warehouse)
}
