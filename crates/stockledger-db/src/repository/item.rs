//! # Item Repository
//!
//! Items, units of measure, and the joined row behind the barcode lookup.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::generate_id;
use crate::error::{DbError, DbResult};
use stockledger_core::{Item, ItemCategory, Unit};

const ITEM_COLUMNS: &str =
    "id, code, name, category, unit_id, image_path, created_at, updated_at";

/// Item joined with its unit name, as read by the scanner lookup.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemWithUnit {
    pub id: String,
    pub code: String,
    pub name: String,
    pub category: ItemCategory,
    pub image_path: Option<String>,
    pub unit_name: Option<String>,
}

/// Repository for item and unit database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let mut conn = self.pool.acquire().await?;
        find_by_id(&mut conn, id).await
    }

    /// Gets an item by its code (barcode).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Item>> {
        let mut conn = self.pool.acquire().await?;
        find_by_code(&mut conn, code).await
    }

    /// Registers a new item.
    pub async fn create(
        &self,
        code: &str,
        name: &str,
        category: ItemCategory,
        unit_id: Option<&str>,
    ) -> DbResult<Item> {
        let now = Utc::now();
        let item = Item {
            id: generate_id(),
            code: code.trim().to_string(),
            name: name.trim().to_string(),
            category,
            unit_id: unit_id.map(str::to_string),
            image_path: None,
            created_at: now,
            updated_at: now,
        };

        self.insert(&item).await?;
        Ok(item)
    }

    /// Inserts an item as given.
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, code = %item.code, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (
                id, code, name, category, unit_id, image_path, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.code)
        .bind(&item.name)
        .bind(item.category)
        .bind(&item.unit_id)
        .bind(&item.image_path)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, item.code.clone()),
            other => other,
        })?;

        Ok(())
    }

    /// Sets the stored image reference.
    pub async fn set_image_path(&self, id: &str, image_path: Option<&str>) -> DbResult<()> {
        let result = sqlx::query("UPDATE items SET image_path = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(image_path)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Registers a unit of measure.
    pub async fn create_unit(&self, name: &str) -> DbResult<Unit> {
        let unit = Unit {
            id: generate_id(),
            name: name.trim().to_string(),
        };

        sqlx::query("INSERT INTO units (id, name) VALUES (?1, ?2)")
            .bind(&unit.id)
            .bind(&unit.name)
            .execute(&self.pool)
            .await?;

        Ok(unit)
    }

    /// Counts registered items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Connection-level Statements
// =============================================================================

pub(crate) async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Item>> {
    let item = sqlx::query_as::<_, Item>(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(item)
}

pub(crate) async fn find_by_code(
    conn: &mut SqliteConnection,
    code: &str,
) -> DbResult<Option<Item>> {
    let item =
        sqlx::query_as::<_, Item>(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE code = ?1"))
            .bind(code.trim())
            .fetch_optional(&mut *conn)
            .await?;
    Ok(item)
}

pub(crate) async fn find_with_unit(
    conn: &mut SqliteConnection,
    code: &str,
) -> DbResult<Option<ItemWithUnit>> {
    let row = sqlx::query_as::<_, ItemWithUnit>(
        r#"
        SELECT
            i.id,
            i.code,
            i.name,
            i.category,
            i.image_path,
            u.name AS unit_name
        FROM items i
        LEFT JOIN units u ON u.id = i.unit_id
        WHERE i.code = ?1
        "#,
    )
    .bind(code.trim())
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

pub(crate) async fn find_unit(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Unit>> {
    let unit = sqlx::query_as::<_, Unit>("SELECT id, name FROM units WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(unit)
}

/// Stamps `updated_at`. Returns false when the item does not exist.
pub(crate) async fn touch(conn: &mut SqliteConnection, id: &str, now: DateTime<Utc>) -> DbResult<bool> {
    let result = sqlx::query("UPDATE items SET updated_at = ?2 WHERE id = ?1")
        .bind(id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn rename(
    conn: &mut SqliteConnection,
    id: &str,
    name: &str,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(item_id = %id, name = %name, "Renaming item");

    let result = sqlx::query("UPDATE items SET name = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(name.trim())
        .bind(now)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Item", id));
    }

    Ok(())
}

pub(crate) async fn set_unit(
    conn: &mut SqliteConnection,
    id: &str,
    unit_id: &str,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(item_id = %id, unit_id = %unit_id, "Changing item unit");

    sqlx::query("UPDATE items SET unit_id = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(unit_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
