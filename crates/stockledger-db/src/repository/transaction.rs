//! # Transaction Repository
//!
//! Transaction headers, their lines, and the per-type code sequence.
//!
//! ## Record Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transactions (header)          transaction_lines                       │
//! │  ─────────────────────          ─────────────────                       │
//! │  id ◄────────────────────────── transaction_id  (ON DELETE CASCADE)     │
//! │  code  TRX-PJM-004   UNIQUE     item_id ┐ UNIQUE per transaction        │
//! │  transaction_type               warehouse_id                            │
//! │  user_id, warehouse_id          quantity > 0, returned_at               │
//! │                                                                         │
//! │  transaction_sequences: transaction_type → last_value                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockledger_core::{Transaction, TransactionLine, TransactionRecord, TransactionType};

const HEADER_COLUMNS: &str = "id, transaction_type, code, transaction_date, description, \
                              user_id, warehouse_id, created_at, updated_at";

const LINE_COLUMNS: &str = "id, transaction_id, item_id, warehouse_id, quantity, returned_at, \
                            description, created_at, updated_at";

/// Repository for transaction reads.
///
/// Writes only happen inside ledger units of work.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Gets a transaction with its lines.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<TransactionRecord>> {
        let mut conn = self.pool.acquire().await?;
        find_record(&mut conn, id).await
    }

    /// Gets a transaction header by its code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Transaction>> {
        let header = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {HEADER_COLUMNS} FROM transactions WHERE code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(header)
    }

    /// Last ordinal handed out for a type (0 if none yet).
    pub async fn last_ordinal(&self, ty: TransactionType) -> DbResult<i64> {
        let last: Option<i64> = sqlx::query_scalar(
            "SELECT last_value FROM transaction_sequences WHERE transaction_type = ?1",
        )
        .bind(ty)
        .fetch_optional(&self.pool)
        .await?;
        Ok(last.unwrap_or(0))
    }
}

// =============================================================================
// Sequence
// =============================================================================

/// Bumps and returns the ordinal for `ty`, starting at 1.
pub(crate) async fn next_ordinal(conn: &mut SqliteConnection, ty: TransactionType) -> DbResult<i64> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO transaction_sequences (transaction_type, last_value)
        VALUES (?1, 1)
        ON CONFLICT (transaction_type) DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(ty)
    .fetch_one(&mut *conn)
    .await?;

    debug!(transaction_type = %ty, ordinal = value, "Allocated transaction ordinal");
    Ok(value)
}

// =============================================================================
// Headers
// =============================================================================

pub(crate) async fn find_header(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Transaction>> {
    let header = sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {HEADER_COLUMNS} FROM transactions WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(header)
}

pub(crate) async fn find_record(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<TransactionRecord>> {
    let Some(transaction) = find_header(conn, id).await? else {
        return Ok(None);
    };
    let lines = find_lines(conn, id).await?;
    Ok(Some(TransactionRecord { transaction, lines }))
}

pub(crate) async fn insert_header(conn: &mut SqliteConnection, header: &Transaction) -> DbResult<()> {
    debug!(id = %header.id, code = %header.code, "Inserting transaction");

    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, transaction_type, code, transaction_date, description,
            user_id, warehouse_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&header.id)
    .bind(header.transaction_type)
    .bind(&header.code)
    .bind(header.transaction_date)
    .bind(&header.description)
    .bind(&header.user_id)
    .bind(&header.warehouse_id)
    .bind(header.created_at)
    .bind(header.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Stamps `updated_at`. Returns false when the transaction does not exist.
///
/// Run first in an update so the unit of work holds the write lock before
/// it reads anything.
pub(crate) async fn touch(conn: &mut SqliteConnection, id: &str, now: DateTime<Utc>) -> DbResult<bool> {
    let result = sqlx::query("UPDATE transactions SET updated_at = ?2 WHERE id = ?1")
        .bind(id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn update_header(conn: &mut SqliteConnection, header: &Transaction) -> DbResult<()> {
    debug!(id = %header.id, transaction_type = %header.transaction_type, "Updating transaction header");

    sqlx::query(
        r#"
        UPDATE transactions SET
            transaction_type = ?2,
            transaction_date = ?3,
            description = ?4,
            user_id = ?5,
            warehouse_id = ?6,
            updated_at = ?7
        WHERE id = ?1
        "#,
    )
    .bind(&header.id)
    .bind(header.transaction_type)
    .bind(header.transaction_date)
    .bind(&header.description)
    .bind(&header.user_id)
    .bind(&header.warehouse_id)
    .bind(header.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Lines
// =============================================================================

pub(crate) async fn find_lines(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> DbResult<Vec<TransactionLine>> {
    let lines = sqlx::query_as::<_, TransactionLine>(&format!(
        "SELECT {LINE_COLUMNS} FROM transaction_lines WHERE transaction_id = ?1 ORDER BY rowid"
    ))
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

pub(crate) async fn insert_line(conn: &mut SqliteConnection, line: &TransactionLine) -> DbResult<()> {
    debug!(
        transaction_id = %line.transaction_id,
        item_id = %line.item_id,
        quantity = line.quantity,
        "Inserting transaction line"
    );

    sqlx::query(
        r#"
        INSERT INTO transaction_lines (
            id, transaction_id, item_id, warehouse_id, quantity,
            returned_at, description, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&line.id)
    .bind(&line.transaction_id)
    .bind(&line.item_id)
    .bind(&line.warehouse_id)
    .bind(line.quantity)
    .bind(line.returned_at)
    .bind(&line.description)
    .bind(line.created_at)
    .bind(line.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn update_line(conn: &mut SqliteConnection, line: &TransactionLine) -> DbResult<()> {
    debug!(id = %line.id, quantity = line.quantity, "Updating transaction line");

    sqlx::query(
        r#"
        UPDATE transaction_lines SET
            warehouse_id = ?2,
            quantity = ?3,
            returned_at = ?4,
            description = ?5,
            updated_at = ?6
        WHERE id = ?1
        "#,
    )
    .bind(&line.id)
    .bind(&line.warehouse_id)
    .bind(line.quantity)
    .bind(line.returned_at)
    .bind(&line.description)
    .bind(line.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn delete_line(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    debug!(id = %id, "Deleting transaction line");

    sqlx::query("DELETE FROM transaction_lines WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
