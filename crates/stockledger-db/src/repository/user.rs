//! # User Repository
//!
//! Acting users as handed over by the caller's auth layer. The ledger only
//! reads them; creation exists for seeding and tests.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::generate_id;
use crate::error::DbResult;
use stockledger_core::{Role, User};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Registers a user.
    pub async fn create(&self, name: &str, role: Role) -> DbResult<User> {
        let user = User {
            id: generate_id(),
            name: name.to_string(),
            role,
        };

        debug!(id = %user.id, role = ?role, "Inserting user");

        sqlx::query("INSERT INTO users (id, name, role) VALUES (?1, ?2, ?3)")
            .bind(&user.id)
            .bind(&user.name)
            .bind(user.role)
            .execute(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        find(&mut conn, id).await
    }
}

pub(crate) async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT id, name, role FROM users WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(user)
}
