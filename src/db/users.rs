//! User repository: resolves authenticated user ids to profiles.

use super::DbError;
use sqlx::SqlitePool;

/// A stored user profile.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
}

/// Repository for user lookups.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch a user by id. Returns `None` when the id is unknown.
    pub async fn fetch(&self, id: &str) -> Result<Option<UserRecord>, DbError> {
        let row = sqlx::query_as::<_, (String, String, String, Option<String>)>(
            "SELECT id, name, email, picture FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, name, email, picture)| UserRecord {
            id,
            name,
            email,
            picture,
        }))
    }
}
