//! Space repository: the access oracle consulted during `space:join`.

use super::DbError;
use sqlx::SqlitePool;

/// A stored space with its access-control fields.
#[derive(Debug, Clone)]
pub struct SpaceRecord {
    pub id: String,
    pub name: String,
    pub is_public: bool,
    pub owner_id: String,
}

/// Repository for space lookups.
pub struct SpaceRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SpaceRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch a space by id. Returns `None` when the id is unknown.
    pub async fn fetch(&self, id: &str) -> Result<Option<SpaceRecord>, DbError> {
        let row = sqlx::query_as::<_, (String, String, bool, String)>(
            "SELECT id, name, is_public, owner_id FROM spaces WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, name, is_public, owner_id)| SpaceRecord {
            id,
            name,
            is_public,
            owner_id,
        }))
    }

    /// Whether a user is on a space's member list.
    pub async fn is_member(&self, space_id: &str, user_id: &str) -> Result<bool, DbError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM space_members WHERE space_id = ? AND user_id = ?",
        )
        .bind(space_id)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }
}
