use anyhow::{Context, Result};
use uuid::Uuid;

use crate::db::{now_timestamp, row_uuid, DbPool};

pub struct FollowRepository {
    pool: DbPool,
}

impl FollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Check if follower_id follows following_id
    pub fn is_following(&self, follower_id: &Uuid, following_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM user_follows WHERE followerId = ? AND followingId = ?",
            [follower_id.to_string(), following_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Follow a user (one-way)
    pub fn follow(&self, follower_id: &Uuid, following_id: &Uuid) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO user_follows (followerId, followingId, followedAt) VALUES (?, ?, ?)",
            (
                follower_id.to_string(),
                following_id.to_string(),
                now_timestamp(),
            ),
        )
        .context("Failed to follow user")?;
        Ok(())
    }

    /// Unfollow a user, returning the number of rows removed
    pub fn unfollow(&self, follower_id: &Uuid, following_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM user_follows WHERE followerId = ? AND followingId = ?",
                (follower_id.to_string(), following_id.to_string()),
            )
            .context("Failed to unfollow user")?;
        Ok(rows)
    }

    /// Users that `user_id` follows
    pub fn get_following(&self, user_id: &Uuid) -> Result<Vec<Uuid>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT followingId FROM user_follows WHERE followerId = ? ORDER BY followedAt ASC",
        )?;
        let ids = stmt
            .query_map([user_id.to_string()], |row| row_uuid(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    pub fn follower_count(&self, user_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM user_follows WHERE followingId = ?",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn following_count(&self, user_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM user_follows WHERE followerId = ?",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
