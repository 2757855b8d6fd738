use anyhow::{Context, Result};
use uuid::Uuid;

use crate::db::{now_timestamp, DbPool};

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Flip the like state for a user on a post.
    /// Returns `true` when the post is liked afterwards.
    pub fn toggle(&self, post_id: &Uuid, user_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;

        let removed = conn
            .execute(
                "DELETE FROM post_likes WHERE postId = ? AND userId = ?",
                (post_id.to_string(), user_id.to_string()),
            )
            .context("Failed to remove like")?;
        if removed > 0 {
            return Ok(false);
        }

        conn.execute(
            "INSERT INTO post_likes (postId, userId, likedAt) VALUES (?, ?, ?)",
            (post_id.to_string(), user_id.to_string(), now_timestamp()),
        )
        .context("Failed to add like")?;
        Ok(true)
    }

    /// Number of likes on a post
    pub fn count_for_post(&self, post_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM post_likes WHERE postId = ?",
            [post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn setup_test_db() -> (Database, LikeRepository, Uuid, Uuid) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");

        let user_id = Uuid::new_v4();
        let post_id = Uuid::new_v4();
        let conn = db.connection().unwrap();
        conn.execute(
            "INSERT INTO users (id, username, email, password, createdAt, updatedAt)
             VALUES (?, 'liker', 'liker@shore.test', 'hash', ?, ?)",
            (user_id.to_string(), now_timestamp(), now_timestamp()),
        )
        .unwrap();
        conn.execute(
            "INSERT INTO posts (id, text, authorId, createdAt, updatedAt) VALUES (?, 'Found a net', ?, ?, ?)",
            (
                post_id.to_string(),
                user_id.to_string(),
                now_timestamp(),
                now_timestamp(),
            ),
        )
        .unwrap();
        drop(conn);

        let repo = LikeRepository::new(db.pool.clone());
        (db, repo, post_id, user_id)
    }

    #[test]
    fn test_toggle_alternates() {
        let (_db, repo, post_id, user_id) = setup_test_db();

        assert!(repo.toggle(&post_id, &user_id).unwrap());
        assert_eq!(repo.count_for_post(&post_id).unwrap(), 1);

        assert!(!repo.toggle(&post_id, &user_id).unwrap());
        assert_eq!(repo.count_for_post(&post_id).unwrap(), 0);

        assert!(repo.toggle(&post_id, &user_id).unwrap());
        assert_eq!(repo.count_for_post(&post_id).unwrap(), 1);
    }

    #[test]
    fn test_like_on_missing_post_fails() {
        let (_db, repo, _post_id, user_id) = setup_test_db();
        assert!(repo.toggle(&Uuid::new_v4(), &user_id).is_err());
    }
}
