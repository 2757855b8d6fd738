use anyhow::{Context, Result};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use shore_types::{format_timestamp, Comment, UserSummary};

use crate::db::{row_timestamp, row_uuid, DbPool};

pub struct CommentRepository {
    pool: DbPool,
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Add a comment to a post
    pub fn create(&self, post_id: &Uuid, comment: &Comment) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO comments (id, postId, authorId, text, createdAt) VALUES (?, ?, ?, ?, ?)",
            (
                comment.comment_id.to_string(),
                post_id.to_string(),
                comment.author.user_id.to_string(),
                &comment.text,
                format_timestamp(&comment.created_at),
            ),
        )
        .context("Failed to create comment")?;
        Ok(())
    }

    pub fn get_by_id(&self, comment_id: &Uuid) -> Result<Option<Comment>> {
        let conn = self.pool.get()?;
        let comment = conn
            .query_row(
                "SELECT c.id, c.authorId, u.username, u.profilePictureUrl, c.text, c.createdAt
                 FROM comments c
                 JOIN users u ON c.authorId = u.id
                 WHERE c.id = ?",
                [comment_id.to_string()],
                |row| {
                    Ok(Comment {
                        comment_id: row_uuid(row, 0)?,
                        author: UserSummary {
                            user_id: row_uuid(row, 1)?,
                            username: row.get(2)?,
                            profile_picture_url: row.get(3)?,
                        },
                        text: row.get(4)?,
                        created_at: row_timestamp(row, 5)?,
                    })
                },
            )
            .optional()?;
        Ok(comment)
    }

    /// Comments on a post, oldest first
    pub fn list_for_post(&self, post_id: &Uuid) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.authorId, u.username, u.profilePictureUrl, c.text, c.createdAt
             FROM comments c
             JOIN users u ON c.authorId = u.id
             WHERE c.postId = ?
             ORDER BY c.createdAt ASC",
        )?;

        let comments = stmt
            .query_map([post_id.to_string()], |row| {
                Ok(Comment {
                    comment_id: row_uuid(row, 0)?,
                    author: UserSummary {
                        user_id: row_uuid(row, 1)?,
                        username: row.get(2)?,
                        profile_picture_url: row.get(3)?,
                    },
                    text: row.get(4)?,
                    created_at: row_timestamp(row, 5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    /// Number of comments on a post
    pub fn count_for_post(&self, post_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE postId = ?",
            [post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
