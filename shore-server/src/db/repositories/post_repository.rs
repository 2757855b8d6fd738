use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use shore_types::{format_timestamp, Post, UserSummary};

use crate::db::{row_optional_uuid, row_timestamp, row_uuid, DbPool};

/// Maximum number of posts returned by the feed
pub const FEED_LIMIT: i64 = 50;

const POST_COLUMNS: &str =
    "p.id, p.authorId, u.username, u.profilePictureUrl, p.text, p.imageUrl, p.eventId, p.createdAt";

fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        post_id: row_uuid(row, 0)?,
        author: UserSummary {
            user_id: row_uuid(row, 1)?,
            username: row.get(2)?,
            profile_picture_url: row.get(3)?,
        },
        text: row.get(4)?,
        image_url: row.get(5)?,
        event_id: row_optional_uuid(row, 6)?,
        likes: 0,    // Populated separately
        comments: 0, // Populated separately
        created_at: row_timestamp(row, 7)?,
    })
}

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new post; `likes`, `comments` and author display fields are ignored
    pub fn create(&self, post: &Post) -> Result<()> {
        let conn = self.pool.get()?;
        let created_at = format_timestamp(&post.created_at);
        conn.execute(
            "INSERT INTO posts (id, text, imageUrl, authorId, eventId, createdAt, updatedAt)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                post.post_id.to_string(),
                &post.text,
                &post.image_url,
                post.author.user_id.to_string(),
                post.event_id.map(|id| id.to_string()),
                &created_at,
                &created_at,
            ),
        )
        .context("Failed to create post")?;
        Ok(())
    }

    /// Get a single post by ID
    pub fn get_by_id(&self, post_id: &Uuid) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!(
                    "SELECT {} FROM posts p JOIN users u ON p.authorId = u.id WHERE p.id = ?",
                    POST_COLUMNS
                ),
                [post_id.to_string()],
                map_post,
            )
            .optional()?;
        Ok(post)
    }

    pub fn exists(&self, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE id = ?",
            [post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Personalized feed, newest first.
    ///
    /// A post is included when the viewer wrote it, follows its author, attends
    /// its event or organizes its event. Each post appears at most once.
    pub fn get_feed(&self, viewer_id: &Uuid) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT {}
             FROM posts p
             JOIN users u ON p.authorId = u.id
             LEFT JOIN user_follows uf ON p.authorId = uf.followingId AND uf.followerId = ?1
             LEFT JOIN event_attendees ea ON p.eventId = ea.eventId AND ea.userId = ?1
             LEFT JOIN events e ON p.eventId = e.id
             WHERE p.authorId = ?1
                OR uf.followerId = ?1
                OR ea.userId = ?1
                OR e.organizerId = ?1
             ORDER BY p.createdAt DESC
             LIMIT ?2",
            POST_COLUMNS
        ))
        .context("Failed to prepare feed query")?;

        let posts = stmt
            .query_map((viewer_id.to_string(), FEED_LIMIT), map_post)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    /// Posts attached to an event, newest first
    pub fn get_by_event(&self, event_id: &Uuid) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {}
             FROM posts p
             JOIN users u ON p.authorId = u.id
             WHERE p.eventId = ?
             ORDER BY p.createdAt DESC",
            POST_COLUMNS
        ))?;

        let posts = stmt
            .query_map([event_id.to_string()], map_post)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }
}
