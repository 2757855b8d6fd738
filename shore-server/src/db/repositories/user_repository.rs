use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use shore_types::{format_timestamp, UpdateProfileRequest, User};

use crate::db::{row_timestamp, row_uuid, DbPool};

const USER_COLUMNS: &str =
    "id, username, email, bio, location, profilePictureUrl, createdAt, updatedAt";

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row_uuid(row, 0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        bio: row.get(3)?,
        location: row.get(4)?,
        profile_picture_url: row.get(5)?,
        created_at: row_timestamp(row, 6)?,
        updated_at: row_timestamp(row, 7)?,
    })
}

pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user with an already hashed password
    pub fn create(&self, user: &User, password_hash: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (id, username, email, password, bio, location, profilePictureUrl, createdAt, updatedAt)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                user.id.to_string(),
                &user.username,
                &user.email,
                password_hash,
                &user.bio,
                &user.location,
                &user.profile_picture_url,
                format_timestamp(&user.created_at),
                format_timestamp(&user.updated_at),
            ),
        )
        .context("Failed to create user")?;
        Ok(())
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                [user_id.to_string()],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user together with the stored password hash, for login
    pub fn get_credentials_by_email(&self, email: &str) -> Result<Option<(User, String)>> {
        let conn = self.pool.get()?;
        let found = conn
            .query_row(
                &format!("SELECT {}, password FROM users WHERE email = ?", USER_COLUMNS),
                [email],
                |row| Ok((map_user(row)?, row.get::<_, String>(8)?)),
            )
            .optional()?;
        Ok(found)
    }

    /// Check whether the email or username is already registered
    pub fn exists_by_email_or_username(&self, email: &str, username: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ? OR username = ?",
            [email, username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Check whether a username belongs to somebody other than `user_id`
    pub fn username_taken_by_other(&self, username: &str, user_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ? AND id != ?",
            (username, user_id.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Apply a partial profile update; fields left as `None` are untouched
    pub fn update_profile(&self, user_id: &Uuid, update: &UpdateProfileRequest) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE users
             SET username = COALESCE(?, username),
                 bio = COALESCE(?, bio),
                 location = COALESCE(?, location),
                 profilePictureUrl = COALESCE(?, profilePictureUrl),
                 updatedAt = ?
             WHERE id = ?",
            (
                &update.username,
                &update.bio,
                &update.location,
                &update.profile_picture_url,
                format_timestamp(&Utc::now()),
                user_id.to_string(),
            ),
        )
        .context("Failed to update user profile")?;
        Ok(())
    }
}
