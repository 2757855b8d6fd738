use crate::db::Database;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::OptionalExtension;
use shore_types::format_timestamp;
use uuid::Uuid;

/// Database-backed bearer session manager
///
/// Tokens are UUID v4 strings stored in the `sessions` table with an expiry
/// of `session_days`. Expired sessions are rejected on validation and purged
/// by [`SessionManager::cleanup_expired_sessions`].
#[derive(Clone)]
pub struct SessionManager {
    db: Database,
    session_days: i64,
}

impl SessionManager {
    pub fn new(db: Database, session_days: i64) -> Self {
        Self { db, session_days }
    }

    /// Create a new session for a user and return its token
    pub fn create_session(&self, user_id: Uuid) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + Duration::days(self.session_days);

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO sessions (token, userId, createdAt, expiresAt) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                token,
                user_id.to_string(),
                format_timestamp(&created_at),
                format_timestamp(&expires_at),
            ],
        )
        .context("Failed to create session")?;

        tracing::info!("Created session for user {}", user_id);
        Ok(token)
    }

    /// Validate a session token.
    ///
    /// Returns `Ok(None)` for unknown or expired tokens; expired rows are
    /// removed on the way out.
    pub fn validate_session(&self, token: &str) -> Result<Option<Uuid>> {
        let conn = self.db.connection()?;

        let found: Option<(String, String)> = conn
            .query_row(
                "SELECT userId, expiresAt FROM sessions WHERE token = ?1",
                rusqlite::params![token],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("Failed to look up session")?;
        drop(conn);

        let Some((user_id_str, expires_at_str)) = found else {
            return Ok(None);
        };

        let expires_at = expires_at_str
            .parse::<DateTime<Utc>>()
            .context("Failed to parse expiry time")?;

        if Utc::now() > expires_at {
            self.delete_session(token)?;
            tracing::debug!("Rejected expired session");
            return Ok(None);
        }

        let user_id = Uuid::parse_str(&user_id_str).context("Failed to parse user ID")?;
        Ok(Some(user_id))
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE token = ?1",
                rusqlite::params![token],
            )
            .context("Failed to delete session")?;

        if rows_affected > 0 {
            tracing::info!("Deleted session");
        }

        Ok(())
    }

    /// Remove every session past its expiry, returning how many were deleted
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let now = format_timestamp(&Utc::now());

        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE expiresAt < ?1",
                rusqlite::params![now],
            )
            .context("Failed to cleanup expired sessions")?;

        if rows_affected > 0 {
            tracing::info!("Cleaned up {} expired sessions", rows_affected);
        }

        Ok(rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{now_timestamp, Database};

    const TEST_USER_ID: &str = "550e8400-e29b-41d4-a716-446655440099";

    fn setup_test_db() -> Database {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize database");

        let conn = db.connection().expect("Failed to get connection");
        conn.execute(
            "INSERT INTO users (id, username, email, password, createdAt, updatedAt)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                TEST_USER_ID,
                "testuser",
                "testuser@shore.test",
                "hash",
                now_timestamp(),
                now_timestamp(),
            ],
        )
        .expect("Failed to create test user");

        db
    }

    fn test_user() -> Uuid {
        Uuid::parse_str(TEST_USER_ID).unwrap()
    }

    #[test]
    fn test_create_session() {
        let manager = SessionManager::new(setup_test_db(), 7);

        let token = manager
            .create_session(test_user())
            .expect("Failed to create session");
        assert!(Uuid::parse_str(&token).is_ok(), "Token should be a valid UUID");
    }

    #[test]
    fn test_validate_session() {
        let manager = SessionManager::new(setup_test_db(), 7);

        let token = manager.create_session(test_user()).unwrap();
        let validated = manager
            .validate_session(&token)
            .expect("Failed to validate session");

        assert_eq!(validated, Some(test_user()));
    }

    #[test]
    fn test_validate_unknown_session() {
        let manager = SessionManager::new(setup_test_db(), 7);
        assert_eq!(manager.validate_session("invalid-token").unwrap(), None);
    }

    #[test]
    fn test_delete_session() {
        let manager = SessionManager::new(setup_test_db(), 7);

        let token = manager.create_session(test_user()).unwrap();
        manager.delete_session(&token).unwrap();

        assert_eq!(manager.validate_session(&token).unwrap(), None);
    }

    #[test]
    fn test_expired_session_rejected_and_removed() {
        let db = setup_test_db();
        let manager = SessionManager::new(db.clone(), 7);
        let token = manager.create_session(test_user()).unwrap();

        let expired_time = format_timestamp(&(Utc::now() - Duration::days(1)));
        db.connection()
            .unwrap()
            .execute(
                "UPDATE sessions SET expiresAt = ?1 WHERE token = ?2",
                rusqlite::params![expired_time, token],
            )
            .unwrap();

        assert_eq!(manager.validate_session(&token).unwrap(), None);
        assert_eq!(db.count_rows("sessions").unwrap(), 0);
    }

    #[test]
    fn test_cleanup_expired_sessions() {
        let db = setup_test_db();
        let manager = SessionManager::new(db.clone(), 7);

        let expired = manager.create_session(test_user()).unwrap();
        let live = manager.create_session(test_user()).unwrap();

        let expired_time = format_timestamp(&(Utc::now() - Duration::days(1)));
        db.connection()
            .unwrap()
            .execute(
                "UPDATE sessions SET expiresAt = ?1 WHERE token = ?2",
                rusqlite::params![expired_time, expired],
            )
            .unwrap();

        assert_eq!(manager.cleanup_expired_sessions().unwrap(), 1);
        assert_eq!(manager.validate_session(&live).unwrap(), Some(test_user()));
    }

    #[test]
    fn test_session_token_uniqueness() {
        let manager = SessionManager::new(setup_test_db(), 7);

        let token1 = manager.create_session(test_user()).unwrap();
        let token2 = manager.create_session(test_user()).unwrap();
        assert_ne!(token1, token2);
    }
}
