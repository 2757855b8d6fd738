use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use super::schema::{HOTSPOT_SEED, SCHEMA};

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let manager = Self::create_connection_manager(path)
            .with_init(|conn| {
                // SQLite keeps these per connection
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.busy_timeout(BUSY_TIMEOUT)
            });
        let pool = Pool::new(manager).context("Failed to create database connection pool")?;
        Ok(Self { pool })
    }

    /// Create appropriate connection manager based on path
    ///
    /// A plain `:memory:` database is private to one connection, so each
    /// in-memory pool gets its own named shared-cache database instead. Every
    /// connection in the pool then sees the same tables.
    fn create_connection_manager<P: AsRef<Path>>(path: P) -> SqliteConnectionManager {
        let path_str = path.as_ref().to_string_lossy();
        let trimmed_path = path_str.trim();

        if trimmed_path.eq_ignore_ascii_case(MEMORY_DB_PATH) {
            let uri = format!("file:shore-{}?mode=memory&cache=shared", Uuid::new_v4());
            SqliteConnectionManager::file(uri)
        } else {
            SqliteConnectionManager::file(path)
        }
    }

    /// Create an in-memory database pool (useful for testing)
    pub fn in_memory() -> Result<Self> {
        Self::new(MEMORY_DB_PATH)
    }

    /// Initialize the database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Seed the known debris hotspots
    pub fn seed_hotspots(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(HOTSPOT_SEED)
            .context("Failed to seed debris hotspots")?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }

    /// Row count for a known table, used by diagnostics
    pub fn count_rows(&self, table: &str) -> Result<i64> {
        const TABLES: [&str; 9] = [
            "users",
            "events",
            "event_attendees",
            "posts",
            "post_likes",
            "comments",
            "user_follows",
            "debris_hotspots",
            "sessions",
        ];
        if !TABLES.contains(&table) {
            anyhow::bail!("Unknown table '{}'", table);
        }

        let conn = self.connection()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .with_context(|| format!("Failed to count rows in {}", table))?;
        Ok(count)
    }
}
