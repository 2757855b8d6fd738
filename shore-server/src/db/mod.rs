pub mod schema;
pub mod connection;
pub mod repositories;

pub use connection::{Database, DbConnection, DbPool};

use chrono::{DateTime, Utc};
use rusqlite::{types::Type, Row};
use uuid::Uuid;

/// Current time in the stored ISO8601 format
pub fn now_timestamp() -> String {
    shore_types::format_timestamp(&Utc::now())
}

/// Read a TEXT column holding a UUID
pub(crate) fn row_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a nullable TEXT column holding a UUID
pub(crate) fn row_optional_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        Uuid::parse_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Read a TEXT column holding an ISO8601 timestamp
pub(crate) fn row_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
