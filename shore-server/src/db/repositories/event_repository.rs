use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use shore_types::{format_timestamp, Event, Organizer, UserSummary};

use crate::db::{now_timestamp, row_timestamp, row_uuid, DbPool};

const EVENT_SELECT: &str =
    "SELECT e.id, e.eventName, e.description, e.date, e.lat, e.lon, e.address,
            e.organizerId, u.username,
            (SELECT COUNT(*) FROM event_attendees WHERE eventId = e.id) as attendee_count,
            e.createdAt, e.updatedAt
     FROM events e
     JOIN users u ON e.organizerId = u.id";

fn map_event(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        event_id: row_uuid(row, 0)?,
        event_name: row.get(1)?,
        description: row.get(2)?,
        date: row.get(3)?,
        lat: row.get(4)?,
        lon: row.get(5)?,
        address: row.get(6)?,
        organizer: Organizer {
            user_id: row_uuid(row, 7)?,
            username: row.get(8)?,
        },
        attendee_count: row.get(9)?,
        created_at: row_timestamp(row, 10)?,
        updated_at: row_timestamp(row, 11)?,
        distance_km: None,
    })
}

pub struct EventRepository {
    pool: DbPool,
}

impl EventRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new event; `attendee_count` and `distance_km` are ignored
    pub fn create(&self, event: &Event) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO events (id, eventName, description, date, lat, lon, address, organizerId, createdAt, updatedAt)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                event.event_id.to_string(),
                &event.event_name,
                &event.description,
                &event.date,
                event.lat,
                event.lon,
                &event.address,
                event.organizer.user_id.to_string(),
                format_timestamp(&event.created_at),
                format_timestamp(&event.updated_at),
            ),
        )
        .context("Failed to create event")?;
        Ok(())
    }

    /// List events ordered by date, optionally restricted to one organizer
    pub fn list(&self, organizer_id: Option<&Uuid>) -> Result<Vec<Event>> {
        let conn = self.pool.get()?;

        let events = match organizer_id {
            Some(organizer_id) => {
                let mut stmt = conn.prepare(&format!(
                    "{} WHERE e.organizerId = ? ORDER BY e.date ASC",
                    EVENT_SELECT
                ))?;
                let rows = stmt
                    .query_map([organizer_id.to_string()], map_event)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!("{} ORDER BY e.date ASC", EVENT_SELECT))?;
                let rows = stmt
                    .query_map([], map_event)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(events)
    }

    /// Get a single event by ID
    pub fn get_by_id(&self, event_id: &Uuid) -> Result<Option<Event>> {
        let conn = self.pool.get()?;
        let event = conn
            .query_row(
                &format!("{} WHERE e.id = ?", EVENT_SELECT),
                [event_id.to_string()],
                map_event,
            )
            .optional()?;
        Ok(event)
    }

    pub fn exists(&self, event_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE id = ?",
            [event_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Organizer of an event, `None` when the event does not exist
    pub fn get_organizer_id(&self, event_id: &Uuid) -> Result<Option<Uuid>> {
        let conn = self.pool.get()?;
        let organizer = conn
            .query_row(
                "SELECT organizerId FROM events WHERE id = ?",
                [event_id.to_string()],
                |row| row_uuid(row, 0),
            )
            .optional()?;
        Ok(organizer)
    }

    /// Attendees in the order they joined
    pub fn get_attendees(&self, event_id: &Uuid) -> Result<Vec<UserSummary>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.profilePictureUrl
             FROM event_attendees ea
             JOIN users u ON ea.userId = u.id
             WHERE ea.eventId = ?
             ORDER BY ea.joinedAt ASC",
        )?;

        let attendees = stmt
            .query_map([event_id.to_string()], |row| {
                Ok(UserSummary {
                    user_id: row_uuid(row, 0)?,
                    username: row.get(1)?,
                    profile_picture_url: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(attendees)
    }

    pub fn is_attending(&self, event_id: &Uuid, user_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM event_attendees WHERE eventId = ? AND userId = ?",
            [event_id.to_string(), user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Record an RSVP
    pub fn add_attendee(&self, event_id: &Uuid, user_id: &Uuid) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO event_attendees (eventId, userId, joinedAt) VALUES (?, ?, ?)",
            (event_id.to_string(), user_id.to_string(), now_timestamp()),
        )
        .context("Failed to join event")?;
        Ok(())
    }

    /// Remove an RSVP, returning the number of rows removed
    pub fn remove_attendee(&self, event_id: &Uuid, user_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM event_attendees WHERE eventId = ? AND userId = ?",
                (event_id.to_string(), user_id.to_string()),
            )
            .context("Failed to leave event")?;
        Ok(rows)
    }

    /// Delete an event; attendee rows cascade and attached posts are detached
    pub fn delete(&self, event_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute("DELETE FROM events WHERE id = ?", [event_id.to_string()])
            .context("Failed to delete event")?;
        Ok(rows)
    }

    pub fn count_organized_by(&self, user_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE organizerId = ?",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn count_attended_by(&self, user_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM event_attendees WHERE userId = ?",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
