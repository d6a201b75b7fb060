//! Database schema

use rusqlite::Connection;

use crate::StorageError;

/// Planner events table
const CREATE_EVENTS: &str = "
    CREATE TABLE IF NOT EXISTS events (
        id          TEXT PRIMARY KEY,
        title       TEXT NOT NULL,
        starts_at   TEXT NOT NULL,
        location    TEXT,
        notes       TEXT,
        created_at  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )";

const CREATE_EVENTS_START_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_events_starts_at ON events (starts_at)";

/// Create tables and indexes if they do not exist
pub fn init(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(CREATE_EVENTS, [])?;
    conn.execute(CREATE_EVENTS_START_INDEX, [])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();
        init(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='events'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
