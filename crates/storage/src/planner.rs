//! SQLite planner store

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::Connection;
use uuid::Uuid;

use pocket_core::{EventRange, NewEvent, PlannerEvent, PlannerStore, Result as CoreResult};

use crate::{schema, StorageError};

/// Planner store over a local SQLite file.
///
/// The connection is serialized behind a mutex; statements run via
/// `spawn_blocking` so async callers never block a runtime worker.
#[derive(Clone)]
pub struct SqlitePlannerStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePlannerStore {
    /// Open (or create) the database at `path` and initialize the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Database(format!("create {}: {}", parent.display(), e)))?;
            }
        }

        let conn = Connection::open(path)?;
        schema::init(&conn)?;

        tracing::info!(path = %path.display(), "Planner store opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store for tests
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run_blocking<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            f(&conn)
        })
        .await
        .map_err(|e| StorageError::Database(format!("blocking task failed: {}", e)))?
    }

    /// Delete an event by id.
    ///
    /// Not part of the routing pipeline's contract; the schedule view
    /// uses it directly.
    pub async fn remove_event(&self, id: &str) -> Result<(), StorageError> {
        let id = id.to_string();
        let removed = self
            .run_blocking(move |conn| {
                Ok(conn.execute("DELETE FROM events WHERE id = ?1", rusqlite::params![id])?)
            })
            .await?;

        if removed == 0 {
            return Err(StorageError::NotFound("no such event".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PlannerStore for SqlitePlannerStore {
    async fn upcoming(&self, range: EventRange) -> CoreResult<Vec<PlannerEvent>> {
        let events = self
            .run_blocking(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, title, starts_at, location, notes FROM events
                     WHERE starts_at >= ?1 AND starts_at < ?2
                     ORDER BY starts_at ASC",
                )?;

                let rows = stmt.query_map(
                    rusqlite::params![range.from.to_rfc3339(), range.to.to_rfc3339()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, Option<String>>(3)?,
                            row.get::<_, Option<String>>(4)?,
                        ))
                    },
                )?;

                let mut events = Vec::new();
                for row in rows {
                    let (id, title, starts_at, location, notes) = row?;
                    let starts_at = DateTime::parse_from_rfc3339(&starts_at)
                        .map_err(|e| {
                            StorageError::InvalidData(format!("bad timestamp for {}: {}", id, e))
                        })?
                        .with_timezone(&Utc);
                    events.push(PlannerEvent {
                        id,
                        title,
                        starts_at,
                        location,
                        notes,
                    });
                }
                Ok(events)
            })
            .await?;

        Ok(events)
    }

    async fn add_event(&self, event: NewEvent) -> CoreResult<String> {
        let id = Uuid::new_v4().to_string();
        let stored_id = id.clone();

        self.run_blocking(move |conn| {
            conn.execute(
                "INSERT INTO events (id, title, starts_at, location, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    stored_id,
                    event.title,
                    event.starts_at.to_rfc3339(),
                    event.location,
                    event.notes,
                ],
            )?;
            Ok(())
        })
        .await?;

        tracing::debug!(event_id = %id, "Planner event added");
        Ok(id)
    }
}
