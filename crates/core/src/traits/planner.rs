//! Planner storage contract

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// A stored calendar/planner event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerEvent {
    /// Store-assigned identifier
    pub id: String,
    /// Event title
    pub title: String,
    /// Scheduled start
    pub starts_at: DateTime<Utc>,
    /// Optional location
    pub location: Option<String>,
    /// Optional free-form notes
    pub notes: Option<String>,
}

/// A new event to be stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl NewEvent {
    pub fn new(title: impl Into<String>, starts_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            starts_at,
            location: None,
            notes: None,
        }
    }
}

/// Query window for upcoming events
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EventRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl EventRange {
    /// The next `days` days starting now
    pub fn next_days(days: i64) -> Self {
        let from = Utc::now();
        Self {
            from,
            to: from + Duration::days(days),
        }
    }
}

/// Calendar/planner storage.
///
/// Backed by a local database; results come back ordered by start time.
#[async_trait]
pub trait PlannerStore: Send + Sync {
    /// List events in the range, ordered by `starts_at`
    async fn upcoming(&self, range: EventRange) -> Result<Vec<PlannerEvent>>;

    /// Store a new event and return its id
    async fn add_event(&self, event: NewEvent) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_days_range() {
        let range = EventRange::next_days(7);
        assert!(range.to > range.from);
        assert_eq!((range.to - range.from).num_days(), 7);
    }
}
