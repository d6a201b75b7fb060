//! Planner handler
//!
//! Two operations: add an event or read back the upcoming schedule. The
//! distinction mirrors the original assistant's calendar functions
//! (create vs. read); full natural-language date parsing stays out of the
//! pipeline, so the handler accepts a few common forms and otherwise
//! schedules on the next hour.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use pocket_core::{
    ChunkStream, EventRange, ExecutionRequest, Handler, NewEvent, PlannerStore, StreamChunk,
};

use crate::backend_error_chunk;

static ADD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(add|create|schedule|book|set up|remind)\b").unwrap()
});
static LIST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(what|show|list|upcoming|tell|read|any|do i have)\b").unwrap()
});
static TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bat\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm)?\b").unwrap()
});
static TITLE_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(add|create|schedule|book|set up|remind me to|remind me|to my calendar|to the calendar|on my calendar|an?\s+(?:event|appointment|meeting)\s*(?:for|called|named)?|tomorrow|today|at\s+\d{1,2}(?::\d{2})?\s*(?:am|pm)?)\b",
    )
    .unwrap()
});

/// Which planner operation the utterance asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlannerOp {
    Add,
    List,
}

/// Question words win over scheduling verbs so "show my schedule" reads
/// rather than creating an event named "my".
fn detect_op(text: &str) -> PlannerOp {
    if LIST_PATTERN.is_match(text) {
        PlannerOp::List
    } else if ADD_PATTERN.is_match(text) {
        PlannerOp::Add
    } else {
        PlannerOp::List
    }
}

/// Resolve the start time from the utterance, in local time.
///
/// Understands "today"/"tomorrow" plus "at H[:MM] [am|pm]"; anything else
/// lands on the top of the next hour.
fn parse_start_time(text: &str, now: DateTime<Local>) -> DateTime<Utc> {
    let lower = text.to_lowercase();
    let day_offset = if lower.contains("tomorrow") { 1 } else { 0 };

    let time = TIME_PATTERN.captures(&lower).and_then(|caps| {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps
            .get(2)
            .map(|m| m.as_str().parse().unwrap_or(0))
            .unwrap_or(0);
        let hour = match caps.get(3).map(|m| m.as_str()) {
            Some("pm") if hour < 12 => hour + 12,
            Some("am") if hour == 12 => 0,
            _ => hour,
        };
        NaiveTime::from_hms_opt(hour, minute, 0)
    });

    let date = now.date_naive() + Duration::days(day_offset);
    let naive = match time {
        Some(time) => date.and_time(time),
        None => {
            // Top of the next hour, carried onto the requested day.
            let next_hour = (now + Duration::hours(1))
                .with_minute(0)
                .and_then(|t| t.with_second(0))
                .unwrap_or(now);
            date.and_time(next_hour.time())
        }
    };

    match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
        // DST gaps and folds resolve towards "soon" rather than failing.
        chrono::LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        chrono::LocalResult::None => (now + Duration::hours(1)).with_timezone(&Utc),
    }
}

/// Strip scheduling words down to an event title
fn extract_title(text: &str) -> String {
    let cleaned = TITLE_NOISE.replace_all(text, " ");
    let title = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c.is_whitespace() || c == ',' || c == '.')
        .to_string();

    if title.is_empty() {
        "Untitled event".to_string()
    } else {
        title
    }
}

/// Calendar/planner handler
pub struct PlannerHandler {
    store: Arc<dyn PlannerStore>,
    upcoming_days: i64,
}

impl PlannerHandler {
    pub fn new(store: Arc<dyn PlannerStore>, upcoming_days: i64) -> Self {
        Self {
            store,
            upcoming_days,
        }
    }
}

impl Handler for PlannerHandler {
    fn name(&self) -> &'static str {
        "planner"
    }

    fn run(&self, request: ExecutionRequest) -> ChunkStream {
        let store = Arc::clone(&self.store);
        let upcoming_days = self.upcoming_days;
        let text = request.utterance.text.clone();
        let cancel = request.cancel;

        Box::pin(async_stream::stream! {
            if cancel.is_cancelled() {
                yield StreamChunk::cancelled();
                return;
            }

            match detect_op(&text) {
                PlannerOp::Add => {
                    let starts_at = parse_start_time(&text, Local::now());
                    let title = extract_title(&text);
                    let event = NewEvent::new(title.clone(), starts_at);

                    match store.add_event(event).await {
                        Ok(id) => {
                            yield StreamChunk::tool_event(
                                "event_added",
                                serde_json::json!({
                                    "id": id,
                                    "title": title,
                                    "starts_at": starts_at.to_rfc3339(),
                                    "speech": format!("Added {} to your calendar.", title),
                                }),
                            );
                            yield StreamChunk::Done;
                        }
                        Err(err) => {
                            yield backend_error_chunk("planner", err);
                        }
                    }
                }
                PlannerOp::List => {
                    match store.upcoming(EventRange::next_days(upcoming_days)).await {
                        Ok(events) if events.is_empty() => {
                            yield StreamChunk::text("Nothing on your calendar coming up.");
                            yield StreamChunk::Done;
                        }
                        Ok(events) => {
                            for event in events {
                                if cancel.is_cancelled() {
                                    yield StreamChunk::cancelled();
                                    return;
                                }
                                let local = event.starts_at.with_timezone(&Local);
                                let mut line = format!(
                                    "{}: {}.",
                                    local.format("%a %H:%M"),
                                    event.title
                                );
                                if let Some(location) = &event.location {
                                    line = format!(
                                        "{}: {} at {}.",
                                        local.format("%a %H:%M"),
                                        event.title,
                                        location
                                    );
                                }
                                yield StreamChunk::text(line);
                            }
                            yield StreamChunk::Done;
                        }
                        Err(err) => {
                            yield backend_error_chunk("planner", err);
                        }
                    }
                }
            }
        })
    }
}
