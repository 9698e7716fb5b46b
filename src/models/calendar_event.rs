//! Calendar event mapping models.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use serde::Serialize;

/// CalendarEvent query model for SELECT operations
///
/// Maps one logical event of a run's solution to the identifier the calendar
/// provider assigned to it. `(timetable_run_id, event_key)` is unique.
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::calendar_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CalendarEvent {
    pub id: i32,
    pub timetable_run_id: i32,
    pub event_key: String,
    pub google_event_id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// NewCalendarEvent insert model for INSERT operations
#[derive(Debug, Insertable, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::calendar_events)]
pub struct NewCalendarEvent {
    pub timetable_run_id: i32,
    pub event_key: String,
    pub google_event_id: String,
}

impl NewCalendarEvent {
    pub fn new(
        timetable_run_id: i32,
        event_key: impl Into<String>,
        google_event_id: impl Into<String>,
    ) -> Self {
        Self {
            timetable_run_id,
            event_key: event_key.into(),
            google_event_id: google_event_id.into(),
        }
    }
}

/// Serializable view of a mapping for command output
#[derive(Debug, Clone, Serialize)]
pub struct CalendarEventSummary {
    pub id: i32,
    pub timetable_run_id: i32,
    pub event_key: String,
    pub google_event_id: String,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl From<&CalendarEvent> for CalendarEventSummary {
    fn from(event: &CalendarEvent) -> Self {
        Self {
            id: event.id,
            timetable_run_id: event.timetable_run_id,
            event_key: event.event_key.clone(),
            google_event_id: event.google_event_id.clone(),
            created_at: event.created_at.to_jiff(),
            updated_at: event.updated_at.to_jiff(),
        }
    }
}
