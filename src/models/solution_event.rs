//! Typed view over the entries of a run's solution document.

use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Category whose entries carry a stable tuition id.
pub const TUITION_CATEGORY: &str = "Tuition";

/// One scheduled event inside `timetable_runs.solution_data`.
///
/// Start and end times are civil (zone-less) date-times, exactly as the
/// solver writes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionEvent {
    pub name: String,
    pub category: String,
    pub start_time: DateTime,
    pub end_time: DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SolutionDocument {
    Many(Vec<SolutionEvent>),
    One(SolutionEvent),
}

impl SolutionEvent {
    /// Decodes a solution document holding either a list of events or one event.
    pub fn from_document(document: &JsonValue) -> Result<Vec<Self>, serde_json::Error> {
        let parsed: SolutionDocument = serde_json::from_value(document.clone())?;
        Ok(match parsed {
            SolutionDocument::Many(events) => events,
            SolutionDocument::One(event) => vec![event],
        })
    }

    pub fn is_tuition(&self) -> bool {
        self.category == TUITION_CATEGORY
    }

    /// Deterministic key used to keep one calendar mapping per event per run.
    ///
    /// Tuition entries are keyed by their tuition id so the key survives
    /// rescheduling; everything else is keyed by name and start time.
    pub fn event_key(&self) -> String {
        match (&self.id, self.is_tuition()) {
            (Some(id), true) => format!("ptm-tuition-{}", id),
            _ => format!("ptm-event-{}-{}", self.name, self.start_time),
        }
    }

    /// Human readable title, underscores replaced by spaces.
    pub fn summary(&self) -> String {
        self.name.replace('_', " ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tuition(id: Option<&str>) -> SolutionEvent {
        SolutionEvent {
            name: "Math_Grade_10".to_string(),
            category: TUITION_CATEGORY.to_string(),
            start_time: "2025-09-13T15:00:00".parse().unwrap(),
            end_time: "2025-09-13T16:30:00".parse().unwrap(),
            id: id.map(str::to_string),
        }
    }

    #[test]
    fn test_tuition_key_uses_tuition_id() {
        let event = tuition(Some("0f8fad5b-d9cb-469f-a165-70867728950e"));
        assert_eq!(
            event.event_key(),
            "ptm-tuition-0f8fad5b-d9cb-469f-a165-70867728950e"
        );
    }

    #[test]
    fn test_tuition_without_id_falls_back_to_name_and_start() {
        let event = tuition(None);
        assert_eq!(event.event_key(), "ptm-event-Math_Grade_10-2025-09-13T15:00:00");
    }

    #[test]
    fn test_non_tuition_key_ignores_id() {
        let mut event = tuition(Some("abc"));
        event.category = "Testing".to_string();
        assert!(event.event_key().starts_with("ptm-event-"));
    }

    #[test]
    fn test_summary_replaces_underscores() {
        assert_eq!(tuition(None).summary(), "Math Grade 10");
    }

    #[test]
    fn test_from_document_single_object() {
        let doc = serde_json::json!({
            "name": "Test Event from SQL",
            "category": "Testing",
            "start_time": "2025-09-15T10:00:00",
            "end_time": "2025-09-15T11:00:00"
        });
        let events = SolutionEvent::from_document(&doc).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].category, "Testing");
        assert!(events[0].id.is_none());
    }

    #[test]
    fn test_from_document_list() {
        let doc = serde_json::json!([
            {"name": "A", "category": "Tuition", "id": "t-1",
             "start_time": "2025-09-15T10:00:00", "end_time": "2025-09-15T11:00:00"},
            {"name": "B", "category": "Gym",
             "start_time": "2025-09-15T12:00:00", "end_time": "2025-09-15T13:00:00"}
        ]);
        let events = SolutionEvent::from_document(&doc).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].is_tuition());
        assert_eq!(events[0].event_key(), "ptm-tuition-t-1");
    }

    #[test]
    fn test_from_document_rejects_incomplete_event() {
        let doc = serde_json::json!({"name": "E2E Test"});
        assert!(SolutionEvent::from_document(&doc).is_err());
    }

    proptest! {
        #[test]
        fn prop_event_key_is_deterministic(
            name in "[A-Za-z_]{1,20}",
            hour in 0i8..23,
            id in proptest::option::of("[a-f0-9-]{1,36}"),
        ) {
            let start = jiff::civil::date(2025, 9, 15).at(hour, 0, 0, 0);
            let event = SolutionEvent {
                name,
                category: TUITION_CATEGORY.to_string(),
                start_time: start,
                end_time: start,
                id,
            };
            prop_assert_eq!(event.event_key(), event.clone().event_key());
            prop_assert!(event.event_key().starts_with("ptm-"));
        }
    }
}
