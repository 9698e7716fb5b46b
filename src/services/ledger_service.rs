//! Ledger service for operator-facing operations.
//!
//! Wraps the repositories and the publisher behind the operations the
//! command line exposes.

use std::collections::HashSet;

use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};
use crate::models::{
    CalendarEvent, CalendarEventSummary, NewCalendarEvent, NewTimetableRun, RunStatus, RunSummary,
    SolutionEvent,
};
use crate::notify::NotificationPublisher;
use crate::repositories::{CalendarEventRepository, TimetableRunRepository};

/// Input for recording a run
#[derive(Debug, Clone)]
pub struct RecordRun {
    pub status: RunStatus,
    pub input_version_hash: String,
    pub solution_data: JsonValue,
    pub started_at: Option<jiff::Timestamp>,
}

impl From<RecordRun> for NewTimetableRun {
    fn from(request: RecordRun) -> Self {
        let new_run = NewTimetableRun::new(
            request.status,
            request.input_version_hash,
            request.solution_data,
        );
        match request.started_at {
            Some(at) => new_run.started_at(at),
            None => new_run,
        }
    }
}

#[derive(Clone)]
pub struct LedgerService {
    runs: TimetableRunRepository,
    calendar_events: CalendarEventRepository,
    publisher: NotificationPublisher,
}

impl LedgerService {
    pub fn new(
        runs: TimetableRunRepository,
        calendar_events: CalendarEventRepository,
        publisher: NotificationPublisher,
    ) -> Self {
        Self {
            runs,
            calendar_events,
            publisher,
        }
    }

    /// Parses a solution document given as JSON text.
    pub fn parse_solution(raw: &str) -> AppResult<JsonValue> {
        serde_json::from_str(raw).map_err(|e| AppError::Validation {
            field: "solution_data".to_string(),
            reason: format!("Malformed JSON: {}", e),
        })
    }

    /// Records a run; listeners are notified once the insert commits.
    ///
    /// # Returns
    /// The new run id
    pub async fn record_run(&self, request: RecordRun) -> AppResult<i32> {
        let status = request.status.clone();
        let run_id = self.runs.record(request.into()).await?;
        tracing::info!(run_id, %status, "Timetable run recorded");
        Ok(run_id)
    }

    /// Removes a run.
    ///
    /// # Returns
    /// Affected rows; 0 when the id does not exist
    pub async fn remove_run(&self, run_id: i32) -> AppResult<usize> {
        let affected = self.runs.remove(run_id).await?;
        if affected == 0 {
            tracing::info!(run_id, "No run to remove");
        } else {
            tracing::info!(run_id, "Timetable run removed");
        }
        Ok(affected)
    }

    /// Publishes `LATEST` on the manual channel.
    pub async fn trigger_latest(&self) -> AppResult<()> {
        self.publisher.trigger_latest().await
    }

    pub async fn recent_runs(&self, limit: i64) -> AppResult<Vec<RunSummary>> {
        let runs = self.runs.list_recent(limit).await?;
        Ok(runs.iter().map(RunSummary::from).collect())
    }

    /// Decoded solution events of a run.
    ///
    /// # Errors
    /// `NotFound` for a missing run, `Validation` for an unreadable document
    pub async fn solution_events(&self, run_id: i32) -> AppResult<Vec<SolutionEvent>> {
        let document = self
            .runs
            .solution_for(run_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: "timetable_runs".to_string(),
                field: "id".to_string(),
                value: run_id.to_string(),
            })?;

        SolutionEvent::from_document(&document).map_err(|e| AppError::Validation {
            field: "solution_data".to_string(),
            reason: e.to_string(),
        })
    }

    /// Solution events of a run that have no calendar mapping yet.
    pub async fn unmapped_events(&self, run_id: i32) -> AppResult<Vec<SolutionEvent>> {
        let events = self.solution_events(run_id).await?;
        let mapped: HashSet<String> = self
            .calendar_events
            .list_for_run(run_id)
            .await?
            .into_iter()
            .map(|event| event.event_key)
            .collect();

        Ok(events
            .into_iter()
            .filter(|event| !mapped.contains(&event.event_key()))
            .collect())
    }

    /// Stores the external id for one event of a run.
    pub async fn record_mapping(
        &self,
        run_id: i32,
        event_key: &str,
        google_event_id: &str,
    ) -> AppResult<CalendarEvent> {
        let event = self
            .calendar_events
            .record_mapping(NewCalendarEvent::new(run_id, event_key, google_event_id))
            .await?;
        tracing::debug!(run_id, event_key, google_event_id, "Calendar mapping recorded");
        Ok(event)
    }

    /// Records a mapping, or refreshes it when the pair is already mapped.
    ///
    /// # Returns
    /// `true` when a new row was inserted
    pub async fn upsert_mapping(
        &self,
        run_id: i32,
        event_key: &str,
        google_event_id: &str,
    ) -> AppResult<bool> {
        match self.record_mapping(run_id, event_key, google_event_id).await {
            Ok(_) => Ok(true),
            Err(error) if error.is_duplicate() => {
                self.calendar_events.touch(run_id, event_key).await?;
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    pub async fn calendar_events(&self, run_id: Option<i32>) -> AppResult<Vec<CalendarEventSummary>> {
        let events = match run_id {
            Some(run_id) => self.calendar_events.list_for_run(run_id).await?,
            None => self.calendar_events.list_all().await?,
        };
        Ok(events.iter().map(CalendarEventSummary::from).collect())
    }

    /// Drops every calendar mapping.
    pub async fn clear_calendar_events(&self) -> AppResult<()> {
        self.calendar_events.clear().await?;
        tracing::info!("Calendar mappings cleared");
        Ok(())
    }
}
