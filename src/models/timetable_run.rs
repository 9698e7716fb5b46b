//! Timetable run models for the run ledger.
//!
//! A run is one attempt to compute a schedule. Rows are inserted by a producer,
//! never updated, and may be removed administratively.

use std::io::Write;
use std::str::FromStr;

use diesel::AsExpression;
use diesel::FromSqlRow;
use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use jiff_diesel::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::SolutionEvent;

// ============================================================================
// Enums
// ============================================================================

/// Status label of a timetable run, stored as upper-case text
///
/// Producers write the column freely, so labels this crate does not know are
/// kept verbatim in [`RunStatus::Other`] and never processed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Failed,
    /// Inserted by hand by an operator, outside the solver pipeline
    Manual,
    /// Any other label found in the ledger
    #[serde(untagged)]
    Other(String),
}

impl RunStatus {
    /// Statuses a consumer is allowed to act on.
    pub const PROCESSABLE: [RunStatus; 2] = [RunStatus::Success, RunStatus::Manual];

    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Pending => "PENDING",
            RunStatus::Running => "RUNNING",
            RunStatus::Success => "SUCCESS",
            RunStatus::Failed => "FAILED",
            RunStatus::Manual => "MANUAL",
            RunStatus::Other(label) => label,
        }
    }

    /// Decodes a stored label, keeping unknown ones as [`RunStatus::Other`].
    pub fn from_label(label: &str) -> Self {
        label
            .parse()
            .unwrap_or_else(|_| RunStatus::Other(label.to_string()))
    }

    pub fn is_processable(&self) -> bool {
        Self::PROCESSABLE.contains(self)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(RunStatus::Pending),
            "RUNNING" => Ok(RunStatus::Running),
            "SUCCESS" => Ok(RunStatus::Success),
            "FAILED" => Ok(RunStatus::Failed),
            "MANUAL" => Ok(RunStatus::Manual),
            _ => Err(format!(
                "Unrecognized run status '{}'. Valid statuses are: PENDING, RUNNING, SUCCESS, FAILED, MANUAL",
                s
            )),
        }
    }
}

impl diesel::query_builder::QueryId for RunStatus {
    type QueryId = RunStatus;
    const HAS_STATIC_QUERY_ID: bool = false;
}

impl ToSql<Text, Pg> for RunStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Pg> for RunStatus {
    fn from_sql(
        bytes: <Pg as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let label = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(RunStatus::from_label(&label))
    }
}

// ============================================================================
// TimetableRun Models (Query/Insert)
// ============================================================================

/// TimetableRun query model for SELECT operations
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::timetable_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TimetableRun {
    pub id: i32,
    pub run_started_at: Timestamp,
    pub status: RunStatus,
    pub input_version_hash: String,
    pub solution_data: JsonValue,
}

impl TimetableRun {
    /// Start time as a jiff timestamp.
    pub fn started_at(&self) -> jiff::Timestamp {
        self.run_started_at.to_jiff()
    }

    /// Decodes the solution document into its events.
    ///
    /// The document is either a list of events or a single event object.
    pub fn solution_events(&self) -> Result<Vec<SolutionEvent>, serde_json::Error> {
        SolutionEvent::from_document(&self.solution_data)
    }
}

/// NewTimetableRun insert model for INSERT operations
///
/// `run_started_at` left as `None` is inserted as `DEFAULT`, i.e. the
/// insertion time.
#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::timetable_runs)]
pub struct NewTimetableRun {
    pub run_started_at: Option<Timestamp>,
    pub status: RunStatus,
    pub input_version_hash: String,
    pub solution_data: JsonValue,
}

impl NewTimetableRun {
    pub fn new(
        status: RunStatus,
        input_version_hash: impl Into<String>,
        solution_data: JsonValue,
    ) -> Self {
        Self {
            run_started_at: None,
            status,
            input_version_hash: input_version_hash.into(),
            solution_data,
        }
    }

    /// Pins the start time instead of letting the database default it.
    pub fn started_at(mut self, at: jiff::Timestamp) -> Self {
        self.run_started_at = Some(Timestamp::from(at));
        self
    }
}

/// Serializable view of a run for command output
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub id: i32,
    pub run_started_at: jiff::Timestamp,
    pub status: RunStatus,
    pub input_version_hash: String,
}

impl From<&TimetableRun> for RunSummary {
    fn from(run: &TimetableRun) -> Self {
        Self {
            id: run.id,
            run_started_at: run.started_at(),
            status: run.status.clone(),
            input_version_hash: run.input_version_hash.clone(),
        }
    }
}
