//! Ledger command handlers: record, remove, trigger, runs and events.

use std::path::Path;

use crate::config::Settings;
use crate::db::establish_async_connection_pool;
use crate::error::{AppError, AppResult};
use crate::models::{CalendarEventSummary, RunStatus, RunSummary, SolutionEvent};
use crate::notify::{Channel, ManualCommand};
use crate::services::{LedgerService, RecordRun, Services};

/// Arguments of `record`
#[derive(Debug, Clone)]
pub struct RecordArgs {
    pub status: RunStatus,
    pub fingerprint: String,
    pub solution: Option<String>,
    pub solution_file: Option<std::path::PathBuf>,
    pub started_at: Option<jiff::Timestamp>,
}

/// Handler for the commands that read or write the ledger directly
pub struct LedgerCommandHandler {
    service: LedgerService,
}

impl LedgerCommandHandler {
    pub fn new(service: LedgerService) -> Self {
        Self { service }
    }

    /// Builds the handler on a fresh connection pool.
    pub async fn connect(config: &Settings) -> AppResult<Self> {
        let pool = establish_async_connection_pool(&config.database).await?;
        Ok(Self::new(Services::new(pool).ledger))
    }

    pub async fn record(&self, args: RecordArgs) -> AppResult<()> {
        let raw = match (&args.solution, &args.solution_file) {
            (Some(inline), _) => inline.clone(),
            (None, Some(path)) => read_solution_file(path)?,
            (None, None) => {
                return Err(AppError::Validation {
                    field: "solution_data".to_string(),
                    reason: "One of --solution or --solution-file is required".to_string(),
                });
            }
        };

        let run_id = self
            .service
            .record_run(RecordRun {
                status: args.status,
                input_version_hash: args.fingerprint,
                solution_data: LedgerService::parse_solution(&raw)?,
                started_at: args.started_at,
            })
            .await?;

        println!("{}", run_id);
        Ok(())
    }

    pub async fn remove(&self, run_id: i32) -> AppResult<()> {
        let affected = self.service.remove_run(run_id).await?;
        println!("{}", affected);
        Ok(())
    }

    pub async fn trigger(&self) -> AppResult<()> {
        self.service.trigger_latest().await?;
        println!("{}", format_trigger());
        Ok(())
    }

    pub async fn runs(&self, limit: i64) -> AppResult<()> {
        let runs = self.service.recent_runs(limit).await?;
        print!("{}", format_runs(&runs));
        Ok(())
    }

    pub async fn events(&self, run_id: Option<i32>, unmapped: bool) -> AppResult<()> {
        match (run_id, unmapped) {
            (Some(run_id), true) => {
                let events = self.service.unmapped_events(run_id).await?;
                print!("{}", format_solution_events(&events));
            }
            _ => {
                let events = self.service.calendar_events(run_id).await?;
                print!("{}", format_calendar_events(&events));
            }
        }
        Ok(())
    }
}

fn read_solution_file(path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path).map_err(|e| AppError::Validation {
        field: "solution_file".to_string(),
        reason: format!("Cannot read '{}': {}", path.display(), e),
    })
}

fn format_trigger() -> String {
    format!(
        "Published {} on {}",
        ManualCommand::Latest.as_str(),
        Channel::ManualTrigger.as_str()
    )
}

fn format_runs(runs: &[RunSummary]) -> String {
    if runs.is_empty() {
        return "No timetable runs recorded\n".to_string();
    }

    let mut out = format!(
        "{:>8}  {:<25}  {:<8}  {}\n",
        "ID", "STARTED AT", "STATUS", "INPUT VERSION"
    );
    for run in runs {
        out.push_str(&format!(
            "{:>8}  {:<25}  {:<8}  {}\n",
            run.id,
            run.run_started_at.to_string(),
            run.status.as_str(),
            run.input_version_hash
        ));
    }
    out
}

fn format_calendar_events(events: &[CalendarEventSummary]) -> String {
    if events.is_empty() {
        return "No calendar events mapped\n".to_string();
    }

    let mut out = format!("{:>8}  {:>6}  {:<40}  {}\n", "ID", "RUN", "EVENT KEY", "GOOGLE EVENT ID");
    for event in events {
        out.push_str(&format!(
            "{:>8}  {:>6}  {:<40}  {}\n",
            event.id, event.timetable_run_id, event.event_key, event.google_event_id
        ));
    }
    out
}

fn format_solution_events(events: &[SolutionEvent]) -> String {
    if events.is_empty() {
        return "Every solution event is mapped\n".to_string();
    }

    let mut out = String::new();
    for event in events {
        out.push_str(&format!(
            "{}  {}  {} - {}\n",
            event.event_key(),
            event.summary(),
            event.start_time,
            event.end_time
        ));
    }
    out
}
