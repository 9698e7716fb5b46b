//! Pluggable processing of dispatched runs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::TimetableRun;

/// What caused a run to be dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// `new_timetable_run` from the insert trigger
    Notification,
    /// `LATEST` on the manual channel
    Manual,
    /// Found by a reconciliation scan
    Reconcile,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Notification => "notification",
            TriggerKind::Manual => "manual",
            TriggerKind::Reconcile => "reconcile",
        }
    }
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-dispatch context handed to the handler
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub dispatch_id: Uuid,
    pub trigger: TriggerKind,
}

impl DispatchContext {
    pub fn new(trigger: TriggerKind) -> Self {
        Self {
            dispatch_id: Uuid::new_v4(),
            trigger,
        }
    }
}

/// Work performed for each processable run.
///
/// Errors are logged by the dispatcher and never stop the worker. A run is
/// handed over at most once per process, except for manual triggers.
#[async_trait]
pub trait RunHandler: Send + Sync {
    /// Name used in log fields
    fn name(&self) -> &'static str;

    async fn handle(&self, run: &TimetableRun, ctx: &DispatchContext) -> AppResult<()>;
}

/// Handler that only reports what it sees.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingRunHandler;

#[async_trait]
impl RunHandler for LoggingRunHandler {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn handle(&self, run: &TimetableRun, ctx: &DispatchContext) -> AppResult<()> {
        tracing::info!(
            run_id = run.id,
            trigger = %ctx.trigger,
            dispatch_id = %ctx.dispatch_id,
            "New timetable run detected with ID: {}",
            run.id
        );

        match run.solution_events() {
            Ok(events) => {
                let tuition = events.iter().filter(|event| event.is_tuition()).count();
                tracing::info!(
                    run_id = run.id,
                    status = %run.status,
                    fingerprint = %run.input_version_hash,
                    events = events.len(),
                    tuition,
                    "Solution decoded"
                );
            }
            Err(error) => {
                tracing::warn!(run_id = run.id, %error, "Solution document has no readable events");
            }
        }

        Ok(())
    }
}
