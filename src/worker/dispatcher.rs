//! Turns notifications and scan results into handler calls.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::AppResult;
use crate::models::{RunStatus, TimetableRun};
use crate::notify::{ManualCommand, RunNotification};
use crate::worker::{DispatchContext, RunHandler, RunSource, TriggerKind};

/// How many recently dispatched ids are remembered for de-duplication
const RECENT_CAPACITY: usize = 256;

/// Result of one dispatch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran and succeeded
    Dispatched { run_id: i32 },
    /// The handler ran and returned an error
    Failed { run_id: i32, error: String },
    /// The run's status is not processable
    Skipped { run_id: i32, status: RunStatus },
    /// The run was already handed to the handler
    AlreadyDispatched { run_id: i32 },
    /// No run with this id (removed before it was read)
    Missing { run_id: i32 },
    /// `LATEST` found no processable run
    NothingToProcess,
}

#[derive(Debug, Default)]
struct DispatchState {
    /// Greatest run id seen by this process
    high_water_mark: i32,
    recent: VecDeque<i32>,
}

impl DispatchState {
    /// Marks `run_id` as taken; false when it already was.
    fn claim(&mut self, run_id: i32) -> bool {
        if self.recent.contains(&run_id) {
            return false;
        }
        if self.recent.len() == RECENT_CAPACITY {
            self.recent.pop_front();
        }
        self.recent.push_back(run_id);
        true
    }

    /// Forgets a claim whose run could not be read, so a later notification
    /// or scan can take it again.
    fn release(&mut self, run_id: i32) {
        self.recent.retain(|&id| id != run_id);
    }

    fn advance(&mut self, run_id: i32) {
        self.high_water_mark = self.high_water_mark.max(run_id);
    }
}

/// Dispatches runs to a [`RunHandler`].
///
/// Notifications, manual triggers and reconciliation scans all go through
/// here, so a run reached by several paths is handled once. Manual `LATEST`
/// requests bypass that check.
pub struct RunDispatcher {
    runs: Arc<dyn RunSource>,
    handler: Arc<dyn RunHandler>,
    state: Mutex<DispatchState>,
}

impl RunDispatcher {
    pub fn new(runs: Arc<dyn RunSource>, handler: Arc<dyn RunHandler>) -> Self {
        Self {
            runs,
            handler,
            state: Mutex::new(DispatchState::default()),
        }
    }

    pub async fn high_water_mark(&self) -> i32 {
        self.state.lock().await.high_water_mark
    }

    /// Sets the starting point of reconciliation scans.
    ///
    /// Without `replay`, runs already in the ledger are treated as handled
    /// and only later inserts are dispatched.
    pub async fn initialise(&self, replay: bool) -> AppResult<i32> {
        let mark = if replay {
            0
        } else {
            self.runs.max_id().await?.unwrap_or(0)
        };
        self.state.lock().await.high_water_mark = mark;
        tracing::info!(high_water_mark = mark, replay, "Dispatcher initialised");
        Ok(mark)
    }

    /// Dispatches one decoded notification.
    pub async fn dispatch_notification(
        &self,
        notification: RunNotification,
    ) -> AppResult<DispatchOutcome> {
        match notification {
            RunNotification::NewRun { run_id } => {
                self.dispatch_run(run_id, TriggerKind::Notification).await
            }
            RunNotification::ManualTrigger(ManualCommand::Latest) => {
                match self.runs.latest_processable_id().await? {
                    Some(run_id) => self.dispatch_run(run_id, TriggerKind::Manual).await,
                    None => {
                        tracing::warn!("Manual trigger received but no processable run exists");
                        Ok(DispatchOutcome::NothingToProcess)
                    }
                }
            }
        }
    }

    /// Loads a run by id and dispatches it.
    pub async fn dispatch_run(&self, run_id: i32, trigger: TriggerKind) -> AppResult<DispatchOutcome> {
        if trigger != TriggerKind::Manual && !self.state.lock().await.claim(run_id) {
            tracing::debug!(run_id, %trigger, "Run already dispatched");
            return Ok(DispatchOutcome::AlreadyDispatched { run_id });
        }

        let found = match self.runs.find_by_id(run_id).await {
            Ok(found) => found,
            Err(error) => {
                if trigger != TriggerKind::Manual {
                    self.state.lock().await.release(run_id);
                }
                tracing::warn!(run_id, %trigger, %error, "Could not load notified run");
                return Err(error);
            }
        };

        match found {
            Some(run) => Ok(self.dispatch_loaded(&run, trigger).await),
            None => {
                self.state.lock().await.advance(run_id);
                tracing::warn!(run_id, %trigger, "Notified run no longer exists");
                Ok(DispatchOutcome::Missing { run_id })
            }
        }
    }

    /// Hands an already claimed run to the handler.
    async fn dispatch_loaded(&self, run: &TimetableRun, trigger: TriggerKind) -> DispatchOutcome {
        self.state.lock().await.advance(run.id);

        if !run.status.is_processable() {
            tracing::info!(
                run_id = run.id,
                status = %run.status,
                "Run is not a completed timetable run, skipping"
            );
            return DispatchOutcome::Skipped {
                run_id: run.id,
                status: run.status.clone(),
            };
        }

        let ctx = DispatchContext::new(trigger);
        match self.handler.handle(run, &ctx).await {
            Ok(()) => {
                tracing::debug!(
                    run_id = run.id,
                    handler = self.handler.name(),
                    dispatch_id = %ctx.dispatch_id,
                    "Run handled"
                );
                DispatchOutcome::Dispatched { run_id: run.id }
            }
            Err(error) => {
                tracing::error!(
                    run_id = run.id,
                    handler = self.handler.name(),
                    dispatch_id = %ctx.dispatch_id,
                    %error,
                    "Run handler failed"
                );
                DispatchOutcome::Failed {
                    run_id: run.id,
                    error: error.to_string(),
                }
            }
        }
    }

    /// Dispatches every run above the high-water mark.
    ///
    /// Covers notifications lost while no listener was connected.
    ///
    /// # Returns
    /// Number of runs handed to the handler
    pub async fn reconcile(&self, batch_size: i64) -> AppResult<usize> {
        let mut handled = 0;

        loop {
            let mark = self.high_water_mark().await;
            let batch = self.runs.list_after(mark, batch_size).await?;
            let exhausted = (batch.len() as i64) < batch_size;

            for run in &batch {
                if !self.state.lock().await.claim(run.id) {
                    self.state.lock().await.advance(run.id);
                    continue;
                }
                if let DispatchOutcome::Dispatched { .. } | DispatchOutcome::Failed { .. } =
                    self.dispatch_loaded(run, TriggerKind::Reconcile).await
                {
                    handled += 1;
                }
            }

            if exhausted || batch.is_empty() {
                break;
            }
        }

        if handled > 0 {
            tracing::info!(handled, "Reconciliation dispatched missed runs");
        }
        Ok(handled)
    }
}
