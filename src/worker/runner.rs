//! Wires the dispatcher, reconciliation and listen loop together.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::db::AsyncDbPool;
use crate::error::AppResult;
use crate::repositories::TimetableRunRepository;
use crate::worker::{ListenLoop, ReconcileTask, RunDispatcher, RunHandler};

/// The long-running consumer behind `timetable-ledger listen`.
pub struct ListenerWorker {
    settings: Settings,
    pool: AsyncDbPool,
    handler: Arc<dyn RunHandler>,
}

impl ListenerWorker {
    pub fn new(settings: Settings, pool: AsyncDbPool, handler: Arc<dyn RunHandler>) -> Self {
        Self {
            settings,
            pool,
            handler,
        }
    }

    /// Runs until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> AppResult<()> {
        let listener_config = self.settings.listener.clone();
        let runs = TimetableRunRepository::new(self.pool);
        let dispatcher = Arc::new(RunDispatcher::new(Arc::new(runs), self.handler));

        dispatcher.initialise(listener_config.replay_on_start).await?;

        let reconcile = ReconcileTask::start(
            Arc::clone(&dispatcher),
            &listener_config.reconcile_cron,
            listener_config.reconcile_batch_size,
        )
        .await?;

        let result = ListenLoop::new(
            self.settings.database.url.as_str(),
            dispatcher,
            listener_config,
        )
        .run(cancel)
        .await;

        reconcile.stop().await?;
        result
    }
}
