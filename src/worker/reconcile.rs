//! Periodic reconciliation on a cron schedule.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::{AppError, AppResult};
use crate::worker::RunDispatcher;

/// Runs [`RunDispatcher::reconcile`] on a cron schedule.
pub struct ReconcileTask {
    scheduler: JobScheduler,
}

impl ReconcileTask {
    /// Schedules the scan and starts the scheduler.
    ///
    /// # Errors
    /// `AppError::Validation` for an unparsable cron expression.
    pub async fn start(
        dispatcher: Arc<RunDispatcher>,
        cron_expression: &str,
        batch_size: i64,
    ) -> AppResult<Self> {
        let scheduler = JobScheduler::new().await.map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;

        let job = Job::new_async(cron_expression, move |_uuid, _lock| {
            let dispatcher = Arc::clone(&dispatcher);
            Box::pin(async move {
                tracing::debug!("Reconciliation scan started");
                if let Err(error) = dispatcher.reconcile(batch_size).await {
                    tracing::error!(%error, "Reconciliation scan failed");
                }
            })
        })
        .map_err(|e| AppError::Validation {
            field: "listener.reconcile_cron".to_string(),
            reason: format!("Invalid cron expression: {}", e),
        })?;

        scheduler.add(job).await.map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;
        scheduler.start().await.map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;

        tracing::info!(cron = cron_expression, "Reconciliation scheduled");
        Ok(Self { scheduler })
    }

    /// Stops the scheduler gracefully
    pub async fn stop(mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })
    }
}
