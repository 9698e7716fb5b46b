//! Listen command handler
//!
//! Runs the notification consumer until Ctrl+C or SIGTERM.

use std::sync::Arc;

use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::db::{establish_async_connection_pool, run_pending_migrations};
use crate::error::AppResult;
use crate::worker::{ListenerWorker, LoggingRunHandler, RunHandler};

/// Handler for the listen command
pub struct ListenCommandHandler {
    config: Settings,
    handler: Arc<dyn RunHandler>,
}

impl ListenCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self::with_handler(config, Arc::new(LoggingRunHandler))
    }

    /// Uses a custom handler instead of [`LoggingRunHandler`].
    pub fn with_handler(config: Settings, handler: Arc<dyn RunHandler>) -> Self {
        Self { config, handler }
    }

    /// Runs the worker until a shutdown signal arrives.
    ///
    /// # Errors
    /// - Migration errors when `database.auto_migrate` is set
    /// - Connection pool errors
    /// - Invalid reconciliation schedule
    pub async fn execute(self) -> AppResult<()> {
        if self.config.database.auto_migrate {
            let applied = run_pending_migrations(&self.config.database.url).await?;
            tracing::info!(count = applied.len(), "Pending migrations applied");
        }

        let pool = establish_async_connection_pool(&self.config.database).await?;

        let cancel = CancellationToken::new();
        let signal_token = cancel.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            signal_token.cancel();
        });

        tracing::info!(
            handler = self.handler.name(),
            channels = "new_timetable_run, manual-ptm-misc-trigger",
            "Starting listener"
        );

        ListenerWorker::new(self.config, pool, self.handler)
            .run(cancel)
            .await?;

        tracing::info!("Listener shutdown complete");
        Ok(())
    }
}

/// Waits for Ctrl+C or SIGTERM.
///
/// A signal handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
