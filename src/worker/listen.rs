//! Listen loop with reconnect.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::config::ListenerConfig;
use crate::error::AppResult;
use crate::notify::{NotifyError, RunListener};
use crate::worker::RunDispatcher;

/// Capped exponential backoff between reconnect attempts.
#[derive(Debug, Clone)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
            current: min,
        }
    }

    /// Delay before the next attempt; doubles up to the cap.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.min;
    }
}

/// Why one listening session ended
enum SessionEnd {
    Cancelled,
    ConnectionLost(NotifyError),
}

/// Keeps a listener connected and feeds the dispatcher until cancelled.
///
/// After every successful `LISTEN` a reconciliation scan picks up runs
/// inserted while no session was listening.
pub struct ListenLoop {
    database_url: String,
    dispatcher: Arc<RunDispatcher>,
    config: ListenerConfig,
}

impl ListenLoop {
    pub fn new(database_url: impl Into<String>, dispatcher: Arc<RunDispatcher>, config: ListenerConfig) -> Self {
        Self {
            database_url: database_url.into(),
            dispatcher,
            config,
        }
    }

    pub async fn run(&self, cancel: CancellationToken) -> AppResult<()> {
        let mut backoff = Backoff::new(self.config.min_backoff(), self.config.max_backoff());

        loop {
            let connected = tokio::select! {
                _ = cancel.cancelled() => break,
                result = RunListener::connect(&self.database_url) => result,
            };

            let mut listener = match connected {
                Ok(listener) => {
                    backoff.reset();
                    listener
                }
                Err(error) => {
                    let delay = backoff.next_delay();
                    tracing::warn!(%error, retry_in = ?delay, "Listener connection failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(delay) => continue,
                    }
                }
            };

            if let Err(error) = self
                .dispatcher
                .reconcile(self.config.reconcile_batch_size)
                .await
            {
                tracing::error!(%error, "Reconciliation after connect failed");
            }

            match self.consume(&mut listener, &cancel).await {
                SessionEnd::Cancelled => break,
                SessionEnd::ConnectionLost(error) => {
                    let delay = backoff.next_delay();
                    tracing::warn!(%error, retry_in = ?delay, "Listener connection lost, reconnecting");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        tracing::info!("Listener stopped");
        Ok(())
    }

    async fn consume(&self, listener: &mut RunListener, cancel: &CancellationToken) -> SessionEnd {
        let notifications = listener.notifications();
        futures::pin_mut!(notifications);

        loop {
            let item = tokio::select! {
                _ = cancel.cancelled() => return SessionEnd::Cancelled,
                item = notifications.next() => item,
            };

            match item {
                Some(Ok(notification)) => {
                    match self.dispatcher.dispatch_notification(notification).await {
                        Ok(outcome) => tracing::debug!(?outcome, "Notification dispatched"),
                        Err(error) => {
                            tracing::error!(%error, channel = %notification.channel(), "Dispatch failed")
                        }
                    }
                }
                Some(Err(error)) => return SessionEnd::ConnectionLost(error),
                None => return SessionEnd::ConnectionLost(NotifyError::StreamClosed),
            }
        }
    }
}
