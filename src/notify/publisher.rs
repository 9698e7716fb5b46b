//! Publishing on notification channels.

use diesel::sql_types::Text;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::AppResult;
use crate::notify::{Channel, ManualCommand, NotifyError};

/// Sends notifications through a pooled connection.
///
/// `pg_notify` is transactional: outside an explicit transaction the
/// statement autocommits and listeners receive the payload right away.
#[derive(Clone)]
pub struct NotificationPublisher {
    pool: AsyncDbPool,
}

impl NotificationPublisher {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Publishes `payload` on `channel`.
    pub async fn publish(&self, channel: Channel, payload: &str) -> AppResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::sql_query("SELECT pg_notify($1, $2)")
            .bind::<Text, _>(channel.as_str())
            .bind::<Text, _>(payload)
            .execute(&mut conn)
            .await
            .map_err(|source| NotifyError::Publish {
                channel: channel.as_str().to_string(),
                source,
            })?;

        tracing::info!(channel = %channel, payload, "Notification published");
        Ok(())
    }

    /// Asks listening workers to re-process the newest processable run.
    pub async fn trigger_latest(&self) -> AppResult<()> {
        self.publish(Channel::ManualTrigger, ManualCommand::Latest.as_str())
            .await
    }
}
