//! Receiving side of LISTEN/NOTIFY.

use diesel_async::{AsyncPgConnection, SimpleAsyncConnection};
use futures::{Stream, StreamExt};

use crate::db::establish_listener_connection;
use crate::error::AppResult;
use crate::notify::{Channel, NotifyError, RunNotification};

/// A dedicated connection subscribed to every [`Channel`].
///
/// Notifications sent while no listener is connected are lost; callers
/// recover them with a reconciliation scan after reconnecting.
pub struct RunListener {
    conn: AsyncPgConnection,
}

impl RunListener {
    /// Connects and issues `LISTEN` for each channel.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let mut conn = establish_listener_connection(database_url).await?;

        for channel in Channel::ALL {
            conn.batch_execute(&channel.listen_sql())
                .await
                .map_err(|source| NotifyError::Subscribe {
                    channel: channel.as_str().to_string(),
                    source,
                })?;
            tracing::debug!(channel = %channel, "Listening");
        }

        tracing::info!(
            channels = ?Channel::ALL.map(|channel| channel.as_str()),
            "Notification listener connected"
        );
        Ok(Self { conn })
    }

    /// Decoded notifications in arrival order.
    ///
    /// Unknown channels and malformed payloads are logged and skipped. An
    /// `Err` item means the connection is unusable.
    pub fn notifications(
        &mut self,
    ) -> impl Stream<Item = Result<RunNotification, NotifyError>> + '_ {
        self.conn.notifications_stream().filter_map(|item| async move {
            match item {
                Ok(raw) => match RunNotification::parse(&raw.channel, &raw.payload) {
                    Ok(notification) => {
                        tracing::debug!(
                            channel = %raw.channel,
                            payload = %raw.payload,
                            sender_pid = raw.process_id,
                            "Notification received"
                        );
                        Some(Ok(notification))
                    }
                    Err(error) => {
                        tracing::warn!(%error, "Ignoring notification");
                        None
                    }
                },
                Err(source) => Some(Err(NotifyError::Stream { source })),
            }
        })
    }
}
