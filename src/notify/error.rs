//! Errors raised by the LISTEN/NOTIFY layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// Notification arrived on a channel nobody subscribed to
    #[error("Unknown notification channel '{channel}'")]
    UnknownChannel { channel: String },

    /// Payload does not match the channel's documented format
    #[error("Invalid payload '{payload}' on channel '{channel}': {reason}")]
    InvalidPayload {
        channel: String,
        payload: String,
        reason: String,
    },

    /// `LISTEN` could not be issued
    #[error("Failed to subscribe to channel '{channel}'")]
    Subscribe {
        channel: String,
        #[source]
        source: diesel::result::Error,
    },

    /// `pg_notify` failed
    #[error("Failed to publish on channel '{channel}'")]
    Publish {
        channel: String,
        #[source]
        source: diesel::result::Error,
    },

    /// The listener connection dropped or reported an error
    #[error("Notification stream failed")]
    Stream {
        #[source]
        source: diesel::result::Error,
    },

    /// The listener connection ended without error
    #[error("Notification stream closed")]
    StreamClosed,
}

impl NotifyError {
    /// Channel the error belongs to, when it is tied to one
    pub fn channel(&self) -> Option<&str> {
        match self {
            NotifyError::UnknownChannel { channel }
            | NotifyError::InvalidPayload { channel, .. }
            | NotifyError::Subscribe { channel, .. }
            | NotifyError::Publish { channel, .. } => Some(channel),
            NotifyError::Stream { .. } | NotifyError::StreamClosed => None,
        }
    }

    /// Errors after which the listener connection must be replaced
    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            NotifyError::Stream { .. } | NotifyError::StreamClosed | NotifyError::Subscribe { .. }
        )
    }
}
