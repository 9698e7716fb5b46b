//! PostgreSQL LISTEN/NOTIFY plumbing for the run ledger.

mod channel;
mod error;
mod listener;
mod publisher;

pub use channel::{Channel, ManualCommand, RunNotification};
pub use error::NotifyError;
pub use listener::RunListener;
pub use publisher::NotificationPublisher;
