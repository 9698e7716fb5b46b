//! Notification consumer.
//!
//! [`ListenLoop`] receives notifications, [`RunDispatcher`] resolves them to
//! runs and calls the [`RunHandler`], and [`ReconcileTask`] periodically
//! dispatches runs whose notification was missed.

mod dispatcher;
mod handler;
mod listen;
mod reconcile;
mod runner;
mod source;

pub use dispatcher::{DispatchOutcome, RunDispatcher};
pub use handler::{DispatchContext, LoggingRunHandler, RunHandler, TriggerKind};
pub use listen::{Backoff, ListenLoop};
pub use reconcile::ReconcileTask;
pub use runner::ListenerWorker;
pub use source::RunSource;
