//! Service layer for business logic operations.
//!
//! Services coordinate between repositories, the notification publisher and
//! the command handlers.

mod ledger_service;

pub use ledger_service::{LedgerService, RecordRun};

use crate::db::AsyncDbPool;
use crate::notify::NotificationPublisher;
use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
///
/// Cloning is cheap since underlying pools use `Arc` internally.
#[derive(Clone)]
pub struct Services {
    pub ledger: LedgerService,
}

impl Services {
    pub fn new(pool: AsyncDbPool) -> Self {
        let repos = Repositories::new(pool.clone());
        Self {
            ledger: LedgerService::new(
                repos.runs,
                repos.calendar_events,
                NotificationPublisher::new(pool),
            ),
        }
    }
}
