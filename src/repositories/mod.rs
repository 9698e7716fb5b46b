//! Repository layer for data access operations.
//!
//! Provides async operations over the run ledger and the calendar mappings.

mod calendar_event_repo;
mod timetable_run_repo;

pub use calendar_event_repo::CalendarEventRepository;
pub use timetable_run_repo::TimetableRunRepository;

use crate::db::AsyncDbPool;

/// Aggregates all repositories for convenient access.
///
/// Since `AsyncDbPool` uses `Arc` internally, cloning is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub runs: TimetableRunRepository,
    pub calendar_events: CalendarEventRepository,
}

impl Repositories {
    /// Creates a new Repositories instance with all repositories initialized.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            runs: TimetableRunRepository::new(pool.clone()),
            calendar_events: CalendarEventRepository::new(pool),
        }
    }
}
