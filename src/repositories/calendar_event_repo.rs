//! Calendar mapping repository.
//!
//! One row per `(timetable_run_id, event_key)`. Inserting the same pair twice
//! fails with `AppError::Duplicate`; a pair pointing at a missing run fails
//! with `AppError::InvalidReference`.

use diesel::dsl::now;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{CalendarEvent, NewCalendarEvent};

#[derive(Clone)]
pub struct CalendarEventRepository {
    pool: AsyncDbPool,
}

impl CalendarEventRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Stores the external id assigned to one event of a run.
    pub async fn record_mapping(
        &self,
        new_event: NewCalendarEvent,
    ) -> Result<CalendarEvent, AppError> {
        use crate::schema::calendar_events::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(calendar_events)
            .values(&new_event)
            .returning(CalendarEvent::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Refreshes `updated_at` for a mapping that was confirmed again.
    ///
    /// # Returns
    /// `true` when a mapping for the pair exists
    pub async fn touch(&self, run_id: i32, key: &str) -> Result<bool, AppError> {
        use crate::schema::calendar_events::dsl::*;
        let mut conn = self.pool.get().await?;

        let affected = diesel::update(
            calendar_events
                .filter(timetable_run_id.eq(run_id))
                .filter(event_key.eq(key)),
        )
        .set(updated_at.eq(now))
        .execute(&mut conn)
        .await?;

        Ok(affected > 0)
    }

    pub async fn find(&self, run_id: i32, key: &str) -> Result<Option<CalendarEvent>, AppError> {
        use crate::schema::calendar_events::dsl::*;
        let mut conn = self.pool.get().await?;

        calendar_events
            .filter(timetable_run_id.eq(run_id))
            .filter(event_key.eq(key))
            .select(CalendarEvent::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn list_all(&self) -> Result<Vec<CalendarEvent>, AppError> {
        use crate::schema::calendar_events::dsl::*;
        let mut conn = self.pool.get().await?;

        calendar_events
            .order((timetable_run_id.asc(), id.asc()))
            .select(CalendarEvent::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn list_for_run(&self, run_id: i32) -> Result<Vec<CalendarEvent>, AppError> {
        use crate::schema::calendar_events::dsl::*;
        let mut conn = self.pool.get().await?;

        calendar_events
            .filter(timetable_run_id.eq(run_id))
            .order(id.asc())
            .select(CalendarEvent::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Removes every mapping and resets the id sequence.
    pub async fn clear(&self) -> Result<(), AppError> {
        let mut conn = self.pool.get().await?;

        diesel::sql_query("TRUNCATE TABLE calendar_events RESTART IDENTITY")
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}
