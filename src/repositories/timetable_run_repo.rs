//! Run ledger repository.
//!
//! Insert and delete are the only writes; a run is never updated. Every
//! committed insert fires the `new_timetable_run` notification from the
//! database trigger, so nothing here publishes explicitly.

use diesel::dsl::max;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde_json::Value as JsonValue;

use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{NewTimetableRun, RunStatus, TimetableRun};

/// Run ledger repository holding an async connection pool.
#[derive(Clone)]
pub struct TimetableRunRepository {
    pool: AsyncDbPool,
}

impl TimetableRunRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Records a run and returns its id.
    ///
    /// # Arguments
    /// * `new_run` - Status, fingerprint, solution and optional start time
    ///
    /// # Returns
    /// The id assigned by the sequence. Ids are unique and increasing.
    pub async fn record(&self, new_run: NewTimetableRun) -> Result<i32, AppError> {
        let mut conn = self.pool.get().await?;
        Self::record_on(&mut conn, &new_run).await
    }

    /// Records a run on a caller-owned connection.
    ///
    /// Use this inside a transaction: the notification is only delivered if
    /// that transaction commits.
    pub async fn record_on(
        conn: &mut AsyncPgConnection,
        new_run: &NewTimetableRun,
    ) -> Result<i32, AppError> {
        use crate::schema::timetable_runs::dsl::*;

        diesel::insert_into(timetable_runs)
            .values(new_run)
            .returning(id)
            .get_result(conn)
            .await
            .map_err(AppError::from)
    }

    /// Deletes a run.
    ///
    /// # Returns
    /// The number of affected rows; 0 for an id that does not exist.
    ///
    /// # Errors
    /// `AppError::StillReferenced` while calendar mappings point at the run.
    pub async fn remove(&self, run_id: i32) -> Result<usize, AppError> {
        use crate::schema::timetable_runs::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(timetable_runs.filter(id.eq(run_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Finds a run by its ID.
    pub async fn find_by_id(&self, run_id: i32) -> Result<Option<TimetableRun>, AppError> {
        use crate::schema::timetable_runs::dsl::*;
        let mut conn = self.pool.get().await?;

        timetable_runs
            .filter(id.eq(run_id))
            .select(TimetableRun::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Like [`find_by_id`](Self::find_by_id) but a missing run is an error.
    pub async fn get(&self, run_id: i32) -> Result<TimetableRun, AppError> {
        self.find_by_id(run_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: "timetable_runs".to_string(),
                field: "id".to_string(),
                value: run_id.to_string(),
            })
    }

    /// Solution document of one run.
    pub async fn solution_for(&self, run_id: i32) -> Result<Option<JsonValue>, AppError> {
        use crate::schema::timetable_runs::dsl::*;
        let mut conn = self.pool.get().await?;

        timetable_runs
            .filter(id.eq(run_id))
            .select(solution_data)
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Id of the newest run a consumer may act on.
    ///
    /// Newest means latest `run_started_at`; ties go to the higher id.
    pub async fn latest_processable_id(&self) -> Result<Option<i32>, AppError> {
        use crate::schema::timetable_runs::dsl::*;
        let mut conn = self.pool.get().await?;

        timetable_runs
            .filter(status.eq_any(RunStatus::PROCESSABLE.to_vec()))
            .order((run_started_at.desc(), id.desc()))
            .select(id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Greatest id in the ledger, if any.
    pub async fn max_id(&self) -> Result<Option<i32>, AppError> {
        use crate::schema::timetable_runs::dsl::*;
        let mut conn = self.pool.get().await?;

        timetable_runs
            .select(max(id))
            .first(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Runs with an id above `after_id`, oldest first.
    pub async fn list_after(&self, after_id: i32, limit: i64) -> Result<Vec<TimetableRun>, AppError> {
        use crate::schema::timetable_runs::dsl::*;
        let mut conn = self.pool.get().await?;

        timetable_runs
            .filter(id.gt(after_id))
            .order(id.asc())
            .limit(limit)
            .select(TimetableRun::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Newest runs first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<TimetableRun>, AppError> {
        use crate::schema::timetable_runs::dsl::*;
        let mut conn = self.pool.get().await?;

        timetable_runs
            .order(id.desc())
            .limit(limit)
            .select(TimetableRun::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
