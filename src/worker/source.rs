//! Read access the dispatcher needs from the ledger.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::TimetableRun;
use crate::repositories::TimetableRunRepository;

#[async_trait]
pub trait RunSource: Send + Sync {
    async fn find_by_id(&self, run_id: i32) -> AppResult<Option<TimetableRun>>;

    async fn latest_processable_id(&self) -> AppResult<Option<i32>>;

    async fn max_id(&self) -> AppResult<Option<i32>>;

    /// Runs above `after_id`, ascending, at most `limit`
    async fn list_after(&self, after_id: i32, limit: i64) -> AppResult<Vec<TimetableRun>>;
}

#[async_trait]
impl RunSource for TimetableRunRepository {
    async fn find_by_id(&self, run_id: i32) -> AppResult<Option<TimetableRun>> {
        TimetableRunRepository::find_by_id(self, run_id).await
    }

    async fn latest_processable_id(&self) -> AppResult<Option<i32>> {
        TimetableRunRepository::latest_processable_id(self).await
    }

    async fn max_id(&self) -> AppResult<Option<i32>> {
        TimetableRunRepository::max_id(self).await
    }

    async fn list_after(&self, after_id: i32, limit: i64) -> AppResult<Vec<TimetableRun>> {
        TimetableRunRepository::list_after(self, after_id, limit).await
    }
}
