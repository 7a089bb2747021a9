use async_trait::async_trait;
use chrono::{DateTime, Utc};

use argus_core::{MissionId, Run, RunId, RunStatus};

use crate::error::StoreError;

/// Filters for listing runs.
#[derive(Debug, Clone, Default)]
pub struct RunQuery {
    pub mission_id: Option<MissionId>,
    pub status: Option<RunStatus>,
    pub limit: usize,
    pub offset: usize,
}

impl RunQuery {
    /// Effective limit: defaults to 50, capped at 200.
    #[must_use]
    pub fn effective_limit(&self) -> usize {
        if self.limit == 0 {
            50
        } else {
            self.limit.min(200)
        }
    }
}

/// Storage for runs.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Persist a new run.
    async fn insert(&self, run: Run) -> Result<(), StoreError>;

    /// Fetch a run by id.
    async fn get(&self, id: &RunId) -> Result<Option<Run>, StoreError>;

    /// Transition a run's status, setting `ended_at` for terminal states.
    /// Returns the updated run, or `None` if it does not exist.
    async fn set_status(
        &self,
        id: &RunId,
        status: RunStatus,
        ended_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Run>, StoreError>;

    /// List runs ordered by `started_at` descending.
    async fn list(&self, query: &RunQuery) -> Result<Vec<Run>, StoreError>;

    /// Remove a run. The caller cascades deletion to the run's event chain
    /// and telemetry samples.
    async fn delete(&self, id: &RunId) -> Result<bool, StoreError>;
}
