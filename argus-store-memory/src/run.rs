use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use argus_core::{Run, RunId, RunStatus};
use argus_store::{RunQuery, RunStore, StoreError};

/// In-memory run store using `DashMap`.
pub struct MemoryRunStore {
    runs: DashMap<RunId, Run>,
}

impl MemoryRunStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runs: DashMap::new(),
        }
    }
}

impl Default for MemoryRunStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn insert(&self, run: Run) -> Result<(), StoreError> {
        self.runs.insert(run.id.clone(), run);
        Ok(())
    }

    async fn get(&self, id: &RunId) -> Result<Option<Run>, StoreError> {
        Ok(self.runs.get(id).map(|r| r.value().clone()))
    }

    async fn set_status(
        &self,
        id: &RunId,
        status: RunStatus,
        ended_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Run>, StoreError> {
        let Some(mut run) = self.runs.get_mut(id) else {
            return Ok(None);
        };
        run.status = status;
        if ended_at.is_some() {
            run.ended_at = ended_at;
        }
        Ok(Some(run.clone()))
    }

    async fn list(&self, query: &RunQuery) -> Result<Vec<Run>, StoreError> {
        let mut runs: Vec<Run> = self
            .runs
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|r| {
                query
                    .mission_id
                    .as_ref()
                    .map_or(true, |id| &r.mission_id == id)
                    && query.status.map_or(true, |s| r.status == s)
            })
            .collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(runs
            .into_iter()
            .skip(query.offset)
            .take(query.effective_limit())
            .collect())
    }

    async fn delete(&self, id: &RunId) -> Result<bool, StoreError> {
        Ok(self.runs.remove(id).is_some())
    }
}
