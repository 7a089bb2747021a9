use async_trait::async_trait;

use argus_core::{Mission, MissionAuditEntry, MissionId};

use crate::error::StoreError;

/// Filters for listing missions.
#[derive(Debug, Clone, Default)]
pub struct MissionQuery {
    /// Include soft-deleted missions in the listing.
    pub include_deleted: bool,
    pub limit: usize,
    pub offset: usize,
}

impl MissionQuery {
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

/// Storage for missions and their control-plane audit trail.
#[async_trait]
pub trait MissionStore: Send + Sync {
    /// Persist a new mission.
    async fn insert(&self, mission: Mission) -> Result<(), StoreError>;

    /// Fetch a mission by id.
    async fn get(&self, id: &MissionId) -> Result<Option<Mission>, StoreError>;

    /// Replace a stored mission. No-op if the mission does not exist.
    async fn update(&self, mission: Mission) -> Result<(), StoreError>;

    /// List missions ordered by `created_at` descending.
    async fn list(&self, query: &MissionQuery) -> Result<Vec<Mission>, StoreError>;

    /// Append one entry to the mission audit log.
    async fn append_audit(&self, entry: MissionAuditEntry) -> Result<(), StoreError>;

    /// Audit entries, newest first. `mission_id = None` returns the trail
    /// across all missions.
    async fn audit_trail(
        &self,
        mission_id: Option<&MissionId>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MissionAuditEntry>, StoreError>;
}
