use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use argus_core::{Mission, MissionAuditEntry, MissionId, MissionStatus};
use argus_store::{MissionQuery, MissionStore, StoreError};

/// In-memory mission store using `DashMap`, with an append-only audit log.
pub struct MemoryMissionStore {
    missions: DashMap<MissionId, Mission>,
    audit: Mutex<Vec<MissionAuditEntry>>,
}

impl MemoryMissionStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            missions: DashMap::new(),
            audit: Mutex::new(Vec::new()),
        }
    }
}

impl Default for MemoryMissionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MissionStore for MemoryMissionStore {
    async fn insert(&self, mission: Mission) -> Result<(), StoreError> {
        self.missions.insert(mission.id.clone(), mission);
        Ok(())
    }

    async fn get(&self, id: &MissionId) -> Result<Option<Mission>, StoreError> {
        Ok(self.missions.get(id).map(|m| m.value().clone()))
    }

    async fn update(&self, mission: Mission) -> Result<(), StoreError> {
        if self.missions.contains_key(&mission.id) {
            self.missions.insert(mission.id.clone(), mission);
        }
        Ok(())
    }

    async fn list(&self, query: &MissionQuery) -> Result<Vec<Mission>, StoreError> {
        let mut missions: Vec<Mission> = self
            .missions
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|m| query.include_deleted || m.status != MissionStatus::Deleted)
            .collect();
        missions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(missions
            .into_iter()
            .skip(query.offset)
            .take(query.effective_limit())
            .collect())
    }

    async fn append_audit(&self, entry: MissionAuditEntry) -> Result<(), StoreError> {
        self.audit.lock().push(entry);
        Ok(())
    }

    async fn audit_trail(
        &self,
        mission_id: Option<&MissionId>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MissionAuditEntry>, StoreError> {
        let audit = self.audit.lock();
        let mut entries: Vec<MissionAuditEntry> = audit
            .iter()
            .filter(|e| mission_id.map_or(true, |id| &e.mission_id == id))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.ts.cmp(&a.ts));
        Ok(entries.into_iter().skip(offset).take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_core::Goal;
    use chrono::Utc;

    fn audit_entry(mission_id: &MissionId, action: &str) -> MissionAuditEntry {
        MissionAuditEntry {
            mission_id: mission_id.clone(),
            ts: Utc::now(),
            action: action.to_owned(),
            actor: "operator".to_owned(),
            old_values: None,
            new_values: None,
            details: None,
        }
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = MemoryMissionStore::new();
        let mission = Mission::new("Deliver", Goal::at(5.0, 5.0));
        let id = mission.id.clone();
        store.insert(mission).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn listing_hides_deleted_by_default() {
        let store = MemoryMissionStore::new();
        let mut mission = Mission::new("Gone", Goal::at(1.0, 1.0));
        mission.status = MissionStatus::Deleted;
        store.insert(mission).await.unwrap();
        store
            .insert(Mission::new("Here", Goal::at(2.0, 2.0)))
            .await
            .unwrap();

        let visible = store.list(&MissionQuery::default()).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Here");

        let all = store
            .list(&MissionQuery {
                include_deleted: true,
                ..MissionQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn audit_trail_filters_by_mission() {
        let store = MemoryMissionStore::new();
        let a = MissionId::new("mis_a");
        let b = MissionId::new("mis_b");
        store.append_audit(audit_entry(&a, "CREATED")).await.unwrap();
        store.append_audit(audit_entry(&b, "CREATED")).await.unwrap();
        store.append_audit(audit_entry(&a, "UPDATED")).await.unwrap();

        assert_eq!(store.audit_trail(Some(&a), 100, 0).await.unwrap().len(), 2);
        assert_eq!(store.audit_trail(None, 100, 0).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_ignores_unknown_mission() {
        let store = MemoryMissionStore::new();
        let mission = Mission::new("Phantom", Goal::at(0.0, 0.0));
        let id = mission.id.clone();
        store.update(mission).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
    }
}
