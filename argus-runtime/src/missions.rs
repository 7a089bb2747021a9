use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, warn};

use argus_core::{
    ArgusError, Goal, Mission, MissionAuditEntry, MissionId, MissionStatus, SimWorld,
};
use argus_sim::Simulator;
use argus_store::{MissionQuery, MissionStore};

use crate::error::store_err;

/// Bays closer than this to a requested goal snap the goal onto the bay.
const BAY_SNAP_THRESHOLD_M: f64 = 1.5;

/// Mission CRUD with a full control-plane audit trail.
///
/// Every state-changing operation appends a [`MissionAuditEntry`]; the
/// trail is append-only but not hash-linked (chain-of-trust integrity
/// belongs to run events).
pub struct MissionService {
    store: Arc<dyn MissionStore>,
    sim: Arc<dyn Simulator>,
}

impl MissionService {
    #[must_use]
    pub fn new(store: Arc<dyn MissionStore>, sim: Arc<dyn Simulator>) -> Self {
        Self { store, sim }
    }

    /// Create a draft mission. The goal is normalized against the world:
    /// clamped into the geofence and snapped to a nearby bay.
    pub async fn create(&self, title: &str, goal: Goal) -> Result<Mission, ArgusError> {
        let title = title.trim();
        if title.is_empty() || title.len() > 200 {
            return Err(ArgusError::Validation(
                "mission title must be 1..=200 characters".to_owned(),
            ));
        }

        let goal = self.normalize_goal(goal).await;
        let mission = Mission::new(title, goal.clone());
        self.store
            .insert(mission.clone())
            .await
            .map_err(store_err)?;
        self.audit(
            &mission.id,
            "CREATED",
            None,
            Some(json!({"title": &mission.title, "goal": &goal.0, "status": "draft"})),
            Some(format!("Mission created: {}", mission.title)),
        )
        .await?;
        Ok(mission)
    }

    /// Edit title and/or goal. Only draft and paused missions are editable.
    pub async fn update(
        &self,
        id: &MissionId,
        title: Option<&str>,
        goal: Option<Goal>,
    ) -> Result<Mission, ArgusError> {
        let mut mission = self.get(id).await?;
        if !mission.status.is_editable() {
            return Err(ArgusError::Precondition(format!(
                "mission {id} is {} and cannot be edited",
                mission.status
            )));
        }

        let mut old_values = serde_json::Map::new();
        let mut new_values = serde_json::Map::new();

        if let Some(title) = title {
            let title = title.trim();
            if title.is_empty() || title.len() > 200 {
                return Err(ArgusError::Validation(
                    "mission title must be 1..=200 characters".to_owned(),
                ));
            }
            if title != mission.title {
                old_values.insert("title".to_owned(), Value::String(mission.title.clone()));
                new_values.insert("title".to_owned(), Value::String(title.to_owned()));
                mission.title = title.to_owned();
            }
        }

        if let Some(goal) = goal {
            let goal = self.normalize_goal(goal).await;
            if goal != mission.goal {
                old_values.insert("goal".to_owned(), mission.goal.0.clone());
                new_values.insert("goal".to_owned(), goal.0.clone());
                mission.goal = goal;
            }
        }

        if new_values.is_empty() {
            return Ok(mission);
        }

        mission.updated_at = Some(Utc::now());
        self.store
            .update(mission.clone())
            .await
            .map_err(store_err)?;
        let changes = new_values.keys().cloned().collect::<Vec<_>>().join(", ");
        self.audit(
            id,
            "UPDATED",
            Some(Value::Object(old_values)),
            Some(Value::Object(new_values)),
            Some(format!("Updated: {changes}")),
        )
        .await?;
        self.get(id).await
    }

    /// Transition a mission's status, with audit.
    pub async fn set_status(
        &self,
        id: &MissionId,
        status: MissionStatus,
        details: Option<String>,
        actor: &str,
    ) -> Result<Mission, ArgusError> {
        let mut mission = self.get(id).await?;
        let old_status = mission.status;
        mission.status = status;
        mission.updated_at = Some(Utc::now());
        self.store
            .update(mission.clone())
            .await
            .map_err(store_err)?;
        self.audit_as(
            id,
            "STATUS_CHANGE",
            Some(json!({"status": old_status})),
            Some(json!({"status": status})),
            Some(details.unwrap_or_else(|| format!("Status: {old_status} -> {status}"))),
            actor,
        )
        .await?;
        Ok(mission)
    }

    /// Soft delete: the mission disappears from listings but stays for
    /// audit.
    pub async fn soft_delete(&self, id: &MissionId) -> Result<Mission, ArgusError> {
        self.set_status(
            id,
            MissionStatus::Deleted,
            Some("Mission soft-deleted".to_owned()),
            "operator",
        )
        .await
    }

    /// Reset a completed, failed or paused mission back to draft so it can
    /// be executed again.
    pub async fn replay(&self, id: &MissionId) -> Result<Mission, ArgusError> {
        let mut mission = self.get(id).await?;
        if !mission.status.is_replayable() {
            return Err(ArgusError::Precondition(format!(
                "mission {id} is {} and cannot be replayed",
                mission.status
            )));
        }
        let old_status = mission.status;
        mission.status = MissionStatus::Draft;
        mission.updated_at = Some(Utc::now());
        self.store
            .update(mission.clone())
            .await
            .map_err(store_err)?;
        self.audit(
            id,
            "REPLAYED",
            Some(json!({"status": old_status})),
            Some(json!({"status": "draft"})),
            Some(format!("Mission replayed from {old_status}")),
        )
        .await?;
        Ok(mission)
    }

    /// Fetch a mission or fail with `NotFound`.
    pub async fn get(&self, id: &MissionId) -> Result<Mission, ArgusError> {
        self.store
            .get(id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| ArgusError::NotFound(format!("mission {id}")))
    }

    /// List missions, most recent first.
    pub async fn list(&self, query: &MissionQuery) -> Result<Vec<Mission>, ArgusError> {
        self.store.list(query).await.map_err(store_err)
    }

    /// The audit trail, newest first.
    pub async fn audit_trail(
        &self,
        mission_id: Option<&MissionId>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MissionAuditEntry>, ArgusError> {
        self.store
            .audit_trail(mission_id, limit, offset)
            .await
            .map_err(store_err)
    }

    /// Clamp the goal into the geofence and snap it to the nearest bay
    /// within range. Best-effort: if the world cannot be fetched the goal
    /// passes through unchanged.
    async fn normalize_goal(&self, goal: Goal) -> Goal {
        let world = match self.sim.get_world().await {
            Ok(world) => world,
            Err(e) => {
                warn!(error = %e, "world unavailable, goal left unnormalized");
                return goal;
            }
        };
        Goal(normalized_goal_value(&world, &goal))
    }

    async fn audit(
        &self,
        mission_id: &MissionId,
        action: &str,
        old_values: Option<Value>,
        new_values: Option<Value>,
        details: Option<String>,
    ) -> Result<(), ArgusError> {
        self.audit_as(mission_id, action, old_values, new_values, details, "operator")
            .await
    }

    async fn audit_as(
        &self,
        mission_id: &MissionId,
        action: &str,
        old_values: Option<Value>,
        new_values: Option<Value>,
        details: Option<String>,
        actor: &str,
    ) -> Result<(), ArgusError> {
        debug!(mission_id = %mission_id, action, "mission audit");
        self.store
            .append_audit(MissionAuditEntry {
                mission_id: mission_id.clone(),
                ts: Utc::now(),
                action: action.to_owned(),
                actor: actor.to_owned(),
                old_values,
                new_values,
                details,
            })
            .await
            .map_err(store_err)
    }
}

fn normalized_goal_value(world: &SimWorld, goal: &Goal) -> Value {
    let (mut x, mut y) = world.geofence.clamp(goal.x(), goal.y());

    let mut best: Option<(f64, f64, f64)> = None;
    for bay in &world.bays {
        let d = ((bay.x - x).powi(2) + (bay.y - y).powi(2)).sqrt();
        if best.map_or(true, |(_, _, bd)| d < bd) {
            best = Some((bay.x, bay.y, d));
        }
    }
    if let Some((bx, by, d)) = best {
        if d <= BAY_SNAP_THRESHOLD_M {
            (x, y) = (bx, by);
        }
    }

    json!({"x": x, "y": y})
}
