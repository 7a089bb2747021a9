use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::MissionId;

/// Lifecycle states of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Draft,
    Executing,
    Paused,
    Completed,
    Failed,
    /// Soft-deleted; hidden from listings but retained for audit.
    Deleted,
}

impl MissionStatus {
    /// Whether the mission's goal and title may still be edited.
    #[must_use]
    pub fn is_editable(self) -> bool {
        matches!(self, MissionStatus::Draft | MissionStatus::Paused)
    }

    /// Whether the mission can be reset to draft for re-execution.
    #[must_use]
    pub fn is_replayable(self) -> bool {
        matches!(
            self,
            MissionStatus::Completed | MissionStatus::Failed | MissionStatus::Paused
        )
    }

    /// Wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MissionStatus::Draft => "draft",
            MissionStatus::Executing => "executing",
            MissionStatus::Paused => "paused",
            MissionStatus::Completed => "completed",
            MissionStatus::Failed => "failed",
            MissionStatus::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mission goal. Canonical form carries `{x, y}`; the mapping stays open
/// for forward compatibility with richer goal kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Goal(pub Value);

impl Goal {
    /// A coordinate goal.
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self(serde_json::json!({"x": x, "y": y}))
    }

    /// Goal x coordinate, defaulting to 0.
    #[must_use]
    pub fn x(&self) -> f64 {
        self.0.get("x").and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// Goal y coordinate, defaulting to 0.
    #[must_use]
    pub fn y(&self) -> f64 {
        self.0.get("y").and_then(Value::as_f64).unwrap_or(0.0)
    }
}

/// A declarative goal for the robot, executed by runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub title: String,
    pub goal: Goal,
    pub status: MissionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Mission {
    /// Create a new draft mission.
    #[must_use]
    pub fn new(title: impl Into<String>, goal: Goal) -> Self {
        Self {
            id: MissionId::generate(),
            title: title.into(),
            goal,
            status: MissionStatus::Draft,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// One entry in a mission's control-plane audit trail.
///
/// This log is append-only but not hash-linked; chain-of-trust integrity
/// applies to run events, not mission mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionAuditEntry {
    pub mission_id: MissionId,
    pub ts: DateTime<Utc>,
    /// Mutation kind, e.g. `CREATED`, `UPDATED`, `STATUS_CHANGE`, `REPLAYED`.
    pub action: String,
    pub actor: String,
    #[serde(default)]
    pub old_values: Option<Value>,
    #[serde(default)]
    pub new_values: Option<Value>,
    #[serde(default)]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_coordinates() {
        let g = Goal::at(12.0, 6.5);
        assert_eq!(g.x(), 12.0);
        assert_eq!(g.y(), 6.5);
    }

    #[test]
    fn goal_defaults_to_origin() {
        let g = Goal(serde_json::json!({}));
        assert_eq!(g.x(), 0.0);
        assert_eq!(g.y(), 0.0);
    }

    #[test]
    fn editability_follows_status() {
        assert!(MissionStatus::Draft.is_editable());
        assert!(MissionStatus::Paused.is_editable());
        assert!(!MissionStatus::Executing.is_editable());
        assert!(!MissionStatus::Deleted.is_editable());
    }

    #[test]
    fn new_missions_start_as_draft() {
        let m = Mission::new("Deliver to B-03", Goal::at(15.0, 7.0));
        assert_eq!(m.status, MissionStatus::Draft);
        assert!(m.updated_at.is_none());
    }
}
