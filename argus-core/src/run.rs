use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MissionId, RunId};

/// Lifecycle states of a run. `Stopped`, `Completed` and `Failed` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Stopped,
    Completed,
    Failed,
}

impl RunStatus {
    /// Whether the run has reached a terminal state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }

    /// Wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Stopped => "stopped",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One execution of a mission. A run exclusively owns its event chain,
/// telemetry samples, in-memory plan queue, and agent memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub mission_id: MissionId,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Run {
    /// Create a new running run for the given mission.
    #[must_use]
    pub fn start(mission_id: MissionId) -> Self {
        Self {
            id: RunId::generate(),
            mission_id,
            status: RunStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
        }
    }
}
