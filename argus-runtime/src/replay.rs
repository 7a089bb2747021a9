use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use argus_audit::{verify_chain, Event};
use argus_core::{MissionId, Run, RunId, TelemetrySample};

/// The full reconstructed timeline of one run, for audit replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTimeline {
    pub run_id: RunId,
    pub mission_id: MissionId,
    pub status: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// Events ordered by `ts` ascending.
    pub events: Vec<Event>,
    /// Raw telemetry samples, when requested.
    #[serde(default)]
    pub telemetry: Option<Vec<TelemetrySample>>,
    pub event_count: usize,
    pub chain_valid: bool,
}

impl RunTimeline {
    /// Assemble a timeline and verify the chain while at it.
    #[must_use]
    pub fn build(run: &Run, events: Vec<Event>, telemetry: Option<Vec<TelemetrySample>>) -> Self {
        let chain_valid = verify_chain(&events).valid;
        Self {
            run_id: run.id.clone(),
            mission_id: run.mission_id.clone(),
            status: run.status.to_string(),
            started_at: run.started_at,
            ended_at: run.ended_at,
            event_count: events.len(),
            events,
            telemetry,
            chain_valid,
        }
    }
}
