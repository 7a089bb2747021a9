use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::RunId;
use crate::world::{Geofence, Obstacle};

/// A detected walking human or worker reported by perception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkingHuman {
    pub x: f64,
    pub y: f64,
    /// Detection confidence in `[0, 1]`.
    #[serde(default = "default_worker_conf")]
    pub conf: f64,
    /// Perception class label, e.g. `worker`.
    #[serde(default)]
    pub r#type: Option<String>,
}

fn default_worker_conf() -> f64 {
    0.9
}

/// One telemetry snapshot from the simulator.
///
/// Fields the policy evaluator reads are typed; anything else the simulator
/// reports rides along in `extra` so stored samples stay lossless.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Telemetry {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub theta: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default = "default_zone")]
    pub zone: String,
    #[serde(default = "far_away")]
    pub nearest_obstacle_m: f64,
    #[serde(default)]
    pub human_detected: bool,
    #[serde(default)]
    pub human_conf: f64,
    #[serde(default = "far_away")]
    pub human_distance_m: f64,
    #[serde(default)]
    pub walking_humans: Vec<WalkingHuman>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    #[serde(default)]
    pub bounds: Option<Geofence>,
    /// Simulator-reported occurrences this tick, e.g. `near_miss`.
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_zone() -> String {
    "aisle".to_owned()
}

fn far_away() -> f64 {
    999.0
}

impl Telemetry {
    /// Distance from the robot to `(x, y)`.
    #[must_use]
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }

    /// The full snapshot as a JSON value, for storage and broadcast.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A stored raw telemetry sample. Not hash-linked; kept for replay and
/// analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub run_id: RunId,
    pub ts: DateTime<Utc>,
    pub payload: Value,
}
