use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::proposal::{ActionProposal, Intent};

/// Axis-aligned rectangle the robot must stay inside. Bounds are inclusive:
/// a position exactly on a corner is inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Geofence {
    /// Whether `(x, y)` lies inside the fence.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.min_x <= x && x <= self.max_x && self.min_y <= y && y <= self.max_y
    }

    /// Clamp `(x, y)` to the nearest point inside the fence.
    #[must_use]
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.clamp(self.min_x, self.max_x),
            y.clamp(self.min_y, self.max_y),
        )
    }
}

/// A named rectangular zone of the warehouse floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneRect {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// A floor zone with its own speed regime, e.g. `aisle` or `loading_bay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub rect: ZoneRect,
}

/// A circular obstacle. Points without a radius are treated as small
/// circles by path planning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f64,
    pub y: f64,
    #[serde(default, alias = "radius")]
    pub r: Option<f64>,
}

impl Obstacle {
    /// Effective radius, with the point-obstacle default.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.r.unwrap_or(0.4)
    }
}

/// A docking bay missions can target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bay {
    #[serde(default)]
    pub id: Option<String>,
    pub x: f64,
    pub y: f64,
}

/// The primary human worker's position in the world definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Human {
    pub x: f64,
    pub y: f64,
}

/// Static world definition served by the simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimWorld {
    pub geofence: Geofence,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    #[serde(default)]
    pub human: Option<Human>,
    #[serde(default)]
    pub bays: Vec<Bay>,
}

/// A command sent to the simulator for execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub intent: Intent,
    #[serde(default)]
    pub params: Value,
}

impl Command {
    /// Build the command for an approved proposal.
    #[must_use]
    pub fn from_proposal(proposal: &ActionProposal) -> Self {
        Self {
            intent: proposal.intent,
            params: proposal.params.clone(),
        }
    }

    /// The command as a JSON value, for audit payloads.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({"intent": self.intent, "params": self.params})
    }
}
