use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The three intents a planner may propose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Drive toward a target position at a bounded speed.
    #[serde(rename = "MOVE_TO")]
    MoveTo,
    /// Halt in place. Ends the run when approved.
    #[serde(rename = "STOP")]
    Stop,
    /// Hold position for one tick without ending the run.
    #[serde(rename = "WAIT")]
    Wait,
}

impl Intent {
    /// Wire name of the intent.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::MoveTo => "MOVE_TO",
            Intent::Stop => "STOP",
            Intent::Wait => "WAIT",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of a `MOVE_TO` proposal's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveTarget {
    pub x: f64,
    pub y: f64,
    /// Commanded speed ceiling in m/s, clamped into `[0.1, 1.0]` by planners.
    pub max_speed: f64,
}

/// A single next action proposed by the reasoning layer.
///
/// `params` stays an open JSON mapping on the wire; `MOVE_TO` proposals carry
/// `{x, y, max_speed}` and expose it through [`ActionProposal::move_target`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionProposal {
    pub intent: Intent,
    #[serde(default = "empty_params")]
    pub params: Value,
    #[serde(default)]
    pub rationale: String,
}

fn empty_params() -> Value {
    json!({})
}

impl ActionProposal {
    /// A `MOVE_TO` proposal toward `(x, y)`.
    #[must_use]
    pub fn move_to(x: f64, y: f64, max_speed: f64, rationale: impl Into<String>) -> Self {
        Self {
            intent: Intent::MoveTo,
            params: json!({"x": x, "y": y, "max_speed": max_speed}),
            rationale: rationale.into(),
        }
    }

    /// A `STOP` proposal.
    #[must_use]
    pub fn stop(rationale: impl Into<String>) -> Self {
        Self {
            intent: Intent::Stop,
            params: json!({}),
            rationale: rationale.into(),
        }
    }

    /// A `WAIT` proposal.
    #[must_use]
    pub fn wait(rationale: impl Into<String>) -> Self {
        Self {
            intent: Intent::Wait,
            params: json!({}),
            rationale: rationale.into(),
        }
    }

    /// Typed parameters for a `MOVE_TO` proposal. `None` for other intents
    /// or when a coordinate is missing.
    #[must_use]
    pub fn move_target(&self) -> Option<MoveTarget> {
        if self.intent != Intent::MoveTo {
            return None;
        }
        let x = self.params.get("x").and_then(Value::as_f64)?;
        let y = self.params.get("y").and_then(Value::as_f64)?;
        let max_speed = self
            .params
            .get("max_speed")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        Some(MoveTarget { x, y, max_speed })
    }

    /// Replace the `max_speed` parameter of a `MOVE_TO` proposal.
    /// No-op for other intents.
    pub fn set_max_speed(&mut self, max_speed: f64) {
        if self.intent == Intent::MoveTo {
            if let Some(map) = self.params.as_object_mut() {
                map.insert("max_speed".into(), json!(max_speed));
            }
        }
    }
}

/// One ordered target for the robot to reach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub max_speed: f64,
}

impl Waypoint {
    /// Convert the waypoint into a `MOVE_TO` proposal.
    #[must_use]
    pub fn into_proposal(self, rationale: impl Into<String>) -> ActionProposal {
        ActionProposal::move_to(self.x, self.y, self.max_speed, rationale)
    }
}

/// A multi-waypoint plan produced by the direct planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointPlan {
    pub waypoints: Vec<Waypoint>,
    pub rationale: String,
    pub estimated_time_s: f64,
}
