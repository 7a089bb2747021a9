use std::fmt::Write;

use serde_json::Value;

use argus_core::{ActionProposal, SimWorld, Telemetry};
use argus_policy::{evaluate, PolicyConfig};

/// Tool descriptions rendered into the ReAct prompt. Execution is local
/// and side-effect free; `submit_action` is a sentinel handled by the
/// planner loop, not the executor.
pub(super) const TOOL_DESCRIPTIONS: &str = "\
  - get_world_state: Get current environment state: robot position, human positions, \
obstacle positions, zone info, geofence boundaries. Params: {}\n\
  - check_policy: Pre-check whether a proposed action would pass governance policies. \
Returns the predicted decision (APPROVED/DENIED/NEEDS_REVIEW) and any policy hits. \
Params: {\"intent\": \"MOVE_TO|STOP|WAIT\", \"x\": float, \"y\": float, \"max_speed\": float 0.1-1.0}\n\
  - submit_action: Submit your final action proposal. Call this ONLY after check_policy \
returns APPROVED. Params: {\"intent\": \"MOVE_TO|STOP|WAIT\", \"x\": float, \"y\": float, \
\"max_speed\": float, \"rationale\": \"brief explanation (max 30 words)\"}";

/// Executes agent tool calls against a snapshot of environment state.
pub(super) struct ToolExecutor<'a> {
    policy: &'a PolicyConfig,
    telemetry: &'a Telemetry,
    world: Option<&'a SimWorld>,
}

impl<'a> ToolExecutor<'a> {
    pub(super) fn new(
        policy: &'a PolicyConfig,
        telemetry: &'a Telemetry,
        world: Option<&'a SimWorld>,
    ) -> Self {
        Self {
            policy,
            telemetry,
            world,
        }
    }

    /// Run a tool and return observation text for the thought chain.
    pub(super) fn execute(&self, tool_name: &str, params: &Value) -> String {
        match tool_name {
            "get_world_state" => self.get_world_state(),
            "check_policy" => self.check_policy(params),
            other => format!("Unknown tool: {other}"),
        }
    }

    /// Predict the governance outcome of a proposal without executing it.
    fn check_policy(&self, params: &Value) -> String {
        let intent = params
            .get("intent")
            .and_then(Value::as_str)
            .unwrap_or("MOVE_TO");
        let x = params.get("x").and_then(Value::as_f64).unwrap_or(0.0);
        let y = params.get("y").and_then(Value::as_f64).unwrap_or(0.0);
        let max_speed = params
            .get("max_speed")
            .and_then(Value::as_f64)
            .unwrap_or(0.5);

        let proposal = match intent {
            "STOP" => ActionProposal::stop("Policy pre-check"),
            "WAIT" => ActionProposal::wait("Policy pre-check"),
            _ => ActionProposal::move_to(x, y, max_speed, "Policy pre-check"),
        };
        let decision = evaluate(self.policy, self.telemetry, &proposal);

        let hits = if decision.policy_hits.is_empty() {
            "none".to_owned()
        } else {
            decision.policy_hits.join(", ")
        };
        let reasons = if decision.reasons.is_empty() {
            "none".to_owned()
        } else {
            decision.reasons.join("; ")
        };
        format!(
            "Decision: {}. Policy hits: {hits}. Risk score: {:.2}. Policy state: {}. Reasons: {reasons}.",
            decision.decision, decision.risk_score, decision.policy_state
        )
    }

    /// Summarize telemetry plus whatever the world definition adds.
    fn get_world_state(&self) -> String {
        let t = self.telemetry;
        let mut out = format!(
            "Robot position: ({}, {})\n\
             Robot speed: {} m/s\n\
             Robot heading: {} rad\n\
             Zone: {}\n\
             Nearest obstacle: {}m\n\
             Human detected: {}\n\
             Human distance: {}m\n\
             Human confidence: {}",
            t.x,
            t.y,
            t.speed,
            t.theta,
            t.zone,
            t.nearest_obstacle_m,
            t.human_detected,
            t.human_distance_m,
            t.human_conf,
        );

        if let Some(world) = self.world {
            let fence = &world.geofence;
            let _ = write!(
                out,
                "\nGeofence: x[{}-{}], y[{}-{}]",
                fence.min_x, fence.max_x, fence.min_y, fence.max_y
            );
            if !world.zones.is_empty() {
                let zones: Vec<String> = world
                    .zones
                    .iter()
                    .map(|z| format!("{}(y:{}-{})", z.name, z.rect.min_y, z.rect.max_y))
                    .collect();
                let _ = write!(out, "\nZones: {}", zones.join(", "));
            }
            if !world.obstacles.is_empty() {
                let obstacles: Vec<String> = world
                    .obstacles
                    .iter()
                    .map(|o| format!("({},{})", o.x, o.y))
                    .collect();
                let _ = write!(out, "\nObstacles at: {}", obstacles.join(", "));
            }
            if let Some(human) = &world.human {
                let _ = write!(out, "\nHuman at: ({}, {})", human.x, human.y);
            }
        }
        out
    }
}
