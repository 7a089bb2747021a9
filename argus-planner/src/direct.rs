use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use argus_core::{
    ActionProposal, Goal, GovernanceDecision, Intent, SimWorld, Telemetry, Waypoint, WaypointPlan,
};
use argus_llm::{extract_json, LlmError, ReasoningClient};
use argus_policy::PolicyConfig;

use crate::planner::{Planner, Proposed};

/// Fallback cruise speed with a clear floor.
const FALLBACK_SPEED: f64 = 0.6;

/// Fallback cruise speed when a human is detected.
const FALLBACK_SPEED_NEAR_HUMAN: f64 = 0.4;

/// Single-shot planner: one reasoning call constrained to one strict-JSON
/// proposal, with deterministic degradation.
#[derive(Debug)]
pub struct DirectPlanner {
    llm: Arc<dyn ReasoningClient>,
    policy: PolicyConfig,
}

impl DirectPlanner {
    #[must_use]
    pub fn new(llm: Arc<dyn ReasoningClient>, policy: PolicyConfig) -> Self {
        Self { llm, policy }
    }

    fn proposal_prompt(telemetry: &Telemetry, goal: &Goal, task: &str) -> String {
        format!(
            "You are the high-level reasoning layer for a simulated mobile robot.\n\
             \n\
             TASK:\n{task}\n\
             \n\
             WORLD STATE (telemetry JSON):\n{telemetry}\n\
             \n\
             GOAL:\n{goal}\n\
             \n\
             INSTRUCTIONS:\n\
             - Propose exactly ONE next action.\n\
             - Allowed intents: MOVE_TO, STOP, WAIT.\n\
             - For MOVE_TO, output params: {{\"x\": <float>, \"y\": <float>, \"max_speed\": <float 0.1..1.0>}}\n\
             - If human_detected=true or nearest_obstacle_m is low, reduce max_speed.\n\
             - Output STRICT JSON (no markdown) in this schema:\n\
             \n\
             {{\"intent\":\"MOVE_TO|STOP|WAIT\",\"params\":{{...}},\"rationale\":\"...\"}}\n",
            telemetry = serde_json::to_string_pretty(&telemetry.to_value()).unwrap_or_default(),
            goal = goal.0,
        )
    }

    fn plan_prompt(&self, telemetry: &Telemetry, instruction: &str, goal: Option<&Goal>) -> String {
        let fence = &self.policy.geofence;
        let goal_text = goal.map_or_else(
            || "No specific coordinate goal.".to_owned(),
            |g| format!("GOAL: {}", g.0),
        );
        format!(
            "You are the high-level reasoning layer for a simulated mobile robot\n\
             operating in a warehouse with a geofence, obstacles, and human workers.\n\
             \n\
             INSTRUCTION FROM OPERATOR:\n{instruction}\n\
             \n\
             CURRENT STATE (telemetry JSON):\n{telemetry}\n\
             \n\
             {goal_text}\n\
             \n\
             CONSTRAINTS:\n\
             - Max speed 0.1-1.0 m/s\n\
             - Reduce speed near humans/obstacles\n\
             - Stay within geofence ({min_x}-{max_x} x, {min_y}-{max_y} y)\n\
             - Allowed intents per waypoint: MOVE_TO, STOP, WAIT\n\
             \n\
             Generate a MULTI-WAYPOINT plan as STRICT JSON (no markdown):\n\
             \n\
             {{\n\
             \x20 \"waypoints\": [\n\
             \x20   {{\"x\": <float>, \"y\": <float>, \"max_speed\": <float>}},\n\
             \x20   ...\n\
             \x20 ],\n\
             \x20 \"rationale\": \"<short explanation of the plan>\",\n\
             \x20 \"estimated_time_s\": <float>\n\
             }}\n\
             \n\
             Keep the plan to 2-6 waypoints. The last waypoint should be the final destination.\n",
            telemetry = serde_json::to_string_pretty(&telemetry.to_value()).unwrap_or_default(),
            min_x = fence.min_x,
            max_x = fence.max_x,
            min_y = fence.min_y,
            max_y = fence.max_y,
        )
    }

    /// Clamp a parsed proposal into the legal envelope: coordinates into
    /// the geofence, speed into `[0.1, 1.0]`.
    fn clamp_proposal(&self, mut proposal: ActionProposal, goal: &Goal) -> ActionProposal {
        if proposal.intent != Intent::MoveTo {
            return proposal;
        }
        let x = proposal
            .params
            .get("x")
            .and_then(Value::as_f64)
            .unwrap_or_else(|| goal.x());
        let y = proposal
            .params
            .get("y")
            .and_then(Value::as_f64)
            .unwrap_or_else(|| goal.y());
        let max_speed = proposal
            .params
            .get("max_speed")
            .and_then(Value::as_f64)
            .unwrap_or(0.5);

        let (x, y) = self.policy.geofence.clamp(x, y);
        let rationale = std::mem::take(&mut proposal.rationale);
        ActionProposal::move_to(x, y, max_speed.clamp(0.1, 1.0), rationale)
    }

    /// Straight-line fallback proposal when the reasoning service is
    /// unavailable or malformed.
    fn fallback_proposal(&self, telemetry: &Telemetry, goal: &Goal) -> ActionProposal {
        let speed = if telemetry.human_detected {
            FALLBACK_SPEED_NEAR_HUMAN
        } else {
            FALLBACK_SPEED
        };
        let (x, y) = self.policy.geofence.clamp(goal.x(), goal.y());
        ActionProposal::move_to(
            x,
            y,
            speed,
            "Deterministic fallback: straight line toward goal.",
        )
    }

    /// Two-waypoint fallback plan: midpoint, then goal.
    fn fallback_plan(&self, telemetry: &Telemetry, goal: &Goal) -> WaypointPlan {
        let speed = if telemetry.human_detected {
            FALLBACK_SPEED_NEAR_HUMAN
        } else {
            FALLBACK_SPEED
        };
        let (gx, gy) = self.policy.geofence.clamp(goal.x(), goal.y());
        let (mx, my) = self
            .policy
            .geofence
            .clamp((telemetry.x + gx) / 2.0, (telemetry.y + gy) / 2.0);
        let distance = telemetry.distance_to(gx, gy);
        WaypointPlan {
            waypoints: vec![
                Waypoint {
                    x: mx,
                    y: my,
                    max_speed: speed,
                },
                Waypoint {
                    x: gx,
                    y: gy,
                    max_speed: speed,
                },
            ],
            rationale: "Deterministic fallback: straight line toward goal via midpoint."
                .to_owned(),
            estimated_time_s: if speed > 0.0 { distance / speed } else { 0.0 },
        }
    }

    /// Generate a multi-waypoint plan from a natural-language instruction.
    ///
    /// Falls back to the deterministic two-waypoint plan when the service
    /// is unavailable or its output cannot be parsed.
    pub async fn generate_plan(
        &self,
        telemetry: &Telemetry,
        instruction: &str,
        goal: Option<&Goal>,
    ) -> WaypointPlan {
        let prompt = self.plan_prompt(telemetry, instruction, goal);
        let fallback_goal = goal
            .cloned()
            .unwrap_or_else(|| Goal::at(telemetry.x, telemetry.y));

        let text = match self.llm.generate_cascading(&prompt).await {
            Ok((text, _model)) => text,
            Err(e) => {
                warn!(error = %e, "plan generation unavailable, using deterministic fallback");
                return self.fallback_plan(telemetry, &fallback_goal);
            }
        };

        match self.parse_plan(&text) {
            Ok(plan) if !plan.waypoints.is_empty() => plan,
            Ok(_) | Err(_) => {
                warn!("plan output empty or malformed, using deterministic fallback");
                self.fallback_plan(telemetry, &fallback_goal)
            }
        }
    }

    fn parse_plan(&self, text: &str) -> Result<WaypointPlan, LlmError> {
        let value = extract_json(text)?;
        let waypoints = value
            .get("waypoints")
            .and_then(Value::as_array)
            .map(|wps| {
                wps.iter()
                    .map(|wp| {
                        let x = wp.get("x").and_then(Value::as_f64).unwrap_or(0.0);
                        let y = wp.get("y").and_then(Value::as_f64).unwrap_or(0.0);
                        let max_speed =
                            wp.get("max_speed").and_then(Value::as_f64).unwrap_or(0.5);
                        let (x, y) = self.policy.geofence.clamp(x, y);
                        Waypoint {
                            x,
                            y,
                            max_speed: max_speed.clamp(0.1, 1.0),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(WaypointPlan {
            waypoints,
            rationale: value
                .get("rationale")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            estimated_time_s: value
                .get("estimated_time_s")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
        })
    }
}

#[async_trait]
impl Planner for DirectPlanner {
    async fn propose(
        &self,
        telemetry: &Telemetry,
        goal: &Goal,
        task: &str,
        _last_governance: Option<&GovernanceDecision>,
        _world: Option<&SimWorld>,
    ) -> Proposed {
        let prompt = Self::proposal_prompt(telemetry, goal, task);
        let (text, model) = match self.llm.generate_cascading(&prompt).await {
            Ok(out) => out,
            Err(e) => {
                warn!(error = %e, "reasoning unavailable, using deterministic fallback");
                return Proposed::plain(
                    self.fallback_proposal(telemetry, goal),
                    "deterministic",
                );
            }
        };

        match extract_json(&text).and_then(|v| {
            serde_json::from_value::<ActionProposal>(v)
                .map_err(|e| LlmError::Parse(e.to_string()))
        }) {
            Ok(proposal) => Proposed::plain(self.clamp_proposal(proposal, goal), model),
            Err(e) => {
                warn!(error = %e, "proposal output malformed, using deterministic fallback");
                Proposed::plain(self.fallback_proposal(telemetry, goal), "deterministic")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_llm::ScriptedReasoningClient;
    use serde_json::json;

    fn telemetry(v: serde_json::Value) -> Telemetry {
        serde_json::from_value(v).unwrap()
    }

    fn planner_with(responses: &[&str]) -> DirectPlanner {
        DirectPlanner::new(
            Arc::new(ScriptedReasoningClient::with_responses(
                responses.iter().copied(),
            )),
            PolicyConfig::default(),
        )
    }

    fn unavailable_planner() -> DirectPlanner {
        DirectPlanner::new(
            Arc::new(ScriptedReasoningClient::unavailable()),
            PolicyConfig::default(),
        )
    }

    #[tokio::test]
    async fn parses_and_clamps_model_proposal() {
        let planner = planner_with(&[
            r#"{"intent":"MOVE_TO","params":{"x":99.0,"y":-5.0,"max_speed":2.0},"rationale":"go"}"#,
        ]);
        let t = telemetry(json!({"x": 1.0, "y": 1.0}));
        let out = planner.propose(&t, &Goal::at(10.0, 10.0), "go", None, None).await;
        let target = out.proposal.move_target().unwrap();
        assert_eq!(target.x, 40.0);
        assert_eq!(target.y, 0.0);
        assert_eq!(target.max_speed, 1.0);
    }

    #[tokio::test]
    async fn fallback_when_service_unavailable() {
        let planner = unavailable_planner();
        let t = telemetry(json!({"x": 0.0, "y": 0.0, "human_detected": false}));
        let out = planner.propose(&t, &Goal::at(8.0, 6.0), "go", None, None).await;
        assert_eq!(out.model_tag, "deterministic");
        assert_eq!(out.proposal.move_target().unwrap().max_speed, 0.6);
    }

    #[tokio::test]
    async fn fallback_slows_near_human() {
        let planner = unavailable_planner();
        let t = telemetry(json!({"x": 0.0, "y": 0.0, "human_detected": true}));
        let out = planner.propose(&t, &Goal::at(8.0, 6.0), "go", None, None).await;
        assert_eq!(out.proposal.move_target().unwrap().max_speed, 0.4);
    }

    #[tokio::test]
    async fn malformed_output_falls_back() {
        let planner = planner_with(&["the robot should probably move forward"]);
        let t = telemetry(json!({"x": 0.0, "y": 0.0}));
        let out = planner.propose(&t, &Goal::at(8.0, 6.0), "go", None, None).await;
        assert_eq!(out.model_tag, "deterministic");
    }

    #[tokio::test]
    async fn plan_generation_parses_waypoints() {
        let planner = planner_with(&[
            r#"{"waypoints":[{"x":5,"y":5,"max_speed":0.5},{"x":50,"y":5,"max_speed":1.5}],"rationale":"two legs","estimated_time_s":30.0}"#,
        ]);
        let t = telemetry(json!({"x": 0.0, "y": 0.0}));
        let plan = planner.generate_plan(&t, "go to the far side", None).await;
        assert_eq!(plan.waypoints.len(), 2);
        assert_eq!(plan.waypoints[1].x, 40.0);
        assert_eq!(plan.waypoints[1].max_speed, 1.0);
        assert_eq!(plan.rationale, "two legs");
    }

    #[tokio::test]
    async fn plan_fallback_is_midpoint_then_goal() {
        let planner = unavailable_planner();
        let t = telemetry(json!({"x": 0.0, "y": 0.0}));
        let goal = Goal::at(10.0, 10.0);
        let plan = planner.generate_plan(&t, "go", Some(&goal)).await;
        assert_eq!(plan.waypoints.len(), 2);
        assert_eq!(plan.waypoints[0].x, 5.0);
        assert_eq!(plan.waypoints[0].y, 5.0);
        assert_eq!(plan.waypoints[1].x, 10.0);
        assert!(plan.estimated_time_s > 0.0);
    }
}
