//! ReAct-style agentic planner: reason, act, observe, replan.
//!
//! Per replan attempt the agent is prompted with the task, current
//! telemetry, a world summary, recent memory and any denial feedback, and
//! answers with a short chain of tool-calling steps. Tools execute locally
//! and without side effects; `submit_action` finalizes the proposal, which
//! is then pre-checked against governance before the controller ever sees
//! it. Denials feed back into the next attempt; exhaustion degrades to a
//! safe `WAIT`.

mod memory;
mod prompt;
mod tools;

pub use memory::{AgentMemory, MemoryEntry};

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use argus_core::{ActionProposal, Decision, Goal, GovernanceDecision, SimWorld, Telemetry};
use argus_llm::{extract_json, ReasoningClient};
use argus_policy::{evaluate, PolicyConfig};

use crate::planner::{Planner, Proposed, ThoughtStep};
use tools::ToolExecutor;

/// Max reasoning steps per attempt. Short chains keep tick latency bounded.
const MAX_STEPS: usize = 3;

/// Max replan attempts after a pre-check denial.
const MAX_REPLANS: usize = 2;

/// Preferred model for agent turns, tried before the rest of the cascade.
const PREFERRED_MODEL: &str = "gemini-2.5-flash";

/// Denials within the last 5 outcomes that trigger a strategy change.
const STRATEGY_SHIFT_DENIALS: usize = 3;

/// ReAct planner with tools, memory, and replanning.
pub struct AgenticPlanner {
    llm: Arc<dyn ReasoningClient>,
    policy: PolicyConfig,
    memory: Mutex<AgentMemory>,
}

impl AgenticPlanner {
    #[must_use]
    pub fn new(llm: Arc<dyn ReasoningClient>, policy: PolicyConfig) -> Self {
        Self {
            llm,
            policy,
            memory: Mutex::new(AgentMemory::default()),
        }
    }

    /// Agent model cascade: the preferred fast model first, then the rest.
    fn agent_cascade(&self) -> Vec<String> {
        let mut cascade = vec![PREFERRED_MODEL.to_owned()];
        cascade.extend(
            self.llm
                .cascade()
                .into_iter()
                .filter(|m| m != PREFERRED_MODEL),
        );
        cascade
    }

    async fn call_model(&self, prompt: &str) -> Option<(String, String)> {
        for model in self.agent_cascade() {
            debug!(model = %model, "agentic reasoning attempt");
            match self.llm.generate(&model, prompt).await {
                Ok(text) if !text.trim().is_empty() => return Some((text, model)),
                Ok(_) => {}
                Err(e) => debug!(model = %model, error = %e, "model failed, trying next"),
            }
        }
        None
    }

    /// Build the final proposal out of a `submit_action` step, clamping
    /// coordinates into the geofence and speed into `[0.1, 1.0]`.
    fn build_submitted_proposal(
        &self,
        action_input: &Value,
        goal: &Goal,
        model: &str,
    ) -> ActionProposal {
        let intent = action_input
            .get("intent")
            .and_then(Value::as_str)
            .unwrap_or("MOVE_TO");
        let rationale = action_input
            .get("rationale")
            .and_then(Value::as_str)
            .unwrap_or("Agent-generated action");
        let rationale = format!("[{model}/agentic] {rationale}");

        match intent {
            "STOP" => ActionProposal::stop(rationale),
            "WAIT" => ActionProposal::wait(rationale),
            _ => {
                let x = action_input
                    .get("x")
                    .and_then(Value::as_f64)
                    .unwrap_or_else(|| goal.x());
                let y = action_input
                    .get("y")
                    .and_then(Value::as_f64)
                    .unwrap_or_else(|| goal.y());
                let max_speed = action_input
                    .get("max_speed")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.5);
                let (x, y) = self.policy.geofence.clamp(x, y);
                ActionProposal::move_to(x, y, max_speed.clamp(0.1, 1.0), rationale)
            }
        }
    }

    /// Deterministic fallback that respects denial history.
    fn deterministic_fallback(&self, telemetry: &Telemetry, goal: &Goal) -> ActionProposal {
        let (gx, gy) = (goal.x(), goal.y());
        if (telemetry.x - gx).abs() < 0.5 && (telemetry.y - gy).abs() < 0.5 {
            return ActionProposal::stop("[agentic/fallback] Reached goal.");
        }

        if telemetry.human_distance_m < self.policy.human_stop_radius_m {
            return ActionProposal::stop("[agentic/fallback] Human too close, stopping.");
        }

        let mut speed = 0.5;
        if telemetry.human_distance_m < self.policy.human_slow_radius_m {
            speed = 0.3;
        }
        if self.memory.lock().denial_count(5) >= 2 {
            speed = f64::min(speed, 0.3);
        }
        speed = f64::min(speed, self.policy.zone_speed_limit(&telemetry.zone));

        ActionProposal::move_to(
            gx,
            gy,
            speed,
            format!(
                "[agentic/fallback] Safe navigation at {speed:.1} m/s (zone: {}).",
                telemetry.zone
            ),
        )
    }

    /// Run the model's reasoning steps through the tool executor.
    /// Returns the submitted proposal, if any.
    fn execute_steps(
        &self,
        steps_raw: &[Value],
        telemetry: &Telemetry,
        world: Option<&SimWorld>,
        goal: &Goal,
        model: &str,
        all_thoughts: &mut Vec<ThoughtStep>,
    ) -> Option<ActionProposal> {
        let tools = ToolExecutor::new(&self.policy, telemetry, world);

        for step_raw in steps_raw.iter().take(MAX_STEPS) {
            let thought = step_raw
                .get("thought")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let action = step_raw
                .get("action")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            let action_input = step_raw.get("action_input").cloned().unwrap_or(Value::Null);

            let mut step = ThoughtStep::new(all_thoughts.len() + 1, thought);
            step.action = Some(action.clone());
            step.action_input = Some(action_input.clone());

            if action == "submit_action" {
                let proposal = self.build_submitted_proposal(&action_input, goal, model);
                step.observation = Some(format!(
                    "Action submitted: {} {}",
                    proposal.intent, proposal.params
                ));
                all_thoughts.push(step);
                return Some(proposal);
            }

            step.observation = Some(tools.execute(&action, &action_input));
            all_thoughts.push(step);
        }
        None
    }
}

#[async_trait]
impl Planner for AgenticPlanner {
    async fn propose(
        &self,
        telemetry: &Telemetry,
        goal: &Goal,
        task: &str,
        last_governance: Option<&GovernanceDecision>,
        world: Option<&SimWorld>,
    ) -> Proposed {
        let mut denial_feedback = last_governance
            .filter(|g| g.decision != Decision::Approved)
            .map(|g| {
                format!(
                    "Decision: {}. Policies: {}. Reasons: {}.",
                    g.decision,
                    g.policy_hits.join(", "),
                    g.reasons.join("; "),
                )
            });

        // Repeated denials demand a different strategy, not a retry.
        let recent_denials = self.memory.lock().denial_count(5);
        if recent_denials >= STRATEGY_SHIFT_DENIALS {
            let warning = format!(
                "\nWARNING: {recent_denials} of last 5 proposals were denied. \
                 Significantly change your strategy."
            );
            denial_feedback = Some(denial_feedback.unwrap_or_default() + &warning);
        }

        let mut all_thoughts: Vec<ThoughtStep> = Vec::new();
        let mut model_used = "unknown".to_owned();

        for replan_attempt in 0..=MAX_REPLANS {
            let memory_text = self.memory.lock().to_context();
            let prompt = prompt::build_react_prompt(
                &self.policy,
                telemetry,
                goal,
                task,
                world,
                &memory_text,
                denial_feedback.as_deref(),
            );

            let Some((text, model)) = self.call_model(&prompt).await else {
                warn!("all models failed, falling back to deterministic");
                return Proposed {
                    proposal: self.deterministic_fallback(telemetry, goal),
                    thought_chain: all_thoughts,
                    model_tag: "deterministic".to_owned(),
                };
            };
            model_used = model;

            let steps_raw = match extract_json(&text) {
                Ok(Value::Array(steps)) => steps,
                Ok(single @ Value::Object(_)) => vec![single],
                Ok(_) | Err(_) => {
                    warn!("failed to parse reasoning steps, falling back to deterministic");
                    return Proposed {
                        proposal: self.deterministic_fallback(telemetry, goal),
                        thought_chain: all_thoughts,
                        model_tag: model_used,
                    };
                }
            };

            let proposal = self
                .execute_steps(
                    &steps_raw,
                    telemetry,
                    world,
                    goal,
                    &model_used,
                    &mut all_thoughts,
                )
                .unwrap_or_else(|| {
                    warn!("agent never submitted an action, using deterministic");
                    self.deterministic_fallback(telemetry, goal)
                });

            // Governance pre-check before the proposal reaches the loop.
            let pre_check = evaluate(&self.policy, telemetry, &proposal);
            if pre_check.decision == Decision::Approved {
                info!(
                    steps = all_thoughts.len(),
                    model = %model_used,
                    "agentic proposal pre-approved"
                );
                return Proposed {
                    proposal,
                    thought_chain: all_thoughts,
                    model_tag: model_used,
                };
            }

            if replan_attempt >= MAX_REPLANS {
                let mut step = ThoughtStep::new(
                    all_thoughts.len() + 1,
                    "Exhausted replanning attempts. Recommending manual override.",
                );
                step.action = Some("graceful_stop".to_owned());
                step.observation =
                    Some("Returning WAIT; operator should review and intervene.".to_owned());
                all_thoughts.push(step);

                return Proposed {
                    proposal: ActionProposal::wait(format!(
                        "[{model_used}/agentic] Unable to generate safe plan after {} attempts - \
                         recommend manual override.",
                        MAX_REPLANS + 1
                    )),
                    thought_chain: all_thoughts,
                    model_tag: model_used,
                };
            }

            let feedback = format!(
                "Pre-check DENIED (attempt {}): Policies: {}. Reasons: {}. Risk: {:.2}. State: {}.",
                replan_attempt + 1,
                pre_check.policy_hits.join(", "),
                pre_check.reasons.join("; "),
                pre_check.risk_score,
                pre_check.policy_state,
            );
            info!(feedback = %feedback, "pre-check denied, replanning");

            let mut step = ThoughtStep::new(
                all_thoughts.len() + 1,
                format!("My proposal was pre-denied. Replanning with feedback: {feedback}"),
            );
            step.action = Some("replan".to_owned());
            step.observation = Some("Starting new reasoning chain...".to_owned());
            all_thoughts.push(step);

            denial_feedback = Some(feedback);
        }

        // The loop always returns from inside; this is unreachable but the
        // compiler cannot see it through the bounded range.
        Proposed {
            proposal: self.deterministic_fallback(telemetry, goal),
            thought_chain: all_thoughts,
            model_tag: model_used,
        }
    }

    async fn record_outcome(
        &self,
        proposal: &ActionProposal,
        governance: &GovernanceDecision,
        was_executed: bool,
    ) {
        self.memory.lock().add(MemoryEntry::from_outcome(
            proposal,
            governance,
            was_executed,
        ));
    }

    async fn memory_summary(&self) -> Option<Value> {
        Some(self.memory.lock().summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_core::Intent;
    use argus_llm::ScriptedReasoningClient;
    use serde_json::json;

    fn telemetry(v: Value) -> Telemetry {
        serde_json::from_value(v).unwrap()
    }

    fn clear_floor() -> Telemetry {
        telemetry(json!({
            "x": 2.0, "y": 2.0, "zone": "aisle",
            "nearest_obstacle_m": 5.0,
            "human_detected": false, "human_conf": 0.0
        }))
    }

    fn react_steps(x: f64, y: f64, speed: f64) -> String {
        json!([
            {"thought": "assess", "action": "get_world_state", "action_input": {}},
            {"thought": "check", "action": "check_policy",
             "action_input": {"intent": "MOVE_TO", "x": x, "y": y, "max_speed": speed}},
            {"thought": "go", "action": "submit_action",
             "action_input": {"intent": "MOVE_TO", "x": x, "y": y, "max_speed": speed,
                              "rationale": "Clear path."}},
        ])
        .to_string()
    }

    fn planner(client: ScriptedReasoningClient) -> AgenticPlanner {
        AgenticPlanner::new(Arc::new(client), PolicyConfig::default())
    }

    #[tokio::test]
    async fn approved_proposal_returns_with_chain() {
        let p = planner(ScriptedReasoningClient::with_responses([react_steps(
            6.0, 6.0, 0.3,
        )]));
        let out = p
            .propose(&clear_floor(), &Goal::at(6.0, 6.0), "go", None, None)
            .await;
        assert_eq!(out.proposal.intent, Intent::MoveTo);
        assert_eq!(out.thought_chain.len(), 3);
        assert!(out.proposal.rationale.contains("/agentic]"));
        assert_eq!(
            out.thought_chain[2].action.as_deref(),
            Some("submit_action")
        );
    }

    #[tokio::test]
    async fn denied_then_approved_replans_once() {
        // First attempt violates the aisle speed limit; the replan passes.
        let p = planner(ScriptedReasoningClient::with_responses([
            react_steps(6.0, 6.0, 0.9),
            react_steps(6.0, 6.0, 0.3),
        ]));
        let out = p
            .propose(&clear_floor(), &Goal::at(6.0, 6.0), "go", None, None)
            .await;
        assert_eq!(out.proposal.move_target().unwrap().max_speed, 0.3);
        assert!(out
            .thought_chain
            .iter()
            .any(|s| s.action.as_deref() == Some("replan")));
    }

    #[tokio::test]
    async fn exhausted_replans_degrade_to_wait() {
        let p = planner(ScriptedReasoningClient::with_responses([
            react_steps(6.0, 6.0, 0.9),
            react_steps(6.0, 6.0, 0.95),
            react_steps(6.0, 6.0, 0.99),
        ]));
        let out = p
            .propose(&clear_floor(), &Goal::at(6.0, 6.0), "go", None, None)
            .await;
        assert_eq!(out.proposal.intent, Intent::Wait);
        assert!(out.proposal.rationale.contains("manual override"));
        assert!(out
            .thought_chain
            .iter()
            .any(|s| s.action.as_deref() == Some("graceful_stop")));
    }

    #[tokio::test]
    async fn model_failure_uses_deterministic_fallback() {
        let p = planner(ScriptedReasoningClient::unavailable());
        let out = p
            .propose(&clear_floor(), &Goal::at(10.0, 10.0), "go", None, None)
            .await;
        assert_eq!(out.model_tag, "deterministic");
        let target = out.proposal.move_target().unwrap();
        assert!(target.max_speed <= 0.5);
    }

    #[tokio::test]
    async fn submitted_coordinates_are_clamped() {
        let p = planner(ScriptedReasoningClient::with_responses([json!([
            {"thought": "go", "action": "submit_action",
             "action_input": {"intent": "STOP", "rationale": "done"}},
        ])
        .to_string()]));
        let out = p
            .propose(&clear_floor(), &Goal::at(6.0, 6.0), "go", None, None)
            .await;
        assert_eq!(out.proposal.intent, Intent::Stop);
    }

    #[tokio::test]
    async fn repeated_denials_shift_strategy_in_prompt() {
        let client = Arc::new(ScriptedReasoningClient::with_responses([react_steps(
            6.0, 6.0, 0.3,
        )]));
        let p = AgenticPlanner::new(
            Arc::clone(&client) as Arc<dyn ReasoningClient>,
            PolicyConfig::default(),
        );

        let denied = GovernanceDecision {
            decision: Decision::Denied,
            policy_hits: vec!["SAFE_SPEED_01".to_owned()],
            reasons: vec!["too fast".to_owned()],
            required_action: None,
            risk_score: 0.85,
            policy_state: argus_core::PolicyState::Slow,
        };
        for _ in 0..4 {
            p.record_outcome(
                &ActionProposal::move_to(6.0, 6.0, 0.9, ""),
                &denied,
                false,
            )
            .await;
        }

        let _ = p
            .propose(&clear_floor(), &Goal::at(6.0, 6.0), "go", None, None)
            .await;

        // Prompt must carry the explicit strategy-change instruction.
        let prompts = client.prompts();
        assert!(prompts[0].contains("Significantly change your strategy"));
    }

    #[tokio::test]
    async fn memory_summary_reports_denials() {
        let p = planner(ScriptedReasoningClient::unavailable());
        let denied = GovernanceDecision {
            decision: Decision::Denied,
            policy_hits: vec![],
            reasons: vec![],
            required_action: None,
            risk_score: 0.9,
            policy_state: argus_core::PolicyState::Stop,
        };
        p.record_outcome(&ActionProposal::wait(""), &denied, false)
            .await;
        let summary = p.memory_summary().await.unwrap();
        assert_eq!(summary["total_entries"], 1);
        assert_eq!(summary["recent_denials"], 1);
    }
}
