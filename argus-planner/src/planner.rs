use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use argus_core::{ActionProposal, Goal, GovernanceDecision, SimWorld, Telemetry};

/// One step in an agent's reasoning chain, captured for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtStep {
    pub step_number: usize,
    pub thought: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub action_input: Option<Value>,
    #[serde(default)]
    pub observation: Option<String>,
}

impl ThoughtStep {
    /// A step with only a thought; action fields are filled in as the step
    /// executes.
    #[must_use]
    pub fn new(step_number: usize, thought: impl Into<String>) -> Self {
        Self {
            step_number,
            thought: thought.into(),
            action: None,
            action_input: None,
            observation: None,
        }
    }
}

/// What a planner hands back to the run controller.
#[derive(Debug, Clone)]
pub struct Proposed {
    pub proposal: ActionProposal,
    /// Reasoning chain, empty for non-agentic planners.
    pub thought_chain: Vec<ThoughtStep>,
    /// Which model (or fallback) produced the proposal.
    pub model_tag: String,
}

impl Proposed {
    /// A proposal with no reasoning chain.
    #[must_use]
    pub fn plain(proposal: ActionProposal, model_tag: impl Into<String>) -> Self {
        Self {
            proposal,
            thought_chain: Vec::new(),
            model_tag: model_tag.into(),
        }
    }
}

/// The planning capability the run controller dispatches through.
///
/// `propose` must always return something actionable: planners absorb
/// reasoning-service failures internally and fall back deterministically.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Propose the next action for the current tick.
    async fn propose(
        &self,
        telemetry: &Telemetry,
        goal: &Goal,
        task: &str,
        last_governance: Option<&GovernanceDecision>,
        world: Option<&SimWorld>,
    ) -> Proposed;

    /// Feed a governed outcome back into planner memory. Default: no-op.
    async fn record_outcome(
        &self,
        _proposal: &ActionProposal,
        _governance: &GovernanceDecision,
        _was_executed: bool,
    ) {
    }

    /// Memory state for inspection, if the planner keeps any.
    async fn memory_summary(&self) -> Option<Value> {
        None
    }
}
