use serde::{Deserialize, Serialize};

/// The three decisions of the policy evaluator.
///
/// `NeedsReview` is a soft deny reserved for aggregate high risk without a
/// hard-deny rule; the run controller does not execute on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "DENIED")]
    Denied,
    #[serde(rename = "NEEDS_REVIEW")]
    NeedsReview,
}

impl Decision {
    /// Whether the controller may execute the proposal.
    #[must_use]
    pub fn allows_execution(self) -> bool {
        self == Decision::Approved
    }

    /// Wire name of the decision.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Approved => "APPROVED",
            Decision::Denied => "DENIED",
            Decision::NeedsReview => "NEEDS_REVIEW",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse safety mode derived from fired rules.
///
/// Ordering is by restrictiveness: `Safe < Slow < Replan < Stop`. The
/// evaluator reports the most restrictive state across all fired rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PolicyState {
    #[serde(rename = "SAFE")]
    Safe,
    #[serde(rename = "SLOW")]
    Slow,
    #[serde(rename = "REPLAN")]
    Replan,
    #[serde(rename = "STOP")]
    Stop,
}

impl PolicyState {
    /// Wire name of the state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyState::Safe => "SAFE",
            PolicyState::Slow => "SLOW",
            PolicyState::Replan => "REPLAN",
            PolicyState::Stop => "STOP",
        }
    }
}

impl std::fmt::Display for PolicyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of evaluating one proposal against the policy set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceDecision {
    pub decision: Decision,
    /// Identifiers of the rules that fired, e.g. `GEOFENCE_01`.
    #[serde(default)]
    pub policy_hits: Vec<String>,
    /// Human-readable explanations, one per hit.
    #[serde(default)]
    pub reasons: Vec<String>,
    /// Remediation the operator or planner should take, if any.
    #[serde(default)]
    pub required_action: Option<String>,
    /// Aggregate risk heuristic in `[0, 1]`.
    #[serde(default)]
    pub risk_score: f64,
    /// Most restrictive safety state across fired rules.
    pub policy_state: PolicyState,
}

impl GovernanceDecision {
    /// An unconditional approval with zero risk.
    #[must_use]
    pub fn approved() -> Self {
        Self {
            decision: Decision::Approved,
            policy_hits: Vec::new(),
            reasons: Vec::new(),
            required_action: None,
            risk_score: 0.0,
            policy_state: PolicyState::Safe,
        }
    }

    /// Whether the decision blocks execution.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        !self.decision.allows_execution()
    }
}

/// Severity of a policy in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicySeverity {
    Low,
    Medium,
    High,
}

/// Catalog entry describing one policy for governance consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyInfo {
    pub policy_id: String,
    pub name: String,
    pub description: String,
    pub severity: PolicySeverity,
}
