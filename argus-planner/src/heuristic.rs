use async_trait::async_trait;

use argus_core::{ActionProposal, Goal, GovernanceDecision, SimWorld, Telemetry};

use crate::planner::{Planner, Proposed};

/// How close to the goal counts as arrived.
const ARRIVAL_TOLERANCE_M: f64 = 0.3;

/// Default commanded speed, before any governance feedback.
const DEFAULT_SPEED: f64 = 0.8;

/// Reduced speed after a speed/human/obstacle related denial.
const CAUTIOUS_SPEED: f64 = 0.4;

/// Policies whose denial makes the next proposal slow down.
const SLOWDOWN_POLICIES: [&str; 4] = [
    "SAFE_SPEED_01",
    "HUMAN_CLEARANCE_02",
    "OBSTACLE_CLEARANCE_03",
    "UNCERTAINTY_04",
];

/// Deterministic planner: head for the goal, slow down when governance
/// pushed back last tick, stop on arrival.
///
/// Deliberately proposes an ambitious default speed so the governed loop
/// has something to govern.
#[derive(Debug, Default)]
pub struct HeuristicPlanner;

impl HeuristicPlanner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn next_proposal(
        telemetry: &Telemetry,
        goal: &Goal,
        last_governance: Option<&GovernanceDecision>,
    ) -> ActionProposal {
        let (gx, gy) = (goal.x(), goal.y());
        if (telemetry.x - gx).abs() < ARRIVAL_TOLERANCE_M
            && (telemetry.y - gy).abs() < ARRIVAL_TOLERANCE_M
        {
            return ActionProposal::stop("Reached goal.");
        }

        let mut speed = DEFAULT_SPEED;
        if let Some(governance) = last_governance {
            let slowdown = governance
                .policy_hits
                .iter()
                .any(|hit| SLOWDOWN_POLICIES.contains(&hit.as_str()));
            if slowdown {
                speed = CAUTIOUS_SPEED;
            }
        }

        ActionProposal::move_to(
            gx,
            gy,
            speed,
            "Navigate toward mission goal using a safe speed profile.",
        )
    }
}

#[async_trait]
impl Planner for HeuristicPlanner {
    async fn propose(
        &self,
        telemetry: &Telemetry,
        goal: &Goal,
        _task: &str,
        last_governance: Option<&GovernanceDecision>,
        _world: Option<&SimWorld>,
    ) -> Proposed {
        Proposed::plain(
            Self::next_proposal(telemetry, goal, last_governance),
            "heuristic",
        )
    }
}
