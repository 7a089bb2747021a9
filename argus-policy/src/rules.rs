use argus_core::{
    ActionProposal, Decision, GovernanceDecision, Intent, PolicyState, Telemetry,
};

use crate::config::PolicyConfig;

/// Rule identifiers, as they appear in `policy_hits` and audit payloads.
pub(crate) const GEOFENCE: &str = "GEOFENCE_01";
pub(crate) const SAFE_SPEED: &str = "SAFE_SPEED_01";
pub(crate) const HUMAN_PROXIMITY: &str = "HUMAN_PROXIMITY_02";
pub(crate) const HUMAN_CLEARANCE: &str = "HUMAN_CLEARANCE_02";
pub(crate) const OBSTACLE_CLEARANCE: &str = "OBSTACLE_CLEARANCE_03";
pub(crate) const UNCERTAINTY: &str = "UNCERTAINTY_04";
pub(crate) const HITL: &str = "HITL_05";
pub(crate) const WORKER_PROXIMITY: &str = "WORKER_PROXIMITY_06";

/// Accumulates rule outcomes while the set is walked.
struct RuleLedger {
    hits: Vec<String>,
    reasons: Vec<String>,
    required_action: Option<String>,
    risk_score: f64,
    state: PolicyState,
}

impl RuleLedger {
    fn new() -> Self {
        Self {
            hits: Vec::new(),
            reasons: Vec::new(),
            required_action: None,
            risk_score: 0.0,
            state: PolicyState::Safe,
        }
    }

    fn hit(&mut self, policy: &str, reason: String, risk: f64, state: PolicyState) {
        if !self.hits.iter().any(|h| h == policy) {
            self.hits.push(policy.to_owned());
        }
        self.reasons.push(reason);
        self.bump(risk, state);
    }

    fn bump(&mut self, risk: f64, state: PolicyState) {
        self.risk_score = self.risk_score.max(risk);
        self.state = self.state.max(state);
    }

    fn require(&mut self, action: impl Into<String>) {
        self.required_action = Some(action.into());
    }
}

/// Evaluate one proposal against the policy set.
///
/// `STOP` and `WAIT` are always approved: halting is never less safe than
/// the alternative, and the run controller relies on an approved `STOP` to
/// complete a run.
#[must_use]
pub fn evaluate(
    config: &PolicyConfig,
    telemetry: &Telemetry,
    proposal: &ActionProposal,
) -> GovernanceDecision {
    if proposal.intent != Intent::MoveTo {
        return GovernanceDecision::approved();
    }

    let mut ledger = RuleLedger::new();

    let x = telemetry.x;
    let y = telemetry.y;
    let target = proposal.move_target();
    let max_speed = target.map_or(0.0, |t| t.max_speed);

    // GEOFENCE_01: current position.
    if !config.geofence.contains(x, y) {
        ledger.hit(
            GEOFENCE,
            format!("Robot out of geofence at ({x:.2},{y:.2})."),
            0.95,
            PolicyState::Stop,
        );
    }

    // GEOFENCE_01: proposed destination.
    if let Some(t) = target {
        if !config.geofence.contains(t.x, t.y) {
            ledger.hit(
                GEOFENCE,
                format!(
                    "Proposed destination ({:.2},{:.2}) is outside geofence.",
                    t.x, t.y
                ),
                0.95,
                PolicyState::Stop,
            );
        }
    }

    // OBSTACLE_CLEARANCE_03.
    if telemetry.nearest_obstacle_m < config.min_obstacle_clearance_m {
        ledger.hit(
            OBSTACLE_CLEARANCE,
            format!(
                "Obstacle clearance too low: {:.2}m < {:.2}m.",
                telemetry.nearest_obstacle_m, config.min_obstacle_clearance_m
            ),
            0.9,
            PolicyState::Replan,
        );
        ledger.require("Stop and replan with safer clearance.");
    }

    // HUMAN_PROXIMITY_02 / WORKER_PROXIMITY_06: distance-based, using the
    // nearer of the primary human and any walking worker.
    let (prox_dist, prox_is_worker) = nearest_human(telemetry);
    let (prox_policy, prox_label) = if prox_is_worker {
        (WORKER_PROXIMITY, "Worker")
    } else {
        (HUMAN_PROXIMITY, "Human")
    };

    if prox_dist < config.human_stop_radius_m {
        ledger.hit(
            prox_policy,
            format!(
                "{} too close: {:.2}m < stop radius {:.1}m. Full stop required.",
                prox_label, prox_dist, config.human_stop_radius_m
            ),
            0.95,
            PolicyState::Stop,
        );
        ledger.require("Full stop: human within safety perimeter.");
    } else if prox_dist < config.human_slow_radius_m {
        ledger.hit(
            prox_policy,
            format!(
                "{} nearby: {:.2}m < slow radius {:.1}m. Reduce speed.",
                prox_label, prox_dist, config.human_slow_radius_m
            ),
            0.80,
            PolicyState::Slow,
        );
        ledger.require(format!(
            "Reduce max_speed to <= {:.2} while a person is within {:.1}m.",
            config.max_speed_near_human, config.human_slow_radius_m
        ));
    }

    // UNCERTAINTY_04: human detected but perception is not sure.
    if telemetry.human_detected && telemetry.human_conf < config.min_human_conf {
        ledger.hit(
            UNCERTAINTY,
            format!(
                "Human detected but confidence too low: {:.2} < {:.2}.",
                telemetry.human_conf, config.min_human_conf
            ),
            0.8,
            PolicyState::Slow,
        );
        ledger.require("Slow down and request operator review; improve perception confidence.");
    }

    // SAFE_SPEED_01: zone speed ceiling.
    let zone_limit = config.zone_speed_limit(&telemetry.zone);
    if max_speed > zone_limit {
        ledger.hit(
            SAFE_SPEED,
            format!(
                "Speed too high for zone '{}': {:.2} > {:.2}.",
                telemetry.zone, max_speed, zone_limit
            ),
            0.85,
            PolicyState::Slow,
        );
        ledger.require(format!("Reduce max_speed to <= {zone_limit:.2}."));
    }

    // HUMAN_CLEARANCE_02: confident human present and speed above the
    // near-human ceiling. Skipped when distance-based primary-human
    // proximity already fired.
    if telemetry.human_detected
        && telemetry.human_conf >= config.min_human_conf
        && max_speed > config.max_speed_near_human
    {
        if !ledger.hits.iter().any(|h| h == HUMAN_PROXIMITY) {
            ledger.hit(
                HUMAN_CLEARANCE,
                format!(
                    "Human nearby (conf={:.2}); max_speed {:.2} too high.",
                    telemetry.human_conf, max_speed
                ),
                0.88,
                PolicyState::Slow,
            );
        } else {
            ledger.reasons.push(format!(
                "Human nearby (conf={:.2}); max_speed {:.2} too high.",
                telemetry.human_conf, max_speed
            ));
            ledger.bump(0.88, PolicyState::Slow);
        }
        ledger.require(format!(
            "Reduce max_speed to <= {:.2} near humans.",
            config.max_speed_near_human
        ));
    }

    // Very low confidence detections bump risk without their own hit.
    if telemetry.human_detected && telemetry.human_conf < config.min_conf_for_move {
        ledger.risk_score = ledger.risk_score.max(0.7);
    }

    // HITL_05: aggregate risk crossed the review threshold with no rule hit.
    if ledger.risk_score >= config.review_risk_threshold && ledger.hits.is_empty() {
        let reason = format!(
            "Risk score {:.2} exceeds review threshold {:.2}; human review required.",
            ledger.risk_score, config.review_risk_threshold
        );
        ledger.hits.push(HITL.to_owned());
        ledger.reasons.push(reason);
    }

    reduce(config, ledger)
}

/// Nearer of the primary perceived human and any walking worker. Returns
/// `(distance, is_worker)`.
fn nearest_human(telemetry: &Telemetry) -> (f64, bool) {
    let mut worker_dist = f64::INFINITY;
    for wh in &telemetry.walking_humans {
        let d = telemetry.distance_to(wh.x, wh.y);
        if d < worker_dist {
            worker_dist = d;
        }
    }
    if worker_dist < telemetry.human_distance_m {
        (worker_dist, true)
    } else {
        (telemetry.human_distance_m, false)
    }
}

/// Reduce the ledger to a decision: any hit denies, except aggregate high
/// risk without a geofence breach, which requests review instead.
fn reduce(config: &PolicyConfig, ledger: RuleLedger) -> GovernanceDecision {
    if ledger.hits.is_empty() {
        return GovernanceDecision {
            decision: Decision::Approved,
            policy_hits: Vec::new(),
            reasons: Vec::new(),
            required_action: None,
            risk_score: ledger.risk_score,
            policy_state: PolicyState::Safe,
        };
    }

    let decision = if ledger.risk_score >= config.review_risk_threshold
        && !ledger.hits.iter().any(|h| h == GEOFENCE)
    {
        Decision::NeedsReview
    } else {
        Decision::Denied
    };

    GovernanceDecision {
        decision,
        policy_hits: ledger.hits,
        reasons: ledger.reasons,
        required_action: ledger.required_action,
        risk_score: ledger.risk_score,
        policy_state: ledger.state,
    }
}
