use argus_core::{PolicyInfo, PolicySeverity};

/// The policy catalog, for governance consumers that list what the
/// evaluator enforces.
#[must_use]
pub fn policy_catalog() -> Vec<PolicyInfo> {
    vec![
        PolicyInfo {
            policy_id: "GEOFENCE_01".into(),
            name: "Geofence containment".into(),
            description: "The robot and any proposed destination must stay inside the \
                          configured operating rectangle."
                .into(),
            severity: PolicySeverity::High,
        },
        PolicyInfo {
            policy_id: "SAFE_SPEED_01".into(),
            name: "Zone speed limit".into(),
            description: "Commanded speed must not exceed the ceiling of the current zone."
                .into(),
            severity: PolicySeverity::Medium,
        },
        PolicyInfo {
            policy_id: "HUMAN_PROXIMITY_02".into(),
            name: "Human proximity".into(),
            description: "Movement near a person requires reduced speed inside the slow \
                          radius and a full stop inside the stop radius."
                .into(),
            severity: PolicySeverity::High,
        },
        PolicyInfo {
            policy_id: "HUMAN_CLEARANCE_02".into(),
            name: "Near-human speed ceiling".into(),
            description: "With a confidently detected human present, commanded speed is \
                          capped regardless of zone."
                .into(),
            severity: PolicySeverity::High,
        },
        PolicyInfo {
            policy_id: "OBSTACLE_CLEARANCE_03".into(),
            name: "Obstacle clearance".into(),
            description: "Movement is blocked while the nearest obstacle is closer than \
                          the minimum clearance; the planner must replan."
                .into(),
            severity: PolicySeverity::Medium,
        },
        PolicyInfo {
            policy_id: "UNCERTAINTY_04".into(),
            name: "Perception uncertainty".into(),
            description: "A human detection below the confidence floor gates movement \
                          until perception improves."
                .into(),
            severity: PolicySeverity::Medium,
        },
        PolicyInfo {
            policy_id: "HITL_05".into(),
            name: "Human-in-the-loop review".into(),
            description: "Aggregate risk above the review threshold without a hard rule \
                          hit is escalated to an operator."
                .into(),
            severity: PolicySeverity::Low,
        },
        PolicyInfo {
            policy_id: "WORKER_PROXIMITY_06".into(),
            name: "Worker proximity".into(),
            description: "Walking workers are tracked separately from the primary human \
                          signal; the nearer of the two governs proximity rules."
                .into(),
            severity: PolicySeverity::High,
        },
    ]
}
