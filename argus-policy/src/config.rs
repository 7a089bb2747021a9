use argus_core::Geofence;
use serde::{Deserialize, Serialize};

/// Tunable parameters of the policy set.
///
/// Defaults match the reference warehouse floor. All thresholds are
/// configuration, not code: swapping the floor plan must not require a
/// recompile of the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// The rectangle the robot must stay inside.
    pub geofence: Geofence,
    /// Speed ceiling in the `aisle` zone (m/s).
    pub aisle_speed_limit: f64,
    /// Speed ceiling in the `corridor` zone (m/s).
    pub corridor_speed_limit: f64,
    /// Speed ceiling in the `loading_bay` zone (m/s).
    pub loading_bay_speed_limit: f64,
    /// Minimum allowed clearance to the nearest obstacle (m).
    pub min_obstacle_clearance_m: f64,
    /// Confidence below which a human detection counts as uncertain.
    pub min_human_conf: f64,
    /// Speed ceiling while a confident human is nearby (m/s).
    pub max_speed_near_human: f64,
    /// Confidence below which any human detection bumps risk.
    pub min_conf_for_move: f64,
    /// Humans inside this radius require reduced speed (m).
    pub human_slow_radius_m: f64,
    /// Humans inside this radius require a full stop (m).
    pub human_stop_radius_m: f64,
    /// Aggregate risk at or above which a human review is requested.
    pub review_risk_threshold: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            geofence: Geofence {
                min_x: 0.0,
                max_x: 40.0,
                min_y: 0.0,
                max_y: 25.0,
            },
            aisle_speed_limit: 0.5,
            corridor_speed_limit: 0.7,
            loading_bay_speed_limit: 0.4,
            min_obstacle_clearance_m: 0.5,
            min_human_conf: 0.65,
            max_speed_near_human: 0.4,
            min_conf_for_move: 0.55,
            human_slow_radius_m: 3.0,
            human_stop_radius_m: 1.0,
            review_risk_threshold: 0.75,
        }
    }
}

impl PolicyConfig {
    /// Speed limit for a named zone. Unknown zones get the aisle limit.
    #[must_use]
    pub fn zone_speed_limit(&self, zone: &str) -> f64 {
        match zone {
            "corridor" => self.corridor_speed_limit,
            "loading_bay" => self.loading_bay_speed_limit,
            _ => self.aisle_speed_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_zone_falls_back_to_aisle() {
        let cfg = PolicyConfig::default();
        assert_eq!(cfg.zone_speed_limit("mezzanine"), cfg.aisle_speed_limit);
    }

    #[test]
    fn default_limits() {
        let cfg = PolicyConfig::default();
        assert_eq!(cfg.zone_speed_limit("aisle"), 0.5);
        assert_eq!(cfg.zone_speed_limit("corridor"), 0.7);
        assert_eq!(cfg.zone_speed_limit("loading_bay"), 0.4);
    }
}
