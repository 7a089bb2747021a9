//! Geometric detour helper.
//!
//! Deliberately minimal: a straight line, or one perpendicular detour
//! waypoint around the first blocking obstacle. Anything smarter belongs
//! in a real path planner, which this system does not claim to be.

use argus_core::Obstacle;
use serde::{Deserialize, Serialize};

/// How the returned polyline was constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathNote {
    Straight,
    Detour,
}

/// Distance from point `(px, py)` to segment `(ax, ay)-(bx, by)`.
fn segment_point_distance(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let (abx, aby) = (bx - ax, by - ay);
    let (apx, apy) = (px - ax, py - ay);
    let ab2 = abx * abx + aby * aby;
    if ab2 <= 1e-9 {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }
    let t = ((apx * abx + apy * aby) / ab2).clamp(0.0, 1.0);
    let (cx, cy) = (ax + t * abx, ay + t * aby);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// Plan a lightweight path preview polyline from `start` to `goal`.
///
/// Starts with a straight line; if it crosses an obstacle circle (inflated
/// by `clearance_m`), inserts one detour waypoint perpendicular to the
/// line, on whichever side keeps more distance from the obstacle.
#[must_use]
pub fn plan_path(
    start: (f64, f64),
    goal: (f64, f64),
    obstacles: &[Obstacle],
    clearance_m: f64,
) -> (Vec<(f64, f64)>, PathNote) {
    let (sx, sy) = start;
    let (gx, gy) = goal;

    let blocking = obstacles.iter().find(|ob| {
        segment_point_distance(ob.x, ob.y, sx, sy, gx, gy) <= ob.radius() + clearance_m
    });

    let Some(ob) = blocking else {
        return (vec![(sx, sy), (gx, gy)], PathNote::Straight);
    };

    let (dx, dy) = (gx - sx, gy - sy);
    let norm = (dx * dx + dy * dy).sqrt().max(1.0);
    let (ux, uy) = (dx / norm, dy / norm);
    // Perpendicular to the direction of travel.
    let (px, py) = (-uy, ux);

    let detour_dist = ob.radius() + clearance_m + 1.0;
    let c1 = (ob.x + px * detour_dist, ob.y + py * detour_dist);
    let c2 = (ob.x - px * detour_dist, ob.y - py * detour_dist);

    // Pick the side whose two legs keep more distance from the obstacle.
    let score = |c: (f64, f64)| {
        let d1 = segment_point_distance(ob.x, ob.y, sx, sy, c.0, c.1);
        let d2 = segment_point_distance(ob.x, ob.y, c.0, c.1, gx, gy);
        d1.min(d2)
    };
    let c = if score(c1) >= score(c2) { c1 } else { c2 };

    (vec![(sx, sy), c, (gx, gy)], PathNote::Detour)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(x: f64, y: f64, r: f64) -> Obstacle {
        Obstacle { x, y, r: Some(r) }
    }

    #[test]
    fn clear_line_goes_straight() {
        let (points, note) = plan_path((0.0, 0.0), (10.0, 0.0), &[circle(5.0, 8.0, 1.0)], 0.75);
        assert_eq!(note, PathNote::Straight);
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn blocking_obstacle_forces_detour() {
        let (points, note) = plan_path((0.0, 0.0), (10.0, 0.0), &[circle(5.0, 0.0, 1.0)], 0.75);
        assert_eq!(note, PathNote::Detour);
        assert_eq!(points.len(), 3);
        // Detour waypoint clears the inflated circle.
        let mid = points[1];
        let dist = ((mid.0 - 5.0f64).powi(2) + mid.1.powi(2)).sqrt();
        assert!(dist > 1.75);
    }

    #[test]
    fn point_obstacles_get_default_radius() {
        let ob = Obstacle {
            x: 5.0,
            y: 0.0,
            r: None,
        };
        let (_, note) = plan_path((0.0, 0.0), (10.0, 0.0), &[ob], 0.75);
        assert_eq!(note, PathNote::Detour);
    }

    #[test]
    fn degenerate_segment_is_handled() {
        let (points, note) = plan_path((5.0, 5.0), (5.0, 5.0), &[], 0.75);
        assert_eq!(note, PathNote::Straight);
        assert_eq!(points[0], points[1]);
    }
}
