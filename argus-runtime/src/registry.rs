use std::collections::VecDeque;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use argus_core::{RunId, Waypoint};

/// In-process index of live runs: stop signals and plan queues.
///
/// The registry holds no run state of record; the run store does. What
/// lives here is strictly ephemeral: the cancellation token a loop task
/// watches, and the in-memory queue of planned waypoints the loop consumes
/// ahead of calling a planner.
#[derive(Default)]
pub struct RunRegistry {
    tokens: DashMap<RunId, CancellationToken>,
    plan_queues: DashMap<RunId, VecDeque<Waypoint>>,
}

impl RunRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new loop task. Returns its cancellation token. An
    /// existing token for the run is replaced (the old task, if any, sees
    /// its own token and exits).
    #[must_use]
    pub fn register(&self, run_id: &RunId) -> CancellationToken {
        let token = CancellationToken::new();
        self.tokens.insert(run_id.clone(), token.clone());
        token
    }

    /// Whether a loop task is registered and not yet cancelled.
    #[must_use]
    pub fn is_live(&self, run_id: &RunId) -> bool {
        self.tokens
            .get(run_id)
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Signal a run's loop to stop. No-op for unknown runs.
    pub fn cancel(&self, run_id: &RunId) {
        if let Some(token) = self.tokens.get(run_id) {
            token.cancel();
        }
    }

    /// Signal every live run. Used by graceful shutdown.
    pub fn cancel_all(&self) {
        for entry in &self.tokens {
            entry.value().cancel();
        }
    }

    /// Drop a finished run's registrations.
    pub fn remove(&self, run_id: &RunId) {
        self.tokens.remove(run_id);
        self.plan_queues.remove(run_id);
    }

    /// Replace the run's plan queue with the given waypoints.
    pub fn seed_plan(&self, run_id: &RunId, waypoints: impl IntoIterator<Item = Waypoint>) {
        self.plan_queues
            .insert(run_id.clone(), waypoints.into_iter().collect());
    }

    /// The next planned waypoint, without consuming it.
    #[must_use]
    pub fn peek_waypoint(&self, run_id: &RunId) -> Option<Waypoint> {
        self.plan_queues
            .get(run_id)
            .and_then(|q| q.front().copied())
    }

    /// Consume the head waypoint after its execution.
    pub fn pop_waypoint(&self, run_id: &RunId) -> Option<Waypoint> {
        self.plan_queues.get_mut(run_id).and_then(|mut q| q.pop_front())
    }

    /// Remaining queued waypoints.
    #[must_use]
    pub fn plan_len(&self, run_id: &RunId) -> usize {
        self.plan_queues.get(run_id).map_or(0, |q| q.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(x: f64) -> Waypoint {
        Waypoint {
            x,
            y: 0.0,
            max_speed: 0.4,
        }
    }

    #[test]
    fn register_and_cancel() {
        let registry = RunRegistry::new();
        let run = RunId::new("run_r1");
        let token = registry.register(&run);
        assert!(registry.is_live(&run));

        registry.cancel(&run);
        assert!(token.is_cancelled());
        assert!(!registry.is_live(&run));
    }

    #[test]
    fn reregistering_replaces_token() {
        let registry = RunRegistry::new();
        let run = RunId::new("run_r2");
        let old = registry.register(&run);
        let _new = registry.register(&run);
        registry.cancel(&run);
        // The replaced token is untouched; only the current one cancels.
        assert!(!old.is_cancelled());
    }

    #[test]
    fn plan_queue_fifo() {
        let registry = RunRegistry::new();
        let run = RunId::new("run_r3");
        registry.seed_plan(&run, [wp(1.0), wp(2.0)]);

        assert_eq!(registry.plan_len(&run), 2);
        assert_eq!(registry.peek_waypoint(&run).unwrap().x, 1.0);
        // Peek does not consume.
        assert_eq!(registry.plan_len(&run), 2);

        assert_eq!(registry.pop_waypoint(&run).unwrap().x, 1.0);
        assert_eq!(registry.peek_waypoint(&run).unwrap().x, 2.0);
    }

    #[test]
    fn remove_clears_everything() {
        let registry = RunRegistry::new();
        let run = RunId::new("run_r4");
        let _token = registry.register(&run);
        registry.seed_plan(&run, [wp(1.0)]);

        registry.remove(&run);
        assert!(!registry.is_live(&run));
        assert_eq!(registry.plan_len(&run), 0);
    }

    #[test]
    fn cancel_all_hits_every_run() {
        let registry = RunRegistry::new();
        let a = registry.register(&RunId::new("run_a"));
        let b = registry.register(&RunId::new("run_b"));
        registry.cancel_all();
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
    }
}
