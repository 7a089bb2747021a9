use std::time::Duration;

/// Which planner drives the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlannerMode {
    /// Deterministic heuristic, no external reasoning calls.
    #[default]
    Heuristic,
    /// Single-shot reasoning call per tick.
    Direct,
    /// ReAct agent with tools, memory and replanning.
    Agentic,
}

/// Configuration for the run controller.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Target period of one loop tick.
    pub tick_interval: Duration,
    /// Consecutive simulator failures after which a run fails.
    pub sim_failure_threshold: u32,
    /// Which planner proposes actions inside the loop.
    pub planner_mode: PlannerMode,
    /// Whether run start seeds the in-memory plan queue from the initial
    /// waypoint plan. Agentic mode ignores the queue either way.
    pub seed_plan_queue: bool,
    /// Per-subscriber channel capacity; slow subscribers drop messages
    /// beyond this depth.
    pub subscriber_capacity: usize,
    /// How long graceful shutdown waits for loop tasks to drain.
    pub shutdown_grace: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            sim_failure_threshold: 5,
            planner_mode: PlannerMode::default(),
            seed_plan_queue: true,
            subscriber_capacity: 64,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}
