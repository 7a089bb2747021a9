//! Mission planners.
//!
//! Three implementations of the [`Planner`] capability:
//!
//! - [`HeuristicPlanner`] — deterministic, no external calls; the baseline
//!   when reasoning is disabled.
//! - [`DirectPlanner`] — one reasoning call per tick, constrained to a
//!   single strict-JSON proposal; also generates multi-waypoint plans.
//! - [`AgenticPlanner`] — ReAct loop with tools, sliding-window memory and
//!   replanning under governance pre-check.
//!
//! Every planner degrades to a deterministic fallback when the reasoning
//! service is unavailable or returns garbage; the run loop never blocks on
//! a model.

pub mod agentic;
pub mod direct;
pub mod heuristic;
pub mod path;
mod planner;

pub use agentic::{AgenticPlanner, AgentMemory, MemoryEntry};
pub use direct::DirectPlanner;
pub use heuristic::HeuristicPlanner;
pub use path::{plan_path, PathNote};
pub use planner::{Planner, Proposed, ThoughtStep};
