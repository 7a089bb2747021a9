//! The governed mission runtime.
//!
//! One [`RunController`] owns every live run: per run, a single loop task
//! samples telemetry, asks a planner for the next action, evaluates the
//! proposal against safety policies, executes only what policy allows, and
//! appends every step to the run's hash-linked audit chain. Telemetry,
//! decisions, alerts and status transitions fan out to subscribers through
//! the [`Broadcaster`].
//!
//! Transient faults (simulator, reasoning) never surface to callers; they
//! become ALERT events and retries. Store faults fail the run. Terminal
//! states are broadcast exactly once.

pub mod broadcast;
pub mod config;
pub mod controller;
mod error;
pub mod missions;
pub mod registry;
pub mod replay;

pub use broadcast::{Broadcaster, SubscriberHandle};
pub use config::{PlannerMode, RuntimeConfig};
pub use controller::{PlanGovernance, RunController, RuntimeServices, WaypointDecision};
pub use missions::MissionService;
pub use registry::RunRegistry;
pub use replay::RunTimeline;
