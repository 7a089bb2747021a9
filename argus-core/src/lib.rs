pub mod canonical;
pub mod error;
pub mod governance;
pub mod mission;
pub mod proposal;
pub mod run;
pub mod stream;
pub mod telemetry;
pub mod types;
pub mod world;

pub use canonical::{canonical_json, sha256_canonical, ZERO_HASH};
pub use error::ArgusError;
pub use governance::{Decision, GovernanceDecision, PolicyInfo, PolicySeverity, PolicyState};
pub use mission::{Goal, Mission, MissionAuditEntry, MissionStatus};
pub use proposal::{ActionProposal, Intent, MoveTarget, Waypoint, WaypointPlan};
pub use run::{Run, RunStatus};
pub use stream::{StreamKind, StreamMessage};
pub use telemetry::{Telemetry, TelemetrySample, WalkingHuman};
pub use types::{new_id, EventId, MissionId, RunId};
pub use world::{Bay, Command, Geofence, Human, Obstacle, SimWorld, Zone, ZoneRect};
