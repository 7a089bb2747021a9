//! Control-plane storage traits.
//!
//! Missions, runs and telemetry samples sit behind narrow async traits so
//! the runtime is backend-agnostic; `argus-store-memory` provides the
//! in-process implementation used in development and tests.

mod error;
mod mission;
mod run;
mod telemetry;

pub use error::StoreError;
pub use mission::{MissionQuery, MissionStore};
pub use run::{RunQuery, RunStore};
pub use telemetry::TelemetryStore;
