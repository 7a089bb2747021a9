use async_trait::async_trait;
use serde_json::Value;

use argus_core::{Command, SimWorld, Telemetry};

use crate::client::SimClient;
use crate::error::SimError;

/// The environment contract the run controller drives against.
///
/// [`SimClient`] implements this over HTTP; tests use the doubles in
/// [`crate::testing`]. Implementations must be `Send + Sync` because one
/// instance is shared by every run.
#[async_trait]
pub trait Simulator: Send + Sync {
    /// Fetch the static world definition.
    async fn get_world(&self) -> Result<SimWorld, SimError>;

    /// Fetch the current telemetry snapshot.
    async fn get_telemetry(&self) -> Result<Telemetry, SimError>;

    /// Send a command for execution. Returns the simulator's raw response.
    async fn send_command(&self, command: &Command) -> Result<Value, SimError>;
}

#[async_trait]
impl Simulator for SimClient {
    async fn get_world(&self) -> Result<SimWorld, SimError> {
        // Inherent methods win resolution, so these delegate, not recurse.
        SimClient::get_world(self).await
    }

    async fn get_telemetry(&self) -> Result<Telemetry, SimError> {
        SimClient::get_telemetry(self).await
    }

    async fn send_command(&self, command: &Command) -> Result<Value, SimError> {
        SimClient::send_command(self, command).await
    }
}
