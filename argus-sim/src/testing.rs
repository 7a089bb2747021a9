//! Test doubles for the [`Simulator`](crate::Simulator) contract.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use argus_core::{Command, Geofence, SimWorld, Telemetry};

use crate::error::SimError;
use crate::simulator::Simulator;

/// A scriptable in-process simulator.
///
/// Serves a fixed world, a settable telemetry snapshot, and records every
/// command it receives. Individual calls can be failed to exercise the
/// controller's transient-fault handling.
pub struct ScriptedSimulator {
    world: SimWorld,
    telemetry: Mutex<Telemetry>,
    commands: Mutex<Vec<Command>>,
    fail_telemetry: Mutex<u32>,
    fail_commands: Mutex<u32>,
}

impl ScriptedSimulator {
    /// A simulator with the default warehouse world and a benign snapshot.
    #[must_use]
    pub fn new() -> Self {
        let world = SimWorld {
            geofence: Geofence {
                min_x: 0.0,
                max_x: 40.0,
                min_y: 0.0,
                max_y: 25.0,
            },
            zones: Vec::new(),
            obstacles: Vec::new(),
            human: None,
            bays: Vec::new(),
        };
        let telemetry: Telemetry = serde_json::from_value(json!({
            "x": 2.0, "y": 2.0, "theta": 0.0, "speed": 0.0,
            "zone": "aisle", "nearest_obstacle_m": 5.0,
            "human_detected": false, "human_conf": 0.0
        }))
        .unwrap_or_default();
        Self {
            world,
            telemetry: Mutex::new(telemetry),
            commands: Mutex::new(Vec::new()),
            fail_telemetry: Mutex::new(0),
            fail_commands: Mutex::new(0),
        }
    }

    /// Replace the world definition.
    #[must_use]
    pub fn with_world(mut self, world: SimWorld) -> Self {
        self.world = world;
        self
    }

    /// Replace the current telemetry snapshot.
    pub fn set_telemetry(&self, telemetry: Telemetry) {
        *self.telemetry.lock() = telemetry;
    }

    /// Fail the next `n` telemetry reads.
    pub fn fail_next_telemetry(&self, n: u32) {
        *self.fail_telemetry.lock() = n;
    }

    /// Fail the next `n` command sends.
    pub fn fail_next_commands(&self, n: u32) {
        *self.fail_commands.lock() = n;
    }

    /// Commands received so far, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }
}

impl Default for ScriptedSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Simulator for ScriptedSimulator {
    async fn get_world(&self) -> Result<SimWorld, SimError> {
        Ok(self.world.clone())
    }

    async fn get_telemetry(&self) -> Result<Telemetry, SimError> {
        let mut failures = self.fail_telemetry.lock();
        if *failures > 0 {
            *failures -= 1;
            return Err(SimError::Unreachable("scripted failure".to_owned()));
        }
        Ok(self.telemetry.lock().clone())
    }

    async fn send_command(&self, command: &Command) -> Result<Value, SimError> {
        let mut failures = self.fail_commands.lock();
        if *failures > 0 {
            *failures -= 1;
            return Err(SimError::Unreachable("scripted failure".to_owned()));
        }
        drop(failures);
        self.commands.lock().push(command.clone());
        Ok(json!({"ok": true}))
    }
}
