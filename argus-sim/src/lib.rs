//! HTTP adapter for the environment simulator.
//!
//! The simulator exposes three request/response endpoints:
//!
//! - `GET  /telemetry` — current telemetry snapshot
//! - `GET  /world`     — static world definition
//! - `POST /command`   — execute a command
//!
//! One [`SimClient`] (one connection pool) is shared by every run; calls
//! carry a bounded timeout and, when configured, a shared secret token in
//! the `X-Sim-Token` header.

mod client;
mod error;
mod simulator;
pub mod testing;

pub use client::{SimClient, SimClientBuilder};
pub use error::SimError;
pub use simulator::Simulator;
