//! Client for the external reasoning service.
//!
//! Planners talk to the service through the [`ReasoningClient`] trait: one
//! prompt in, raw model text out. The HTTP implementation speaks a
//! `generateContent`-style REST API; the scripted implementation feeds
//! canned responses to tests. Model output is free text, so
//! [`extract_json`] pulls the first JSON object or array out of whatever
//! came back, markdown fences included.

mod client;
mod config;
mod error;
mod http;
mod json;
mod mock;

pub use client::ReasoningClient;
pub use config::ReasoningConfig;
pub use error::LlmError;
pub use http::HttpReasoningClient;
pub use json::extract_json;
pub use mock::ScriptedReasoningClient;
