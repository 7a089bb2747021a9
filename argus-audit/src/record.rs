use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use argus_core::{sha256_canonical, EventId, RunId};

/// Kind of one link in a run's event chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// The initial strategy: waypoints generated at run start.
    #[serde(rename = "PLAN")]
    Plan,
    /// A persisted telemetry snapshot.
    #[serde(rename = "TELEMETRY")]
    Telemetry,
    /// A governed proposal with its context and decision.
    #[serde(rename = "DECISION")]
    Decision,
    /// A command actually sent to the simulator, with its result.
    #[serde(rename = "EXECUTION")]
    Execution,
    /// A fault or simulator-reported occurrence.
    #[serde(rename = "ALERT")]
    Alert,
}

impl EventType {
    /// Wire name of the event type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Plan => "PLAN",
            EventType::Telemetry => "TELEMETRY",
            EventType::Decision => "DECISION",
            EventType::Execution => "EXECUTION",
            EventType::Alert => "ALERT",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One link in the tamper-evident chain for a run.
///
/// `hash` covers `{run_id, ts, type, payload, prev_hash}` in canonical JSON;
/// `prev_hash` is the previous event's `hash`, or the zero hash for the
/// first event. Both render as bare 64-char lowercase hex. Events are
/// append-only; the store never rewrites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub run_id: RunId,
    pub ts: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub payload: Value,
    pub prev_hash: String,
    pub hash: String,
}

impl Event {
    /// Recompute this event's hash from its own fields.
    ///
    /// Used by chain verification; a stored hash that does not re-derive
    /// means the payload or linkage was altered after the fact.
    #[must_use]
    pub fn derive_hash(&self) -> String {
        compute_hash(
            &self.run_id,
            self.ts,
            self.event_type,
            &self.payload,
            &self.prev_hash,
        )
    }
}

/// Hash of the canonical event content.
///
/// The timestamp is rendered in RFC 3339 with microsecond precision and a
/// numeric offset; this encoding is part of the chain format and must stay
/// bit-stable so old audit bundles keep verifying.
#[must_use]
pub fn compute_hash(
    run_id: &RunId,
    ts: DateTime<Utc>,
    event_type: EventType,
    payload: &Value,
    prev_hash: &str,
) -> String {
    sha256_canonical(&json!({
        "run_id": run_id,
        "ts": ts.to_rfc3339_opts(SecondsFormat::Micros, false),
        "type": event_type,
        "payload": payload,
        "prev_hash": prev_hash,
    }))
}
