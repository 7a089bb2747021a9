use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Category of a real-time frame fanned out to run subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Telemetry,
    Event,
    Alert,
    Status,
    AgentReasoning,
}

impl StreamKind {
    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::Telemetry => "telemetry",
            StreamKind::Event => "event",
            StreamKind::Alert => "alert",
            StreamKind::Status => "status",
            StreamKind::AgentReasoning => "agent_reasoning",
        }
    }
}

/// One frame delivered to subscribers: `{kind, data}`.
///
/// Delivery is best-effort at-most-once; there is no replay on reconnect.
/// Consumers reconstruct history from the event list instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMessage {
    pub kind: StreamKind,
    pub data: Value,
}

impl StreamMessage {
    #[must_use]
    pub fn telemetry(data: Value) -> Self {
        Self {
            kind: StreamKind::Telemetry,
            data,
        }
    }

    #[must_use]
    pub fn event(data: Value) -> Self {
        Self {
            kind: StreamKind::Event,
            data,
        }
    }

    #[must_use]
    pub fn alert(data: Value) -> Self {
        Self {
            kind: StreamKind::Alert,
            data,
        }
    }

    /// A run status transition frame.
    #[must_use]
    pub fn status(status: &str) -> Self {
        Self {
            kind: StreamKind::Status,
            data: json!({"status": status}),
        }
    }

    #[must_use]
    pub fn agent_reasoning(data: Value) -> Self {
        Self {
            kind: StreamKind::AgentReasoning,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&StreamKind::AgentReasoning).unwrap(),
            "\"agent_reasoning\""
        );
    }

    #[test]
    fn status_frame_shape() {
        let m = StreamMessage::status("completed");
        assert_eq!(m.data["status"], "completed");
        assert_eq!(m.kind, StreamKind::Status);
    }
}
