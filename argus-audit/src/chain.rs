use serde::{Deserialize, Serialize};

use argus_core::ZERO_HASH;

use crate::record::Event;

/// Result of walking a chain, for compliance consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainVerification {
    /// Whether the chain is intact (no broken links, no altered content).
    pub valid: bool,
    /// Number of events checked.
    pub events_checked: u64,
    /// ID of the event where the chain first broke, if any.
    #[serde(default)]
    pub first_broken_at: Option<String>,
    /// What broke, e.g. `prev_hash mismatch` or `hash does not re-derive`.
    #[serde(default)]
    pub detail: Option<String>,
}

impl ChainVerification {
    fn intact(count: u64) -> Self {
        Self {
            valid: true,
            events_checked: count,
            first_broken_at: None,
            detail: None,
        }
    }

    fn broken(count: u64, at: &Event, detail: impl Into<String>) -> Self {
        Self {
            valid: false,
            events_checked: count,
            first_broken_at: Some(at.id.to_string()),
            detail: Some(detail.into()),
        }
    }
}

/// Walk an event list (in `ts` order) and verify the chain of trust.
///
/// Valid iff: the list is empty (vacuously true); the first event's
/// `prev_hash` is the zero hash; each subsequent `prev_hash` equals the
/// previous event's `hash`; and every stored `hash` re-derives from the
/// event's own content. Pure and idempotent; never mutates the store.
#[must_use]
pub fn verify_chain(events: &[Event]) -> ChainVerification {
    let total = events.len() as u64;
    let Some(first) = events.first() else {
        return ChainVerification::intact(0);
    };

    if first.prev_hash != ZERO_HASH {
        return ChainVerification::broken(total, first, "first event prev_hash is not zero");
    }

    for (i, event) in events.iter().enumerate() {
        if i > 0 && event.prev_hash != events[i - 1].hash {
            return ChainVerification::broken(total, event, "prev_hash mismatch");
        }
        if event.derive_hash() != event.hash {
            return ChainVerification::broken(total, event, "hash does not re-derive");
        }
    }

    ChainVerification::intact(total)
}
