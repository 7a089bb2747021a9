use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use argus_core::{sha256_canonical, ArgusError, MissionId, Run, RunId, TelemetrySample};

use crate::chain::verify_chain;
use crate::record::Event;

/// Current bundle format. Bump only with a migration story: old bundles
/// must keep verifying.
pub const BUNDLE_FORMAT_VERSION: &str = "1.0";

/// A self-contained export of one run's timeline, suitable for regulatory
/// submission and offline verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditBundle {
    pub run_id: RunId,
    pub mission_id: MissionId,
    pub status: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// Full ordered event timeline.
    pub events: Vec<Event>,
    /// Raw telemetry samples, when requested.
    #[serde(default)]
    pub telemetry: Option<Vec<TelemetrySample>>,
    pub event_count: usize,
    /// Whether the chain verified at export time. Recipients should
    /// re-verify rather than trust this flag.
    pub chain_valid: bool,
    /// `SHA-256(canonical({event_hashes, run_id}))`, bare lowercase hex.
    pub bundle_hash: String,
    pub format_version: String,
}

impl AuditBundle {
    /// Assemble a bundle from a run and its ordered timeline.
    #[must_use]
    pub fn build(run: &Run, events: Vec<Event>, telemetry: Option<Vec<TelemetrySample>>) -> Self {
        let chain_valid = verify_chain(&events).valid;
        let bundle_hash = bundle_hash(&run.id, &events);
        Self {
            run_id: run.id.clone(),
            mission_id: run.mission_id.clone(),
            status: run.status.to_string(),
            started_at: run.started_at,
            ended_at: run.ended_at,
            event_count: events.len(),
            events,
            telemetry,
            chain_valid,
            bundle_hash,
            format_version: BUNDLE_FORMAT_VERSION.to_owned(),
        }
    }

    /// Recompute the bundle hash from the contained events.
    #[must_use]
    pub fn derive_bundle_hash(&self) -> String {
        bundle_hash(&self.run_id, &self.events)
    }

    /// Independently verify a received bundle: the event chain must be
    /// intact and the bundle hash must re-derive from the events.
    ///
    /// This is what an auditor runs on a submitted bundle; the embedded
    /// `chain_valid` flag is advisory only.
    pub fn verify(&self) -> Result<(), ArgusError> {
        let verification = verify_chain(&self.events);
        if !verification.valid {
            return Err(ArgusError::ChainIntegrity(format!(
                "event chain broken at {}: {}",
                verification.first_broken_at.as_deref().unwrap_or("?"),
                verification.detail.as_deref().unwrap_or("unknown"),
            )));
        }
        if self.derive_bundle_hash() != self.bundle_hash {
            return Err(ArgusError::ChainIntegrity(
                "bundle hash does not re-derive from events".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Top-level integrity hash over the ordered event hashes.
///
/// Defined over the possibly-empty list of hashes, so a run with no events
/// still exports a verifiable bundle.
#[must_use]
pub fn bundle_hash(run_id: &RunId, events: &[Event]) -> String {
    let hashes: Vec<&str> = events.iter().map(|e| e.hash.as_str()).collect();
    sha256_canonical(&json!({"event_hashes": hashes, "run_id": run_id}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{compute_hash, EventType};
    use argus_core::{EventId, RunStatus, ZERO_HASH};
    use chrono::TimeZone;

    fn run() -> Run {
        Run {
            id: RunId::new("run_b"),
            mission_id: MissionId::new("mis_b"),
            status: RunStatus::Completed,
            started_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            ended_at: Some(Utc.with_ymd_and_hms(2025, 6, 1, 12, 5, 0).unwrap()),
        }
    }

    fn one_event(run_id: &RunId) -> Event {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 1).unwrap();
        let payload = serde_json::json!({"k": 1});
        let hash = compute_hash(run_id, ts, EventType::Decision, &payload, ZERO_HASH);
        Event {
            id: EventId::new("evt_b0"),
            run_id: run_id.clone(),
            ts,
            event_type: EventType::Decision,
            payload,
            prev_hash: ZERO_HASH.to_owned(),
            hash,
        }
    }

    #[test]
    fn bundle_hash_defined_over_empty_list() {
        let h = bundle_hash(&RunId::new("run_b"), &[]);
        assert_eq!(h.len(), 64);
    }

    #[test]
    fn bundle_reports_chain_validity() {
        let run = run();
        let event = one_event(&run.id);
        let bundle = AuditBundle::build(&run, vec![event], None);
        assert!(bundle.chain_valid);
        assert_eq!(bundle.event_count, 1);
        assert_eq!(bundle.format_version, "1.0");
        assert_eq!(bundle.derive_bundle_hash(), bundle.bundle_hash);
    }

    #[test]
    fn bundle_hash_changes_with_events() {
        let run = run();
        let empty = AuditBundle::build(&run, vec![], None);
        let with_event = AuditBundle::build(&run, vec![one_event(&run.id)], None);
        assert_ne!(empty.bundle_hash, with_event.bundle_hash);
    }

    #[test]
    fn verify_accepts_intact_and_rejects_tampered_bundles() {
        let run = run();
        let mut bundle = AuditBundle::build(&run, vec![one_event(&run.id)], None);
        assert!(bundle.verify().is_ok());

        bundle.events[0].payload = serde_json::json!({"k": 2});
        let err = bundle.verify().unwrap_err();
        assert!(matches!(err, ArgusError::ChainIntegrity(_)));
    }

    #[test]
    fn verify_rejects_bundle_hash_mismatch() {
        let run = run();
        let mut bundle = AuditBundle::build(&run, vec![one_event(&run.id)], None);
        bundle.bundle_hash = "0".repeat(64);
        assert!(matches!(
            bundle.verify().unwrap_err(),
            ArgusError::ChainIntegrity(_)
        ));
    }

    #[test]
    fn bundle_roundtrips_through_json() {
        let run = run();
        let bundle = AuditBundle::build(&run, vec![one_event(&run.id)], None);
        let text = serde_json::to_string(&bundle).unwrap();
        let parsed: AuditBundle = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.bundle_hash, bundle.bundle_hash);
        assert_eq!(parsed.derive_bundle_hash(), bundle.bundle_hash);
        assert!(verify_chain(&parsed.events).valid);
    }
}
