//! Compliance report generation over a run's decision history.
//!
//! Reports summarize governance outcomes and chain integrity; framework
//! mappings (ISO 42001, EU AI Act, NIST AI RMF) are static text tables
//! describing which control each capability addresses.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use argus_core::RunId;

use crate::chain::verify_chain;
use crate::record::{Event, EventType};

/// Aggregate governance metrics for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplianceMetrics {
    pub total_decisions: u64,
    pub approved: u64,
    pub denied: u64,
    pub needs_review: u64,
    /// `approved / total_decisions`, 0 when no decisions were made.
    pub approval_rate: f64,
    pub avg_risk_score: f64,
    pub max_risk_score: f64,
    /// Violation counts keyed by policy id, e.g. `SAFE_SPEED_01`.
    pub violations_by_policy: BTreeMap<String, u64>,
}

/// A generated compliance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub run_id: RunId,
    #[serde(default)]
    pub period_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub period_end: Option<DateTime<Utc>>,
    pub metrics: ComplianceMetrics,
    pub chain_valid: bool,
    /// Framework name to the controls this system addresses.
    pub framework_mapping: BTreeMap<String, Vec<String>>,
}

/// Static mapping of regulatory frameworks to addressed controls.
#[must_use]
pub fn framework_mappings() -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();
    map.insert(
        "EU_AI_ACT".to_owned(),
        vec![
            "Article 9: Risk Management System".to_owned(),
            "Article 11: Technical Documentation".to_owned(),
            "Article 12: Record-Keeping".to_owned(),
            "Article 13: Transparency".to_owned(),
            "Article 14: Human Oversight".to_owned(),
            "Article 15: Accuracy and Robustness".to_owned(),
        ],
    );
    map.insert(
        "ISO_42001".to_owned(),
        vec![
            "Clause 6: Planning - Risk Assessment".to_owned(),
            "Clause 7: Support - Monitoring".to_owned(),
            "Clause 8: Operation - Risk Treatment".to_owned(),
            "Clause 9: Evaluation - Internal Audit".to_owned(),
            "Clause 10: Improvement - Continual".to_owned(),
        ],
    );
    map.insert(
        "NIST_AI_RMF".to_owned(),
        vec![
            "GOVERN: Policy configuration and access control".to_owned(),
            "MAP: Context-aware risk assessment".to_owned(),
            "MEASURE: Continuous risk scoring".to_owned(),
            "MANAGE: Real-time policy enforcement".to_owned(),
        ],
    );
    map
}

/// Generate a compliance report from a run's ordered event timeline.
///
/// Only DECISION events contribute to the metrics; chain validity covers
/// the whole timeline.
#[must_use]
pub fn generate_report(run_id: &RunId, events: &[Event]) -> ComplianceReport {
    let now = Utc::now();
    let metrics = calculate_metrics(events);
    let chain_valid = verify_chain(events).valid;

    ComplianceReport {
        report_id: format!("CR-{}-{}", run_id, now.format("%Y%m%d%H%M%S")),
        generated_at: now,
        run_id: run_id.clone(),
        period_start: events.first().map(|e| e.ts),
        period_end: events.last().map(|e| e.ts),
        metrics,
        chain_valid,
        framework_mapping: framework_mappings(),
    }
}

fn calculate_metrics(events: &[Event]) -> ComplianceMetrics {
    let mut metrics = ComplianceMetrics::default();
    let mut risk_sum = 0.0;

    for event in events {
        if event.event_type != EventType::Decision {
            continue;
        }
        let Some(governance) = event.payload.get("governance") else {
            continue;
        };
        metrics.total_decisions += 1;

        match governance.get("decision").and_then(Value::as_str) {
            Some("APPROVED") => metrics.approved += 1,
            Some("NEEDS_REVIEW") => metrics.needs_review += 1,
            _ => metrics.denied += 1,
        }

        let risk = governance
            .get("risk_score")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        risk_sum += risk;
        metrics.max_risk_score = metrics.max_risk_score.max(risk);

        if let Some(hits) = governance.get("policy_hits").and_then(Value::as_array) {
            for hit in hits.iter().filter_map(Value::as_str) {
                *metrics.violations_by_policy.entry(hit.to_owned()).or_insert(0) += 1;
            }
        }
    }

    if metrics.total_decisions > 0 {
        let total = metrics.total_decisions as f64;
        metrics.approval_rate = metrics.approved as f64 / total;
        metrics.avg_risk_score = risk_sum / total;
    }
    metrics
}
