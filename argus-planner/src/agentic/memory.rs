use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use argus_core::{ActionProposal, Decision, GovernanceDecision, Intent, PolicyState};

/// Sliding window size. Old outcomes age out; the agent reasons over what
/// happened recently, not the whole run.
const MAX_ENTRIES: usize = 20;

/// Entries rendered into the prompt. The full window is kept for counting;
/// only the tail is worth the tokens.
const CONTEXT_ENTRIES: usize = 8;

/// One remembered outcome: what was proposed, what governance said, and
/// whether it executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub ts: DateTime<Utc>,
    pub intent: Intent,
    pub params: Value,
    pub decision: Decision,
    pub policy_hits: Vec<String>,
    pub reasons: Vec<String>,
    pub policy_state: PolicyState,
    pub was_executed: bool,
}

impl MemoryEntry {
    /// Capture a governed outcome.
    #[must_use]
    pub fn from_outcome(
        proposal: &ActionProposal,
        governance: &GovernanceDecision,
        was_executed: bool,
    ) -> Self {
        Self {
            ts: Utc::now(),
            intent: proposal.intent,
            params: proposal.params.clone(),
            decision: governance.decision,
            policy_hits: governance.policy_hits.clone(),
            reasons: governance.reasons.clone(),
            policy_state: governance.policy_state,
            was_executed,
        }
    }

    /// One-line rendering for the prompt.
    #[must_use]
    pub fn to_text(&self) -> String {
        let hits = if self.policy_hits.is_empty() {
            "none".to_owned()
        } else {
            self.policy_hits.join(", ")
        };
        let reasons = if self.reasons.is_empty() {
            "none".to_owned()
        } else {
            self.reasons.join("; ")
        };
        format!(
            "- Proposed {} {} -> {} (policies: {hits}). Reasons: {reasons}. Executed: {}.",
            self.intent, self.params, self.decision, self.was_executed
        )
    }

    fn is_denial(&self) -> bool {
        matches!(self.decision, Decision::Denied | Decision::NeedsReview)
    }
}

/// Sliding window of past decisions and outcomes.
#[derive(Debug, Default)]
pub struct AgentMemory {
    entries: Vec<MemoryEntry>,
}

impl AgentMemory {
    /// Append an outcome, evicting the oldest entries past the window.
    pub fn add(&mut self, entry: MemoryEntry) {
        self.entries.push(entry);
        if self.entries.len() > MAX_ENTRIES {
            let excess = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(..excess);
        }
    }

    /// Recent history rendered for the prompt.
    #[must_use]
    pub fn to_context(&self) -> String {
        if self.entries.is_empty() {
            return "No previous decisions.".to_owned();
        }
        let tail = self
            .entries
            .iter()
            .rev()
            .take(CONTEXT_ENTRIES)
            .collect::<Vec<_>>();
        let lines: Vec<String> = tail.into_iter().rev().map(MemoryEntry::to_text).collect();
        format!("Recent decision history:\n{}", lines.join("\n"))
    }

    /// How many of the last `last_n` outcomes were denied or escalated.
    #[must_use]
    pub fn denial_count(&self, last_n: usize) -> usize {
        self.entries
            .iter()
            .rev()
            .take(last_n)
            .filter(|e| e.is_denial())
            .count()
    }

    /// Reasons of the most recent denial, if any.
    #[must_use]
    pub fn last_denial_reasons(&self) -> Vec<String> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.is_denial())
            .map(|e| e.reasons.clone())
            .unwrap_or_default()
    }

    /// Memory state for inspection surfaces.
    #[must_use]
    pub fn summary(&self) -> Value {
        let recent: Vec<Value> = self
            .entries
            .iter()
            .rev()
            .take(10)
            .rev()
            .map(|e| {
                json!({
                    "intent": e.intent,
                    "params": &e.params,
                    "decision": e.decision,
                    "policy_hits": &e.policy_hits,
                    "executed": e.was_executed,
                })
            })
            .collect();
        json!({
            "total_entries": self.entries.len(),
            "recent_denials": self.denial_count(5),
            "entries": recent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(decision: Decision) -> MemoryEntry {
        MemoryEntry {
            ts: Utc::now(),
            intent: Intent::MoveTo,
            params: json!({"x": 1.0}),
            decision,
            policy_hits: vec![],
            reasons: vec!["r".to_owned()],
            policy_state: PolicyState::Safe,
            was_executed: decision == Decision::Approved,
        }
    }

    #[test]
    fn window_evicts_oldest() {
        let mut memory = AgentMemory::default();
        for _ in 0..25 {
            memory.add(entry(Decision::Approved));
        }
        assert_eq!(memory.summary()["total_entries"], 20);
    }

    #[test]
    fn denial_count_looks_at_tail_only() {
        let mut memory = AgentMemory::default();
        memory.add(entry(Decision::Denied));
        for _ in 0..5 {
            memory.add(entry(Decision::Approved));
        }
        assert_eq!(memory.denial_count(5), 0);

        memory.add(entry(Decision::NeedsReview));
        assert_eq!(memory.denial_count(5), 1);
    }

    #[test]
    fn context_caps_at_eight_lines() {
        let mut memory = AgentMemory::default();
        for _ in 0..12 {
            memory.add(entry(Decision::Approved));
        }
        let context = memory.to_context();
        assert_eq!(context.lines().count(), 9); // header + 8 entries
    }

    #[test]
    fn empty_memory_has_placeholder_context() {
        assert_eq!(AgentMemory::default().to_context(), "No previous decisions.");
    }

    #[test]
    fn last_denial_reasons_found() {
        let mut memory = AgentMemory::default();
        memory.add(entry(Decision::Denied));
        memory.add(entry(Decision::Approved));
        assert_eq!(memory.last_denial_reasons(), vec!["r".to_owned()]);
    }
}
