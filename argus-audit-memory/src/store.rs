use async_trait::async_trait;
use dashmap::DashMap;

use argus_audit::{AuditError, Event, EventStore};
use argus_core::RunId;

/// In-memory event store using `DashMap`, keyed by run.
///
/// Events per run are kept in append order, which matches `ts` order
/// because appends within one run are serialized by the chain writer.
pub struct MemoryEventStore {
    chains: DashMap<RunId, Vec<Event>>,
}

impl MemoryEventStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chains: DashMap::new(),
        }
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, event: Event) -> Result<(), AuditError> {
        self.chains
            .entry(event.run_id.clone())
            .or_default()
            .push(event);
        Ok(())
    }

    async fn last(&self, run_id: &RunId) -> Result<Option<Event>, AuditError> {
        Ok(self
            .chains
            .get(run_id)
            .and_then(|chain| chain.last().cloned()))
    }

    async fn list(
        &self,
        run_id: &RunId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Event>, AuditError> {
        let Some(chain) = self.chains.get(run_id) else {
            return Ok(Vec::new());
        };
        Ok(chain.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn delete_run(&self, run_id: &RunId) -> Result<u64, AuditError> {
        Ok(self
            .chains
            .remove(run_id)
            .map_or(0, |(_, chain)| chain.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use argus_audit::{verify_chain, EventChain, EventType};
    use argus_core::ZERO_HASH;
    use serde_json::json;

    use super::*;

    fn chain() -> EventChain {
        EventChain::new(Arc::new(MemoryEventStore::new()))
    }

    #[tokio::test]
    async fn first_event_links_to_zero_hash() {
        let chain = chain();
        let run = RunId::new("run_m1");
        let event = chain
            .append(&run, EventType::Decision, json!({"n": 1}))
            .await
            .unwrap();
        assert_eq!(event.prev_hash, ZERO_HASH);
        assert_eq!(event.hash, event.derive_hash());
    }

    #[tokio::test]
    async fn appends_link_and_verify() {
        let chain = chain();
        let run = RunId::new("run_m2");
        let first = chain
            .append(&run, EventType::Decision, json!({"n": 1}))
            .await
            .unwrap();
        let second = chain
            .append(&run, EventType::Execution, json!({"n": 2}))
            .await
            .unwrap();
        assert_eq!(second.prev_hash, first.hash);

        let events = chain.full_chain(&run).await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(verify_chain(&events).valid);
    }

    #[tokio::test]
    async fn runs_have_independent_chains() {
        let chain = chain();
        let run_a = RunId::new("run_a");
        let run_b = RunId::new("run_b");
        chain
            .append(&run_a, EventType::Alert, json!({}))
            .await
            .unwrap();
        let b = chain
            .append(&run_b, EventType::Alert, json!({}))
            .await
            .unwrap();
        assert_eq!(b.prev_hash, ZERO_HASH);
    }

    #[tokio::test]
    async fn concurrent_appends_keep_linkage() {
        let chain = Arc::new(chain());
        let run = RunId::new("run_m3");
        let mut handles = Vec::new();
        for i in 0..16 {
            let chain = Arc::clone(&chain);
            let run = run.clone();
            handles.push(tokio::spawn(async move {
                chain
                    .append(&run, EventType::Telemetry, json!({"i": i}))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let events = chain.full_chain(&run).await.unwrap();
        assert_eq!(events.len(), 16);
        assert!(verify_chain(&events).valid);
    }

    #[tokio::test]
    async fn list_paginates_in_order() {
        let chain = chain();
        let run = RunId::new("run_m4");
        for i in 0..5 {
            chain
                .append(&run, EventType::Telemetry, json!({"i": i}))
                .await
                .unwrap();
        }
        let page = chain.list(&run, 2, 1).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].payload["i"], 1);
        assert_eq!(page[1].payload["i"], 2);
    }

    #[tokio::test]
    async fn delete_run_drops_chain() {
        let chain = chain();
        let run = RunId::new("run_m5");
        chain
            .append(&run, EventType::Alert, json!({}))
            .await
            .unwrap();
        assert_eq!(chain.delete_run(&run).await.unwrap(), 1);
        assert!(chain.full_chain(&run).await.unwrap().is_empty());
    }
}
