use async_trait::async_trait;
use dashmap::DashMap;

use argus_core::{RunId, TelemetrySample};
use argus_store::{StoreError, TelemetryStore};

/// In-memory telemetry sample store using `DashMap`, keyed by run.
pub struct MemoryTelemetryStore {
    samples: DashMap<RunId, Vec<TelemetrySample>>,
}

impl MemoryTelemetryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            samples: DashMap::new(),
        }
    }
}

impl Default for MemoryTelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelemetryStore for MemoryTelemetryStore {
    async fn add_sample(&self, sample: TelemetrySample) -> Result<(), StoreError> {
        self.samples
            .entry(sample.run_id.clone())
            .or_default()
            .push(sample);
        Ok(())
    }

    async fn list(
        &self,
        run_id: &RunId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TelemetrySample>, StoreError> {
        let Some(samples) = self.samples.get(run_id) else {
            return Ok(Vec::new());
        };
        Ok(samples.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn delete_run(&self, run_id: &RunId) -> Result<u64, StoreError> {
        Ok(self
            .samples
            .remove(run_id)
            .map_or(0, |(_, samples)| samples.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn sample(run_id: &RunId, n: i64) -> TelemetrySample {
        TelemetrySample {
            run_id: run_id.clone(),
            ts: Utc::now(),
            payload: json!({"n": n}),
        }
    }

    #[tokio::test]
    async fn samples_keep_append_order() {
        let store = MemoryTelemetryStore::new();
        let run = RunId::new("run_t");
        for n in 0..4 {
            store.add_sample(sample(&run, n)).await.unwrap();
        }
        let page = store.list(&run, 2, 1).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].payload["n"], 1);
    }

    #[tokio::test]
    async fn delete_run_reports_count() {
        let store = MemoryTelemetryStore::new();
        let run = RunId::new("run_t2");
        store.add_sample(sample(&run, 0)).await.unwrap();
        store.add_sample(sample(&run, 1)).await.unwrap();
        assert_eq!(store.delete_run(&run).await.unwrap(), 2);
        assert!(store.list(&run, 10, 0).await.unwrap().is_empty());
    }
}
