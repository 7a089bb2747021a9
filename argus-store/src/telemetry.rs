use async_trait::async_trait;

use argus_core::{RunId, TelemetrySample};

use crate::error::StoreError;

/// Append-only storage for raw telemetry samples, keyed by run.
///
/// Samples are not hash-linked; they exist for replay and analysis. High
/// rates belong in object storage, but an in-process backend is fine for
/// development scale.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Append one sample.
    async fn add_sample(&self, sample: TelemetrySample) -> Result<(), StoreError>;

    /// Samples of a run ordered by `ts` ascending.
    async fn list(
        &self,
        run_id: &RunId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TelemetrySample>, StoreError>;

    /// Remove every sample of a run. Returns the number removed.
    async fn delete_run(&self, run_id: &RunId) -> Result<u64, StoreError>;
}
