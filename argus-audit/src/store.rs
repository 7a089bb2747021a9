use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DurationRound, TimeDelta, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use argus_core::{EventId, RunId, ZERO_HASH};

use crate::error::AuditError;
use crate::record::{compute_hash, Event, EventType};

/// Storage backend for the event chain.
///
/// Backends store and retrieve events verbatim; linkage is the
/// [`EventChain`] writer's job. Implementations must be `Send + Sync`.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist one event. The event arrives fully linked and hashed.
    async fn insert(&self, event: Event) -> Result<(), AuditError>;

    /// The most recent event of a run (by `ts`, then insertion order).
    async fn last(&self, run_id: &RunId) -> Result<Option<Event>, AuditError>;

    /// Events of a run ordered by `ts` ascending.
    async fn list(
        &self,
        run_id: &RunId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Event>, AuditError>;

    /// Remove every event of a run (run deletion cascades to its chain).
    /// Returns the number of events removed.
    async fn delete_run(&self, run_id: &RunId) -> Result<u64, AuditError>;
}

/// The chain writer: appends events with `prev_hash` linkage.
///
/// Reading the chain tip and inserting the new event must not interleave
/// for the same run, and the memory backend is not transactional, so the
/// writer guards both steps with a per-run async mutex. The run controller
/// is the single logical writer per run; this guard keeps the invariant
/// even if that contract is ever violated. Appends for different runs
/// proceed in parallel.
pub struct EventChain {
    inner: Arc<dyn EventStore>,
    guards: DashMap<RunId, Arc<Mutex<()>>>,
}

impl EventChain {
    /// Create a chain writer over the given backend.
    #[must_use]
    pub fn new(inner: Arc<dyn EventStore>) -> Self {
        Self {
            inner,
            guards: DashMap::new(),
        }
    }

    /// Append one event to a run's chain.
    ///
    /// A single timestamp (truncated to microseconds) is used both inside
    /// the hash input and in the stored row, so verification can re-derive
    /// the hash from the row alone.
    pub async fn append(
        &self,
        run_id: &RunId,
        event_type: EventType,
        payload: Value,
    ) -> Result<Event, AuditError> {
        let guard = self
            .guards
            .entry(run_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _linked = guard.lock().await;

        let prev_hash = self
            .inner
            .last(run_id)
            .await?
            .map_or_else(|| ZERO_HASH.to_owned(), |e| e.hash);

        let ts = Utc::now()
            .duration_trunc(TimeDelta::microseconds(1))
            .map_err(|e| AuditError::Serialization(e.to_string()))?;
        let hash = compute_hash(run_id, ts, event_type, &payload, &prev_hash);

        let event = Event {
            id: EventId::generate(),
            run_id: run_id.clone(),
            ts,
            event_type,
            payload,
            prev_hash,
            hash,
        };
        self.inner.insert(event.clone()).await?;
        debug!(run_id = %run_id, event_type = %event_type, "event appended");
        Ok(event)
    }

    /// Events of a run ordered by `ts` ascending.
    pub async fn list(
        &self,
        run_id: &RunId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Event>, AuditError> {
        self.inner.list(run_id, limit, offset).await
    }

    /// The full chain of a run, oldest first.
    pub async fn full_chain(&self, run_id: &RunId) -> Result<Vec<Event>, AuditError> {
        self.inner.list(run_id, usize::MAX, 0).await
    }

    /// Drop the chain of a deleted run, including its append guard.
    pub async fn delete_run(&self, run_id: &RunId) -> Result<u64, AuditError> {
        let removed = self.inner.delete_run(run_id).await?;
        self.guards.remove(run_id);
        Ok(removed)
    }
}
