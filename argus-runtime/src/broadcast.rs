use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use argus_core::{RunId, StreamMessage};

/// Identifies one subscription for later removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberHandle {
    run_id: RunId,
    id: u64,
}

struct Subscriber {
    id: u64,
    tx: mpsc::Sender<StreamMessage>,
}

/// Per-run fan-out of telemetry, events, alerts, status and reasoning
/// frames.
///
/// Delivery is best-effort at-most-once: a full subscriber channel drops
/// the message for that subscriber only, and a closed subscriber is
/// removed on the next send. The subscriber map lock is held only for the
/// map update or snapshot; sends happen outside the critical section and
/// never exert back-pressure on the producer.
pub struct Broadcaster {
    subscribers: Mutex<HashMap<RunId, Vec<Subscriber>>>,
    capacity: usize,
    next_id: Mutex<u64>,
}

impl Broadcaster {
    /// Create a broadcaster with the given per-subscriber channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            next_id: Mutex::new(0),
        }
    }

    /// Register a subscriber for one run's frames.
    pub fn subscribe(&self, run_id: &RunId) -> (SubscriberHandle, mpsc::Receiver<StreamMessage>) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            *next
        };
        self.subscribers
            .lock()
            .entry(run_id.clone())
            .or_default()
            .push(Subscriber { id, tx });
        (
            SubscriberHandle {
                run_id: run_id.clone(),
                id,
            },
            rx,
        )
    }

    /// Remove a subscriber. Safe to call after the receiver was dropped.
    pub fn unsubscribe(&self, handle: &SubscriberHandle) {
        let mut map = self.subscribers.lock();
        if let Some(subs) = map.get_mut(&handle.run_id) {
            subs.retain(|s| s.id != handle.id);
            if subs.is_empty() {
                map.remove(&handle.run_id);
            }
        }
    }

    /// Number of live subscribers for a run.
    #[must_use]
    pub fn subscriber_count(&self, run_id: &RunId) -> usize {
        self.subscribers.lock().get(run_id).map_or(0, Vec::len)
    }

    /// Fan one message out to every live subscriber of a run.
    pub fn broadcast(&self, run_id: &RunId, message: &StreamMessage) {
        // Snapshot the senders inside the lock, deliver outside it.
        let senders: Vec<(u64, mpsc::Sender<StreamMessage>)> = {
            let map = self.subscribers.lock();
            match map.get(run_id) {
                Some(subs) => subs.iter().map(|s| (s.id, s.tx.clone())).collect(),
                None => return,
            }
        };

        let mut dead = Vec::new();
        for (id, tx) in senders {
            match tx.try_send(message.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // Slow sink: drop this message for this subscriber only.
                    debug!(run_id = %run_id, subscriber = id, "subscriber full, dropping frame");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => dead.push(id),
            }
        }

        if !dead.is_empty() {
            let mut map = self.subscribers.lock();
            if let Some(subs) = map.get_mut(run_id) {
                subs.retain(|s| !dead.contains(&s.id));
                if subs.is_empty() {
                    map.remove(run_id);
                }
            }
        }
    }
}
