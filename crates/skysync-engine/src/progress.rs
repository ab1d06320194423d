//! Batch-scoped progress aggregation.
//!
//! The tracker is the only state mutated concurrently by multiple group
//! tasks. It cannot fail: lock poisoning is absorbed, and observer calls
//! happen outside the lock so a slow observer never blocks bookkeeping.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use skysync_core::Location;

/// Point-in-time view of a running batch, pushed to the observer after
/// every per-location start/finish event.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    /// Locations currently being processed, unordered.
    pub processing: Vec<Location>,
    pub completed: usize,
    pub total: usize,
}

/// Fire-and-forget progress sink. Implementations must not block.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, snapshot: ProgressSnapshot);

    /// Called exactly once per batch, however it ends. Used to dismiss any
    /// progress indicator.
    fn on_batch_finished(&self) {}
}

pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _snapshot: ProgressSnapshot) {}
}

struct ProgressState {
    processing: HashMap<String, Location>,
    completed: usize,
}

pub struct ProgressTracker {
    total: usize,
    state: Mutex<ProgressState>,
    observer: std::sync::Arc<dyn ProgressObserver>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(total: usize, observer: std::sync::Arc<dyn ProgressObserver>) -> Self {
        Self {
            total,
            state: Mutex::new(ProgressState {
                processing: HashMap::new(),
                completed: 0,
            }),
            observer,
        }
    }

    /// Records that `location` entered processing and pushes a snapshot.
    pub fn started(&self, location: &Location) {
        let snapshot = {
            let mut state = self
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state
                .processing
                .insert(location.formatted_id.clone(), location.clone());
            self.snapshot(&state)
        };
        self.observer.on_progress(snapshot);
    }

    /// Records that `location` finished processing (whatever the outcome)
    /// and pushes a snapshot.
    pub fn finished(&self, location: &Location) {
        let snapshot = {
            let mut state = self
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.processing.remove(&location.formatted_id);
            state.completed += 1;
            self.snapshot(&state)
        };
        self.observer.on_progress(snapshot);
    }

    /// Removes `location` from the in-flight set without counting it as
    /// completed. Used when a cancelled batch abandons in-flight work.
    pub fn abandoned(&self, location: &Location) {
        let snapshot = {
            let mut state = self
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.processing.remove(&location.formatted_id);
            self.snapshot(&state)
        };
        self.observer.on_progress(snapshot);
    }

    /// Signals the end of the batch to the observer.
    pub fn finish(&self) {
        self.observer.on_batch_finished();
    }

    fn snapshot(&self, state: &ProgressState) -> ProgressSnapshot {
        ProgressSnapshot {
            processing: state.processing.values().cloned().collect(),
            completed: state.completed,
            total: self.total,
        }
    }
}
