//! Same-kind gating for refresh batches.
//!
//! An automatic batch is skipped while any other batch runs; a manual batch
//! refuses to start while another manual batch runs (but may run alongside
//! an automatic one, which the scheduler treats as preemptible). The guard
//! releases its slot on every exit path.

use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    Automatic,
    Manual,
}

impl std::fmt::Display for RefreshKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshKind::Automatic => write!(f, "automatic"),
            RefreshKind::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Default)]
struct GateState {
    automatic_running: bool,
    manual_running: bool,
}

#[derive(Debug, Default)]
pub struct RefreshGate {
    state: Mutex<GateState>,
}

impl RefreshGate {
    /// Tries to reserve a slot for a batch of `kind`. Returns `None` when
    /// the gating rules refuse it.
    pub fn try_begin(&self, kind: RefreshKind) -> Option<GateGuard<'_>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match kind {
            RefreshKind::Automatic => {
                if state.automatic_running || state.manual_running {
                    return None;
                }
                state.automatic_running = true;
            }
            RefreshKind::Manual => {
                if state.manual_running {
                    return None;
                }
                state.manual_running = true;
            }
        }
        Some(GateGuard { gate: self, kind })
    }

    fn end(&self, kind: RefreshKind) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match kind {
            RefreshKind::Automatic => state.automatic_running = false,
            RefreshKind::Manual => state.manual_running = false,
        }
    }
}

/// RAII slot reservation; dropping it ends the batch's occupancy.
#[derive(Debug)]
pub struct GateGuard<'a> {
    gate: &'a RefreshGate,
    kind: RefreshKind,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.end(self.kind);
    }
}
