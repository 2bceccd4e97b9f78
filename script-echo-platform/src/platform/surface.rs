//! UI Surface Port
//!
//! The platform never touches widgets. It only asks the host to activate or
//! deactivate the surface bound to a platform state.

use std::collections::BTreeSet;
use parking_lot::Mutex;

use crate::platform::state::PlatformState;

/// Host-provided mapping from platform state to an activatable surface.
///
/// Called while the state machine holds its lock; implementations must not
/// call back into it.
pub trait SurfaceRegistry: Send + Sync {
    /// Show the surface bound to `state`.
    fn activate(&self, state: PlatformState);

    /// Hide the surface bound to `state`.
    fn deactivate(&self, state: PlatformState);
}

/// One call made against a [`SurfaceRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCall {
    /// `activate(state)`
    Activate(PlatformState),
    /// `deactivate(state)`
    Deactivate(PlatformState),
}

/// In-process registry that records calls and tracks what is visible.
#[derive(Default)]
pub struct RecordingSurfaces {
    calls: Mutex<Vec<SurfaceCall>>,
    active: Mutex<BTreeSet<PlatformState>>,
}

impl RecordingSurfaces {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls so far, in order.
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().clone()
    }

    /// Surfaces currently shown.
    pub fn active(&self) -> Vec<PlatformState> {
        self.active.lock().iter().copied().collect()
    }
}

impl SurfaceRegistry for RecordingSurfaces {
    fn activate(&self, state: PlatformState) {
        self.calls.lock().push(SurfaceCall::Activate(state));
        self.active.lock().insert(state);
    }

    fn deactivate(&self, state: PlatformState) {
        self.calls.lock().push(SurfaceCall::Deactivate(state));
        self.active.lock().remove(&state);
    }
}
