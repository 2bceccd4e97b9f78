//! Collaborator Ports
//!
//! Narrow boundary traits the mini-game integration drives. Scene loading,
//! mission tracking and engine time live on the other side of these.

use std::sync::Arc;
use futures_util::future::BoxFuture;
use tokio::sync::broadcast;

/// Play-area loading errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AreaError {
    /// No such play area.
    #[error("unknown play area: {0}")]
    UnknownArea(String),

    /// The loader gave up.
    #[error("play area {area} failed: {reason}")]
    Failed {
        /// Area being loaded or unloaded.
        area: String,
        /// Loader-provided reason.
        reason: String,
    },
}

/// Loads and unloads play areas asynchronously.
///
/// Completion is reported only through the returned future; the
/// integration never polls the loader.
pub trait PlayAreaLoader: Send + Sync {
    /// Load `area_id`. Resolves once the area is ready.
    fn load(&self, area_id: &str) -> BoxFuture<'static, Result<(), AreaError>>;

    /// Unload `area_id`. Resolves once the area is gone.
    fn unload(&self, area_id: &str) -> BoxFuture<'static, Result<(), AreaError>>;
}

/// One mission completion signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionCompleted {
    /// Mission name, for logs and profile bookkeeping.
    pub mission: String,
}

/// Mission progress inside a loaded play area.
pub trait MissionSource: Send + Sync {
    /// Targets left before the area counts as cleared.
    fn remaining_targets(&self) -> u32;

    /// Missions completed so far in this area.
    fn completed_missions(&self) -> u32;

    /// Subscribe to completion signals.
    fn subscribe(&self) -> broadcast::Receiver<MissionCompleted>;
}

/// Finds the mission source of a freshly loaded area.
pub trait MissionLocator: Send + Sync {
    /// `None` when the area has no mission source.
    fn locate(&self, area_id: &str) -> Option<Arc<dyn MissionSource>>;
}

/// Engine-wide time progression.
pub trait TimeControl: Send + Sync {
    /// 0.0 freezes game time, 1.0 is normal speed.
    fn set_time_scale(&self, scale: f32);
}
