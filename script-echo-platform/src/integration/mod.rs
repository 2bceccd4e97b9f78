//! Mini-game integration layer.
//!
//! - `ports`: boundary traits for area loading, missions and time
//! - `timer`: cancellable deferred actions
//! - `minigame`: launch / pause / exit lifecycle and reward settlement
//! - `local`: in-process collaborators

pub mod local;
pub mod minigame;
pub mod ports;
pub mod timer;

pub use minigame::{
    ExitReason, ExitReport, IntegrationConfig, IntegrationEvent, IntegrationPhase,
    MiniGameIntegration, MiniGameStats, PlatformLink,
};
pub use ports::{AreaError, MissionCompleted, MissionLocator, MissionSource, PlayAreaLoader, TimeControl};
pub use timer::DeferredAction;
