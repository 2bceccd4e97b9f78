//! # Script Echo Platform
//!
//! Session and mini-game orchestration core for the Script Echo
//! role-playing platform.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  SCRIPT ECHO PLATFORM                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── money.rs    - Fixed-point currency and percentages      │
//! │  └── ids.rs      - Player and session identifiers            │
//! │                                                              │
//! │  game/           - Domain logic (synchronous)                │
//! │  ├── profile.rs  - Player identity and progression           │
//! │  ├── session.rs  - Session lifecycle and roster              │
//! │  ├── reward.rs   - Revenue split and mini-game rewards       │
//! │  └── registry.rs - Live session tracking                     │
//! │                                                              │
//! │  platform/       - Top-level mode switch                     │
//! │  ├── state.rs    - Platform state machine and events         │
//! │  └── surface.rs  - UI surface port                           │
//! │                                                              │
//! │  integration/    - Mini-game lifecycle (async)               │
//! │  ├── ports.rs    - Loader, mission and time ports            │
//! │  ├── timer.rs    - Cancellable deferred actions              │
//! │  ├── minigame.rs - Launch / pause / exit and settlement      │
//! │  └── local.rs    - In-process collaborators                  │
//! │                                                              │
//! │  config.rs       - Defaults and environment overrides        │
//! │  app.rs          - Composed platform service                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Money
//!
//! All currency is integer fixed-point (4 decimal places). Revenue splits
//! truncate the host and platform cuts and give the remainder to players,
//! so a split always sums exactly to its total.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod app;
pub mod config;
pub mod core;
pub mod game;
pub mod integration;
pub mod platform;

// Re-export commonly used types
pub use app::{Collaborators, Platform, PlatformError, PlatformStatus};
pub use config::{ConfigError, PlatformConfig};
pub use crate::core::ids::{PlayerId, SessionId};
pub use crate::core::money::{Money, Percent};
pub use game::profile::{PlayerProfile, SharedProfile};
pub use game::session::{GameSession, SessionConfig, SessionError, SessionStatus};
pub use integration::minigame::{IntegrationConfig, IntegrationEvent, MiniGameIntegration};
pub use platform::state::{PlatformEvent, PlatformState, PlatformStateMachine};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
