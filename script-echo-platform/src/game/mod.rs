//! Game Logic Module
//!
//! Synchronous domain logic. No timers and no I/O; the async layers call in.
//!
//! ## Module Structure
//!
//! - `profile`: Player identity and progression
//! - `session`: Game session lifecycle and roster
//! - `reward`: Revenue split and mini-game reward arithmetic
//! - `registry`: Live session tracking

pub mod profile;
pub mod registry;
pub mod reward;
pub mod session;

// Re-export key types
pub use profile::{PlayerProfile, SharedProfile, RoleType, PlayStyle, PaymentMethod, level_for_experience};
pub use registry::SessionRegistry;
pub use reward::{RevenueSplit, MiniGameReward, settle_session_revenue, mini_game_reward};
pub use session::{GameSession, SessionConfig, SessionError, SessionPlayer, SessionStatus};
