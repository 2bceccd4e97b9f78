//! Core deterministic primitives.
//!
//! Integer-only currency math and identifiers shared by every layer.

pub mod ids;
pub mod money;

// Re-export core types
pub use ids::{PlayerId, SessionId};
pub use money::{Money, Percent, MONEY_SCALE};
