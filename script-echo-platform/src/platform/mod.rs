//! Platform Layer
//!
//! The platform-level mode switch and the UI surface port it drives.

pub mod state;
pub mod surface;

pub use state::{PlatformEvent, PlatformState, PlatformStateMachine};
pub use surface::{RecordingSurfaces, SurfaceCall, SurfaceRegistry};
