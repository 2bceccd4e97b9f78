//! Platform State Machine
//!
//! Single-active-state switch across the platform's top-level modes. Owns
//! which UI surface is visible, the shared current-player reference, and
//! broadcasts every transition to subscribers.

use std::sync::Arc;
use parking_lot::Mutex;
use serde::{Serialize, Deserialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::core::ids::SessionId;
use crate::game::profile::SharedProfile;
use crate::platform::surface::SurfaceRegistry;

/// Platform-level mode. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlatformState {
    /// Landing screen.
    MainMenu,
    /// Role matching lobby.
    RoleMatching,
    /// Inside a game session.
    GameSession,
    /// Inside the embedded mini-game.
    MiniGame,
    /// Revenue share overview.
    RevenueShare,
}

/// Notifications published by the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// Active state changed to the payload.
    StateChanged(PlatformState),
    /// A mini-game area was requested.
    MiniGameLaunched {
        /// Play area to load.
        area_id: String,
    },
    /// The mini-game mode was left.
    MiniGameExited,
}

struct Inner {
    current: PlatformState,
    current_player: Option<SharedProfile>,
    current_session: Option<SessionId>,
}

/// The platform state machine.
///
/// Constructed once per process and shared by reference (`Arc`) with every
/// mode that needs to switch state or reach the current player.
pub struct PlatformStateMachine {
    inner: Mutex<Inner>,
    surfaces: Arc<dyn SurfaceRegistry>,
    event_tx: broadcast::Sender<PlatformEvent>,
}

impl PlatformStateMachine {
    /// Create a state machine resting in `MainMenu`.
    pub fn new(surfaces: Arc<dyn SurfaceRegistry>) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            inner: Mutex::new(Inner {
                current: PlatformState::MainMenu,
                current_player: None,
                current_session: None,
            }),
            surfaces,
            event_tx,
        }
    }

    /// Show the surface of the initial state.
    pub fn start(&self) {
        let current = self.inner.lock().current;
        self.surfaces.activate(current);
        info!("Platform started in {:?}", current);
    }

    /// Switch to `state`.
    ///
    /// No-op when already there. Otherwise hides the old surface, shows the
    /// new one and publishes `StateChanged`. Returns whether a switch happened.
    pub fn switch_to(&self, state: PlatformState) -> bool {
        let old = {
            let mut inner = self.inner.lock();
            if inner.current == state {
                return false;
            }
            let old = inner.current;
            self.surfaces.deactivate(old);
            inner.current = state;
            self.surfaces.activate(state);
            old
        };

        self.publish(PlatformEvent::StateChanged(state));
        info!("Platform state {:?} -> {:?}", old, state);
        true
    }

    /// Active state.
    pub fn current_state(&self) -> PlatformState {
        self.inner.lock().current
    }

    /// Set the player every mode reads and rewards.
    pub fn set_current_player(&self, profile: SharedProfile) {
        let name = profile.lock().display_name.clone();
        self.inner.lock().current_player = Some(profile);
        info!("Current player set to {}", name);
    }

    /// Shared handle to the current player, if any.
    pub fn current_player(&self) -> Option<SharedProfile> {
        self.inner.lock().current_player.clone()
    }

    /// Session the platform is currently showing.
    pub fn current_session(&self) -> Option<SessionId> {
        self.inner.lock().current_session
    }

    /// Subscribe to platform notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.event_tx.subscribe()
    }

    /// Enter the role matching lobby.
    pub fn start_role_matching(&self) {
        info!("Role matching started");
        self.switch_to(PlatformState::RoleMatching);
    }

    /// Show a game session.
    pub fn start_game_session(&self, session_id: SessionId) {
        self.inner.lock().current_session = Some(session_id);
        self.switch_to(PlatformState::GameSession);
        info!("Showing game session {}", session_id.short());
    }

    /// Open the revenue share overview.
    pub fn open_revenue_share(&self) {
        self.switch_to(PlatformState::RevenueShare);
    }

    /// Enter mini-game mode for `area_id`.
    pub fn enter_mini_game(&self, area_id: &str) {
        info!("Entering mini-game {}", area_id);
        self.switch_to(PlatformState::MiniGame);
        self.publish(PlatformEvent::MiniGameLaunched { area_id: area_id.to_string() });
    }

    /// Leave mini-game mode and return to the main menu.
    pub fn leave_mini_game(&self) {
        self.publish(PlatformEvent::MiniGameExited);
        self.switch_to(PlatformState::MainMenu);
    }

    /// Unlock an achievement on the current player.
    ///
    /// Returns false when there is no current player or it was already
    /// unlocked.
    pub fn unlock_achievement(&self, name: &str) -> bool {
        match self.current_player() {
            Some(profile) => profile.lock().unlock_achievement(name),
            None => {
                warn!("No current player, achievement {} dropped", name);
                false
            }
        }
    }

    fn publish(&self, event: PlatformEvent) {
        // No subscribers is fine.
        if self.event_tx.send(event).is_err() {
            debug!("Platform event had no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::profile::PlayerProfile;
    use crate::platform::surface::{RecordingSurfaces, SurfaceCall};

    fn machine() -> (PlatformStateMachine, Arc<RecordingSurfaces>) {
        let surfaces = Arc::new(RecordingSurfaces::new());
        let machine = PlatformStateMachine::new(surfaces.clone());
        machine.start();
        (machine, surfaces)
    }

    #[tokio::test]
    async fn test_switch_to_same_state_is_noop() {
        let (machine, surfaces) = machine();
        let mut rx = machine.subscribe();

        assert!(!machine.switch_to(PlatformState::MainMenu));
        assert_eq!(surfaces.calls(), vec![SurfaceCall::Activate(PlatformState::MainMenu)]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_switch_swaps_surfaces_and_notifies() {
        let (machine, surfaces) = machine();
        let mut rx = machine.subscribe();

        assert!(machine.switch_to(PlatformState::RoleMatching));
        assert_eq!(machine.current_state(), PlatformState::RoleMatching);
        assert_eq!(
            surfaces.calls()[1..],
            [
                SurfaceCall::Deactivate(PlatformState::MainMenu),
                SurfaceCall::Activate(PlatformState::RoleMatching),
            ]
        );
        assert_eq!(surfaces.active(), vec![PlatformState::RoleMatching]);
        assert_eq!(rx.recv().await.unwrap(), PlatformEvent::StateChanged(PlatformState::RoleMatching));
    }

    #[tokio::test]
    async fn test_exactly_one_surface_active() {
        let (machine, surfaces) = machine();
        for state in [
            PlatformState::RoleMatching,
            PlatformState::GameSession,
            PlatformState::MiniGame,
            PlatformState::RevenueShare,
            PlatformState::MainMenu,
        ] {
            machine.switch_to(state);
            assert_eq!(surfaces.active(), vec![state]);
        }
    }

    #[tokio::test]
    async fn test_mini_game_mode_events() {
        let (machine, _) = machine();
        let mut rx = machine.subscribe();

        machine.enter_mini_game("MainGameAR_ARDK");
        assert_eq!(rx.recv().await.unwrap(), PlatformEvent::StateChanged(PlatformState::MiniGame));
        assert_eq!(
            rx.recv().await.unwrap(),
            PlatformEvent::MiniGameLaunched { area_id: "MainGameAR_ARDK".into() }
        );

        machine.leave_mini_game();
        assert_eq!(rx.recv().await.unwrap(), PlatformEvent::MiniGameExited);
        assert_eq!(rx.recv().await.unwrap(), PlatformEvent::StateChanged(PlatformState::MainMenu));
    }

    #[tokio::test]
    async fn test_current_player_shared() {
        let (machine, _) = machine();
        assert!(machine.current_player().is_none());
        assert!(!machine.unlock_achievement("first_lap"));

        let profile = PlayerProfile::new("Ada").into_shared();
        machine.set_current_player(profile.clone());

        assert!(machine.unlock_achievement("first_lap"));
        assert!(profile.lock().achievements.contains("first_lap"));
    }

    #[tokio::test]
    async fn test_start_game_session_records_id() {
        let (machine, _) = machine();
        let id = SessionId::new([3; 16]);
        machine.start_game_session(id);
        assert_eq!(machine.current_session(), Some(id));
        assert_eq!(machine.current_state(), PlatformState::GameSession);
    }
}
