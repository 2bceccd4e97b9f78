//! Platform Service
//!
//! Composes the state machine, session registry and mini-game integration
//! into one process-wide service. Collaborators are injected explicitly;
//! there is no global instance.
//!
//! ```text
//!  bootstrap ──▶ MainMenu ──host_session──▶ GameSession ──finish──▶ RevenueShare
//!                   │  ▲
//!   launch_mini_game│  │exit / timeout / completion
//!                   ▼  │
//!                 MiniGame
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use parking_lot::Mutex;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PlatformConfig;
use crate::core::ids::{PlayerId, SessionId};
use crate::game::profile::{PlayStyle, PlayerProfile, RoleType, SharedProfile};
use crate::game::registry::SessionRegistry;
use crate::game::reward::RevenueSplit;
use crate::game::session::SessionError;
use crate::integration::minigame::{ExitReport, MiniGameIntegration, PlatformLink};
use crate::integration::ports::{MissionLocator, PlayAreaLoader, TimeControl};
use crate::platform::state::{PlatformState, PlatformStateMachine};
use crate::platform::surface::SurfaceRegistry;

/// Platform service errors.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// `bootstrap` has not run.
    #[error("platform not initialized")]
    NotInitialized,

    /// Mini-games are switched off in the config.
    #[error("mini-game integration disabled")]
    MiniGameDisabled,

    /// A mini-game is already launching or running.
    #[error("mini-game already running")]
    MiniGameBusy,

    /// The operation needs a current player.
    #[error("no current player")]
    NoCurrentPlayer,

    /// Session rejected the operation.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Host-side collaborators.
pub struct Collaborators {
    /// UI surfaces per platform state.
    pub surfaces: Arc<dyn SurfaceRegistry>,
    /// Play-area loading.
    pub loader: Arc<dyn PlayAreaLoader>,
    /// Mission source lookup.
    pub locator: Arc<dyn MissionLocator>,
    /// Engine time.
    pub time: Arc<dyn TimeControl>,
}

/// Coarse platform status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStatus {
    /// `bootstrap` ran and `shutdown` has not.
    pub initialized: bool,
    /// Mini-game integration follows platform requests.
    pub mini_game_enabled: bool,
    /// Periodic snapshots on.
    pub auto_save_enabled: bool,
    /// Active platform state.
    pub current_state: PlatformState,
}

/// The composed platform.
pub struct Platform {
    config: PlatformConfig,
    state: Arc<PlatformStateMachine>,
    sessions: Arc<SessionRegistry>,
    integration: MiniGameIntegration,
    link: Mutex<Option<PlatformLink>>,
    initialized: AtomicBool,
}

impl Platform {
    /// Wire the platform. Nothing is shown until `bootstrap`.
    pub fn new(config: PlatformConfig, collaborators: Collaborators) -> Self {
        let state = Arc::new(PlatformStateMachine::new(collaborators.surfaces));
        let integration = MiniGameIntegration::new(
            config.integration.clone(),
            state.clone(),
            collaborators.loader,
            collaborators.locator,
            collaborators.time,
        );

        Self {
            config,
            state,
            sessions: Arc::new(SessionRegistry::new()),
            integration,
            link: Mutex::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    /// Show the main menu, ensure a current player, and attach the
    /// mini-game integration. Must run inside a tokio runtime.
    pub fn bootstrap(&self) -> SharedProfile {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("Platform already initialized");
        } else {
            self.state.start();
        }

        let player = match self.state.current_player() {
            Some(player) => player,
            None => {
                let player = self.default_player().into_shared();
                self.state.set_current_player(player.clone());
                info!("Default player created: {}", self.config.default_player_name);
                player
            }
        };

        if self.config.mini_game_enabled {
            let mut link = self.link.lock();
            if link.is_none() {
                *link = Some(self.integration.attach_to_platform());
            }
        }

        player
    }

    fn default_player(&self) -> PlayerProfile {
        let mut player = PlayerProfile::new(self.config.default_player_name.clone());
        player.play_style = PlayStyle::Casual;
        player.preferred_roles = vec![RoleType::Detective, RoleType::Witness];
        player
    }

    /// Platform configuration.
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// The state machine.
    pub fn state(&self) -> &Arc<PlatformStateMachine> {
        &self.state
    }

    /// Live sessions.
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// The mini-game integration.
    pub fn integration(&self) -> &MiniGameIntegration {
        &self.integration
    }

    /// Coarse status.
    pub fn status(&self) -> PlatformStatus {
        PlatformStatus {
            initialized: self.initialized.load(Ordering::SeqCst),
            mini_game_enabled: self.config.mini_game_enabled,
            auto_save_enabled: self.config.auto_save,
            current_state: self.state.current_state(),
        }
    }

    // =========================================================================
    // MINI-GAME
    // =========================================================================

    /// Request a mini-game launch (default area if `None`).
    ///
    /// The run is registered before this returns, so an immediate
    /// `exit_mini_game` settles it. The platform then switches to
    /// `MiniGame`; loading completes asynchronously, watch
    /// `integration().subscribe()` for readiness.
    pub fn launch_mini_game(&self, area_id: Option<&str>) -> Result<(), PlatformError> {
        if !self.config.mini_game_enabled {
            return Err(PlatformError::MiniGameDisabled);
        }
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(PlatformError::NotInitialized);
        }

        let area = area_id.unwrap_or(&self.config.integration.default_area);
        if !self.integration.launch(Some(area)) {
            warn!("Mini-game launch of {} requested while one is running", area);
            return Err(PlatformError::MiniGameBusy);
        }
        self.state.switch_to(PlatformState::MiniGame);
        Ok(())
    }

    /// Leave the mini-game.
    ///
    /// Settles rewards when a run was in progress. Always ends back in the
    /// main menu, also after a failed load.
    pub fn exit_mini_game(&self) -> Option<ExitReport> {
        let report = self.integration.exit();
        if report.is_none() && self.state.current_state() == PlatformState::MiniGame {
            self.state.switch_to(PlatformState::MainMenu);
        }
        report
    }

    // =========================================================================
    // SESSIONS
    // =========================================================================

    /// Host a session with the current player seated first.
    pub async fn host_session(&self, name: &str, script_name: &str) -> Result<SessionId, PlatformError> {
        let host = self.state.current_player().ok_or(PlatformError::NoCurrentPlayer)?;
        let host = host.lock().clone();
        let role = host.preferred_roles.first().copied().unwrap_or(RoleType::Detective);

        let id = self
            .sessions
            .create_session(name, script_name, host.id, self.config.session.clone())
            .await?;
        if let Err(e) = self.seat(id, &host, role).await {
            self.sessions.remove_session(&id).await;
            return Err(e);
        }

        self.state.start_game_session(id);
        Ok(id)
    }

    /// Seat `profile` in a session.
    pub async fn join_session(
        &self,
        session_id: SessionId,
        profile: &PlayerProfile,
        role: RoleType,
    ) -> Result<(), PlatformError> {
        self.seat(session_id, profile, role).await
    }

    async fn seat(&self, session_id: SessionId, profile: &PlayerProfile, role: RoleType) -> Result<(), PlatformError> {
        let session = self.sessions.get_session(&session_id).await.ok_or(SessionError::SessionNotFound)?;
        session.write().await.add_player(profile, role)?;
        if let Err(e) = self.sessions.register_player(profile.id, session_id).await {
            session.write().await.remove_player(&profile.id);
            return Err(e.into());
        }
        Ok(())
    }

    /// End a session, settle it and open the revenue overview.
    pub async fn finish_session(&self, session_id: SessionId) -> Result<RevenueSplit, PlatformError> {
        let session = self.sessions.get_session(&session_id).await.ok_or(SessionError::SessionNotFound)?;
        let (split, seated) = {
            let mut session = session.write().await;
            let split = session.end_session();
            let seated: Vec<PlayerId> = session.players().iter().map(|p| p.player_id).collect();
            (split, seated)
        };

        if let Some(player) = self.state.current_player() {
            let mut player = player.lock();
            if seated.contains(&player.id) {
                player.games_played += 1;
            }
        }

        self.state.open_revenue_share();
        Ok(split)
    }

    // =========================================================================
    // SNAPSHOTS / SHUTDOWN
    // =========================================================================

    /// Copy of the current player for persistence.
    pub fn snapshot_player(&self) -> Option<PlayerProfile> {
        self.state.current_player().map(|p| p.lock().clone())
    }

    /// Periodically snapshot the current player onto a channel.
    ///
    /// `None` when auto-save is off. The task stops once the receiver is
    /// dropped.
    pub fn spawn_auto_save(&self) -> Option<(JoinHandle<()>, mpsc::Receiver<PlayerProfile>)> {
        if !self.config.auto_save {
            return None;
        }

        let (tx, rx) = mpsc::channel(4);
        let state = self.state.clone();
        let period = self.config.auto_save_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // First tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(player) = state.current_player() else {
                    continue;
                };
                let snapshot = player.lock().clone();
                debug!("Auto-saving {}", snapshot.display_name);
                if tx.send(snapshot).await.is_err() {
                    break;
                }
            }
        });

        Some((handle, rx))
    }

    /// Abort any mini-game, detach from platform requests and return the
    /// final player snapshot.
    pub fn shutdown(&self) -> Option<PlayerProfile> {
        info!("Shutting down platform");
        self.integration.force_exit();
        if let Some(link) = self.link.lock().take() {
            link.detach();
        }
        self.initialized.store(false, Ordering::SeqCst);

        let snapshot = self.snapshot_player();
        if let Some(player) = &snapshot {
            info!(
                "Saved player {} - level {}, earnings {}, missions {}",
                player.display_name,
                player.level(),
                player.total_earnings,
                player.completed_missions
            );
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::core::money::Money;
    use crate::game::session::SessionStatus;
    use crate::integration::local::{InstantLoader, RecordingTimeControl, ScriptedMission, StaticLocator};
    use crate::integration::minigame::{ExitReason, IntegrationEvent, IntegrationPhase};
    use crate::platform::surface::RecordingSurfaces;

    fn platform_with(config: PlatformConfig, loader: InstantLoader) -> (Platform, Arc<InstantLoader>) {
        let loader = Arc::new(loader);
        let platform = Platform::new(
            config,
            Collaborators {
                surfaces: Arc::new(RecordingSurfaces::new()),
                loader: loader.clone(),
                locator: Arc::new(StaticLocator::with_source(Arc::new(ScriptedMission::new(3)))),
                time: Arc::new(RecordingTimeControl::new()),
            },
        );
        (platform, loader)
    }

    fn platform() -> Platform {
        platform_with(PlatformConfig::default(), InstantLoader::new()).0
    }

    async fn wait_for<F>(rx: &mut tokio::sync::broadcast::Receiver<IntegrationEvent>, pred: F)
    where
        F: Fn(&IntegrationEvent) -> bool,
    {
        loop {
            if pred(&rx.recv().await.unwrap()) {
                return;
            }
        }
    }

    #[tokio::test]
    async fn test_bootstrap_creates_default_player() {
        let platform = platform();
        assert!(!platform.status().initialized);

        let player = platform.bootstrap();
        {
            let player = player.lock();
            assert_eq!(player.display_name, "New Player");
            assert_eq!(player.level(), 1);
            assert_eq!(player.preferred_roles, vec![RoleType::Detective, RoleType::Witness]);
        }

        let status = platform.status();
        assert!(status.initialized);
        assert_eq!(status.current_state, PlatformState::MainMenu);
    }

    #[tokio::test]
    async fn test_bootstrap_keeps_existing_player() {
        let platform = platform();
        let existing = PlayerProfile::new("Ada").into_shared();
        platform.state().set_current_player(existing.clone());

        let player = platform.bootstrap();
        assert!(Arc::ptr_eq(&player, &existing));
    }

    #[tokio::test]
    async fn test_launch_requires_bootstrap() {
        let platform = platform();
        assert!(matches!(platform.launch_mini_game(None), Err(PlatformError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_launch_disabled() {
        let config = PlatformConfig { mini_game_enabled: false, ..Default::default() };
        let (platform, _) = platform_with(config, InstantLoader::new());
        platform.bootstrap();
        assert!(matches!(platform.launch_mini_game(None), Err(PlatformError::MiniGameDisabled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mini_game_round_trip() {
        let (platform, loader) = platform_with(PlatformConfig::default(), InstantLoader::new());
        let player = platform.bootstrap();
        let mut events = platform.integration().subscribe();

        platform.launch_mini_game(None).unwrap();
        assert_eq!(platform.state().current_state(), PlatformState::MiniGame);
        wait_for(&mut events, |e| matches!(e, IntegrationEvent::AreaReady { .. })).await;
        assert!(matches!(platform.launch_mini_game(None), Err(PlatformError::MiniGameBusy)));

        tokio::time::sleep(Duration::from_secs(60)).await;
        let report = platform.exit_mini_game().unwrap();

        assert_eq!(report.reward.unwrap().total_exp, 110);
        assert_eq!(player.lock().experience(), 110);
        assert_eq!(player.lock().total_earnings, Money::from_int(10));
        assert_eq!(platform.state().current_state(), PlatformState::MainMenu);
        assert_eq!(loader.unloads().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_right_after_launch_settles_once() {
        let (platform, loader) = platform_with(PlatformConfig::default(), InstantLoader::new());
        let player = platform.bootstrap();

        platform.launch_mini_game(None).unwrap();
        let report = platform.exit_mini_game().expect("run settles on immediate exit");
        assert_eq!(report.reason, ExitReason::Manual);
        assert_eq!(platform.state().current_state(), PlatformState::MainMenu);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(player.lock().mini_games_played, 1);
        assert_eq!(player.lock().experience(), 100);
        assert_eq!(platform.integration().phase(), IntegrationPhase::Idle);
        assert_eq!(platform.state().current_state(), PlatformState::MainMenu);
        assert_eq!(loader.loads().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_launch_is_busy() {
        let (platform, loader) = platform_with(PlatformConfig::default(), InstantLoader::new());
        platform.bootstrap();

        platform.launch_mini_game(Some("Attic")).unwrap();
        assert!(matches!(platform.launch_mini_game(Some("Cellar")), Err(PlatformError::MiniGameBusy)));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(loader.loads(), vec!["Attic".to_string()]);
        assert!(platform.integration().is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_after_failed_load_returns_to_menu() {
        let (platform, _) = platform_with(PlatformConfig::default(), InstantLoader::failing());
        platform.bootstrap();
        let mut events = platform.integration().subscribe();

        platform.launch_mini_game(Some("Broken")).unwrap();
        wait_for(&mut events, |e| matches!(e, IntegrationEvent::LoadFailed { .. })).await;
        assert_eq!(platform.state().current_state(), PlatformState::MiniGame);

        assert!(platform.exit_mini_game().is_none());
        assert_eq!(platform.state().current_state(), PlatformState::MainMenu);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_area_fails_load() {
        let loader = InstantLoader::new().restricted_to(&["MainGameAR_ARDK"]);
        let (platform, _) = platform_with(PlatformConfig::default(), loader);
        let player = platform.bootstrap();
        let mut events = platform.integration().subscribe();

        platform.launch_mini_game(Some("Lighthouse")).unwrap();
        wait_for(&mut events, |e| {
            matches!(e, IntegrationEvent::LoadFailed { reason, .. } if reason.contains("unknown play area"))
        })
        .await;
        assert!(!platform.integration().is_active());
        assert_eq!(player.lock().mini_games_played, 0);

        assert!(platform.exit_mini_game().is_none());
        assert_eq!(platform.state().current_state(), PlatformState::MainMenu);

        // The relaunch must not be torn down by the earlier exit.
        platform.launch_mini_game(None).unwrap();
        wait_for(&mut events, |e| matches!(e, IntegrationEvent::AreaReady { .. })).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(platform.integration().is_active());
        assert_eq!(platform.state().current_state(), PlatformState::MiniGame);
        assert_eq!(player.lock().mini_games_played, 0);
    }

    #[tokio::test]
    async fn test_host_and_finish_session() {
        let platform = platform();
        let host = platform.bootstrap();

        let id = platform.host_session("Midnight Manor", "manor_v1").await.unwrap();
        assert_eq!(platform.state().current_state(), PlatformState::GameSession);
        assert_eq!(platform.state().current_session(), Some(id));

        let guest = PlayerProfile::new("Grace");
        platform.join_session(id, &guest, RoleType::Suspect).await.unwrap();
        assert!(platform.sessions().get_player_session(&guest.id).await.is_some());

        let session = platform.sessions().get_session(&id).await.unwrap();
        {
            let mut session = session.write().await;
            assert_eq!(session.player_count(), 2);
            assert_eq!(session.player(&host.lock().id).unwrap().role, RoleType::Detective);
            let ids: Vec<PlayerId> = session.players().iter().map(|p| p.player_id).collect();
            for pid in &ids {
                session.set_player_ready(pid, true);
            }
            session.start_session().unwrap();
        }

        let split = platform.finish_session(id).await.unwrap();
        assert_eq!(split.total, Money::from_int(100));
        assert_eq!(split.host, Money::from_int(20));
        assert_eq!(session.read().await.status(), SessionStatus::Completed);
        assert_eq!(host.lock().games_played, 1);
        assert_eq!(platform.state().current_state(), PlatformState::RevenueShare);
    }

    #[tokio::test]
    async fn test_player_cannot_sit_in_two_sessions() {
        let platform = platform();
        platform.bootstrap();
        let first = platform.host_session("Midnight Manor", "manor_v1").await.unwrap();

        let err = platform.host_session("Second Manor", "manor_v1").await.unwrap_err();
        assert!(matches!(err, PlatformError::Session(SessionError::AlreadyInSession)));
        assert_eq!(platform.sessions().session_count().await, 1);

        let other_host = PlayerProfile::new("Hugo");
        let other = platform
            .sessions()
            .create_session("Lighthouse", "light_v1", other_host.id, platform.config().session.clone())
            .await
            .unwrap();
        let guest = PlayerProfile::new("Grace");
        platform.join_session(first, &guest, RoleType::Suspect).await.unwrap();

        let err = platform.join_session(other, &guest, RoleType::Witness).await.unwrap_err();
        assert!(matches!(err, PlatformError::Session(SessionError::AlreadyInSession)));
        let other = platform.sessions().get_session(&other).await.unwrap();
        assert!(other.read().await.player(&guest.id).is_none());
        let mapped = platform.sessions().get_player_session(&guest.id).await.unwrap();
        assert_eq!(mapped.read().await.id, first);
    }

    #[tokio::test]
    async fn test_host_session_needs_player() {
        let platform = platform();
        let err = platform.host_session("Empty", "none").await.unwrap_err();
        assert!(matches!(err, PlatformError::NoCurrentPlayer));
    }

    #[tokio::test]
    async fn test_join_unknown_session() {
        let platform = platform();
        platform.bootstrap();
        let err = platform
            .join_session(SessionId::new([9; 16]), &PlayerProfile::new("Ghost"), RoleType::Neutral)
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Session(SessionError::SessionNotFound)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_save_snapshots() {
        let platform = platform();
        let player = platform.bootstrap();
        let (handle, mut rx) = platform.spawn_auto_save().unwrap();

        player.lock().add_experience(30);
        let first = rx.recv().await.unwrap();
        assert_eq!(first.experience(), 30);

        player.lock().add_experience(20);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.experience(), 50);

        drop(rx);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_auto_save_disabled() {
        let config = PlatformConfig { auto_save: false, ..Default::default() };
        let (platform, _) = platform_with(config, InstantLoader::new());
        assert!(platform.spawn_auto_save().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_and_snapshots() {
        let (platform, loader) = platform_with(PlatformConfig::default(), InstantLoader::new());
        let player = platform.bootstrap();
        let mut events = platform.integration().subscribe();
        platform.launch_mini_game(None).unwrap();
        wait_for(&mut events, |e| matches!(e, IntegrationEvent::AreaReady { .. })).await;

        let snapshot = platform.shutdown().unwrap();
        assert_eq!(snapshot.id, player.lock().id);
        assert_eq!(snapshot.mini_games_played, 0);
        assert!(!platform.integration().is_active());
        assert_eq!(loader.unloads().len(), 1);
        assert!(!platform.status().initialized);
    }
}
