//! Mini-Game Integration
//!
//! Bridges the platform and the embedded AR driving mini-game: launches a
//! play area, binds to its mission source, watches the session timeout,
//! settles rewards on exit and hands control back to the main menu.
//!
//! ```text
//!            launch                 area ready
//!   Idle ─────────────▶ Launching ─────────────▶ Active(Running ⇄ Paused)
//!    ▲                      │                          │
//!    │      load failed     │    exit / timeout /      │
//!    ├──────────────────────┘    completion grace      │
//!    │                                                 ▼
//!    └───────────────────────── Idle ◀──────────── Exiting
//! ```
//!
//! Every pending task (area load, timeout watcher, grace exit, mission
//! listener) is tagged with the launch generation. Teardown aborts them,
//! and a task that still gets to run checks the generation and phase
//! before touching state, so a stale timer can never re-enter.

use std::sync::{Arc, Weak};
use std::time::Duration;
use parking_lot::Mutex;
use serde::{Serialize, Deserialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::core::money::Money;
use crate::game::reward::{apply_mini_game_reward, mini_game_reward, MiniGameReward};
use crate::integration::ports::{
    AreaError, MissionCompleted, MissionLocator, MissionSource, PlayAreaLoader, TimeControl,
};
use crate::integration::timer::DeferredAction;
use crate::platform::state::{PlatformEvent, PlatformState, PlatformStateMachine};

/// Mini-game integration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Area loaded when `launch` gets no explicit id.
    pub default_area: String,
    /// Play-time limit. Zero disables the watcher.
    pub session_timeout: Duration,
    /// Base experience granted on exit.
    pub completion_exp: u64,
    /// Experience per completed mission.
    pub mission_exp: u64,
    /// Currency granted on exit and per completed mission.
    pub completion_reward: Money,
    /// Delay between clearing all targets and tearing down.
    pub grace_period: Duration,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            default_area: "MainGameAR_ARDK".to_string(),
            session_timeout: Duration::from_secs(30 * 60),
            completion_exp: 100,
            mission_exp: 50,
            completion_reward: Money::from_int(10),
            grace_period: Duration::from_secs(3),
        }
    }
}

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntegrationPhase {
    /// Nothing running.
    #[default]
    Idle,
    /// Load requested, area not ready yet.
    Launching,
    /// Area ready and bound.
    Active {
        /// Game time frozen.
        paused: bool,
    },
    /// Teardown in progress.
    Exiting,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Caller asked.
    Manual,
    /// Timeout watcher fired.
    Timeout,
    /// All targets cleared and the grace period ran out.
    Completed,
}

/// Outcome of a normal exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitReport {
    /// Area that was unloaded.
    pub area_id: String,
    /// Unpaused play time.
    pub elapsed: Duration,
    /// Applied reward; `None` without a current player.
    pub reward: Option<MiniGameReward>,
    /// What triggered the exit.
    pub reason: ExitReason,
}

/// Notifications published by the integration.
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrationEvent {
    /// Launch accepted, load requested.
    Started {
        /// Area being loaded.
        area_id: String,
    },
    /// Area loaded and bound.
    AreaReady {
        /// Loaded area.
        area_id: String,
        /// Whether a mission source was found.
        missions_bound: bool,
    },
    /// Load failed; the run was abandoned.
    LoadFailed {
        /// Area that failed.
        area_id: String,
        /// Loader error.
        reason: String,
    },
    /// Game time frozen.
    Paused,
    /// Game time running again.
    Resumed,
    /// Experience granted to the current player.
    ExperienceEarned(u64),
    /// Every target cleared; exit follows after the grace period.
    Completed,
    /// Normal exit finished.
    Exited(ExitReport),
    /// Emergency abort finished. No rewards were settled.
    ForceExited,
}

/// Snapshot of the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiniGameStats {
    /// Unpaused play time so far.
    pub play_time: Duration,
    /// Launching or active.
    pub active: bool,
    /// Game time frozen.
    pub paused: bool,
    /// Missions the bound source reports as done.
    pub completed_missions: u32,
}

#[derive(Default)]
struct RunState {
    phase: IntegrationPhase,
    generation: u64,
    area_id: Option<String>,

    started_at: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,

    timeout_deadline: Option<Instant>,
    timeout_remaining: Option<Duration>,
    timeout: Option<DeferredAction>,
    grace: Option<DeferredAction>,
    load_task: Option<JoinHandle<()>>,

    mission: Option<Arc<dyn MissionSource>>,
    mission_listener: Option<JoinHandle<()>>,
}

impl RunState {
    fn phase(&self) -> IntegrationPhase {
        self.phase
    }

    fn is_running(&self) -> bool {
        matches!(self.phase(), IntegrationPhase::Launching | IntegrationPhase::Active { .. })
    }

    fn elapsed(&self, now: Instant) -> Duration {
        let Some(started) = self.started_at else {
            return Duration::ZERO;
        };
        let paused_now = self
            .paused_at
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or_default();
        now.saturating_duration_since(started)
            .saturating_sub(self.paused_total)
            .saturating_sub(paused_now)
    }

    /// Revoke every pending task and drop the mission binding.
    fn cancel_pending(&mut self) {
        if let Some(timeout) = self.timeout.take() {
            timeout.cancel();
        }
        if let Some(grace) = self.grace.take() {
            grace.cancel();
        }
        if let Some(load) = self.load_task.take() {
            load.abort();
        }
        if let Some(listener) = self.mission_listener.take() {
            listener.abort();
        }
        self.mission = None;
        self.timeout_deadline = None;
        self.timeout_remaining = None;
    }

    fn reset(&mut self) {
        self.phase = IntegrationPhase::Idle;
        self.area_id = None;
        self.started_at = None;
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
    }
}

struct Shared {
    config: IntegrationConfig,
    platform: Arc<PlatformStateMachine>,
    loader: Arc<dyn PlayAreaLoader>,
    locator: Arc<dyn MissionLocator>,
    time: Arc<dyn TimeControl>,
    state: Mutex<RunState>,
    event_tx: broadcast::Sender<IntegrationEvent>,
}

/// The mini-game integration service.
///
/// Cheap to clone; clones share one run state.
#[derive(Clone)]
pub struct MiniGameIntegration {
    shared: Arc<Shared>,
}

impl MiniGameIntegration {
    /// Create an idle integration.
    pub fn new(
        config: IntegrationConfig,
        platform: Arc<PlatformStateMachine>,
        loader: Arc<dyn PlayAreaLoader>,
        locator: Arc<dyn MissionLocator>,
        time: Arc<dyn TimeControl>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(128);
        Self {
            shared: Arc::new(Shared {
                config,
                platform,
                loader,
                locator,
                time,
                state: Mutex::new(RunState::default()),
                event_tx,
            }),
        }
    }

    fn from_weak(weak: &Weak<Shared>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    /// Integration settings.
    pub fn config(&self) -> &IntegrationConfig {
        &self.shared.config
    }

    /// Subscribe to integration notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<IntegrationEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Current phase.
    pub fn phase(&self) -> IntegrationPhase {
        self.shared.state.lock().phase()
    }

    /// Launching or active.
    pub fn is_active(&self) -> bool {
        self.shared.state.lock().is_running()
    }

    /// Snapshot of the current run.
    pub fn stats(&self) -> MiniGameStats {
        let st = self.shared.state.lock();
        MiniGameStats {
            play_time: st.elapsed(Instant::now()),
            active: st.is_running(),
            paused: st.phase() == IntegrationPhase::Active { paused: true },
            completed_missions: st.mission.as_ref().map(|m| m.completed_missions()).unwrap_or(0),
        }
    }

    // =========================================================================
    // LAUNCH
    // =========================================================================

    /// Launch a play area (the default one if `area_id` is `None`).
    ///
    /// Returns once the load is requested. Readiness arrives later as
    /// `IntegrationEvent::AreaReady`. Rejected with a warning when a run is
    /// already in progress.
    pub fn launch(&self, area_id: Option<&str>) -> bool {
        let area = area_id.unwrap_or(&self.shared.config.default_area).to_string();
        let mut st = self.shared.state.lock();

        if st.phase() != IntegrationPhase::Idle {
            warn!("Mini-game already running, launch of {} ignored", area);
            return false;
        }

        st.generation += 1;
        let generation = st.generation;
        st.phase = IntegrationPhase::Launching;
        st.area_id = Some(area.clone());
        st.started_at = Some(Instant::now());
        st.paused_at = None;
        st.paused_total = Duration::ZERO;

        info!("Launching mini-game area {} (run {})", area, generation);
        self.emit(IntegrationEvent::Started { area_id: area.clone() });

        let load = self.shared.loader.load(&area);
        let weak = Arc::downgrade(&self.shared);
        st.load_task = Some(tokio::spawn(async move {
            let result = load.await;
            if let Some(integration) = Self::from_weak(&weak) {
                integration.on_area_loaded(generation, result);
            }
        }));

        true
    }

    fn on_area_loaded(&self, generation: u64, result: Result<(), AreaError>) {
        let mut st = self.shared.state.lock();
        if st.generation != generation || st.phase() != IntegrationPhase::Launching {
            debug!("Stale area load for run {} ignored", generation);
            return;
        }
        st.load_task = None;
        let area = st.area_id.clone().unwrap_or_default();

        if let Err(e) = result {
            error!("Mini-game area {} failed to load: {}", area, e);
            st.cancel_pending();
            self.shared.time.set_time_scale(1.0);
            st.reset();
            self.emit(IntegrationEvent::LoadFailed { area_id: area, reason: e.to_string() });
            return;
        }

        // Re-resolve: the source only exists once the area is loaded.
        let mission = self.shared.locator.locate(&area);
        let missions_bound = mission.is_some();
        match mission {
            Some(source) => {
                st.mission_listener = Some(self.bind_missions(generation, source.as_ref()));
                st.mission = Some(source);
            }
            None => warn!("No mission source in {}, mission rewards disabled", area),
        }

        let timeout = self.shared.config.session_timeout;
        if !timeout.is_zero() {
            self.arm_timeout(&mut st, generation, timeout);
        }

        st.phase = IntegrationPhase::Active { paused: false };
        info!("Mini-game area {} ready", area);
        self.emit(IntegrationEvent::AreaReady { area_id: area, missions_bound });
    }

    fn bind_missions(&self, generation: u64, source: &dyn MissionSource) -> JoinHandle<()> {
        let mut rx = source.subscribe();
        let weak = Arc::downgrade(&self.shared);
        debug!("Mission listener bound for run {}", generation);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(completed) => match Self::from_weak(&weak) {
                        Some(integration) => integration.on_mission_completed(generation, completed),
                        None => break,
                    },
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Mission listener lagged, {} completions dropped", missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    fn arm_timeout(&self, st: &mut RunState, generation: u64, after: Duration) {
        st.timeout_deadline = Some(Instant::now() + after);
        st.timeout_remaining = None;
        st.timeout = Some(self.schedule_exit(generation, after, ExitReason::Timeout));
    }

    fn schedule_exit(&self, generation: u64, after: Duration, reason: ExitReason) -> DeferredAction {
        let weak = Arc::downgrade(&self.shared);
        DeferredAction::schedule(after, move || async move {
            if let Some(integration) = Self::from_weak(&weak) {
                integration.scheduled_exit(generation, reason);
            }
        })
    }

    #[instrument(skip(self))]
    fn scheduled_exit(&self, generation: u64, reason: ExitReason) {
        if reason == ExitReason::Timeout {
            info!("Mini-game session timed out");
        }
        self.exit_run(Some(generation), reason);
    }

    // =========================================================================
    // PAUSE / RESUME
    // =========================================================================

    /// Freeze game time. No-op unless running and unpaused.
    pub fn pause(&self) -> bool {
        let mut st = self.shared.state.lock();
        if st.phase() != (IntegrationPhase::Active { paused: false }) {
            return false;
        }

        let now = Instant::now();
        self.shared.time.set_time_scale(0.0);
        st.phase = IntegrationPhase::Active { paused: true };
        st.paused_at = Some(now);

        // Scaled time stops, so the deadline stops with it.
        if let (Some(deadline), Some(timeout)) = (st.timeout_deadline.take(), st.timeout.take()) {
            timeout.cancel();
            st.timeout_remaining = Some(deadline.saturating_duration_since(now));
        }

        info!("Mini-game paused");
        self.emit(IntegrationEvent::Paused);
        true
    }

    /// Unfreeze game time. No-op unless running and paused.
    pub fn resume(&self) -> bool {
        let mut st = self.shared.state.lock();
        if st.phase() != (IntegrationPhase::Active { paused: true }) {
            return false;
        }

        let now = Instant::now();
        self.shared.time.set_time_scale(1.0);
        st.phase = IntegrationPhase::Active { paused: false };
        if let Some(at) = st.paused_at.take() {
            st.paused_total += now.saturating_duration_since(at);
        }

        if let Some(remaining) = st.timeout_remaining.take() {
            let generation = st.generation;
            self.arm_timeout(&mut st, generation, remaining);
        }

        info!("Mini-game resumed");
        self.emit(IntegrationEvent::Resumed);
        true
    }

    // =========================================================================
    // MISSIONS
    // =========================================================================

    fn on_mission_completed(&self, generation: u64, completed: MissionCompleted) {
        let mut st = self.shared.state.lock();
        if st.generation != generation || !matches!(st.phase(), IntegrationPhase::Active { .. }) {
            debug!("Stale mission completion for run {} ignored", generation);
            return;
        }

        info!("Mission completed: {}", completed.mission);
        let config = &self.shared.config;
        if let Some(profile) = self.shared.platform.current_player() {
            {
                let mut player = profile.lock();
                player.complete_mission(&completed.mission, config.mission_exp);
                player.add_earnings(config.completion_reward);
            }
            self.emit(IntegrationEvent::ExperienceEarned(config.mission_exp));
        }

        let cleared = st.mission.as_ref().map(|m| m.remaining_targets() == 0).unwrap_or(false);
        if cleared && st.grace.is_none() {
            info!("All targets cleared, exiting in {:?}", config.grace_period);
            self.emit(IntegrationEvent::Completed);
            st.grace = Some(self.schedule_exit(generation, config.grace_period, ExitReason::Completed));
        }
    }

    // =========================================================================
    // EXIT
    // =========================================================================

    /// Leave the mini-game, settle rewards and return to the main menu.
    ///
    /// Returns `None` (and changes nothing) when no run is in progress.
    pub fn exit(&self) -> Option<ExitReport> {
        self.exit_run(None, ExitReason::Manual)
    }

    fn exit_run(&self, generation: Option<u64>, reason: ExitReason) -> Option<ExitReport> {
        let mut st = self.shared.state.lock();
        if generation.is_some_and(|g| g != st.generation) || !st.is_running() {
            debug!("Mini-game not running, exit ignored");
            return None;
        }

        st.phase = IntegrationPhase::Exiting;

        // Bookkeeping first; the unload below may be slow or fail.
        st.cancel_pending();
        self.shared.time.set_time_scale(1.0);

        let elapsed = st.elapsed(Instant::now());
        let area = st.area_id.clone().unwrap_or_default();
        let reward = self.settle_rewards(elapsed);

        self.request_unload(&area);
        st.reset();

        let report = ExitReport { area_id: area, elapsed, reward, reason };
        self.emit(IntegrationEvent::Exited(report.clone()));
        drop(st);

        self.shared.platform.switch_to(PlatformState::MainMenu);
        info!("Mini-game exited ({:?}) after {:.1}s", reason, elapsed.as_secs_f64());
        Some(report)
    }

    fn settle_rewards(&self, elapsed: Duration) -> Option<MiniGameReward> {
        let Some(profile) = self.shared.platform.current_player() else {
            warn!("No current player, mini-game rewards skipped");
            return None;
        };

        let config = &self.shared.config;
        let reward = mini_game_reward(elapsed, config.completion_exp, config.completion_reward);
        {
            let mut player = profile.lock();
            apply_mini_game_reward(&mut player, &reward, elapsed);
        }

        info!("Mini-game reward - exp: {}, currency: {}", reward.total_exp, reward.currency);
        self.emit(IntegrationEvent::ExperienceEarned(reward.total_exp));
        Some(reward)
    }

    fn request_unload(&self, area: &str) {
        let unload = self.shared.loader.unload(area);
        let area = area.to_string();
        tokio::spawn(async move {
            match unload.await {
                Ok(()) => debug!("Mini-game area {} unloaded", area),
                Err(e) => warn!("Mini-game area {} failed to unload: {}", area, e),
            }
        });
    }

    /// Emergency abort.
    ///
    /// Cancels everything, restores time and unloads the area without
    /// settling rewards. Recovers a run whose load never resolves.
    pub fn force_exit(&self) -> bool {
        let mut st = self.shared.state.lock();
        if !st.is_running() {
            return false;
        }

        st.cancel_pending();
        self.shared.time.set_time_scale(1.0);
        if let Some(area) = st.area_id.clone() {
            self.request_unload(&area);
        }
        st.reset();

        self.emit(IntegrationEvent::ForceExited);
        drop(st);

        self.shared.platform.switch_to(PlatformState::MainMenu);
        warn!("Mini-game force exited");
        true
    }

    // =========================================================================
    // PLATFORM LINK
    // =========================================================================

    /// Follow platform mini-game requests.
    ///
    /// `MiniGameLaunched` launches, `MiniGameExited` exits. The returned
    /// link must be detached to unsubscribe.
    pub fn attach_to_platform(&self) -> PlatformLink {
        let mut rx = self.shared.platform.subscribe();
        let weak = Arc::downgrade(&self.shared);

        let task = tokio::spawn(async move {
            loop {
                let event = match rx.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Platform link lagged, {} events dropped", missed);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Some(integration) = Self::from_weak(&weak) else {
                    break;
                };
                match event {
                    PlatformEvent::MiniGameLaunched { area_id } => {
                        integration.launch(Some(&area_id));
                    }
                    PlatformEvent::MiniGameExited => {
                        integration.exit();
                    }
                    PlatformEvent::StateChanged(_) => {}
                }
            }
        });

        PlatformLink { task }
    }

    fn emit(&self, event: IntegrationEvent) {
        // No subscribers is fine.
        let _ = self.shared.event_tx.send(event);
    }
}

/// Subscription of an integration to platform requests.
#[derive(Debug)]
pub struct PlatformLink {
    task: JoinHandle<()>,
}

impl PlatformLink {
    /// Stop following platform requests.
    pub fn detach(self) {
        self.task.abort();
    }
}
