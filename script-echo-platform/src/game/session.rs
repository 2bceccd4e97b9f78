//! Game Session
//!
//! One complete play engagement among a bounded group of players under one
//! scenario. Enforces the session lifecycle and settles revenue at the end.
//!
//! ```text
//! WaitingForPlayers ──join/check (≥min, all ready)──▶ Ready ──start──▶ InProgress ──end──▶ Completed
//!        │                                              │                 │
//!        └────────────────────── cancel ────────────────┴─────────────────┴──▶ Cancelled
//! ```

use std::collections::BTreeMap;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::core::ids::{PlayerId, SessionId};
use crate::core::money::{Money, Percent};
use crate::game::profile::{PlayerProfile, RoleType};
use crate::game::reward::{settle_session_revenue, RevenueSplit};

/// Session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Gathering players.
    WaitingForPlayers,
    /// Enough players, all ready.
    Ready,
    /// Play underway.
    InProgress,
    /// Finished and settled.
    Completed,
    /// Abandoned before completion.
    Cancelled,
}

impl SessionStatus {
    /// Completed or cancelled.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

/// Scenario difficulty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyLevel {
    /// First-timers.
    Beginner,
    /// Standard.
    #[default]
    Normal,
    /// Hard.
    Hard,
    /// Expert.
    Expert,
}

/// How a session's revenue is shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevenueShareModel {
    /// Fixed percentages.
    #[default]
    FixedRate,
    /// Weighted by performance.
    Performance,
    /// Seats auctioned.
    Auction,
    /// Covered by subscription.
    Subscription,
}

/// Configuration for a game session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum players in session.
    pub max_players: usize,
    /// Minimum players to start.
    pub min_players: usize,
    /// Scenario difficulty.
    pub difficulty: DifficultyLevel,
    /// Expected running time.
    pub estimated_duration: Duration,
    /// Revenue model.
    pub revenue_model: RevenueShareModel,
    /// Price per seat.
    pub price: Money,
    /// Host cut of the pool.
    pub host_share: Percent,
    /// Platform cut of the pool.
    pub platform_share: Percent,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_players: 6,
            min_players: 2,
            difficulty: DifficultyLevel::Normal,
            estimated_duration: Duration::from_secs(2 * 60 * 60),
            revenue_model: RevenueShareModel::FixedRate,
            price: Money::from_int(50),
            host_share: Percent::from_whole(20),
            platform_share: Percent::from_whole(10),
        }
    }
}

impl SessionConfig {
    /// Check roster bounds and that the cuts leave a non-negative player pool.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.min_players == 0 || self.min_players > self.max_players {
            return Err(SessionError::InvalidRosterBounds {
                min: self.min_players,
                max: self.max_players,
            });
        }
        if self.host_share.checked_add(self.platform_share).is_none() {
            return Err(SessionError::SharesExceedTotal {
                host: self.host_share,
                platform: self.platform_share,
            });
        }
        Ok(())
    }
}

/// A player's seat in one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPlayer {
    /// Player identifier.
    pub player_id: PlayerId,
    /// Name at join time.
    pub display_name: String,
    /// Role assigned for this scenario.
    pub role: RoleType,
    /// When the player joined.
    pub joined_at: DateTime<Utc>,
    /// Is player ready to start.
    pub ready: bool,
    /// In-session score.
    pub score: u32,
    /// Connectivity flag.
    pub connected: bool,
}

impl SessionPlayer {
    /// Check if player is connected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Session is full.
    #[error("Session is full")]
    SessionFull,

    /// Player already in session.
    #[error("Already in session")]
    AlreadyInSession,

    /// Roster is locked once play has started or the session ended.
    #[error("Session no longer accepts players")]
    SessionClosed,

    /// Invalid session state for the operation.
    #[error("Invalid session state: {0:?}")]
    InvalidState(SessionStatus),

    /// Fewer players than the minimum.
    #[error("Not enough players: {have} of {need}")]
    NotEnoughPlayers {
        /// Current roster size.
        have: usize,
        /// Configured minimum.
        need: usize,
    },

    /// Players not ready.
    #[error("Players not ready")]
    PlayersNotReady,

    /// Player not found.
    #[error("Player not found")]
    PlayerNotFound,

    /// Session not found.
    #[error("Session not found")]
    SessionNotFound,

    /// Min/max roster bounds are inconsistent.
    #[error("Invalid roster bounds: min {min}, max {max}")]
    InvalidRosterBounds {
        /// Minimum players.
        min: usize,
        /// Maximum players.
        max: usize,
    },

    /// Host and platform cuts exceed 100%.
    #[error("Shares exceed 100%: host {host}, platform {platform}")]
    SharesExceedTotal {
        /// Host cut.
        host: Percent,
        /// Platform cut.
        platform: Percent,
    },
}

/// A game session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    /// Unique session identifier.
    pub id: SessionId,
    /// Display name.
    pub name: String,
    /// Scenario being played.
    pub script_name: String,
    /// Player who created the session.
    pub host_id: PlayerId,
    /// Current status.
    status: SessionStatus,
    /// Session configuration.
    pub config: SessionConfig,

    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When play started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the session ended.
    pub ended_at: Option<DateTime<Utc>>,

    /// Roster in join order.
    players: Vec<SessionPlayer>,

    /// Bonus mini-games enabled for this session.
    enabled_mini_games: Vec<String>,
    /// Set once any bonus mini-game is enabled.
    enhanced_mode: bool,

    /// Current chapter (1-based once started).
    current_chapter: u32,
    /// Objectives reached, keyed by completion order.
    completed_objectives: BTreeMap<u32, String>,

    /// Every settlement run by `end_session`.
    settlements: Vec<RevenueSplit>,
}

impl GameSession {
    /// Create a new session waiting for players.
    pub fn new(
        name: impl Into<String>,
        script_name: impl Into<String>,
        host_id: PlayerId,
        config: SessionConfig,
    ) -> Self {
        Self::with_id(SessionId::random(), name, script_name, host_id, config)
    }

    /// Create a session with a known id.
    pub fn with_id(
        id: SessionId,
        name: impl Into<String>,
        script_name: impl Into<String>,
        host_id: PlayerId,
        config: SessionConfig,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            script_name: script_name.into(),
            host_id,
            status: SessionStatus::WaitingForPlayers,
            config,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            players: Vec::new(),
            enabled_mini_games: Vec::new(),
            enhanced_mode: false,
            current_chapter: 0,
            completed_objectives: BTreeMap::new(),
            settlements: Vec::new(),
        }
    }

    /// Add a player to the session.
    pub fn add_player(&mut self, profile: &PlayerProfile, role: RoleType) -> Result<(), SessionError> {
        if !matches!(self.status, SessionStatus::WaitingForPlayers | SessionStatus::Ready) {
            warn!("Session {} rejected {}: status {:?}", self.name, profile.display_name, self.status);
            return Err(SessionError::SessionClosed);
        }

        if self.players.len() >= self.config.max_players {
            warn!("Session {} is full, {} cannot join", self.name, profile.display_name);
            return Err(SessionError::SessionFull);
        }

        if self.player(&profile.id).is_some() {
            return Err(SessionError::AlreadyInSession);
        }

        self.players.push(SessionPlayer {
            player_id: profile.id,
            display_name: profile.display_name.clone(),
            role,
            joined_at: Utc::now(),
            ready: false,
            score: 0,
            connected: true,
        });
        info!("Player {} joined session {} as {:?}", profile.display_name, self.name, role);

        self.check_readiness();
        Ok(())
    }

    /// Remove a player from the session.
    ///
    /// Leaving never re-runs the readiness check.
    pub fn remove_player(&mut self, player_id: &PlayerId) -> bool {
        match self.players.iter().position(|p| p.player_id == *player_id) {
            Some(index) => {
                let player = self.players.remove(index);
                info!("Player {} left session {}", player.display_name, self.name);
                true
            }
            None => false,
        }
    }

    /// Set a player's ready flag.
    ///
    /// Status is only re-evaluated on join, so un-readying a player in a
    /// `Ready` session leaves the status as is.
    pub fn set_player_ready(&mut self, player_id: &PlayerId, ready: bool) -> bool {
        match self.player_mut(player_id) {
            Some(player) => {
                player.ready = ready;
                info!("Player {} ready: {}", player.display_name, ready);
                true
            }
            None => false,
        }
    }

    /// Check if the roster meets the minimum and everyone is ready.
    pub fn all_players_ready(&self) -> bool {
        self.players.len() >= self.config.min_players
            && self.players.iter().all(|p| p.ready)
    }

    /// Promote `WaitingForPlayers` to `Ready` when the roster qualifies.
    ///
    /// Runs after every join and on explicit host request. Promotion only:
    /// a `Ready` session is never demoted here.
    pub fn check_readiness(&mut self) -> bool {
        if self.status == SessionStatus::WaitingForPlayers && self.all_players_ready() {
            self.status = SessionStatus::Ready;
            info!("Session {} is ready", self.name);
        }
        self.status == SessionStatus::Ready
    }

    /// Start play.
    pub fn start_session(&mut self) -> Result<(), SessionError> {
        if !matches!(self.status, SessionStatus::WaitingForPlayers | SessionStatus::Ready) {
            warn!("Session {} cannot start from {:?}", self.name, self.status);
            return Err(SessionError::InvalidState(self.status));
        }

        if self.players.len() < self.config.min_players {
            warn!("Session {} has too few players to start", self.name);
            return Err(SessionError::NotEnoughPlayers {
                have: self.players.len(),
                need: self.config.min_players,
            });
        }

        if !self.players.iter().all(|p| p.ready) {
            warn!("Session {} still has players who are not ready", self.name);
            return Err(SessionError::PlayersNotReady);
        }

        self.started_at = Some(Utc::now());
        self.status = SessionStatus::InProgress;
        self.current_chapter = 1;
        info!("Session {} started", self.name);
        Ok(())
    }

    /// End the session and settle revenue.
    ///
    /// Settlement runs on every call and is appended to the ledger, so
    /// ending twice counts the pool twice.
    pub fn end_session(&mut self) -> RevenueSplit {
        if self.status == SessionStatus::Completed {
            warn!("Session {} ended again; revenue will be settled twice", self.name);
        }

        self.ended_at = Some(Utc::now());
        self.status = SessionStatus::Completed;

        let split = settle_session_revenue(
            self.config.price,
            self.players.len() as u32,
            self.config.host_share,
            self.config.platform_share,
        );
        self.settlements.push(split);

        info!(
            "Session {} settled - total: {}, host: {}, platform: {}, players: {}",
            self.name, split.total, split.host, split.platform, split.players
        );
        split
    }

    /// Cancel from any non-terminal state.
    pub fn cancel_session(&mut self) -> Result<(), SessionError> {
        if self.status.is_terminal() {
            return Err(SessionError::InvalidState(self.status));
        }
        self.ended_at = Some(Utc::now());
        self.status = SessionStatus::Cancelled;
        info!("Session {} cancelled", self.name);
        Ok(())
    }

    /// Enable a bonus mini-game. Idempotent.
    pub fn enable_bonus_mini_game(&mut self, mini_game_id: &str) {
        if self.enabled_mini_games.iter().any(|id| id == mini_game_id) {
            return;
        }
        self.enabled_mini_games.push(mini_game_id.to_string());
        self.enhanced_mode = true;
        info!("Session {} enabled bonus mini-game {}", self.name, mini_game_id);
    }

    /// Move to the next chapter. Only valid while in progress.
    pub fn advance_chapter(&mut self) -> Result<u32, SessionError> {
        if self.status != SessionStatus::InProgress {
            return Err(SessionError::InvalidState(self.status));
        }
        self.current_chapter += 1;
        Ok(self.current_chapter)
    }

    /// Record an objective. Returns false if it was already recorded.
    pub fn complete_objective(&mut self, objective: &str) -> bool {
        if self.completed_objectives.values().any(|o| o == objective) {
            return false;
        }
        let order = self.completed_objectives.len() as u32;
        self.completed_objectives.insert(order, objective.to_string());
        true
    }

    /// Add to a player's in-session score.
    pub fn add_score(&mut self, player_id: &PlayerId, points: u32) -> bool {
        match self.player_mut(player_id) {
            Some(player) => {
                player.score = player.score.saturating_add(points);
                true
            }
            None => false,
        }
    }

    /// Mark a player as disconnected. The seat is kept.
    pub fn mark_disconnected(&mut self, player_id: &PlayerId) -> bool {
        match self.player_mut(player_id) {
            Some(player) => {
                player.connected = false;
                true
            }
            None => false,
        }
    }

    /// Mark a disconnected player as back.
    pub fn mark_reconnected(&mut self, player_id: &PlayerId) -> bool {
        match self.player_mut(player_id) {
            Some(player) => {
                player.connected = true;
                true
            }
            None => false,
        }
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Roster in join order.
    pub fn players(&self) -> &[SessionPlayer] {
        &self.players
    }

    /// Get player count.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Look up one seat.
    pub fn player(&self, player_id: &PlayerId) -> Option<&SessionPlayer> {
        self.players.iter().find(|p| p.player_id == *player_id)
    }

    fn player_mut(&mut self, player_id: &PlayerId) -> Option<&mut SessionPlayer> {
        self.players.iter_mut().find(|p| p.player_id == *player_id)
    }

    /// Current chapter (0 before start).
    pub fn current_chapter(&self) -> u32 {
        self.current_chapter
    }

    /// Objectives in completion order.
    pub fn completed_objectives(&self) -> impl Iterator<Item = &str> {
        self.completed_objectives.values().map(String::as_str)
    }

    /// Enabled bonus mini-games.
    pub fn enabled_mini_games(&self) -> &[String] {
        &self.enabled_mini_games
    }

    /// Whether any bonus mini-game is enabled.
    pub fn enhanced_mode(&self) -> bool {
        self.enhanced_mode
    }

    /// Every settlement run so far.
    pub fn settlements(&self) -> &[RevenueSplit] {
        &self.settlements
    }

    /// Sum of all settled pools.
    pub fn settled_revenue(&self) -> Money {
        self.settlements.iter().map(|s| s.total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_session() -> GameSession {
        GameSession::new("Friday night", "Manor Murder", PlayerId::new([0; 16]), SessionConfig::default())
    }

    fn profile(i: u8) -> PlayerProfile {
        PlayerProfile::with_id(PlayerId::new([i; 16]), format!("player{}", i))
    }

    fn ready_session(count: u8) -> GameSession {
        let mut session = create_test_session();
        for i in 1..=count {
            session.add_player(&profile(i), RoleType::Witness).unwrap();
            session.set_player_ready(&PlayerId::new([i; 16]), true);
        }
        session
    }

    #[test]
    fn test_add_remove_player() {
        let mut session = create_test_session();
        let p = profile(1);

        session.add_player(&p, RoleType::Detective).unwrap();
        assert_eq!(session.player_count(), 1);
        assert!(!session.player(&p.id).unwrap().ready);
        assert!(session.player(&p.id).unwrap().is_connected());

        assert!(session.remove_player(&p.id));
        assert_eq!(session.player_count(), 0);
        assert!(!session.remove_player(&p.id));
    }

    #[test]
    fn test_session_full() {
        let config = SessionConfig {
            max_players: 2,
            ..Default::default()
        };
        let mut session = GameSession::new("s", "script", PlayerId::new([0; 16]), config);

        for i in 1..=2 {
            session.add_player(&profile(i), RoleType::Suspect).unwrap();
        }

        let result = session.add_player(&profile(99), RoleType::Suspect);
        assert_eq!(result, Err(SessionError::SessionFull));
        assert_eq!(session.player_count(), 2);
        assert!(session.player(&PlayerId::new([99; 16])).is_none());
    }

    #[test]
    fn test_duplicate_join_rejected() {
        let mut session = create_test_session();
        session.add_player(&profile(1), RoleType::Suspect).unwrap();
        assert_eq!(session.add_player(&profile(1), RoleType::Victim), Err(SessionError::AlreadyInSession));
        assert_eq!(session.player_count(), 1);
    }

    #[test]
    fn test_ready_evaluated_on_join_only() {
        let mut session = create_test_session();
        session.add_player(&profile(1), RoleType::Detective).unwrap();
        session.add_player(&profile(2), RoleType::Suspect).unwrap();
        assert_eq!(session.status(), SessionStatus::WaitingForPlayers);

        // Readying alone does not promote the session.
        session.set_player_ready(&PlayerId::new([1; 16]), true);
        session.set_player_ready(&PlayerId::new([2; 16]), true);
        assert!(session.all_players_ready());
        assert_eq!(session.status(), SessionStatus::WaitingForPlayers);

        // A join triggers evaluation; the newcomer is not ready yet.
        session.add_player(&profile(3), RoleType::Witness).unwrap();
        assert_eq!(session.status(), SessionStatus::WaitingForPlayers);
    }

    #[test]
    fn test_check_readiness_promotes() {
        let mut session = create_test_session();
        session.add_player(&profile(1), RoleType::Detective).unwrap();
        session.add_player(&profile(2), RoleType::Suspect).unwrap();

        assert!(!session.check_readiness());
        session.set_player_ready(&PlayerId::new([1; 16]), true);
        session.set_player_ready(&PlayerId::new([2; 16]), true);
        assert!(session.check_readiness());
        assert_eq!(session.status(), SessionStatus::Ready);
    }

    #[test]
    fn test_unready_does_not_revert_ready_status() {
        let mut session = ready_session(2);
        assert!(session.check_readiness());
        assert_eq!(session.status(), SessionStatus::Ready);

        // Flipping a flag back is not re-evaluated.
        session.set_player_ready(&PlayerId::new([2; 16]), false);
        assert_eq!(session.status(), SessionStatus::Ready);
        assert!(!session.all_players_ready());

        // Start still checks every flag.
        assert_eq!(session.start_session(), Err(SessionError::PlayersNotReady));
    }

    #[test]
    fn test_leaving_never_promotes() {
        let mut session = ready_session(2);
        session.add_player(&profile(3), RoleType::Victim).unwrap();
        assert_eq!(session.status(), SessionStatus::WaitingForPlayers);

        // The only unready player leaves; status stays until re-checked.
        assert!(session.remove_player(&PlayerId::new([3; 16])));
        assert!(session.all_players_ready());
        assert_eq!(session.status(), SessionStatus::WaitingForPlayers);
    }

    #[test]
    fn test_cannot_start_without_ready() {
        let mut session = create_test_session();
        session.add_player(&profile(1), RoleType::Detective).unwrap();
        session.add_player(&profile(2), RoleType::Suspect).unwrap();

        let result = session.start_session();
        assert_eq!(result, Err(SessionError::PlayersNotReady));
        assert_eq!(session.status(), SessionStatus::WaitingForPlayers);
        assert!(session.started_at.is_none());
    }

    #[test]
    fn test_cannot_start_below_minimum() {
        let mut session = ready_session(1);
        let result = session.start_session();
        assert_eq!(result, Err(SessionError::NotEnoughPlayers { have: 1, need: 2 }));
        assert_eq!(session.current_chapter(), 0);
    }

    #[test]
    fn test_start_session() {
        let mut session = ready_session(2);
        session.start_session().unwrap();
        assert_eq!(session.status(), SessionStatus::InProgress);
        assert_eq!(session.current_chapter(), 1);
        assert!(session.started_at.is_some());
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut session = ready_session(2);
        session.start_session().unwrap();
        session.advance_chapter().unwrap();
        let started = session.started_at;

        let again = session.start_session();
        assert_eq!(again, Err(SessionError::InvalidState(SessionStatus::InProgress)));
        assert_eq!(session.current_chapter(), 2);
        assert_eq!(session.started_at, started);
    }

    #[test]
    fn test_roster_locked_once_started() {
        let mut session = ready_session(2);
        session.start_session().unwrap();
        assert_eq!(session.add_player(&profile(7), RoleType::Neutral), Err(SessionError::SessionClosed));
    }

    #[test]
    fn test_end_session_settles() {
        let config = SessionConfig {
            max_players: 4,
            ..Default::default()
        };
        let mut session = GameSession::new("s", "script", PlayerId::new([0; 16]), config);
        for i in 1..=4 {
            session.add_player(&profile(i), RoleType::Witness).unwrap();
            session.set_player_ready(&PlayerId::new([i; 16]), true);
        }
        session.start_session().unwrap();

        let split = session.end_session();
        assert_eq!(session.status(), SessionStatus::Completed);
        assert!(session.ended_at.is_some());
        assert_eq!(split.total, Money::from_int(200));
        assert_eq!(split.host, Money::from_int(40));
        assert_eq!(split.platform, Money::from_int(20));
        assert_eq!(split.players, Money::from_int(140));
    }

    #[test]
    fn test_end_session_twice_double_counts() {
        let mut session = ready_session(2);
        session.start_session().unwrap();

        let first = session.end_session();
        let second = session.end_session();
        assert_eq!(first, second);
        assert_eq!(session.settlements().len(), 2);
        assert_eq!(session.settled_revenue(), first.total + second.total);
    }

    #[test]
    fn test_cancel() {
        let mut session = create_test_session();
        session.cancel_session().unwrap();
        assert_eq!(session.status(), SessionStatus::Cancelled);
        assert!(session.cancel_session().is_err());
        assert!(session.start_session().is_err());
    }

    #[test]
    fn test_enable_bonus_mini_game_idempotent() {
        let mut session = create_test_session();
        assert!(!session.enhanced_mode());

        session.enable_bonus_mini_game("ARRacing");
        session.enable_bonus_mini_game("ARRacing");
        assert_eq!(session.enabled_mini_games(), &["ARRacing".to_string()]);
        assert!(session.enhanced_mode());
    }

    #[test]
    fn test_progress_tracking() {
        let mut session = ready_session(2);
        assert!(session.advance_chapter().is_err());
        session.start_session().unwrap();

        assert_eq!(session.advance_chapter(), Ok(2));
        assert!(session.complete_objective("find the key"));
        assert!(!session.complete_objective("find the key"));
        assert!(session.complete_objective("open the safe"));
        let done: Vec<_> = session.completed_objectives().collect();
        assert_eq!(done, vec!["find the key", "open the safe"]);

        assert!(session.add_score(&PlayerId::new([1; 16]), 15));
        assert_eq!(session.player(&PlayerId::new([1; 16])).unwrap().score, 15);
        assert!(!session.add_score(&PlayerId::new([9; 16]), 15));
    }

    #[test]
    fn test_disconnect_marks_player() {
        let mut session = ready_session(2);
        let id = PlayerId::new([1; 16]);

        assert!(session.mark_disconnected(&id));
        assert!(!session.player(&id).unwrap().is_connected());
        assert!(session.mark_reconnected(&id));
        assert!(session.player(&id).unwrap().is_connected());
    }

    #[test]
    fn test_config_validation() {
        assert!(SessionConfig::default().validate().is_ok());

        let bad_bounds = SessionConfig { min_players: 5, max_players: 2, ..Default::default() };
        assert!(matches!(bad_bounds.validate(), Err(SessionError::InvalidRosterBounds { .. })));

        let bad_shares = SessionConfig {
            host_share: Percent::from_whole(80),
            platform_share: Percent::from_whole(30),
            ..Default::default()
        };
        assert!(matches!(bad_shares.validate(), Err(SessionError::SharesExceedTotal { .. })));
    }
}
