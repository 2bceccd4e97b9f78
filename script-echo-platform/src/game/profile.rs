//! Player Profile
//!
//! Long-lived player identity and cumulative progression. Profiles are
//! owned by the platform, mutated by session and mini-game settlement, and
//! exposed as a plain serializable value so the host can persist them.

use std::collections::BTreeSet;
use std::sync::Arc;
use parking_lot::Mutex;
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::ids::PlayerId;
use crate::core::money::Money;

/// Experience needed per level step: reaching level `n + 1` requires
/// `n * EXP_PER_LEVEL` cumulative experience.
pub const EXP_PER_LEVEL: u64 = 100;

/// Reputation every new profile starts with.
pub const DEFAULT_REPUTATION: i32 = 100;

/// Profile shared between the platform and the mode it activated.
///
/// Every logical mutation step takes the lock exactly once.
pub type SharedProfile = Arc<Mutex<PlayerProfile>>;

/// Role a player takes in a scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoleType {
    /// Investigates the case.
    Detective,
    /// Under suspicion.
    Suspect,
    /// Saw something.
    Witness,
    /// The victim.
    Victim,
    /// Supporting cast.
    Support,
    /// No allegiance.
    Neutral,
}

/// Preferred way of playing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayStyle {
    /// Relaxed play.
    #[default]
    Casual,
    /// Ranked / score driven.
    Competitive,
    /// Mostly for the company.
    Social,
    /// Story first.
    Immersive,
}

/// Where earnings are paid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// WeChat Pay.
    #[default]
    WeChat,
    /// Alipay.
    Alipay,
    /// Bank card.
    BankCard,
    /// Digital currency wallet.
    Digital,
}

/// Pure leveling function.
///
/// Starting at level 1, the level increases while `experience >= level * 100`.
/// Large awards can cross several levels at once. That loop always stops at
/// `experience / 100 + 1`, computed here directly and capped at `u32::MAX`.
pub fn level_for_experience(experience: u64) -> u32 {
    let level = experience / EXP_PER_LEVEL + 1;
    u32::try_from(level).unwrap_or(u32::MAX)
}

/// A player's identity and cumulative progression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// Unique player id
    pub id: PlayerId,
    /// Display name
    pub display_name: String,
    /// Avatar location, if any
    pub avatar_url: Option<String>,

    /// Cached level, always `level_for_experience(experience)`
    level: u32,
    /// Cumulative experience; never decremented
    experience: u64,

    /// Roles the player likes to be matched into
    pub preferred_roles: Vec<RoleType>,
    /// Play style preference
    pub play_style: PlayStyle,

    /// Sessions completed
    pub games_played: u32,
    /// Mini-game runs settled
    pub mini_games_played: u32,
    /// Cumulative mini-game play time in seconds
    pub total_play_time_secs: f64,
    /// Missions completed across all mini-games
    pub completed_missions: u32,

    /// Cumulative earnings
    pub total_earnings: Money,
    /// Payout preference
    pub payment_method: PaymentMethod,

    /// Friend ids
    pub friends: Vec<PlayerId>,
    /// Reputation score
    pub reputation: i32,
    /// Unlocked achievements
    pub achievements: BTreeSet<String>,
}

impl PlayerProfile {
    /// Create a fresh level-1 profile.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self::with_id(PlayerId::random(), display_name)
    }

    /// Create a fresh profile with a known id.
    pub fn with_id(id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            avatar_url: None,
            level: 1,
            experience: 0,
            preferred_roles: Vec::new(),
            play_style: PlayStyle::default(),
            games_played: 0,
            mini_games_played: 0,
            total_play_time_secs: 0.0,
            completed_missions: 0,
            total_earnings: Money::ZERO,
            payment_method: PaymentMethod::default(),
            friends: Vec::new(),
            reputation: DEFAULT_REPUTATION,
            achievements: BTreeSet::new(),
        }
    }

    /// Wrap into a shared handle.
    pub fn into_shared(self) -> SharedProfile {
        Arc::new(Mutex::new(self))
    }

    /// Current level.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Cumulative experience.
    pub fn experience(&self) -> u64 {
        self.experience
    }

    /// Add experience and recompute the level.
    ///
    /// Returns the number of levels gained.
    pub fn add_experience(&mut self, exp: u64) -> u32 {
        self.experience = self.experience.saturating_add(exp);
        let new_level = level_for_experience(self.experience);
        let gained = new_level.saturating_sub(self.level);
        self.level = new_level.max(self.level);
        if gained > 0 {
            info!("Player {} reached level {}", self.display_name, self.level);
        }
        gained
    }

    /// Add to cumulative earnings.
    pub fn add_earnings(&mut self, amount: Money) {
        self.total_earnings += amount;
    }

    /// Count a finished mission and grant its experience.
    pub fn complete_mission(&mut self, mission: &str, exp_reward: u64) {
        self.completed_missions = self.completed_missions.saturating_add(1);
        self.add_experience(exp_reward);
        info!("Player {} completed mission: {}", self.display_name, mission);
    }

    /// Unlock an achievement. Returns false if already unlocked.
    pub fn unlock_achievement(&mut self, name: &str) -> bool {
        let added = self.achievements.insert(name.to_string());
        if added {
            info!("Player {} unlocked achievement: {}", self.display_name, name);
        }
        added
    }

    /// Accumulate play time.
    pub fn record_play_time(&mut self, secs: f64) {
        self.total_play_time_secs += secs.max(0.0);
    }
}
