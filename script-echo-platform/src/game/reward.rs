//! Reward Settlement
//!
//! Pure arithmetic shared by session revenue sharing and mini-game
//! rewards. Nothing here touches shared state; callers apply the returned
//! values themselves.

use std::time::Duration;
use serde::{Serialize, Deserialize};
use tracing::warn;

use crate::core::money::{Money, Percent};
use crate::game::profile::PlayerProfile;

/// Experience granted per rounded minute of mini-game play.
pub const EXP_PER_MINUTE: u64 = 10;

const MILLIS_PER_MINUTE: u128 = 60_000;

// =============================================================================
// SESSION REVENUE
// =============================================================================

/// Result of splitting a session's price pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSplit {
    /// price * player count
    pub total: Money,
    /// Host cut
    pub host: Money,
    /// Platform cut
    pub platform: Money,
    /// Remainder pooled for the players
    pub players: Money,
}

/// Split a session's revenue.
///
/// The players' share is the remainder, so the four fields always satisfy
/// `host + platform + players == total` with no rounding leakage.
pub fn settle_session_revenue(
    price: Money,
    player_count: u32,
    host_pct: Percent,
    platform_pct: Percent,
) -> RevenueSplit {
    let total = price.checked_mul(player_count).unwrap_or_else(|| {
        warn!("Session revenue {} x {} out of range, capped", price, player_count);
        Money::MAX
    });
    let host = total.percent_of(host_pct);
    let platform = total.percent_of(platform_pct);
    let players = total - host - platform;

    RevenueSplit { total, host, platform, players }
}

// =============================================================================
// MINI-GAME REWARD
// =============================================================================

/// Reward for one finished mini-game run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniGameReward {
    /// Experience from rounded minutes played
    pub time_bonus_exp: u64,
    /// Base completion experience plus time bonus
    pub total_exp: u64,
    /// Flat currency grant
    pub currency: Money,
}

/// Round a duration to whole minutes, ties to even.
pub fn rounded_minutes(elapsed: Duration) -> u64 {
    let millis = elapsed.as_millis();
    let whole = millis / MILLIS_PER_MINUTE;
    let rem = millis % MILLIS_PER_MINUTE;
    let rounded = match (rem * 2).cmp(&MILLIS_PER_MINUTE) {
        std::cmp::Ordering::Greater => whole + 1,
        std::cmp::Ordering::Equal if whole % 2 == 1 => whole + 1,
        _ => whole,
    };
    rounded as u64
}

/// Compute the mini-game reward for `elapsed` play time.
pub fn mini_game_reward(elapsed: Duration, base_exp: u64, currency: Money) -> MiniGameReward {
    let time_bonus_exp = rounded_minutes(elapsed).saturating_mul(EXP_PER_MINUTE);
    MiniGameReward {
        time_bonus_exp,
        total_exp: base_exp.saturating_add(time_bonus_exp),
        currency,
    }
}

/// Apply a settled mini-game reward to a profile.
///
/// Returns the number of levels gained.
pub fn apply_mini_game_reward(
    profile: &mut PlayerProfile,
    reward: &MiniGameReward,
    elapsed: Duration,
) -> u32 {
    let gained = profile.add_experience(reward.total_exp);
    profile.add_earnings(reward.currency);
    profile.record_play_time(elapsed.as_secs_f64());
    profile.mini_games_played = profile.mini_games_played.saturating_add(1);
    gained
}
