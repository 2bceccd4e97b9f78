//! Platform Configuration
//!
//! Defaults for every tunable plus `SCRIPT_ECHO_*` environment overrides.
//!
//! | Variable                               | Default           |
//! |----------------------------------------|-------------------|
//! | `SCRIPT_ECHO_DEFAULT_PLAYER`           | `New Player`      |
//! | `SCRIPT_ECHO_AUTO_SAVE`                | `true`            |
//! | `SCRIPT_ECHO_AUTO_SAVE_SECS`           | `60`              |
//! | `SCRIPT_ECHO_MINI_GAME`                | `true`            |
//! | `SCRIPT_ECHO_MINI_GAME_AREA`           | `MainGameAR_ARDK` |
//! | `SCRIPT_ECHO_MINI_GAME_TIMEOUT_SECS`   | `1800` (0 = off)  |
//! | `SCRIPT_ECHO_COMPLETION_EXP`           | `100`             |
//! | `SCRIPT_ECHO_MISSION_EXP`              | `50`              |
//! | `SCRIPT_ECHO_COMPLETION_REWARD`        | `10`              |
//! | `SCRIPT_ECHO_GRACE_SECS`               | `3`               |
//! | `SCRIPT_ECHO_MAX_PLAYERS`              | `6`               |
//! | `SCRIPT_ECHO_MIN_PLAYERS`              | `2`               |
//! | `SCRIPT_ECHO_SEAT_PRICE`               | `50`              |
//! | `SCRIPT_ECHO_HOST_SHARE_PCT`           | `20`              |
//! | `SCRIPT_ECHO_PLATFORM_SHARE_PCT`       | `10`              |

use std::str::FromStr;
use std::time::Duration;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::money::{Money, Percent};
use crate::game::session::{SessionConfig, SessionError};
use crate::integration::minigame::IntegrationConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable did not parse.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },

    /// The session defaults are inconsistent.
    #[error("invalid session config: {0}")]
    Session(#[from] SessionError),
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Defaults for newly hosted sessions.
    pub session: SessionConfig,
    /// Mini-game integration.
    pub integration: IntegrationConfig,
    /// Name of the player created when none is set at bootstrap.
    pub default_player_name: String,
    /// Periodic profile snapshots.
    pub auto_save: bool,
    /// Interval between snapshots.
    pub auto_save_interval: Duration,
    /// Whether the mini-game integration follows platform requests.
    pub mini_game_enabled: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            integration: IntegrationConfig::default(),
            default_player_name: "New Player".to_string(),
            auto_save: true,
            auto_save_interval: Duration::from_secs(60),
            mini_game_enabled: true,
        }
    }
}

impl PlatformConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup. Unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup("SCRIPT_ECHO_DEFAULT_PLAYER") {
            config.default_player_name = name;
        }
        if let Some(v) = parse_flag(&lookup, "SCRIPT_ECHO_AUTO_SAVE")? {
            config.auto_save = v;
        }
        if let Some(secs) = parse::<u64, _>(&lookup, "SCRIPT_ECHO_AUTO_SAVE_SECS")? {
            config.auto_save_interval = Duration::from_secs(secs);
        }
        if let Some(v) = parse_flag(&lookup, "SCRIPT_ECHO_MINI_GAME")? {
            config.mini_game_enabled = v;
        }

        let integration = &mut config.integration;
        if let Some(area) = lookup("SCRIPT_ECHO_MINI_GAME_AREA") {
            integration.default_area = area;
        }
        if let Some(secs) = parse::<u64, _>(&lookup, "SCRIPT_ECHO_MINI_GAME_TIMEOUT_SECS")? {
            integration.session_timeout = Duration::from_secs(secs);
        }
        if let Some(exp) = parse(&lookup, "SCRIPT_ECHO_COMPLETION_EXP")? {
            integration.completion_exp = exp;
        }
        if let Some(exp) = parse(&lookup, "SCRIPT_ECHO_MISSION_EXP")? {
            integration.mission_exp = exp;
        }
        if let Some(reward) = parse_money(&lookup, "SCRIPT_ECHO_COMPLETION_REWARD")? {
            integration.completion_reward = reward;
        }
        if let Some(secs) = parse::<u64, _>(&lookup, "SCRIPT_ECHO_GRACE_SECS")? {
            integration.grace_period = Duration::from_secs(secs);
        }

        let session = &mut config.session;
        if let Some(n) = parse(&lookup, "SCRIPT_ECHO_MAX_PLAYERS")? {
            session.max_players = n;
        }
        if let Some(n) = parse(&lookup, "SCRIPT_ECHO_MIN_PLAYERS")? {
            session.min_players = n;
        }
        if let Some(price) = parse_money(&lookup, "SCRIPT_ECHO_SEAT_PRICE")? {
            session.price = price;
        }
        if let Some(pct) = parse_percent(&lookup, "SCRIPT_ECHO_HOST_SHARE_PCT")? {
            session.host_share = pct;
        }
        if let Some(pct) = parse_percent(&lookup, "SCRIPT_ECHO_PLATFORM_SHARE_PCT")? {
            session.platform_share = pct;
        }
        config.session.validate()?;

        Ok(config)
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

/// Whole currency units; negative or out-of-range amounts are rejected.
fn parse_money<F>(lookup: &F, key: &'static str) -> Result<Option<Money>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(units) = parse::<i64, _>(lookup, key)? else {
        return Ok(None);
    };
    if units < 0 {
        return Err(invalid(lookup, key));
    }
    Money::checked_from_int(units).map(Some).ok_or_else(|| invalid(lookup, key))
}

/// Whole percent in `0..=100`.
fn parse_percent<F>(lookup: &F, key: &'static str) -> Result<Option<Percent>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse::<u32, _>(lookup, key)? {
        None => Ok(None),
        Some(pct) => Percent::checked_from_whole(pct).map(Some).ok_or_else(|| invalid(lookup, key)),
    }
}

fn invalid<F>(lookup: &F, key: &'static str) -> ConfigError
where
    F: Fn(&str) -> Option<String>,
{
    ConfigError::InvalidValue { key, value: lookup(key).unwrap_or_default() }
}

fn parse_flag<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(None),
        Some("1") | Some("true") => Ok(Some(true)),
        Some("0") | Some("false") => Ok(Some(false)),
        Some(other) => Err(ConfigError::InvalidValue { key, value: other.to_string() }),
    }
}
