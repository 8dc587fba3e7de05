//! Economy configuration loading from config.toml
//!
//! Prize sizes, reward amounts, withdrawal policy and the achievement catalogue all
//! come from one TOML file. Every section has defaults so a partial file is valid.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EconomyConfig {
    /// Daily competition settings
    #[serde(default)]
    pub competition: CompetitionSettings,
    /// Points granted for engagement events
    #[serde(default)]
    pub rewards: RewardSettings,
    /// Withdrawal thresholds and conversion
    #[serde(default)]
    pub withdrawal: WithdrawalPolicy,
    /// Achievement catalogue to seed
    #[serde(default)]
    pub achievements: Vec<AchievementConfig>,
}

/// Daily competition settings
#[derive(Debug, Clone, Deserialize)]
pub struct CompetitionSettings {
    /// Points credited to each period's winner
    #[serde(default = "default_prize_points")]
    pub prize_points: i64,
    /// How often the background task checks whether yesterday needs settling
    #[serde(default = "default_settlement_interval_secs")]
    pub settlement_interval_secs: u64,
}

impl Default for CompetitionSettings {
    fn default() -> Self {
        Self {
            prize_points: default_prize_points(),
            settlement_interval_secs: default_settlement_interval_secs(),
        }
    }
}

/// Points granted for engagement events
#[derive(Debug, Clone, Deserialize)]
pub struct RewardSettings {
    /// Credited to a video's author per like received
    #[serde(default = "default_like_points")]
    pub like_points: i64,
    /// Credited per uploaded video, 0 disables the reward
    #[serde(default)]
    pub video_upload_points: i64,
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self {
            like_points: default_like_points(),
            video_upload_points: 0,
        }
    }
}

/// Withdrawal thresholds and conversion
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalPolicy {
    /// Smallest withdrawal accepted
    #[serde(default = "default_minimum_points")]
    pub minimum_points: i64,
    /// Withdrawals at or above this amount require premium status
    #[serde(default = "default_premium_threshold_points")]
    pub premium_threshold_points: i64,
    /// Points per one unit of payout currency
    #[serde(default = "default_points_per_unit")]
    pub points_per_unit: i64,
}

impl Default for WithdrawalPolicy {
    fn default() -> Self {
        Self {
            minimum_points: default_minimum_points(),
            premium_threshold_points: default_premium_threshold_points(),
            points_per_unit: default_points_per_unit(),
        }
    }
}

/// Configuration for a single achievement
#[derive(Debug, Clone, Deserialize)]
pub struct AchievementConfig {
    /// Stable key, used to match existing rows when reseeding
    pub code: String,
    /// Progress category
    pub category: String,
    /// Display title
    pub title: String,
    /// Progress value that completes the achievement
    pub target_value: i64,
    /// Points awarded on completion
    pub reward_points: i64,
}

const fn default_prize_points() -> i64 {
    1_000
}

const fn default_settlement_interval_secs() -> u64 {
    15 * 60
}

const fn default_like_points() -> i64 {
    1
}

const fn default_minimum_points() -> i64 {
    100_000
}

const fn default_premium_threshold_points() -> i64 {
    1_000_000
}

const fn default_points_per_unit() -> i64 {
    10_000
}

/// Loads economy configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML is invalid, or the values are
/// inconsistent (see [`EconomyConfig::validate`]).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EconomyConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    let config: EconomyConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads economy configuration from `CONFIG_PATH`, or ./config.toml when unset
pub fn load_default_config() -> Result<EconomyConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}

impl EconomyConfig {
    /// Rejects values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::Config { message });

        if self.competition.prize_points <= 0 {
            return invalid("competition.prize_points must be positive".to_string());
        }
        if self.withdrawal.points_per_unit <= 0 {
            return invalid("withdrawal.points_per_unit must be positive".to_string());
        }
        if self.withdrawal.minimum_points <= 0 {
            return invalid("withdrawal.minimum_points must be positive".to_string());
        }
        for achievement in &self.achievements {
            if achievement.target_value <= 0 || achievement.reward_points < 0 {
                return invalid(format!(
                    "achievement '{}' needs a positive target and a non-negative reward",
                    achievement.code
                ));
            }
        }
        Ok(())
    }
}
