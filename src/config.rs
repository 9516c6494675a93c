//! Engine Configuration
//!
//! Defaults match the deployed tables. A JSON file can replace them and
//! `ARCADE_*` environment variables override individual fields.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::ids::AccountId;
use crate::game::variant::ExpiryPolicy;

/// Basis points in one whole.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    /// Height the ledger clock starts at.
    pub start_height: u64,
    /// Reveal window of single-player house games (ticks).
    pub house_reveal_window: u64,
    /// Join window and reveal window of two-player games (ticks).
    pub duel_reveal_window: u64,
    /// What happens to an unrevealed house game at expiry.
    pub house_expiry: ExpiryPolicy,
    /// Hot-potato countdown, reset by every take (ticks).
    pub hot_potato_timer: u64,
    /// Top-3 tournament split in basis points (first, second, third).
    /// Rounding dust goes to first place.
    pub top3_split_bps: [u64; 3],
    /// Bootstrap admin for scoreboard, lottery and cosmetics.
    /// When unset, the first `init-admin` caller claims each slot.
    pub admin: Option<AccountId>,
    /// Starting balances keyed by account (UUID string or label).
    pub genesis_balances: BTreeMap<String, u64>,
    /// Starting house bankroll for single-player games.
    pub house_bankroll: u64,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        Self {
            start_height: 0,
            house_reveal_window: 100,
            duel_reveal_window: 150,
            house_expiry: ExpiryPolicy::Refund,
            hot_potato_timer: 30,
            top3_split_bps: [5_000, 3_000, 2_000],
            admin: None,
            genesis_balances: BTreeMap::new(),
            house_bankroll: 0,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Environment variable has an unusable value.
    #[error("invalid value for {var}: {value}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// Values are inconsistent.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

impl ArcadeConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Apply `ARCADE_*` environment overrides on top of this config.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |var: &'static str| -> Result<Option<u64>, ConfigError> {
            match lookup(var) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| ConfigError::InvalidEnv { var, value }),
                None => Ok(None),
            }
        };

        if let Some(v) = number("ARCADE_START_HEIGHT")? {
            self.start_height = v;
        }
        if let Some(v) = number("ARCADE_HOUSE_REVEAL_WINDOW")? {
            self.house_reveal_window = v;
        }
        if let Some(v) = number("ARCADE_DUEL_REVEAL_WINDOW")? {
            self.duel_reveal_window = v;
        }
        if let Some(v) = number("ARCADE_HOT_POTATO_TIMER")? {
            self.hot_potato_timer = v;
        }
        if let Some(v) = number("ARCADE_HOUSE_BANKROLL")? {
            self.house_bankroll = v;
        }
        if let Some(value) = lookup("ARCADE_HOUSE_EXPIRY") {
            self.house_expiry = match value.trim() {
                "refund" => ExpiryPolicy::Refund,
                "forfeit" | "forfeit-to-house" => ExpiryPolicy::ForfeitToHouse,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        var: "ARCADE_HOUSE_EXPIRY",
                        value,
                    })
                }
            };
        }
        if let Some(value) = lookup("ARCADE_ADMIN") {
            // FromStr is infallible
            self.admin = value.trim().parse().ok();
        }

        self.validate()?;
        Ok(self)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.house_reveal_window == 0 || self.duel_reveal_window == 0 {
            return Err(ConfigError::Invalid("reveal windows must be at least one tick"));
        }
        if self.hot_potato_timer == 0 {
            return Err(ConfigError::Invalid("hot potato timer must be at least one tick"));
        }
        let split = self
            .top3_split_bps
            .iter()
            .try_fold(0u64, |total, bps| total.checked_add(*bps));
        if !matches!(split, Some(total) if total <= BPS_DENOMINATOR) {
            return Err(ConfigError::Invalid("top-3 split exceeds 10000 bps"));
        }
        Ok(())
    }

    /// Genesis balances resolved to account ids.
    pub fn genesis_accounts(&self) -> Vec<(AccountId, u64)> {
        self.genesis_balances
            .iter()
            .map(|(name, amount)| (name.parse().unwrap_or_default(), *amount))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_is_valid() {
        let config = ArcadeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.house_reveal_window, 100);
        assert_eq!(config.duel_reveal_window, 150);
        assert_eq!(config.hot_potato_timer, 30);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ARCADE_DUEL_REVEAL_WINDOW", "200"),
            ("ARCADE_HOUSE_EXPIRY", "forfeit"),
            ("ARCADE_ADMIN", "deployer"),
        ]
        .into_iter()
        .collect();

        let config = ArcadeConfig::default()
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.duel_reveal_window, 200);
        assert_eq!(config.house_expiry, ExpiryPolicy::ForfeitToHouse);
        assert_eq!(config.admin, Some(AccountId::from_label("deployer")));
    }

    #[test]
    fn test_bad_override_rejected() {
        let result = ArcadeConfig::default().with_overrides(|k| {
            (k == "ARCADE_HOT_POTATO_TIMER").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidEnv { var: "ARCADE_HOT_POTATO_TIMER", .. })));

        let zero = ArcadeConfig::default()
            .with_overrides(|k| (k == "ARCADE_HOT_POTATO_TIMER").then(|| "0".to_string()));
        assert!(matches!(zero, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_json_partial() {
        let config: ArcadeConfig = serde_json::from_str(
            r#"{ "house_bankroll": 5000000, "genesis_balances": { "wallet_1": 100 } }"#,
        )
        .unwrap();

        assert_eq!(config.house_bankroll, 5_000_000);
        assert_eq!(config.house_reveal_window, 100);
        assert_eq!(
            config.genesis_accounts(),
            vec![(AccountId::from_label("wallet_1"), 100)]
        );
    }

    #[test]
    fn test_split_over_whole_rejected() {
        let config = ArcadeConfig {
            top3_split_bps: [6_000, 3_000, 2_000],
            ..ArcadeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overflowing_split_rejected() {
        let config = ArcadeConfig {
            top3_split_bps: [u64::MAX, 1, 0],
            ..ArcadeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
