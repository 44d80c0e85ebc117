use serde::{Deserialize, Serialize};
use crate::log::DEFAULT_LOG_CAPACITY;

/// The most players a 15-card deck can seat with two cards each and cards to spare.
pub const MAX_SEATS: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub min_players: usize,
    pub max_players: usize,
    pub starting_coins: u32,
    pub starting_cards: usize,
    pub log_capacity: usize,
    pub room_code_length: usize,
    pub room_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            min_players: 2,
            max_players: MAX_SEATS,
            starting_coins: 2,
            starting_cards: 2,
            log_capacity: DEFAULT_LOG_CAPACITY,
            room_code_length: 6,
            room_ttl_secs: 30 * 60,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

impl Config {
    /// Parses a (possibly partial) JSON document; missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players < 2 {
            return Err(ConfigError::Invalid("min_players must be at least 2"));
        }
        if self.max_players > MAX_SEATS {
            return Err(ConfigError::Invalid("max_players cannot exceed 6"));
        }
        if self.min_players > self.max_players {
            return Err(ConfigError::Invalid("min_players cannot exceed max_players"));
        }
        if self.starting_cards == 0 {
            return Err(ConfigError::Invalid("starting_cards must be at least 1"));
        }
        if self.room_code_length == 0 {
            return Err(ConfigError::Invalid("room_code_length must be at least 1"));
        }
        Ok(())
    }
}
