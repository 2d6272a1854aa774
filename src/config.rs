//! Game tuning and endpoints.
//!
//! Defaults reproduce the classic rules: four notes to start, one second
//! between notes, 5% faster each round down to 100 ms, 10 points per key.
//! The page may override any field by passing JSON to `mount`.

use serde::Deserialize;

use crate::error::{GameError, Result};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub initial_length: usize,
    pub base_speed_ms: f64,
    pub min_speed_ms: f64,
    /// Multiplier applied to the speed after each completed round.
    pub speed_factor: f64,
    pub reward: u32,
    /// Lead-in before the first round is played.
    pub start_delay_ms: u32,
    /// Pause between completing a round and hearing the next one.
    pub success_delay_ms: u32,
    pub tick_ms: u32,
    pub game_id: String,
    pub report_url: String,
    pub exit_url: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_length: 4,
            base_speed_ms: 1000.0,
            min_speed_ms: 100.0,
            speed_factor: 0.95,
            reward: 10,
            start_delay_ms: 1500,
            success_delay_ms: 2000,
            tick_ms: 1000,
            game_id: "1".to_string(),
            report_url: "http://127.0.0.1:8000/api/game-results".to_string(),
            exit_url: "http://127.0.0.1:8000/games".to_string(),
        }
    }
}

impl GameConfig {
    /// Parse overrides; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_length == 0 {
            return Err(GameError::Config("initial_length must be at least 1".into()));
        }
        if !self.base_speed_ms.is_finite() || !self.min_speed_ms.is_finite() {
            return Err(GameError::Config("speeds must be finite".into()));
        }
        if !(self.min_speed_ms > 0.0) {
            return Err(GameError::Config("min_speed_ms must be positive".into()));
        }
        if !(self.base_speed_ms >= self.min_speed_ms) {
            return Err(GameError::Config(format!(
                "base_speed_ms ({}) is below min_speed_ms ({})",
                self.base_speed_ms, self.min_speed_ms
            )));
        }
        if !(self.speed_factor > 0.0 && self.speed_factor <= 1.0) {
            return Err(GameError::Config(format!(
                "speed_factor must be in (0, 1], got {}",
                self.speed_factor
            )));
        }
        if self.tick_ms == 0 {
            return Err(GameError::Config("tick_ms must be positive".into()));
        }
        Ok(())
    }

    /// Speed for the round after one played at `speed_ms`.
    pub fn next_speed(&self, speed_ms: f64) -> f64 {
        (speed_ms * self.speed_factor).max(self.min_speed_ms)
    }
}

/// `user_id` from a `location.search` string (leading `?` optional).
/// Empty values count as present; only a missing parameter yields `None`.
pub fn user_id_from_query(search: &str) -> Option<String> {
    let query = search.strip_prefix('?').unwrap_or(search);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "user_id")
        .map(|(_, value)| value.into_owned())
}
