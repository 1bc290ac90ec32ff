use std::env;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_TICK_MS: u64 = 1_000;

/// Game page settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// Wall-clock length of one countdown second
    pub tick_interval: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }
}

impl GameConfig {
    /// Reads the optional `GAME_TICK_MS` (must be positive).
    pub fn from_env() -> Result<Self, AppError> {
        let Ok(raw) = env::var("GAME_TICK_MS") else {
            return Ok(Self::default());
        };
        match raw.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(Self {
                tick_interval: Duration::from_millis(ms),
            }),
            _ => Err(AppError::config(format!(
                "GAME_TICK_MS must be a positive number of milliseconds, got: '{raw}'"
            ))),
        }
    }
}
