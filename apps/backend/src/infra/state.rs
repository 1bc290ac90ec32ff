use std::sync::Arc;

use uuid::Uuid;

use crate::adapters::hosted_rest::HostedRestBackend;
use crate::config::game::GameConfig;
use crate::config::hosted::HostedServiceConfig;
use crate::error::AppError;
use crate::repos::SharedPointsBackend;
use crate::state::app_state::AppState;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    backend: Option<SharedPointsBackend>,
    hosted: Option<HostedServiceConfig>,
    game_config: GameConfig,
    device_id: Option<String>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            backend: None,
            hosted: None,
            game_config: GameConfig::default(),
            device_id: None,
        }
    }

    /// Use an already-built backend (tests pass an in-memory one here).
    pub fn with_backend(mut self, backend: SharedPointsBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Talk to the hosted service described by `config`.
    pub fn with_hosted(mut self, config: HostedServiceConfig) -> Self {
        self.hosted = Some(config);
        self
    }

    pub fn with_game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn build(self) -> Result<AppState, AppError> {
        let hosted_device = self.hosted.as_ref().map(|h| h.device_id.clone());

        let backend: SharedPointsBackend = match (self.backend, &self.hosted) {
            (Some(backend), _) => backend,
            (None, Some(config)) => Arc::new(HostedRestBackend::new(config)?),
            (None, None) => {
                return Err(AppError::config(
                    "no points backend configured: call with_backend or with_hosted",
                ))
            }
        };

        let device_id = self
            .device_id
            .or(hosted_device)
            .unwrap_or_else(|| format!("server-{}", Uuid::new_v4()));

        Ok(AppState::new(backend, self.game_config, device_id))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
