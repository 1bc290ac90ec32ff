use crate::config::game::GameConfig;
use crate::repos::SharedPointsBackend;
use crate::services::{GameService, PointsService, TeamNameCache};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Hosted points service (or an in-memory stand-in for tests)
    pub backend: SharedPointsBackend,
    pub points: PointsService,
    pub game: GameService,
    pub game_config: GameConfig,
}

impl AppState {
    pub fn new(backend: SharedPointsBackend, game_config: GameConfig, device_id: String) -> Self {
        let team_names = TeamNameCache::new(backend.clone());
        Self {
            points: PointsService::new(backend.clone(), team_names, device_id),
            game: GameService::new(backend.clone(), game_config),
            backend,
            game_config,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("game_config", &self.game_config)
            .field("device_id", &self.points.device_id())
            .finish_non_exhaustive()
    }
}
