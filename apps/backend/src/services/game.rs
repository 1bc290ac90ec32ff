//! Game page setup: snapshot the caller's local team total and arm a timer.

use serde::Serialize;
use tracing::info;

use crate::config::game::GameConfig;
use crate::domain::{AccessToken, GameFrame, SessionState, UserIdentity};
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::repos::SharedPointsBackend;
use crate::services::game_timer::GameTimerController;

/// What the page shows right after loading, before the first start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub status: SessionState,
    pub points_total: i64,
    pub play_seconds: u32,
    pub frame: GameFrame,
}

/// A freshly initialized timer together with the total it was sized from.
#[derive(Debug)]
pub struct LoadedGame {
    pub points_total: i64,
    pub controller: GameTimerController,
}

impl LoadedGame {
    pub fn snapshot(&self) -> GameSnapshot {
        let frame = self.controller.frame();
        GameSnapshot {
            status: frame.status,
            points_total: self.points_total,
            play_seconds: frame.play_seconds,
            frame,
        }
    }
}

#[derive(Clone)]
pub struct GameService {
    backend: SharedPointsBackend,
    config: GameConfig,
}

impl GameService {
    pub fn new(backend: SharedPointsBackend, config: GameConfig) -> Self {
        Self { backend, config }
    }

    /// Read the caller's local total once and return a `ready` controller.
    ///
    /// Callers without a local team get `NotFound(LocalTeam)` and no controller.
    pub async fn load(
        &self,
        token: &AccessToken,
        user: &UserIdentity,
    ) -> Result<LoadedGame, DomainError> {
        let points_total = self
            .backend
            .local_total(token, user.id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::LocalTeam,
                    "You are not assigned to a local team yet.",
                )
            })?
            .max(0);

        let controller = GameTimerController::new(self.config.tick_interval);
        let play_seconds = controller.initialize(points_total);
        info!(user_id = %user.id, points_total, play_seconds, "game loaded");

        Ok(LoadedGame {
            points_total,
            controller,
        })
    }
}
