//! Application services sitting between the routes and the hosted backend.

pub mod game;
pub mod game_timer;
pub mod points;
pub mod team_names;

pub use game::{GameService, GameSnapshot, LoadedGame};
pub use game_timer::GameTimerController;
pub use points::{AwardForm, Me, PointsService};
pub use team_names::TeamNameCache;
