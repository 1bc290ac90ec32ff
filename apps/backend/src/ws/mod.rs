//! WebSocket game page.

pub mod game_session;
pub mod protocol;

pub use game_session::GameSession;
