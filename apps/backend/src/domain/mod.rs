//! Domain layer: game timer logic and the types shared with the hosted service.

pub mod game_timer;
pub mod points;

#[cfg(test)]
mod tests_props_game_timer;

// Re-exports for ergonomics
pub use game_timer::{play_seconds, render_frame, GameFrame, GameTimer, SessionState};
pub use points::{
    AccessToken, AwardReceipt, AwardRequest, Panel, Role, TeamId, Transaction, TransactionView,
    UserId, UserIdentity,
};
