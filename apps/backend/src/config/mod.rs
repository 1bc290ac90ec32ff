pub mod game;
pub mod hosted;
