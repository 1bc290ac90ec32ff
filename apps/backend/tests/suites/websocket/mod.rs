pub mod game_ws;
