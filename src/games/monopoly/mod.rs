//! Monopoly-style property trading game for 2-6 human or AI players.

pub mod ai;
pub mod board;
pub mod cards;
pub mod game;
pub mod landing;
pub mod lifecycle;
pub mod state;
mod turn;
pub mod types;

pub use game::Game;
pub use lifecycle::{rankings, Standing};
pub use state::GameState;
