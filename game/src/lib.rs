pub mod color;
pub mod controller;
pub mod presenter;
pub mod remote_api;
pub mod rng;
pub mod settings;
pub mod sfx;
pub mod state;
pub mod terminal;
pub mod timing;

pub use color::Color;
pub use controller::GameController;
pub use state::{GameSnapshot, GameState};
