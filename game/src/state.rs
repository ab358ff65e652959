use serde::{Deserialize, Serialize};

use crate::color::Color;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameState {
    /// Nothing started yet.
    #[default]
    Idle,
    /// Replaying the sequence, or pausing before the next replay. Input is dropped.
    Presenting,
    AwaitingInput,
    /// Terminal until the next start.
    GameOver,
}

impl GameState {
    pub fn accepts_input(self) -> bool {
        matches!(self, GameState::AwaitingInput)
    }
}

/// Read-only view of a game, as handed to remote clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub state: GameState,
    pub sequence: Vec<Color>,
    pub player_input: Vec<Color>,
    pub score: u32,
    pub epoch: u64,
}
