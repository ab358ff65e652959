use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of buttons on the board.
pub const COLOR_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Green,
    Red,
    Yellow,
    Blue,
}

impl Color {
    pub const ALL: [Color; COLOR_COUNT] = [Color::Green, Color::Red, Color::Yellow, Color::Blue];

    pub fn index(self) -> usize {
        match self {
            Color::Green => 0,
            Color::Red => 1,
            Color::Yellow => 2,
            Color::Blue => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Color> {
        Self::ALL.get(index).copied()
    }

    /// Pitch of the tone bound to this button (C major triad plus octave).
    pub fn frequency_hz(self) -> f32 {
        match self {
            Color::Green => 261.6,  // C4
            Color::Red => 329.6,    // E4
            Color::Yellow => 392.0, // G4
            Color::Blue => 523.2,   // C5
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Green => "green",
            Color::Red => "red",
            Color::Yellow => "yellow",
            Color::Blue => "blue",
        }
    }

    pub fn key(self) -> char {
        match self {
            Color::Green => 'g',
            Color::Red => 'r',
            Color::Yellow => 'y',
            Color::Blue => 'b',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown color: {0:?}")]
pub struct ColorParseError(pub String);

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Color::ALL
            .into_iter()
            .find(|c| c.name() == needle || needle.chars().eq(std::iter::once(c.key())))
            .ok_or_else(|| ColorParseError(s.to_string()))
    }
}
