//! Fixed pacing of the game.
//!
//! One replay step is `INTER_SYMBOL_DELAY`, then the flash window
//! (`FLASH_DURATION`), then `POST_TONE_GAP` before the next step.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const INTER_SYMBOL_DELAY: Duration = Duration::from_millis(500);
pub const FLASH_DURATION: Duration = Duration::from_millis(300);
pub const POST_TONE_GAP: Duration = Duration::from_millis(100);
pub const POST_ROUND_PAUSE: Duration = Duration::from_millis(1_000);

/// Length of a button tone. Outlasts the flash window on purpose so the
/// tail rings into the gap.
pub const TONE_LENGTH: Duration = Duration::from_millis(500);
pub const TONE_PEAK_GAIN: f32 = 0.5;
pub const TONE_FLOOR_GAIN: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
    #[serde(with = "millis")]
    pub inter_symbol_delay: Duration,
    #[serde(with = "millis")]
    pub flash: Duration,
    #[serde(with = "millis")]
    pub post_tone_gap: Duration,
    #[serde(with = "millis")]
    pub post_round_pause: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            inter_symbol_delay: INTER_SYMBOL_DELAY,
            flash: FLASH_DURATION,
            post_tone_gap: POST_TONE_GAP,
            post_round_pause: POST_ROUND_PAUSE,
        }
    }
}

impl Timings {
    pub fn step(&self) -> Duration {
        self.inter_symbol_delay + self.flash + self.post_tone_gap
    }

    /// Time from the start of a replay until input is accepted.
    pub fn replay_length(&self, symbols: usize) -> Duration {
        self.step().saturating_mul(symbols.min(u32::MAX as usize) as u32)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
