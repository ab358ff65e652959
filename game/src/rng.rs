use crate::color::{COLOR_COUNT, Color};

/// Supplies the next color appended to the target sequence.
pub trait ColorSource {
    fn next_color(&mut self) -> Color;
}

/// Golden-ratio increment; also stands in for a zero seed, which would pin
/// xorshift at zero forever.
const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;
const OUTPUT_MUL: u64 = 0x2545_F491_4F6C_DD1D;

/// Seedable color generator for the target sequence.
///
/// Seeds usually come from the clock, so neighbouring seeds are common. The
/// seed is run through a splitmix finalizer before it becomes xorshift
/// state, which keeps games started a nanosecond apart from sharing a
/// sequence prefix. Each draw is uniform over the board and independent of
/// earlier draws; repeats are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRng {
    state: u64,
}

impl SequenceRng {
    pub fn new(seed: u64) -> Self {
        let state = match scramble(seed) {
            0 => SEED_MIX,
            mixed => mixed,
        };
        Self { state }
    }

    /// Advances the xorshift state and returns the multiplied output word.
    fn step(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(OUTPUT_MUL)
    }

    /// High half of the output word; the low bits of xorshift* are weak.
    pub fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    /// Uniform value in `0..bound` via multiply-shift range reduction.
    pub fn below(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0);
        ((self.next_u32() as u64 * bound as u64) >> 32) as usize
    }
}

fn scramble(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(SEED_MIX);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl ColorSource for SequenceRng {
    fn next_color(&mut self) -> Color {
        Color::ALL[self.below(COLOR_COUNT)]
    }
}
