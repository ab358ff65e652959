use std::f32::consts::TAU;
use std::time::Duration;

/// Shape of a single percussive sine tone: a fixed pitch whose gain starts at
/// `peak_gain` and decays exponentially to `floor_gain` over `length`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneShape {
    pub frequency_hz: f32,
    pub length: Duration,
    pub peak_gain: f32,
    pub floor_gain: f32,
    pub attack: Duration,
}

impl ToneShape {
    pub fn new(frequency_hz: f32, length: Duration) -> Self {
        Self {
            frequency_hz: frequency_hz.max(0.0),
            length,
            peak_gain: 0.5,
            floor_gain: 0.01,
            attack: Duration::from_millis(5),
        }
    }

    pub fn with_gain_ramp(mut self, peak_gain: f32, floor_gain: f32) -> Self {
        self.peak_gain = peak_gain.clamp(0.0, 1.0);
        // An exponential ramp cannot reach zero.
        self.floor_gain = floor_gain.clamp(1e-4, self.peak_gain.max(1e-4));
        self
    }

    pub fn with_attack(mut self, attack: Duration) -> Self {
        self.attack = attack;
        self
    }

    /// Gain at `t` seconds into the tone, `0.0` once the tone has ended.
    pub fn gain_at(&self, t: f32) -> f32 {
        let length = self.length.as_secs_f32();
        if length <= 0.0 || t < 0.0 || t >= length {
            return 0.0;
        }
        let ratio = self.floor_gain / self.peak_gain.max(1e-4);
        let ramp = self.peak_gain * ratio.powf(t / length);
        let attack = self.attack.as_secs_f32();
        if attack > 0.0 && t < attack {
            ramp * (t / attack)
        } else {
            ramp
        }
    }
}

/// A retriggerable oscillator.
///
/// One voice is built per pitch and lives as long as the output it feeds.
/// [`Voice::trigger`] restarts the envelope in place, so a tone can be played
/// any number of times without allocating a new synthesis graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    shape: ToneShape,
    sample_rate: u32,
    phase: f32,
    position: Option<u64>,
    length_samples: u64,
    triggers: u64,
}

impl Voice {
    pub fn new(sample_rate: u32, shape: ToneShape) -> Self {
        let sample_rate = sample_rate.max(1);
        let length_samples = (shape.length.as_secs_f64() * sample_rate as f64).round() as u64;
        Self {
            shape,
            sample_rate,
            phase: 0.0,
            position: None,
            length_samples,
            triggers: 0,
        }
    }

    pub fn shape(&self) -> &ToneShape {
        &self.shape
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Starts the tone from the top, cutting off any tail still sounding.
    pub fn trigger(&mut self) {
        self.phase = 0.0;
        self.position = Some(0);
        self.triggers = self.triggers.saturating_add(1);
    }

    pub fn trigger_count(&self) -> u64 {
        self.triggers
    }

    pub fn is_sounding(&self) -> bool {
        self.position.is_some()
    }

    pub fn next_sample(&mut self) -> f32 {
        let Some(pos) = self.position else {
            return 0.0;
        };
        if pos >= self.length_samples {
            self.position = None;
            return 0.0;
        }

        let t = pos as f32 / self.sample_rate as f32;
        let gain = self.shape.gain_at(t);
        let sample = self.phase.sin() * gain;

        let phase_delta = TAU * self.shape.frequency_hz / self.sample_rate as f32;
        self.phase = (self.phase + phase_delta) % TAU;
        self.position = Some(pos + 1);
        sample
    }
}
