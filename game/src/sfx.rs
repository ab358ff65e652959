use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use engine::audio::{ToneShape, Voice};
use rodio::{OutputStream, Sink};
use thiserror::Error;
use tracing::{debug, info};

use crate::color::{COLOR_COUNT, Color};
use crate::presenter::TonePlayer;
use crate::timing::{TONE_FLOOR_GAIN, TONE_LENGTH, TONE_PEAK_GAIN};

pub const SAMPLE_RATE: u32 = 48_000;

/// Default tone volume (0.0..=1.0), applied on top of the tone's own gain.
pub const TONE_VOLUME: f32 = 0.8;

#[derive(Debug, Error)]
pub enum SfxError {
    #[error("no audio output device: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("could not open audio sink: {0}")]
    Sink(#[from] rodio::PlayError),
}

pub fn tone_shape(color: Color) -> ToneShape {
    ToneShape::new(color.frequency_hz(), TONE_LENGTH)
        .with_gain_ramp(TONE_PEAK_GAIN, TONE_FLOOR_GAIN)
}

/// Endless source backed by one [`Voice`].
///
/// The game thread never touches the voice directly: it bumps a shared trigger
/// counter, and the audio thread restarts the envelope when it sees a new value.
#[derive(Debug)]
pub struct ToneSource {
    voice: Voice,
    trigger: Arc<AtomicU64>,
    seen: u64,
}

impl ToneSource {
    pub fn new(voice: Voice, trigger: Arc<AtomicU64>) -> Self {
        let seen = trigger.load(Ordering::Acquire);
        Self {
            voice,
            trigger,
            seen,
        }
    }

    pub fn voice(&self) -> &Voice {
        &self.voice
    }
}

impl Iterator for ToneSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.trigger.load(Ordering::Acquire);
        if current != self.seen {
            self.seen = current;
            self.voice.trigger();
        }
        Some(self.voice.next_sample())
    }
}

impl rodio::Source for ToneSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.voice.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Per-color trigger counters shared with the audio thread.
#[derive(Debug, Clone, Default)]
pub struct ToneTriggers {
    counters: [Arc<AtomicU64>; COLOR_COUNT],
}

impl ToneTriggers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self, color: Color, sample_rate: u32) -> ToneSource {
        ToneSource::new(
            Voice::new(sample_rate, tone_shape(color)),
            Arc::clone(&self.counters[color.index()]),
        )
    }

    pub fn fire(&self, color: Color) {
        self.counters[color.index()].fetch_add(1, Ordering::Release);
    }

    pub fn count(&self, color: Color) -> u64 {
        self.counters[color.index()].load(Ordering::Acquire)
    }
}

/// Plays button tones on the default output device.
///
/// Each color gets one sink fed by one endless [`ToneSource`] for the life of
/// the player; `play` only retriggers it.
pub struct RodioTonePlayer {
    _stream: OutputStream,
    // Dropping a sink silences its voice.
    _sinks: Vec<Sink>,
    triggers: ToneTriggers,
}

impl RodioTonePlayer {
    pub fn new(volume: f32) -> Result<Self, SfxError> {
        let (stream, handle) = OutputStream::try_default()?;
        let triggers = ToneTriggers::new();
        let mut sinks = Vec::with_capacity(COLOR_COUNT);
        for color in Color::ALL {
            let sink = Sink::try_new(&handle)?;
            sink.set_volume(volume.clamp(0.0, 1.0));
            sink.append(triggers.source(color, SAMPLE_RATE));
            sinks.push(sink);
        }
        info!(volume, "audio output ready");
        Ok(Self {
            _stream: stream,
            _sinks: sinks,
            triggers,
        })
    }
}

impl TonePlayer for RodioTonePlayer {
    fn play(&mut self, color: Color) {
        debug!(%color, "tone");
        self.triggers.fire(color);
    }
}
