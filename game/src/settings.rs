use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::sfx::TONE_VOLUME;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSettings {
    pub master_volume: f32,
    pub tone_volume: f32,
    pub mute_all: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            tone_volume: TONE_VOLUME,
            mute_all: false,
        }
    }
}

impl AudioSettings {
    pub fn clamp(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.tone_volume = self.tone_volume.clamp(0.0, 1.0);
        self
    }

    pub fn effective_tone_gain(self) -> f32 {
        if self.mute_all {
            0.0
        } else {
            self.master_volume * self.tone_volume
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub audio: AudioSettings,
    /// Fixed sequence seed. `None` seeds from the clock.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            audio: AudioSettings::default(),
            seed: None,
        }
    }
}

impl PlayerSettings {
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self.audio = self.audio.clamp();
        self
    }
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        Self::from_env_with(|name| std::env::var_os(name).map(PathBuf::from))
    }

    fn from_env_with<F>(mut get_env: F) -> Self
    where
        F: FnMut(&str) -> Option<PathBuf>,
    {
        if let Some(explicit) = get_env("SIMON_SETTINGS_PATH") {
            return Self::new(explicit);
        }

        let mut path = get_env("XDG_CONFIG_HOME")
            .or_else(|| get_env("HOME").map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("simon");
        path.push("settings.json");
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable settings fall back to defaults.
    pub fn load(&self) -> PlayerSettings {
        let Ok(bytes) = fs::read(&self.path) else {
            return PlayerSettings::default();
        };
        match serde_json::from_slice::<PlayerSettings>(&bytes) {
            Ok(settings) => settings.sanitized(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring malformed settings");
                PlayerSettings::default()
            }
        }
    }
}
