use anyhow::{Context, Result};
use muz_model::PrepareOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "muz.json";

/// Gameplay settings shared by every session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    /// Base scroll speed
    pub noterate: f64,
    /// Scroll speed gained per combo step
    pub noterate_per_combo: f64,
    pub max_noterate: f64,
    /// How fast the scroll speed approaches its target
    pub noterate_gain_speed: f64,
    /// Split each update into steps of `aggressive_update_step` ms
    pub aggressive_update: bool,
    pub aggressive_update_step: u32,
    /// Advance time by the frame delta while the audio position is stalled
    pub interpolate_music_time: bool,
    pub start_paused: bool,
    pub start_autoplay: bool,
    /// Use a dedicated hold sound instead of the release sound
    pub use_hold_sound: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            noterate: 1.0,
            noterate_per_combo: 0.0,
            max_noterate: 3.0,
            noterate_gain_speed: 1.0,
            aggressive_update: false,
            aggressive_update_step: 1,
            interpolate_music_time: true,
            start_paused: true,
            start_autoplay: false,
            use_hold_sound: false,
        }
    }
}

impl GameConfig {
    /// Loads config from a specified path.
    /// Returns default config if file doesn't exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config.sanitized())
    }

    /// Saves config to a specified path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn sanitized(mut self) -> Self {
        if self.aggressive_update_step == 0 {
            log::warn!("aggressiveUpdateStep must be at least 1 ms, using 1");
            self.aggressive_update_step = 1;
        }
        if self.max_noterate < 0.0 {
            log::warn!("maxNoterate is negative, using 0");
            self.max_noterate = 0.0;
        }
        self
    }
}

/// Options for a single play session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayOptions {
    /// Song position to start from, in ms
    pub start_from: i64,
    /// Restart after playing this many ms (0 = off)
    pub loop_limit: i64,
    /// Restart on any combo break
    pub fc_run: bool,
    /// Restart on anything below Perfect
    pub perfect_run: bool,
    pub autoplay: bool,
    pub prepare: PrepareOptions,
}

impl PlayOptions {
    pub fn restarts_on_combo_break(&self) -> bool {
        self.fc_run || self.perfect_run
    }
}
