//! Game settings and preferences
//!
//! Persisted separately from high scores through the same key-value store.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::persistence::{KeyValueStore, load_json, save_json};

/// Difficulty curve tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Difficulty {
    /// Spawn interval at t = 0 (ms)
    pub base_interval_ms: f32,
    /// Interval shrink per second of play (ms)
    pub interval_decay_per_sec: f32,
    /// Interval floor (ms)
    pub min_interval_ms: f32,
    /// Largest spawn batch
    pub max_batch: u32,
    /// Fall speed at t = 0 (units per tick)
    pub base_speed: f32,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            base_interval_ms: BASE_SPAWN_INTERVAL_MS,
            interval_decay_per_sec: SPAWN_DECAY_MS_PER_SEC,
            min_interval_ms: MIN_SPAWN_INTERVAL_MS,
            max_batch: MAX_BATCH,
            base_speed: BASE_SPEED,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,

    // === Session ===
    /// Countdown length in seconds (None = play until stopped)
    pub session_secs: Option<u32>,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
    /// Pause when the tab is hidden
    pub pause_on_blur: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            session_secs: Some(SESSION_SECS),

            // Audio
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            pause_on_blur: true,
        }
    }
}

/// Smallest spawn interval we accept from a settings file
const MIN_INTERVAL_FLOOR_MS: f32 = 50.0;

impl Settings {
    /// Untimed variant of the defaults
    pub fn untimed() -> Self {
        Self {
            session_secs: None,
            ..Self::default()
        }
    }

    /// Clamp every value into a playable range
    pub fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);

        let d = &mut self.difficulty;
        d.min_interval_ms = d.min_interval_ms.max(MIN_INTERVAL_FLOOR_MS);
        d.base_interval_ms = d.base_interval_ms.max(d.min_interval_ms);
        d.interval_decay_per_sec = d.interval_decay_per_sec.max(0.0);
        d.max_batch = d.max_batch.clamp(1, MAX_BATCH);
        d.base_speed = d.base_speed.clamp(0.1, STRIKE_ZONE_END - STRIKE_ZONE_START - 1.0);

        self.session_secs = self.session_secs.map(|s| s.max(1));
        self
    }

    /// Effective sound effect volume (0 when muted)
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Storage key
    pub const STORAGE_KEY: &'static str = "robot_runner_settings";

    /// Load settings, falling back to defaults on any failure
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json::<Settings>(store, Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings.sanitized()
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Failed to load settings ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Save settings; failures are logged and dropped
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match save_json(store, Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::speed;

    #[test]
    fn test_defaults_are_within_sanitized_ranges() {
        assert_eq!(Settings::default().sanitized(), Settings::default());
    }

    #[test]
    fn test_sanitize_clamps_out_of_range_values() {
        let mut s = Settings::default();
        s.master_volume = 3.0;
        s.sfx_volume = -1.0;
        s.difficulty.min_interval_ms = 0.0;
        s.difficulty.max_batch = 40;
        s.session_secs = Some(0);
        s.difficulty.base_speed = 500.0;
        let s = s.sanitized();
        assert_eq!(s.master_volume, 1.0);
        assert_eq!(s.sfx_volume, 0.0);
        assert_eq!(s.difficulty.min_interval_ms, MIN_INTERVAL_FLOOR_MS);
        assert_eq!(s.difficulty.max_batch, MAX_BATCH);
        assert_eq!(s.session_secs, Some(1));
        assert!(speed(&s.difficulty, 0.0) < STRIKE_ZONE_END - STRIKE_ZONE_START);
    }

    #[test]
    fn test_long_sessions_are_kept() {
        let mut s = Settings::default();
        s.session_secs = Some(600);
        assert_eq!(s.sanitized().session_secs, Some(600));
    }

    #[test]
    fn test_effective_volume_respects_mute() {
        let mut s = Settings::default();
        assert!((s.effective_volume() - 0.8).abs() < 1e-6);
        s.muted = true;
        assert_eq!(s.effective_volume(), 0.0);
    }

    #[test]
    fn test_load_falls_back_on_garbage() {
        let mut store = MemoryStore::new();
        store.set(Settings::STORAGE_KEY, "garbage").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut s = Settings::untimed();
        s.muted = true;
        s.save(&mut store);
        assert_eq!(Settings::load(&store), s);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut store = MemoryStore::new();
        store.set(Settings::STORAGE_KEY, r#"{"muted":true}"#).unwrap();
        let s = Settings::load(&store);
        assert!(s.muted);
        assert_eq!(s.session_secs, Some(SESSION_SECS));
    }
}
