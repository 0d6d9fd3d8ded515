//! Robot Runner - A four-lane arcade dodger
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, movement, scoring)
//! - `session`: Session lifecycle and fixed-cadence ticking
//! - `events`: Game events and the sink trait consumers implement
//! - `audio`: Procedural sound effects driven by game events
//! - `platform`: Browser/native differences (time, input keys)
//! - `persistence`: Key-value storage backends
//! - `highscores`: Top 10 leaderboard
//! - `settings`: Data-driven tuning and preferences

pub mod audio;
pub mod events;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

pub use events::{EventLog, EventSink, GameEvent};
pub use highscores::HighScores;
pub use session::Session;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation tick period (20 Hz)
    pub const TICK_MS: u32 = 50;
    /// Countdown tick period
    pub const COUNTDOWN_TICK_MS: u32 = 1000;
    /// Longest frame we will simulate at once (avoids a spiral of death)
    pub const MAX_FRAME_MS: u32 = 250;

    /// Number of lanes
    pub const LANE_COUNT: u8 = 4;
    /// Lane the runner starts in
    pub const START_LANE: u8 = 1;
    /// Horizontal screen position of each lane (percent of width)
    pub const LANE_SCREEN_X: [f32; LANE_COUNT as usize] = [12.5, 37.5, 62.5, 87.5];

    /// Spawn position of the first monster in a batch
    pub const SPAWN_POSITION: f32 = -10.0;
    /// Extra upward offset for each following monster in a batch
    pub const BATCH_STAGGER: f32 = 15.0;
    /// Strike zone start (inclusive)
    pub const STRIKE_ZONE_START: f32 = 70.0;
    /// Strike zone end (inclusive), pass zone begins past this
    pub const STRIKE_ZONE_END: f32 = 90.0;
    /// Past this point a monster resolves even when lined up with the runner
    pub const PASS_THRESHOLD: f32 = 95.0;
    /// Monsters at or beyond this position leave the field
    pub const DESPAWN_POSITION: f32 = 110.0;

    /// Score change for a single resolution
    pub const SCORE_STEP: i64 = 10;

    /// Default spawn tuning
    pub const BASE_SPAWN_INTERVAL_MS: f32 = 1500.0;
    pub const SPAWN_DECAY_MS_PER_SEC: f32 = 10.0;
    pub const MIN_SPAWN_INTERVAL_MS: f32 = 300.0;
    pub const MAX_BATCH: u32 = 3;
    /// Seconds of play per extra monster in a batch
    pub const BATCH_GROWTH_SECS: f32 = 50.0;

    /// Speed in position units per tick at t = 0
    pub const BASE_SPEED: f32 = 2.0;
    /// Seconds of play per +1 unit/tick of speed
    pub const SPEED_GROWTH_SECS: f32 = 10.0;

    /// Default timed session length
    pub const SESSION_SECS: u32 = 120;
}
