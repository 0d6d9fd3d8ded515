//! Game state and core simulation types
//!
//! Everything a tick reads or writes lives here. RNG and timers are owned by the
//! session, so this state stays plain data.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, nothing ticking
    #[default]
    NotStarted,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Run ended, waiting for a name
    GameOver,
    /// Leaderboard after a score was submitted
    ViewHighScores,
}

impl GamePhase {
    /// Phases from which `start()` begins a new run
    pub fn can_start(self) -> bool {
        matches!(
            self,
            GamePhase::NotStarted | GamePhase::GameOver | GamePhase::ViewHighScores
        )
    }
}

/// One of the four fixed lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Lane(u8);

impl Lane {
    /// All lanes, left to right
    pub const ALL: [Lane; LANE_COUNT as usize] = [Lane(0), Lane(1), Lane(2), Lane(3)];

    /// Validate a raw lane index
    pub fn new(index: u8) -> Option<Self> {
        (index < LANE_COUNT).then_some(Lane(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Horizontal screen position (percent of width)
    pub fn screen_x(self) -> f32 {
        LANE_SCREEN_X[self.0 as usize]
    }

    /// Neighbouring lane to the left, if any
    pub fn left(self) -> Option<Self> {
        self.0.checked_sub(1).and_then(Lane::new)
    }

    /// Neighbouring lane to the right, if any
    pub fn right(self) -> Option<Self> {
        Lane::new(self.0 + 1)
    }
}

impl Default for Lane {
    fn default() -> Self {
        Lane(START_LANE)
    }
}

impl TryFrom<u8> for Lane {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Lane::new(index).ok_or_else(|| format!("lane {index} out of range"))
    }
}

impl From<Lane> for u8 {
    fn from(lane: Lane) -> u8 {
        lane.0
    }
}

/// Whether touching a monster hurts or helps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// Dodge it
    Harmful,
    /// Catch it
    Beneficial,
}

/// A falling monster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub id: u32,
    pub lane: Lane,
    /// Progress along the fall axis (negative = above the screen)
    pub position: f32,
    pub polarity: Polarity,
    /// Already counted toward the score; inert from then on
    pub resolved: bool,
}

impl Monster {
    pub fn new(id: u32, lane: Lane, position: f32, polarity: Polarity) -> Self {
        Self {
            id,
            lane,
            position,
            polarity,
            resolved: false,
        }
    }

    /// True once the monster has left the visible field
    pub fn is_off_screen(&self) -> bool {
        self.position >= DESPAWN_POSITION
    }
}

/// The player's runner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runner {
    pub lane: Lane,
}

/// Complete simulation state for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Current phase
    pub phase: GamePhase,
    /// Score (can go negative)
    pub score: i64,
    /// Simulation ticks played this run (only advances while Playing)
    pub time_ticks: u64,
    /// Milliseconds since the last spawn batch
    pub since_spawn_ms: u32,
    /// Seconds left on the countdown (None = untimed)
    pub time_left: Option<u32>,
    /// Player runner
    pub runner: Runner,
    /// Active monsters in spawn order
    pub monsters: Vec<Monster>,
    /// Next entity ID
    next_id: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(None)
    }
}

impl GameState {
    /// Fresh state; `session_secs` arms the countdown
    pub fn new(session_secs: Option<u32>) -> Self {
        Self {
            phase: GamePhase::NotStarted,
            score: 0,
            time_ticks: 0,
            since_spawn_ms: 0,
            time_left: session_secs,
            runner: Runner::default(),
            monsters: Vec::new(),
            next_id: 1,
        }
    }

    /// Clear everything a run accumulates, keeping the phase
    pub fn reset(&mut self, session_secs: Option<u32>) {
        let phase = self.phase;
        *self = Self::new(session_secs);
        self.phase = phase;
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Elapsed play time in seconds
    pub fn elapsed_secs(&self) -> f32 {
        (self.time_ticks as f64 * f64::from(TICK_MS) / 1000.0) as f32
    }

    /// Render-facing view of the current state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            runner_lane: self.runner.lane,
            runner_x: self.runner.lane.screen_x(),
            monsters: self
                .monsters
                .iter()
                .map(|m| MonsterView {
                    id: m.id,
                    lane: m.lane,
                    x: m.lane.screen_x(),
                    position: m.position,
                    polarity: m.polarity,
                    resolved: m.resolved,
                })
                .collect(),
            score: self.score,
            time_left: self.time_left,
            elapsed_secs: self.elapsed_secs(),
        }
    }
}

/// One monster as the renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterView {
    pub id: u32,
    pub lane: Lane,
    /// Horizontal screen position (percent)
    pub x: f32,
    /// Vertical progress (percent, may be negative)
    pub position: f32,
    pub polarity: Polarity,
    pub resolved: bool,
}

/// Per-frame snapshot for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub runner_lane: Lane,
    pub runner_x: f32,
    pub monsters: Vec<MonsterView>,
    pub score: i64,
    pub time_left: Option<u32>,
    pub elapsed_secs: f32,
}
