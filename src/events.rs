//! Game events and the sink that consumes them
//!
//! Events are delivered synchronously, in the order they happen. Sinks are
//! fire-and-forget: they cannot fail or stall the simulation.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::audio::SoundEffect;
use crate::settings::Settings;
use crate::sim::Lane;

/// Something the outside world may want to react to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// Runner changed lane
    Move { lane: Lane },
    /// Runner collided with a harmful monster
    Hit { monster_id: u32 },
    /// Harmful monster dodged, or beneficial monster caught
    Avoid { monster_id: u32 },
    /// New run began
    Started,
    Paused,
    Resumed,
    /// Session returned to the title screen
    Stopped,
    /// Run ended with this score
    GameOver { score: i64 },
    /// Score submitted; rank is 1-based, None if it fell off the board
    ScoreSaved { rank: Option<usize> },
}

impl GameEvent {
    /// Sound to play for this event, if any
    pub fn sound(&self) -> Option<SoundEffect> {
        match self {
            GameEvent::Move { .. } => Some(SoundEffect::Move),
            GameEvent::Hit { .. } => Some(SoundEffect::Hit),
            GameEvent::Avoid { .. } => Some(SoundEffect::Avoid),
            _ => None,
        }
    }
}

/// Receiver of game events
pub trait EventSink {
    fn emit(&mut self, event: &GameEvent);

    /// Settings changed mid-session
    fn apply_settings(&mut self, _settings: &Settings) {}
}

impl EventSink for Vec<GameEvent> {
    fn emit(&mut self, event: &GameEvent) {
        self.push(event.clone());
    }
}

/// Sink that drops everything (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &GameEvent) {}
}

/// Shared, cloneable event recorder
///
/// Hand one clone to the session and keep another to inspect what was emitted.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Rc<RefCell<Vec<GameEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<GameEvent> {
        self.events.borrow().clone()
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<GameEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Number of recorded events matching `pred`
    pub fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &GameEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
