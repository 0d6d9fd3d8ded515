//! Session lifecycle and fixed-cadence ticking
//!
//! `Session` owns everything a run needs: game state, RNG, tick timers,
//! leaderboard, storage and the event sink. Timers exist only while Playing;
//! every transition out of Playing releases them, so nothing can tick in any
//! other phase.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::events::{EventSink, GameEvent};
use crate::highscores::{HighScores, clean_name};
use crate::persistence::KeyValueStore;
use crate::platform::{InputAction, now_ms};
use crate::settings::Settings;
use crate::sim::{GamePhase, GameState, Lane, Snapshot, tick};

/// Converts elapsed milliseconds into whole fixed-period ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticker {
    period_ms: u32,
    accumulator_ms: u32,
}

impl Ticker {
    pub fn new(period_ms: u32) -> Self {
        Self::with_carry(period_ms, 0)
    }

    /// Resume with a partial period already elapsed
    pub fn with_carry(period_ms: u32, carry_ms: u32) -> Self {
        let period_ms = period_ms.max(1);
        Self {
            period_ms,
            accumulator_ms: carry_ms % period_ms,
        }
    }

    /// Add elapsed time, returning how many periods completed
    pub fn advance(&mut self, dt_ms: u32) -> u32 {
        let total = self.accumulator_ms + dt_ms;
        self.accumulator_ms = total % self.period_ms;
        total / self.period_ms
    }

    /// Time into the current period
    pub fn carry_ms(&self) -> u32 {
        self.accumulator_ms
    }

    /// Time until the next period completes
    pub fn until_next(&self) -> u32 {
        self.period_ms - self.accumulator_ms
    }
}

/// Partial periods saved across a pause
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TimerCarry {
    sim_ms: u32,
    countdown_ms: u32,
}

/// Tick timers held while Playing
#[derive(Debug)]
struct Timers {
    sim: Ticker,
    countdown: Option<Ticker>,
}

impl Timers {
    fn acquire(carry: TimerCarry, timed: bool) -> Self {
        Self {
            sim: Ticker::with_carry(TICK_MS, carry.sim_ms),
            countdown: timed.then(|| Ticker::with_carry(COUNTDOWN_TICK_MS, carry.countdown_ms)),
        }
    }

    fn release(self) -> TimerCarry {
        TimerCarry {
            sim_ms: self.sim.carry_ms(),
            countdown_ms: self.countdown.map(|c| c.carry_ms()).unwrap_or(0),
        }
    }
}

/// A player's session: title screen, runs, pauses, game over and leaderboard
pub struct Session {
    state: GameState,
    settings: Settings,
    rng: Pcg32,
    timers: Option<Timers>,
    carry: TimerCarry,
    high_scores: HighScores,
    store: Box<dyn KeyValueStore>,
    sink: Box<dyn EventSink>,
    /// Scratch buffer for events produced by a tick
    pending: Vec<GameEvent>,
}

impl Session {
    /// Create a session; high scores are loaded from `store` right away
    pub fn new(
        settings: Settings,
        seed: u64,
        store: Box<dyn KeyValueStore>,
        sink: Box<dyn EventSink>,
    ) -> Self {
        let settings = settings.sanitized();
        let high_scores = HighScores::load(&*store);
        Self {
            state: GameState::new(settings.session_secs),
            settings,
            rng: Pcg32::seed_from_u64(seed),
            timers: None,
            carry: TimerCarry::default(),
            high_scores,
            store,
            sink,
            pending: Vec::new(),
        }
    }

    /// Create a session using settings saved in `store`
    pub fn from_store(store: Box<dyn KeyValueStore>, sink: Box<dyn EventSink>, seed: u64) -> Self {
        let settings = Settings::load(&*store);
        Self::new(settings, seed, store, sink)
    }

    // === Queries ===

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn score(&self) -> i64 {
        self.state.score
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        &*self.store
    }

    /// Render-facing view of the current state
    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// True while tick timers are held (only ever while Playing)
    pub fn timers_active(&self) -> bool {
        self.timers.is_some()
    }

    fn is_timed(&self) -> bool {
        self.settings.session_secs.is_some()
    }

    // === Lifecycle ===

    /// Begin a new run from the title screen, game over or leaderboard
    pub fn start(&mut self) {
        if !self.state.phase.can_start() {
            log::debug!("start ignored in {:?}", self.state.phase);
            return;
        }
        self.reset();
        self.state.phase = GamePhase::Playing;
        self.timers = Some(Timers::acquire(self.carry, self.is_timed()));
        log::info!("Run started ({:?}s)", self.settings.session_secs);
        self.emit(GameEvent::Started);
    }

    pub fn pause(&mut self) {
        if self.state.phase != GamePhase::Playing {
            return;
        }
        self.release_timers();
        self.state.phase = GamePhase::Paused;
        log::info!("Paused at {:.2}s", self.state.elapsed_secs());
        self.emit(GameEvent::Paused);
    }

    pub fn resume(&mut self) {
        if self.state.phase != GamePhase::Paused {
            return;
        }
        self.state.phase = GamePhase::Playing;
        self.timers = Some(Timers::acquire(self.carry, self.is_timed()));
        log::info!("Resumed");
        self.emit(GameEvent::Resumed);
    }

    pub fn toggle_pause(&mut self) {
        match self.state.phase {
            GamePhase::Playing => self.pause(),
            GamePhase::Paused => self.resume(),
            _ => {}
        }
    }

    /// Abandon whatever is happening and return to the title screen
    pub fn stop(&mut self) {
        self.timers = None;
        self.reset();
        self.state.phase = GamePhase::NotStarted;
        log::info!("Stopped");
        self.emit(GameEvent::Stopped);
    }

    /// End the current run early
    pub fn end(&mut self) {
        if matches!(self.state.phase, GamePhase::Playing | GamePhase::Paused) {
            self.game_over();
        }
    }

    fn game_over(&mut self) {
        self.timers = None;
        self.carry = TimerCarry::default();
        self.state.phase = GamePhase::GameOver;
        let score = self.state.score;
        log::info!(
            "Game over: score {} after {:.1}s",
            score,
            self.state.elapsed_secs()
        );
        self.emit(GameEvent::GameOver { score });
    }

    fn release_timers(&mut self) {
        if let Some(timers) = self.timers.take() {
            self.carry = timers.release();
        }
    }

    fn reset(&mut self) {
        self.carry = TimerCarry::default();
        self.pending.clear();
        self.state.reset(self.settings.session_secs);
    }

    /// Submit the finished run under `name`
    ///
    /// Only valid in GameOver with a non-blank name; anything else is ignored
    /// and returns false.
    pub fn finalize_score(&mut self, name: &str) -> bool {
        if self.state.phase != GamePhase::GameOver {
            return false;
        }
        let Some(name) = clean_name(name) else {
            log::debug!("Rejected blank high score name");
            return false;
        };

        let score = self.state.score;
        let rank = self.high_scores.add_score(name, score, now_ms());
        self.high_scores.save(&mut *self.store);
        log::info!("Score {} submitted, rank {:?}", score, rank);

        self.state.phase = if self.is_timed() {
            GamePhase::ViewHighScores
        } else {
            GamePhase::NotStarted
        };
        self.emit(GameEvent::ScoreSaved { rank });
        true
    }

    /// Replace settings; session length applies from the next run, audio
    /// settings reach the sink right away
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        self.sink.apply_settings(&self.settings);
        self.settings.save(&mut *self.store);
    }

    // === Input ===

    /// Move the runner to lane `index`; ignored unless Playing or out of range
    pub fn select_lane(&mut self, index: u8) {
        if self.state.phase != GamePhase::Playing {
            return;
        }
        let Some(lane) = Lane::new(index) else {
            return;
        };
        if lane != self.state.runner.lane {
            self.state.runner.lane = lane;
            self.emit(GameEvent::Move { lane });
        }
    }

    /// Apply a decoded key press
    pub fn handle(&mut self, action: InputAction) {
        let lane = self.state.runner.lane;
        match action {
            InputAction::SelectLane(index) => self.select_lane(index),
            InputAction::StepLeft => {
                if let Some(left) = lane.left() {
                    self.select_lane(left.index());
                }
            }
            InputAction::StepRight => {
                if let Some(right) = lane.right() {
                    self.select_lane(right.index());
                }
            }
            InputAction::TogglePause => self.toggle_pause(),
            InputAction::Start => self.start(),
            InputAction::Stop => self.stop(),
        }
    }

    // === Ticking ===

    /// Feed elapsed wall-clock time; runs whole simulation and countdown ticks
    ///
    /// Time is consumed up to whichever timer fires next, so a countdown that
    /// expires mid-frame stops the simulation at that exact tick.
    pub fn update(&mut self, dt_ms: u32) {
        let mut remaining = dt_ms.min(MAX_FRAME_MS);
        while remaining > 0 && self.state.phase == GamePhase::Playing {
            let Some(timers) = self.timers.as_mut() else {
                return;
            };
            let step = timers
                .countdown
                .as_ref()
                .map_or(remaining, |c| c.until_next().min(remaining))
                .min(timers.sim.until_next());
            remaining -= step;

            let sim_fired = timers.sim.advance(step) > 0;
            let countdown_fired = timers.countdown.as_mut().is_some_and(|c| c.advance(step) > 0);

            if sim_fired {
                tick(
                    &mut self.state,
                    &self.settings.difficulty,
                    &mut self.rng,
                    &mut self.pending,
                );
                self.flush_events();
            }
            if countdown_fired {
                self.count_down();
            }
        }
    }

    fn count_down(&mut self) {
        if let Some(left) = self.state.time_left.as_mut() {
            *left = left.saturating_sub(1);
            if *left == 0 {
                self.game_over();
            }
        }
    }

    fn emit(&mut self, event: GameEvent) {
        self.sink.emit(&event);
    }

    fn flush_events(&mut self) {
        for event in self.pending.drain(..) {
            self.sink.emit(&event);
        }
    }
}
