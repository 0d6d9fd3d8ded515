//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering, audio or platform dependencies

pub mod spawn;
pub mod state;
pub mod tick;

pub use spawn::{batch_size, maybe_spawn, spawn_interval_ms};
pub use state::{GamePhase, GameState, Lane, Monster, MonsterView, Polarity, Runner, Snapshot};
pub use tick::{advance, speed, tick};
