//! Monster spawning and the difficulty curve
//!
//! Spawning is a pure function of elapsed play time, the caller's
//! "time since last spawn" accumulator and an RNG.

use rand::Rng;

use super::state::{Lane, Monster, Polarity};
use crate::consts::*;
use crate::settings::Difficulty;

/// Milliseconds between spawn batches at `elapsed_secs` into the run
pub fn spawn_interval_ms(difficulty: &Difficulty, elapsed_secs: f32) -> f32 {
    let decayed = difficulty.base_interval_ms - elapsed_secs * difficulty.interval_decay_per_sec;
    decayed.max(difficulty.min_interval_ms)
}

/// Monsters per batch: one more every `BATCH_GROWTH_SECS`, capped at `max_batch`
pub fn batch_size(difficulty: &Difficulty, elapsed_secs: f32) -> u32 {
    let grown = (1.0 + elapsed_secs.max(0.0) / BATCH_GROWTH_SECS).floor() as u32;
    grown.clamp(1, difficulty.max_batch.max(1))
}

/// Emit a batch if the interval has elapsed, otherwise nothing.
///
/// The caller resets its accumulator to zero whenever this returns a
/// non-empty batch.
pub fn maybe_spawn<R, F>(
    difficulty: &Difficulty,
    elapsed_secs: f32,
    since_spawn_ms: u32,
    rng: &mut R,
    mut next_id: F,
) -> Vec<Monster>
where
    R: Rng + ?Sized,
    F: FnMut() -> u32,
{
    if (since_spawn_ms as f32) < spawn_interval_ms(difficulty, elapsed_secs) {
        return Vec::new();
    }

    let count = batch_size(difficulty, elapsed_secs);
    (0..count)
        .map(|i| {
            let lane = Lane::ALL[rng.random_range(0..LANE_COUNT as usize)];
            let polarity = if rng.random_bool(0.5) {
                Polarity::Harmful
            } else {
                Polarity::Beneficial
            };
            // Stagger batch members upward so they don't overlap
            let position = SPAWN_POSITION - i as f32 * BATCH_STAGGER;
            Monster::new(next_id(), lane, position, polarity)
        })
        .collect()
}
