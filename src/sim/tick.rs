//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use rand::Rng;

use super::spawn::maybe_spawn;
use super::state::{GamePhase, GameState, Lane, Monster, Polarity};
use crate::consts::*;
use crate::events::GameEvent;
use crate::settings::Difficulty;

/// Fall speed in position units per tick at `elapsed_secs` into the run
pub fn speed(difficulty: &Difficulty, elapsed_secs: f32) -> f32 {
    difficulty.base_speed + elapsed_secs.max(0.0) / SPEED_GROWTH_SECS
}

/// Score contribution of a monster at `new_position`, or None if it stays unresolved.
///
/// Lined up in the strike zone: harmful -10 (hit), beneficial +10 (caught).
/// A step that carries a monster from above the zone to below it in one tick
/// counts as passing through the zone.
/// Past the strike zone without a match, or past the pass threshold: harmful
/// +10 (dodged), beneficial 0 (missed, silent).
fn resolution(
    monster: &Monster,
    new_position: f32,
    runner_lane: Lane,
) -> Option<(i64, Option<GameEvent>)> {
    let id = monster.id;
    let lined_up = monster.lane == runner_lane;
    let in_zone = (STRIKE_ZONE_START..=STRIKE_ZONE_END).contains(&new_position);
    let jumped_zone = monster.position < STRIKE_ZONE_START && new_position > STRIKE_ZONE_END;

    if lined_up && (in_zone || jumped_zone) {
        return Some(match monster.polarity {
            Polarity::Harmful => (-SCORE_STEP, Some(GameEvent::Hit { monster_id: id })),
            Polarity::Beneficial => (SCORE_STEP, Some(GameEvent::Avoid { monster_id: id })),
        });
    }

    if new_position > STRIKE_ZONE_END && (!lined_up || new_position > PASS_THRESHOLD) {
        return Some(match monster.polarity {
            Polarity::Harmful => (SCORE_STEP, Some(GameEvent::Avoid { monster_id: id })),
            Polarity::Beneficial => (0, None),
        });
    }

    None
}

/// Move every monster by `speed`, resolve the ones that scored and drop the
/// ones that left the field. Returns the total score delta.
pub fn advance(
    monsters: &mut Vec<Monster>,
    runner_lane: Lane,
    speed: f32,
    events: &mut Vec<GameEvent>,
) -> i64 {
    let mut delta = 0;

    for monster in monsters.iter_mut() {
        let new_position = monster.position + speed;

        if !monster.resolved {
            if let Some((points, event)) = resolution(monster, new_position, runner_lane) {
                monster.resolved = true;
                delta += points;
                events.extend(event);
            }
        }

        monster.position = new_position;
    }

    monsters.retain(|m| !m.is_off_screen());
    delta
}

/// Advance the game state by one fixed timestep
///
/// Reads runner lane and elapsed time once up front so every monster in this
/// tick sees the same values. No-op unless Playing.
pub fn tick<R: Rng + ?Sized>(
    state: &mut GameState,
    difficulty: &Difficulty,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) {
    if state.phase != GamePhase::Playing {
        return;
    }

    let elapsed = state.elapsed_secs();
    let runner_lane = state.runner.lane;

    let delta = advance(
        &mut state.monsters,
        runner_lane,
        speed(difficulty, elapsed),
        events,
    );
    state.score += delta;

    state.since_spawn_ms = state.since_spawn_ms.saturating_add(TICK_MS);
    let since_spawn = state.since_spawn_ms;
    let batch = maybe_spawn(difficulty, elapsed, since_spawn, rng, || state.next_entity_id());
    if !batch.is_empty() {
        log::debug!(
            "t={:.2}s spawned {} monster(s), {} active",
            elapsed,
            batch.len(),
            state.monsters.len() + batch.len()
        );
        state.since_spawn_ms = 0;
        state.monsters.extend(batch);
    }

    state.time_ticks += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn lane(i: u8) -> Lane {
        Lane::new(i).unwrap()
    }

    fn harmful(id: u32, l: u8, position: f32) -> Monster {
        Monster::new(id, lane(l), position, Polarity::Harmful)
    }

    fn beneficial(id: u32, l: u8, position: f32) -> Monster {
        Monster::new(id, lane(l), position, Polarity::Beneficial)
    }

    fn playing_state() -> GameState {
        let mut state = GameState::new(None);
        state.phase = GamePhase::Playing;
        state
    }

    #[test]
    fn test_harmful_in_lane_hits() {
        let mut monsters = vec![harmful(1, 1, 73.0)];
        let mut events = Vec::new();
        let delta = advance(&mut monsters, lane(1), 2.0, &mut events);
        assert_eq!(delta, -10);
        assert_eq!(events, vec![GameEvent::Hit { monster_id: 1 }]);
        assert!(monsters[0].resolved);
        assert_eq!(monsters[0].position, 75.0);
    }

    #[test]
    fn test_harmful_in_other_lane_is_dodged_once() {
        let mut monsters = vec![harmful(1, 2, 94.0)];
        let mut events = Vec::new();
        let delta = advance(&mut monsters, lane(1), 2.0, &mut events);
        assert_eq!(delta, 10);
        assert_eq!(events, vec![GameEvent::Avoid { monster_id: 1 }]);

        // Later ticks never score it again
        let mut total = 0;
        while !monsters.is_empty() {
            total += advance(&mut monsters, lane(1), 2.0, &mut events);
        }
        assert_eq!(total, 0);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_beneficial_caught_in_strike_zone() {
        let mut monsters = vec![beneficial(4, 3, 80.0)];
        let mut events = Vec::new();
        let delta = advance(&mut monsters, lane(3), 5.0, &mut events);
        assert_eq!(delta, 10);
        assert_eq!(events, vec![GameEvent::Avoid { monster_id: 4 }]);
    }

    #[test]
    fn test_beneficial_missed_is_silent() {
        let mut monsters = vec![beneficial(4, 0, 89.0)];
        let mut events = Vec::new();
        let delta = advance(&mut monsters, lane(3), 2.0, &mut events);
        assert_eq!(delta, 0);
        assert!(events.is_empty());
        assert!(monsters[0].resolved);
    }

    #[test]
    fn test_lined_up_past_strike_zone_waits_for_pass_threshold() {
        // Runner stepped into the lane just after the strike window
        let mut monsters = vec![harmful(1, 1, 90.5)];
        let mut events = Vec::new();
        assert_eq!(advance(&mut monsters, lane(1), 2.0, &mut events), 0);
        assert!(!monsters[0].resolved);
        assert_eq!(advance(&mut monsters, lane(1), 2.0, &mut events), 0);
        assert!(!monsters[0].resolved);
        // 96.5 > 95: outran the zone
        assert_eq!(advance(&mut monsters, lane(1), 2.0, &mut events), 10);
        assert_eq!(events, vec![GameEvent::Avoid { monster_id: 1 }]);
    }

    #[test]
    fn test_strike_zone_bounds_are_inclusive() {
        let mut events = Vec::new();
        let mut at_start = vec![harmful(1, 0, 68.0)];
        assert_eq!(advance(&mut at_start, lane(0), 2.0, &mut events), -10);
        let mut at_end = vec![harmful(2, 0, 88.0)];
        assert_eq!(advance(&mut at_end, lane(0), 2.0, &mut events), -10);
        let mut before = vec![harmful(3, 0, 67.0)];
        assert_eq!(advance(&mut before, lane(0), 2.0, &mut events), 0);
        assert!(!before[0].resolved);
    }

    #[test]
    fn test_off_screen_monsters_are_dropped() {
        let mut monsters = vec![harmful(1, 0, 108.5), beneficial(2, 1, 10.0)];
        monsters[0].resolved = true;
        let mut events = Vec::new();
        advance(&mut monsters, lane(3), 2.0, &mut events);
        assert_eq!(monsters.len(), 1);
        assert_eq!(monsters[0].id, 2);
    }

    #[test]
    fn test_zone_jump_still_strikes_when_lined_up() {
        let d = Difficulty::default();
        let fast = speed(&d, 300.0);
        assert!(fast > STRIKE_ZONE_END - STRIKE_ZONE_START);

        let mut events = Vec::new();
        let mut monsters = vec![harmful(1, 2, 69.0), beneficial(2, 2, 60.0)];
        let delta = advance(&mut monsters, lane(2), fast, &mut events);
        assert_eq!(delta, 0);
        assert_eq!(
            events,
            vec![GameEvent::Hit { monster_id: 1 }, GameEvent::Avoid { monster_id: 2 }]
        );
    }

    #[test]
    fn test_leaving_zone_while_lined_up_still_waits_for_pass_threshold() {
        // Entered the lane while the monster was already inside the zone
        let mut monsters = vec![harmful(1, 1, 88.0)];
        let mut events = Vec::new();
        assert_eq!(advance(&mut monsters, lane(1), 4.0, &mut events), 0);
        assert!(!monsters[0].resolved);
        assert!(events.is_empty());
    }

    #[test]
    fn test_untimed_late_run_scores_hits() {
        let d = Difficulty::default();
        let mut state = playing_state();
        // 300 s into an untimed run
        state.time_ticks = 300 * 1000 / TICK_MS as u64;
        state.since_spawn_ms = 0;
        let id = state.next_entity_id();
        state.monsters.push(harmful(id, START_LANE, 69.0));
        let mut rng = Pcg32::seed_from_u64(3);
        let mut events = Vec::new();
        tick(&mut state, &d, &mut rng, &mut events);
        tick(&mut state, &d, &mut rng, &mut events);
        assert_eq!(events.iter().filter(|e| matches!(e, GameEvent::Hit { .. })).count(), 1);
        assert!(!events.iter().any(|e| *e == GameEvent::Avoid { monster_id: id }));
        assert_eq!(state.score, -SCORE_STEP);
    }

    #[test]
    fn test_unresolved_monster_dropped_after_resolving() {
        // Jumps straight from above the zone to off screen: still resolves first
        let mut monsters = vec![harmful(1, 2, 60.0)];
        let mut events = Vec::new();
        let delta = advance(&mut monsters, lane(0), 55.0, &mut events);
        assert_eq!(delta, 10);
        assert!(monsters.is_empty());
    }

    #[test]
    fn test_tick_only_runs_while_playing() {
        let mut state = GameState::new(None);
        state.monsters.push(harmful(1, 0, 0.0));
        let mut rng = Pcg32::seed_from_u64(1);
        let mut events = Vec::new();
        for phase in [GamePhase::NotStarted, GamePhase::Paused, GamePhase::GameOver] {
            state.phase = phase;
            tick(&mut state, &Difficulty::default(), &mut rng, &mut events);
        }
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.monsters[0].position, 0.0);
    }

    #[test]
    fn test_first_spawn_after_base_interval() {
        let mut state = playing_state();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut events = Vec::new();
        let d = Difficulty::default();
        for _ in 0..29 {
            tick(&mut state, &d, &mut rng, &mut events);
        }
        assert!(state.monsters.is_empty());
        tick(&mut state, &d, &mut rng, &mut events);
        assert_eq!(state.monsters.len(), 1);
        assert_eq!(state.monsters[0].position, SPAWN_POSITION);
        assert_eq!(state.since_spawn_ms, 0);
    }

    #[test]
    fn test_determinism() {
        let d = Difficulty::default();
        let run = || {
            let mut state = playing_state();
            let mut rng = Pcg32::seed_from_u64(99999);
            let mut events = Vec::new();
            for i in 0..2000u32 {
                if i % 37 == 0 {
                    state.runner.lane = lane((i / 37 % 4) as u8);
                }
                tick(&mut state, &d, &mut rng, &mut events);
            }
            (state.score, state.monsters, events)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_speed_stays_below_zone_width_for_default_session() {
        let d = Difficulty::default();
        let peak = speed(&d, SESSION_SECS as f32);
        assert!(peak < STRIKE_ZONE_END - STRIKE_ZONE_START);
    }

    proptest! {
        #[test]
        fn speed_is_monotonic(t1 in 0.0f32..10_000.0, dt in 0.0f32..10_000.0) {
            let d = Difficulty::default();
            prop_assert!(speed(&d, t1 + dt) >= speed(&d, t1));
            prop_assert!(speed(&d, t1) >= d.base_speed);
        }

        #[test]
        fn each_monster_scores_at_most_once(
            seed in any::<u64>(),
            lanes in proptest::collection::vec(0u8..4, 1..400),
        ) {
            let d = Difficulty::default();
            let mut state = playing_state();
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut events = Vec::new();
            for l in lanes {
                state.runner.lane = lane(l);
                tick(&mut state, &d, &mut rng, &mut events);
                prop_assert!(state.monsters.iter().all(|m| m.position < DESPAWN_POSITION));
            }
            let mut ids: Vec<u32> = events
                .iter()
                .filter_map(|e| match e {
                    GameEvent::Hit { monster_id } | GameEvent::Avoid { monster_id } => Some(*monster_id),
                    _ => None,
                })
                .collect();
            let scored = ids.len();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), scored);
        }
    }
}
