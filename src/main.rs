//! Robot Runner entry point
//!
//! Handles platform-specific initialization and runs the game loop.
//! The browser build renders from `snapshot_json()`; the native build runs a
//! headless autopilot round.

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use robot_runner::Session;
    use robot_runner::audio::AudioManager;
    use robot_runner::persistence::LocalStorageStore;
    use robot_runner::platform::{action_for_key, clock_seed};
    use robot_runner::settings::Settings;
    use robot_runner::sim::GamePhase;

    thread_local! {
        static SESSION: RefCell<Option<Session>> = const { RefCell::new(None) };
    }

    fn with_session<T>(f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        SESSION.with(|cell| cell.borrow_mut().as_mut().map(f))
    }

    /// Current frame as JSON for the page's renderer
    #[wasm_bindgen]
    pub fn snapshot_json() -> String {
        with_session(|s| serde_json::to_string(&s.snapshot()).ok())
            .flatten()
            .unwrap_or_default()
    }

    /// Leaderboard as JSON
    #[wasm_bindgen]
    pub fn high_scores_json() -> String {
        with_session(|s| serde_json::to_string(s.high_scores()).ok())
            .flatten()
            .unwrap_or_default()
    }

    /// Submit the finished run's score; false if the name was rejected
    #[wasm_bindgen]
    pub fn submit_score(name: &str) -> bool {
        with_session(|s| s.finalize_score(name)).unwrap_or(false)
    }

    fn request_animation_frame(f: &Closure<dyn FnMut(f64)>) {
        if let Some(window) = web_sys::window() {
            let _ = window.request_animation_frame(f.as_ref().unchecked_ref());
        }
    }

    fn setup_keyboard(window: &web_sys::Window) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            if let Some(action) = action_for_key(&event.key()) {
                event.prevent_default();
                with_session(|s| s.handle(action));
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_auto_pause(document: &web_sys::Document) {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() != web_sys::VisibilityState::Hidden {
                return;
            }
            with_session(|s| {
                if s.settings().pause_on_blur && s.phase() == GamePhase::Playing {
                    s.pause();
                    log::info!("Auto-paused (tab hidden)");
                }
            });
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn start_frame_loop() {
        let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
        let g = f.clone();
        let mut last_time: Option<f64> = None;
        // Sub-millisecond remainder carried between frames
        let mut frac_ms = 0.0;

        *g.borrow_mut() = Some(Closure::new(move |time: f64| {
            let dt = last_time.map_or(0.0, |last| (time - last).max(0.0)) + frac_ms;
            last_time = Some(time);
            let whole = dt.floor();
            frac_ms = dt - whole;
            with_session(|s| s.update(whole as u32));

            if let Some(cb) = f.borrow().as_ref() {
                request_animation_frame(cb);
            }
        }));

        if let Some(cb) = g.borrow().as_ref() {
            request_animation_frame(cb);
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);
        log::info!("Robot Runner starting...");

        let store = LocalStorageStore;
        let settings = Settings::load(&store);
        let audio = AudioManager::from_settings(&settings);
        let seed = clock_seed();
        let session = Session::new(settings, seed, Box::new(store), Box::new(audio));
        SESSION.with(|cell| *cell.borrow_mut() = Some(session));
        log::info!("Session ready with seed: {}", seed);

        let Some(window) = web_sys::window() else {
            log::error!("No window - cannot attach input");
            return;
        };
        setup_keyboard(&window);
        if let Some(document) = window.document() {
            setup_auto_pause(&document);
        }
        start_frame_loop();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use robot_runner::Session;
    use robot_runner::audio::AudioManager;
    use robot_runner::highscores::format_date;
    use robot_runner::persistence::FileStore;
    use robot_runner::platform::{clock_seed, now_ms};
    use robot_runner::settings::Settings;

    env_logger::init();
    log::info!("Robot Runner (native) starting...");
    log::info!("Native mode plays a headless autopilot round - build for wasm32 to play");

    let name = std::env::args().nth(1).unwrap_or_else(|| "autopilot".to_string());
    let data_dir = std::env::var("ROBOT_RUNNER_DATA").unwrap_or_else(|_| ".robot-runner".into());

    let store = FileStore::new(data_dir);
    let settings = Settings::load(&store);
    let audio = AudioManager::from_settings(&settings);
    let mut session = Session::new(settings, clock_seed(), Box::new(store), Box::new(audio));

    autopilot::play_round(&mut session);

    println!("Final score: {}", session.score());
    session.finalize_score(&name);

    let now = now_ms();
    println!("\n=== HIGH SCORES ===");
    for (i, entry) in session.high_scores().entries.iter().enumerate() {
        println!(
            "{:>2}. {:<20} {:>6}  {}",
            i + 1,
            entry.name,
            entry.score,
            format_date(entry.timestamp, now)
        );
    }
}

/// Simple bot for headless runs: dodge harmful monsters, chase beneficial ones
#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use robot_runner::Session;
    use robot_runner::consts::{SESSION_SECS, TICK_MS};
    use robot_runner::sim::{GamePhase, Lane, Polarity, Snapshot};

    /// How far above the strike zone the bot starts reacting
    const LOOKAHEAD: f32 = 40.0;

    /// Play one run to game over, one tick per frame
    ///
    /// Untimed sessions are ended after a default-length run.
    pub fn play_round(session: &mut Session) {
        let secs = session.settings().session_secs.unwrap_or(SESSION_SECS);
        let frames = secs.saturating_mul(1000) / TICK_MS;

        session.start();
        for _ in 0..frames {
            if session.phase() != GamePhase::Playing {
                break;
            }
            let lane = choose_lane(&session.snapshot());
            session.select_lane(lane);
            session.update(TICK_MS);
        }
        session.end();
    }

    pub fn choose_lane(snap: &Snapshot) -> u8 {
        let threat = |lane: Lane| {
            snap.monsters.iter().any(|m| {
                m.lane == lane
                    && !m.resolved
                    && m.polarity == Polarity::Harmful
                    && m.position > 70.0 - LOOKAHEAD
            })
        };
        let prize = |lane: Lane| {
            snap.monsters
                .iter()
                .filter(|m| m.lane == lane && !m.resolved && m.polarity == Polarity::Beneficial)
                .filter(|m| m.position > 70.0 - LOOKAHEAD && m.position < 90.0)
                .count()
        };

        let current = snap.runner_lane;
        let best = Lane::ALL
            .iter()
            .copied()
            .filter(|&lane| !threat(lane))
            // Prefer prizes, then staying put, then nearby lanes
            .max_by_key(|&lane| {
                let distance = (i16::from(lane.index()) - i16::from(current.index())).abs();
                (prize(lane), lane == current, -distance)
            });
        best.unwrap_or(current).index()
    }

}
