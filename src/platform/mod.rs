//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time (timestamps, seeds)
//! - Keyboard input mapping

/// Discrete player input, already decoded from a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Jump straight to a lane (raw index, validated by the session)
    SelectLane(u8),
    /// Move one lane left
    StepLeft,
    /// Move one lane right
    StepRight,
    TogglePause,
    Start,
    Stop,
}

/// Map a `KeyboardEvent.key` value to an action
///
/// Home-row keys pick lanes directly; unknown keys map to nothing.
pub fn action_for_key(key: &str) -> Option<InputAction> {
    let action = match key.to_lowercase().as_str() {
        "a" => InputAction::SelectLane(0),
        "s" => InputAction::SelectLane(1),
        "d" => InputAction::SelectLane(2),
        "f" => InputAction::SelectLane(3),
        "arrowleft" => InputAction::StepLeft,
        "arrowright" => InputAction::StepRight,
        " " | "p" => InputAction::TogglePause,
        "enter" => InputAction::Start,
        "escape" => InputAction::Stop,
        _ => return None,
    };
    Some(action)
}

/// Current Unix time in milliseconds
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Current Unix time in milliseconds
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Run seed derived from the clock
pub fn clock_seed() -> u64 {
    now_ms() as u64
}
