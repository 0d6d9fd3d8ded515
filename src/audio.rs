//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//! Native builds keep the same interface but stay silent.

#[cfg(target_arch = "wasm32")]
use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::events::{EventSink, GameEvent};
use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Runner changed lane
    Move,
    /// Runner hit a harmful monster
    Hit,
    /// Monster dodged or caught
    Avoid,
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Sawtooth,
}

/// One oscillator burst with an exponential fade-out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq: f32,
    pub wave: Wave,
    /// Peak gain before volume scaling
    pub gain: f32,
    /// Seconds from trigger to start
    pub delay: f64,
    /// Seconds from start to silence
    pub duration: f64,
}

const MOVE_TONES: [Tone; 1] = [Tone {
    freq: 400.0,
    wave: Wave::Sine,
    gain: 0.1,
    delay: 0.0,
    duration: 0.1,
}];

const HIT_TONES: [Tone; 1] = [Tone {
    freq: 150.0,
    wave: Wave::Sawtooth,
    gain: 0.3,
    delay: 0.0,
    duration: 0.3,
}];

// Rising two-note chirp
const AVOID_TONES: [Tone; 2] = [
    Tone {
        freq: 600.0,
        wave: Wave::Sine,
        gain: 0.15,
        delay: 0.0,
        duration: 0.15,
    },
    Tone {
        freq: 800.0,
        wave: Wave::Sine,
        gain: 0.15,
        delay: 0.05,
        duration: 0.15,
    },
];

/// Gain the fade ramps down to (exponential ramps can't reach zero)
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
const FADE_FLOOR: f32 = 0.01;

impl SoundEffect {
    /// Oscillator recipe for this effect
    pub fn tones(self) -> &'static [Tone] {
        match self {
            SoundEffect::Move => &MOVE_TONES,
            SoundEffect::Hit => &HIT_TONES,
            SoundEffect::Avoid => &AVOID_TONES,
        }
    }
}

/// Audio manager for the game
///
/// Owns the audio context for its whole lifetime and closes it on drop.
pub struct AudioManager {
    #[cfg(target_arch = "wasm32")]
    ctx: Option<AudioContext>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        #[cfg(target_arch = "wasm32")]
        let ctx = {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            ctx
        };
        Self {
            #[cfg(target_arch = "wasm32")]
            ctx,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// Create with volumes taken from settings
    pub fn from_settings(settings: &Settings) -> Self {
        let mut audio = Self::new();
        audio.apply_settings(settings);
        audio
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.set_muted(settings.muted);
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Get effective volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        #[cfg(target_arch = "wasm32")]
        {
            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            for tone in effect.tones() {
                self.play_tone(ctx, tone, vol);
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        log::trace!("sfx {:?} at volume {:.2}", effect, vol);
    }

    /// Create an oscillator with gain envelope
    #[cfg(target_arch = "wasm32")]
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    #[cfg(target_arch = "wasm32")]
    fn play_tone(&self, ctx: &AudioContext, tone: &Tone, vol: f32) {
        let osc_type = match tone.wave {
            Wave::Sine => OscillatorType::Sine,
            Wave::Sawtooth => OscillatorType::Sawtooth,
        };
        let Some((osc, gain)) = self.create_osc(ctx, tone.freq, osc_type) else {
            return;
        };
        let t = ctx.current_time() + tone.delay;

        gain.gain().set_value_at_time(tone.gain * vol, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(FADE_FLOOR, t + tone.duration)
            .ok();

        osc.start_with_when(t).ok();
        osc.stop_with_when(t + tone.duration).ok();
    }
}

impl EventSink for AudioManager {
    fn emit(&mut self, event: &GameEvent) {
        if let Some(effect) = event.sound() {
            self.play(effect);
        }
    }

    fn apply_settings(&mut self, settings: &Settings) {
        AudioManager::apply_settings(self, settings);
    }
}

#[cfg(target_arch = "wasm32")]
impl Drop for AudioManager {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            let _ = ctx.close();
        }
    }
}
