//! Audio cues
//!
//! The simulation only fires cues; nothing it does depends on playback.
//! [`AudioManager`] applies mute/volume settings and drops rapid-fire repeats
//! before handing a cue to a backend. On the web the backend generates sounds
//! procedurally with the Web Audio API - no external files needed!

use std::cell::Cell;
use std::cell::RefCell;

use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Tap that missed every projectile
    Tap,
    /// Tap that cracked (or broke) a projectile
    GlassBreak,
    /// A life was lost
    LowBattery,
    /// Game over
    GameOver,
    /// New high score
    HighScore,
}

impl SoundEffect {
    /// Minimum spacing between two plays of the same cue (seconds)
    pub fn min_interval(self) -> Option<f64> {
        match self {
            SoundEffect::Tap | SoundEffect::GlassBreak => Some(0.05),
            _ => None,
        }
    }
}

/// Fire-and-forget cue consumer
pub trait AudioSink {
    fn play(&self, effect: SoundEffect);

    /// Current time (seconds), fed once per frame for throttling
    fn set_clock(&self, _now: f64) {}
}

/// Discards every cue
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&self, _effect: SoundEffect) {}
}

/// Keeps every cue it receives (headless runs and tests)
#[derive(Debug, Default)]
pub struct RecordingAudio {
    played: RefCell<Vec<SoundEffect>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<SoundEffect> {
        self.played.borrow().clone()
    }

    pub fn count(&self, effect: SoundEffect) -> usize {
        self.played.borrow().iter().filter(|e| **e == effect).count()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&self, effect: SoundEffect) {
        self.played.borrow_mut().push(effect);
    }
}

/// Something that can actually make a sound
pub trait AudioBackend {
    /// Play `effect` at `volume` (0.0 - 1.0, already mixed)
    fn emit(&self, effect: SoundEffect, volume: f32);
}

/// Audio manager for the game
pub struct AudioManager<B: AudioBackend> {
    backend: B,
    master_volume: Cell<f32>,
    sfx_volume: Cell<f32>,
    muted: Cell<bool>,
    now: Cell<f64>,
    last_tap: Cell<Option<f64>>,
    last_glass_break: Cell<Option<f64>>,
}

impl<B: AudioBackend> AudioManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            master_volume: Cell::new(0.8),
            sfx_volume: Cell::new(1.0),
            muted: Cell::new(false),
            now: Cell::new(0.0),
            last_tap: Cell::new(None),
            last_glass_break: Cell::new(None),
        }
    }

    /// Adopt the player's volume and mute preferences
    pub fn apply_settings(&self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.set_muted(settings.muted);
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&self, vol: f32) {
        self.master_volume.set(vol.clamp(0.0, 1.0));
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&self, vol: f32) {
        self.sfx_volume.set(vol.clamp(0.0, 1.0));
    }

    /// Mute/unmute all audio
    pub fn set_muted(&self, muted: bool) {
        self.muted.set(muted);
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted.get() {
            0.0
        } else {
            self.master_volume.get() * self.sfx_volume.get()
        }
    }

    fn last_played(&self, effect: SoundEffect) -> Option<&Cell<Option<f64>>> {
        match effect {
            SoundEffect::Tap => Some(&self.last_tap),
            SoundEffect::GlassBreak => Some(&self.last_glass_break),
            _ => None,
        }
    }

    /// Record a play of `effect` unless it repeats too quickly
    fn admit(&self, effect: SoundEffect) -> bool {
        let (Some(slot), Some(min_interval)) = (self.last_played(effect), effect.min_interval())
        else {
            return true;
        };
        let now = self.now.get();
        if let Some(last) = slot.get() {
            if now - last < min_interval {
                return false;
            }
        }
        slot.set(Some(now));
        true
    }
}

impl<B: AudioBackend> AudioSink for AudioManager<B> {
    fn play(&self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        if !self.admit(effect) {
            return;
        }
        self.backend.emit(effect, vol);
    }

    fn set_clock(&self, now: f64) {
        self.now.set(now);
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudioBackend;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioBackend, SoundEffect};

    /// Procedural Web Audio cues
    pub struct WebAudioBackend {
        ctx: Option<AudioContext>,
    }

    impl Default for WebAudioBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudioBackend {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx }
        }

        /// Create an oscillator with gain envelope
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

        /// Tap on empty glass - short ping
        fn play_tap(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 420.0, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.25, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.06)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.08).ok();
        }

        /// Glass break - crackling shatter with a bass thump
        fn play_glass_break(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 100.0, OscillatorType::Sawtooth) {
                gain.gain().set_value_at_time(vol * 0.35, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.18)
                    .ok();
                for (i, freq) in [3500.0, 200.0, 4000.0, 150.0, 3000.0, 80.0].iter().enumerate() {
                    let at = t + 0.01 * (i as f64 + 1.0) * 1.5;
                    osc.frequency().set_value_at_time(*freq, at).ok();
                }
                osc.start().ok();
                osc.stop_with_when(t + 0.2).ok();
            }

            if let Some((osc, gain)) = self.create_osc(ctx, 60.0, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.12).ok();
            }
        }

        /// Life lost - two falling beeps
        fn play_low_battery(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [660.0, 440.0].iter().enumerate() {
                let delay = i as f64 * 0.15;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Square) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.2, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.12)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.14).ok();
                }
            }
        }

        /// Game over - sad descending
        fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
                let delay = i as f64 * 0.2;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.3, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.4).ok();
                }
            }
        }

        /// High score - celebratory
        fn play_high_score(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [500.0, 600.0, 700.0, 800.0, 1000.0].iter().enumerate() {
                let delay = i as f64 * 0.08;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.25, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.3).ok();
                }
            }
        }
    }

    impl AudioBackend for WebAudioBackend {
        fn emit(&self, effect: SoundEffect, vol: f32) {
            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Tap => self.play_tap(ctx, vol),
                SoundEffect::GlassBreak => self.play_glass_break(ctx, vol),
                SoundEffect::LowBattery => self.play_low_battery(ctx, vol),
                SoundEffect::GameOver => self.play_game_over(ctx, vol),
                SoundEffect::HighScore => self.play_high_score(ctx, vol),
            }
        }
    }
}
