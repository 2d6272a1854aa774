//! Piano-ish tones through Web Audio.

use web_sys::{AudioContext, OscillatorType};

use crate::error::{GameError, Result};
use crate::notes::Note;

const PEAK_GAIN: f32 = 0.35;
const SILENT: f32 = 0.0001;
const ATTACK_S: f64 = 0.01;
const RELEASE_S: f64 = 0.6;

/// Lazily created audio context; one oscillator + gain envelope per note.
#[derive(Default)]
pub struct Synth {
    ctx: Option<AudioContext>,
}

impl Synth {
    pub fn new() -> Self {
        Self::default()
    }

    fn context(&mut self) -> Result<&AudioContext> {
        if self.ctx.is_none() {
            self.ctx = Some(AudioContext::new().map_err(GameError::audio)?);
        }
        self.ctx
            .as_ref()
            .ok_or_else(|| GameError::Audio("audio context unavailable".into()))
    }

    /// Browsers keep audio suspended until a user gesture; call from one.
    pub fn unlock(&mut self) -> Result<()> {
        let ctx = self.context()?;
        // resolves asynchronously, nothing to wait for
        let _ = ctx.resume().map_err(GameError::audio)?;
        Ok(())
    }

    pub fn play(&mut self, note: Note) -> Result<()> {
        let ctx = self.context()?;
        let now = ctx.current_time();

        let osc = ctx.create_oscillator().map_err(GameError::audio)?;
        osc.set_type(OscillatorType::Triangle);
        osc.frequency()
            .set_value_at_time(note.frequency() as f32, now)
            .map_err(GameError::audio)?;

        let gain = ctx.create_gain().map_err(GameError::audio)?;
        let env = gain.gain();
        env.set_value_at_time(SILENT, now).map_err(GameError::audio)?;
        env.exponential_ramp_to_value_at_time(PEAK_GAIN, now + ATTACK_S)
            .map_err(GameError::audio)?;
        env.exponential_ramp_to_value_at_time(SILENT, now + RELEASE_S)
            .map_err(GameError::audio)?;

        osc.connect_with_audio_node(&gain)
            .map_err(GameError::audio)?;
        gain.connect_with_audio_node(&ctx.destination())
            .map_err(GameError::audio)?;
        osc.start_with_when(now).map_err(GameError::audio)?;
        osc.stop_with_when(now + RELEASE_S + 0.05)
            .map_err(GameError::audio)?;
        Ok(())
    }
}
