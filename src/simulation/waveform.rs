//! Time- and mode-dependent opacity envelope per field line
//! Location: src/simulation/waveform.rs

use crate::config::constants::waveform;
use crate::model::{StimulationMode, StimulationParams};
use crate::utils::bounds::{clamp_finite, clamp_unit};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Animation clock for one line at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeClock {
    /// Elapsed time scaled by frequency / 50
    pub scaled_time: f32,
    pub line_index: f32,
}

type EnvelopeFn = fn(&EnvelopeClock) -> f32;

/// One pure envelope per mode, indexed by [`StimulationMode::index`]
const ENVELOPE_TABLE: [EnvelopeFn; 4] = [convencional, acupuntura, burst, modulado];

#[inline]
fn frac(value: f32) -> f32 {
    value.rem_euclid(1.0)
}

fn convencional(clock: &EnvelopeClock) -> f32 {
    let phase = frac(clock.scaled_time + clock.line_index * waveform::CONVENCIONAL_LINE_PHASE);
    waveform::CONVENCIONAL_BASE + (phase * TAU).sin() * waveform::CONVENCIONAL_SWING
}

fn acupuntura(clock: &EnvelopeClock) -> f32 {
    let phase = frac(clock.scaled_time * waveform::ACUPUNTURA_RATE);
    if phase < waveform::ACUPUNTURA_PULSE_WIDTH {
        waveform::ACUPUNTURA_ON
    } else {
        waveform::ACUPUNTURA_OFF
    }
}

fn burst(clock: &EnvelopeClock) -> f32 {
    let in_burst = frac(clock.scaled_time) < waveform::BURST_DUTY;
    if in_burst {
        let pulse_phase = frac(clock.scaled_time * waveform::BURST_PULSE_RATE);
        waveform::BURST_BASE + (pulse_phase * TAU).sin() * waveform::BURST_SWING
    } else {
        waveform::BURST_REST
    }
}

fn modulado(clock: &EnvelopeClock) -> f32 {
    let envelope = (clock.scaled_time * waveform::MODULADO_ENVELOPE_RATE).sin() * 0.5 + 0.5;
    let carrier = (clock.scaled_time * waveform::MODULADO_CARRIER_RATE
        + clock.line_index * waveform::MODULADO_LINE_PHASE)
        .sin()
        * 0.5
        + 0.5;
    waveform::MODULADO_FLOOR + envelope * carrier * waveform::MODULADO_DEPTH
}

/// Opacity signal handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveformEnvelope {
    pub mode: StimulationMode,
    pub speed: f32,
    pub intensity_norm: f32,
}

impl WaveformEnvelope {
    pub fn new(mode: StimulationMode, frequency_hz: f32, intensity_norm: f32) -> Self {
        Self {
            mode,
            speed: clamp_finite(frequency_hz, 0.0, f32::MAX) / waveform::SPEED_REFERENCE_HZ,
            intensity_norm: clamp_unit(intensity_norm),
        }
    }

    pub fn from_params(params: &StimulationParams, intensity_norm: f32) -> Self {
        Self::new(params.mode, params.frequency_hz, intensity_norm)
    }

    /// Mode envelope before intensity scaling
    pub fn raw_opacity(&self, line_index: usize, time: f32) -> f32 {
        let clock = EnvelopeClock {
            scaled_time: time * self.speed,
            line_index: line_index as f32,
        };
        ENVELOPE_TABLE[self.mode.index()](&clock)
    }

    /// Final opacity in [0, 1]
    pub fn opacity(&self, line_index: usize, time: f32) -> f32 {
        clamp_finite(
            self.raw_opacity(line_index, time) * self.intensity_norm,
            waveform::OPACITY_MIN,
            waveform::OPACITY_MAX,
        )
    }

    /// `(line_index, time) -> opacity` closure for the render loop
    pub fn as_fn(&self) -> impl Fn(usize, f32) -> f32 + Copy + Send + Sync {
        let envelope = *self;
        move |line_index, time| envelope.opacity(line_index, time)
    }

    /// Opacities of `line_count` lines at one instant
    pub fn sample_lines(&self, line_count: usize, time: f32) -> Vec<f32> {
        (0..line_count).map(|i| self.opacity(i, time)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(mode: StimulationMode) -> WaveformEnvelope {
        // 50 Hz -> speed 1.0
        WaveformEnvelope::new(mode, 50.0, 1.0)
    }

    #[test]
    fn test_table_matches_modes() {
        assert_eq!(ENVELOPE_TABLE.len(), StimulationMode::ALL.len());
    }

    #[test]
    fn test_acupuntura_pulse() {
        let env = envelope(StimulationMode::Acupuntura);
        // t * speed * 2 = 0.05
        assert!((env.raw_opacity(0, 0.025) - 0.8).abs() < 1e-6);
        // t * speed * 2 = 0.5
        assert!((env.raw_opacity(0, 0.25) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_convencional_quarter_phase() {
        let env = envelope(StimulationMode::Convencional);
        assert!((env.raw_opacity(0, 0.25) - 0.6).abs() < 1e-5);
        assert!((env.raw_opacity(0, 0.0) - 0.3).abs() < 1e-5);
        // line 5 is half a cycle ahead
        assert!((env.raw_opacity(5, 0.25) - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_burst_rest_and_pulse() {
        let env = envelope(StimulationMode::Burst);
        assert!((env.raw_opacity(0, 0.5) - 0.1).abs() < 1e-6);
        // burst phase 0.05, pulse phase 0.25
        assert!((env.raw_opacity(0, 0.05) - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_burst_negative_lobe_clamps_to_zero() {
        let env = envelope(StimulationMode::Burst);
        // pulse phase 0.75 -> 0.3 - 0.4
        let raw = env.raw_opacity(0, 0.15);
        assert!(raw < 0.0);
        assert_eq!(env.opacity(0, 0.15), waveform::OPACITY_MIN);
    }

    #[test]
    fn test_modulado_range() {
        let env = envelope(StimulationMode::Modulado);
        for step in 0..200 {
            let raw = env.raw_opacity(step % 7, step as f32 * 0.05);
            assert!((0.2 - 1e-6..=0.8 + 1e-6).contains(&raw));
        }
    }

    #[test]
    fn test_intensity_scales_and_clamps() {
        let half = WaveformEnvelope::new(StimulationMode::Acupuntura, 50.0, 0.5);
        assert!((half.opacity(0, 0.025) - 0.4).abs() < 1e-6);

        let off = WaveformEnvelope::new(StimulationMode::Acupuntura, 50.0, 0.0);
        assert_eq!(off.opacity(0, 0.025), 0.0);
    }

    #[test]
    fn test_all_modes_bounded() {
        for mode in StimulationMode::ALL {
            let env = WaveformEnvelope::new(mode, 120.0, 1.0);
            for step in -50..50 {
                let value = env.opacity(3, step as f32 * 0.013);
                assert!(
                    (waveform::OPACITY_MIN..=waveform::OPACITY_MAX).contains(&value),
                    "{:?} produced {}",
                    mode,
                    value
                );
            }
        }
    }

    #[test]
    fn test_closure_matches_method() {
        let env = WaveformEnvelope::new(StimulationMode::Modulado, 80.0, 0.8);
        let f = env.as_fn();
        assert_eq!(f(2, 1.3), env.opacity(2, 1.3));
        assert_eq!(env.sample_lines(4, 0.7).len(), 4);
    }

    #[test]
    fn test_non_finite_frequency_freezes_animation() {
        let env = WaveformEnvelope::new(StimulationMode::Convencional, f32::NAN, 1.0);
        assert_eq!(env.speed, 0.0);
        assert_eq!(env.opacity(0, 10.0), env.opacity(0, 0.0));
    }
}
