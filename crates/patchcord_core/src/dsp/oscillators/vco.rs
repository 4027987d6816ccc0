//! Band-limited oscillator: sine-morph output (inverted sharkfin / sine /
//! sharkfin) plus a PolyBLEP pulse with shape-controlled width.

use crate::dsp::utils::poly_blep;
use crate::dsp::{ParamBlock, param_or};
use std::f32::consts::TAU;

const TUNE_DEFAULT: f32 = 440.0;
const SHAPE_DEFAULT: f32 = 0.5;
const FM_DEFAULT: f32 = 0.0;

pub struct Vco {
    sample_rate: f32,
    phase: f32,
    sine_out: Vec<f32>,
    pulse_out: Vec<f32>,
}

impl Vco {
    pub fn new(sample_rate: f32, max_block: usize) -> Self {
        Vco {
            sample_rate,
            phase: 0.0,
            sine_out: vec![0.0; max_block],
            pulse_out: vec![0.0; max_block],
        }
    }

    /// Params: tune (Hz), shape, fm. Inputs: pitch CV (1V/Oct) and FM.
    pub fn process(
        &mut self,
        v_oct: Option<&[f32]>,
        fm_in: Option<&[f32]>,
        params: &[ParamBlock<'_>],
        frames: usize,
    ) {
        let tune = param_or(params, 0, TUNE_DEFAULT);
        let shape = param_or(params, 1, SHAPE_DEFAULT);
        let fm = param_or(params, 2, FM_DEFAULT);
        let max_freq = self.sample_rate * 0.45;

        for i in 0..frames {
            let tune = tune.at(i);
            let shape = shape.at(i);
            let fm = fm.at(i);

            // 1V/Oct pitch modulation around the tune frequency
            let pitch_cv = v_oct.map_or(0.0, |cv| cv[i]);
            let pitch_mod = if pitch_cv != 0.0 {
                tune * (2f32.powf(pitch_cv) - 1.0)
            } else {
                0.0
            };

            // FM with a tanh limiter so hot inputs cannot run away
            let fm_mod = fm_in.map_or(0.0, |m| (m[i] * fm).tanh() * tune * 0.5);

            let freq = (tune + fm_mod + pitch_mod).clamp(20.0, max_freq);
            let dt = freq / self.sample_rate;
            self.phase += dt;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }

            // 3-way morph: 0 = inverted sharkfin, 0.5 = sine, 1 = sharkfin
            let sine = (self.phase * TAU).sin();
            let morphed = if shape < 0.5 {
                let blend = shape * 2.0;
                inverted_sharkfin(self.phase) * (1.0 - blend) + sine * blend
            } else {
                let blend = (shape - 0.5) * 2.0;
                sine * (1.0 - blend) + sharkfin(self.phase) * blend
            };
            self.sine_out[i] = morphed;

            // Pulse with shape-controlled width, band-limited at both edges
            let pw = (0.1 + shape * 0.8).clamp(0.05, 0.95);
            let mut pulse = if self.phase < pw { 1.0 } else { -1.0 };
            pulse += poly_blep(self.phase, dt);
            pulse -= poly_blep(
                if self.phase >= pw {
                    self.phase - pw
                } else {
                    self.phase - pw + 1.0
                },
                dt,
            );
            self.pulse_out[i] = pulse;
        }
    }

    pub fn sine_output(&self) -> &[f32] {
        &self.sine_out
    }

    pub fn pulse_output(&self) -> &[f32] {
        &self.pulse_out
    }
}

/// Piecewise-linear ramp 0 -> 1 -> -1 -> 0 across one cycle.
fn sharkfin(phase: f32) -> f32 {
    if phase < 0.25 {
        phase * 4.0
    } else if phase < 0.75 {
        1.0 - (phase - 0.25) * 4.0
    } else {
        (phase - 0.75) * 4.0 - 1.0
    }
}

/// Sharkfin shifted by half a cycle and sign-flipped.
fn inverted_sharkfin(phase: f32) -> f32 {
    let p = (phase + 0.5) % 1.0;
    if p < 0.25 {
        -p * 4.0
    } else if p < 0.75 {
        -1.0 + (p - 0.25) * 4.0
    } else {
        1.0 - (p - 0.75) * 4.0
    }
}
