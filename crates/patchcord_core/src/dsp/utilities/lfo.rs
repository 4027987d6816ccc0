//! Low-frequency oscillator: sine, triangle, square, saw and sample-&-hold
//! shapes, with a depth attenuator.

use crate::dsp::utils::Lcg;
use crate::dsp::{ParamBlock, param_or};
use std::f32::consts::TAU;

const RATE_DEFAULT: f32 = 1.0;
const SHAPE_DEFAULT: f32 = 0.0;
const DEPTH_DEFAULT: f32 = 1.0;

pub struct Lfo {
    sample_rate: f32,
    phase: f32,
    rng: Lcg,
    held: f32,
    out: Vec<f32>,
}

impl Lfo {
    pub fn new(sample_rate: f32, max_block: usize) -> Self {
        Self::with_seed(Lcg::from_entropy(), sample_rate, max_block)
    }

    /// Deterministic variant for tests.
    pub fn with_seed(mut rng: Lcg, sample_rate: f32, max_block: usize) -> Self {
        let held = rng.next_bipolar();
        Lfo {
            sample_rate,
            phase: 0.0,
            rng,
            held,
            out: vec![0.0; max_block],
        }
    }

    /// Params: rate (Hz), shape (0..4, rounded), depth.
    ///
    /// The sample-&-hold value is redrawn only when the phase wraps, once
    /// per cycle.
    pub fn process(&mut self, params: &[ParamBlock<'_>], frames: usize) {
        let rate = param_or(params, 0, RATE_DEFAULT);
        let shape = param_or(params, 1, SHAPE_DEFAULT);
        let depth = param_or(params, 2, DEPTH_DEFAULT);

        for i in 0..frames {
            let rate = rate.at(i).max(0.0);
            let depth = depth.at(i);
            let shape = shape.at(i).clamp(0.0, 4.0).round() as u8;

            let prev_phase = self.phase;
            self.phase = (self.phase + rate / self.sample_rate) % 1.0;
            if self.phase < prev_phase {
                self.held = self.rng.next_bipolar();
            }

            let value = match shape {
                0 => (self.phase * TAU).sin(),
                1 => {
                    if self.phase < 0.5 {
                        self.phase * 4.0 - 1.0
                    } else {
                        3.0 - self.phase * 4.0
                    }
                }
                2 => {
                    if self.phase < 0.5 {
                        1.0
                    } else {
                        -1.0
                    }
                }
                3 => self.phase * 2.0 - 1.0,
                _ => self.held,
            };

            self.out[i] = value * depth;
        }
    }

    pub fn output(&self) -> &[f32] {
        &self.out
    }
}
