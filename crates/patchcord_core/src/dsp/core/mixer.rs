//! 4-channel mixer: per-channel level, soft clip on the mix bus.

use crate::dsp::utils::soft_clip;
use crate::dsp::{ParamBlock, input, param_or};

const CHANNELS: usize = 4;
const LEVEL_DEFAULTS: [f32; CHANNELS] = [1.0, 1.0, 1.0, 0.0];

pub struct Mixer {
    out: Vec<f32>,
}

impl Mixer {
    pub fn new(max_block: usize) -> Self {
        Mixer {
            out: vec![0.0; max_block],
        }
    }

    /// Params: ch1..ch4 level. Inputs: ch1..ch4 (absent channels are
    /// silent).
    pub fn process(
        &mut self,
        inputs: &[Option<&[f32]>],
        params: &[ParamBlock<'_>],
        frames: usize,
    ) {
        for i in 0..frames {
            let mut sum = 0.0;
            for ch in 0..CHANNELS {
                let level = param_or(params, ch, LEVEL_DEFAULTS[ch]).at(i);
                let sample = input(inputs, ch).map_or(0.0, |b| b[i]);
                sum += sample * level;
            }
            self.out[i] = soft_clip(sum);
        }
    }

    pub fn output(&self) -> &[f32] {
        &self.out
    }
}
