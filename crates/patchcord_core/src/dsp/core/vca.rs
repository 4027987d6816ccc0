//! Voltage-controlled amplifier: CV adds to the gain knob, soft clip for
//! analog character, DC blocking on the way out.

use crate::dsp::utils::{DcBlocker, soft_clip};
use crate::dsp::{ParamBlock, param_or};

const GAIN_DEFAULT: f32 = 0.5;

pub struct Vca {
    dc: DcBlocker,
    out: Vec<f32>,
}

impl Vca {
    pub fn new(sample_rate: f32, max_block: usize) -> Self {
        Vca {
            dc: DcBlocker::new(sample_rate),
            out: vec![0.0; max_block],
        }
    }

    /// Param: gain. Inputs: audio and CV.
    pub fn process(
        &mut self,
        audio_in: Option<&[f32]>,
        cv_in: Option<&[f32]>,
        params: &[ParamBlock<'_>],
        frames: usize,
    ) {
        let gain = param_or(params, 0, GAIN_DEFAULT);

        for i in 0..frames {
            let input = audio_in.map_or(0.0, |a| a[i]);
            let cv = cv_in.map_or(0.0, |c| c[i]);

            let amplitude = (gain.at(i) + cv).clamp(0.0, 2.0);
            let signal = soft_clip(input * amplitude);
            self.out[i] = self.dc.process(signal);
        }
    }

    pub fn output(&self) -> &[f32] {
        &self.out
    }
}
