//! White noise with analog-style soft clipping and DC blocking.

use crate::dsp::utils::{DcBlocker, Lcg, soft_clip};

pub struct Noise {
    rng: Lcg,
    dc: DcBlocker,
    out: Vec<f32>,
}

impl Noise {
    pub fn new(sample_rate: f32, max_block: usize) -> Self {
        Self::with_seed(Lcg::from_entropy(), sample_rate, max_block)
    }

    /// Deterministic variant for tests.
    pub fn with_seed(rng: Lcg, sample_rate: f32, max_block: usize) -> Self {
        Noise {
            rng,
            dc: DcBlocker::new(sample_rate),
            out: vec![0.0; max_block],
        }
    }

    pub fn process(&mut self, frames: usize) {
        for i in 0..frames {
            let white = self.rng.next_bipolar();
            let sample = soft_clip(white * 1.2);
            self.out[i] = self.dc.process(sample);
        }
    }

    pub fn output(&self) -> &[f32] {
        &self.out
    }
}
