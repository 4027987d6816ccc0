//! 4-pole (24 dB/oct) state-variable filter: two cascaded Chamberlin stages
//! run at 2x the output rate, with CV modulation on cutoff, DC blocking and
//! soft clipping on the way out.

use crate::dsp::utils::{DcBlocker, soft_clip};
use crate::dsp::{ParamBlock, param_or};
use std::f32::consts::PI;

const CUTOFF_MIN: f32 = 40.0;
const CUTOFF_MAX: f32 = 20000.0;
const CUTOFF_DEFAULT: f32 = 1000.0;
const RESONANCE_DEFAULT: f32 = 0.0;
const CV_AMOUNT_DEFAULT: f32 = 0.5;

#[derive(Debug, Default, Clone, Copy)]
struct SvfStage {
    lp: f32,
    bp: f32,
}

impl SvfStage {
    fn process(&mut self, input: f32, f: f32, q: f32) -> f32 {
        let hp = input - self.lp - q * self.bp;
        self.bp += f * hp;
        self.lp += f * self.bp;
        // Flush denormals out of the recursion
        if self.lp.abs() < 1e-18 {
            self.lp = 0.0;
        }
        if self.bp.abs() < 1e-18 {
            self.bp = 0.0;
        }
        self.lp
    }
}

pub struct Svf {
    sample_rate: f32,
    stage1: SvfStage,
    stage2: SvfStage,
    dc: DcBlocker,
    out: Vec<f32>,
}

impl Svf {
    pub fn new(sample_rate: f32, max_block: usize) -> Self {
        Svf {
            sample_rate,
            stage1: SvfStage::default(),
            stage2: SvfStage::default(),
            dc: DcBlocker::new(sample_rate),
            out: vec![0.0; max_block],
        }
    }

    /// Params: cutoff (Hz), resonance, cv_amount. Inputs: audio and CV.
    pub fn process(
        &mut self,
        audio_in: Option<&[f32]>,
        cv_in: Option<&[f32]>,
        params: &[ParamBlock<'_>],
        frames: usize,
    ) {
        let cutoff = param_or(params, 0, CUTOFF_DEFAULT);
        let resonance = param_or(params, 1, RESONANCE_DEFAULT);
        let cv_amount = param_or(params, 2, CV_AMOUNT_DEFAULT);

        let oversampled_rate = self.sample_rate * 2.0;
        let max_cutoff = self.sample_rate * 0.4;

        for i in 0..frames {
            let base_cutoff = cutoff.at(i);
            let resonance = resonance.at(i);
            let cv_amount = cv_amount.at(i);

            // CV sweeps cutoff over +-5 octaves at full amount
            let cv = cv_in.map_or(0.0, |cv| cv[i] * cv_amount);
            let cutoff = (base_cutoff * 2f32.powf(cv * 5.0)).clamp(CUTOFF_MIN, max_cutoff);

            let f = 2.0 * (PI * cutoff / oversampled_rate).sin();
            let q = 1.0 - resonance * 0.97;

            let input = audio_in.map_or(0.0, |a| a[i]);
            let mut out = 0.0;
            for _ in 0..2 {
                let lp1 = self.stage1.process(input, f, q);
                out = self.stage2.process(lp1, f, q);
            }

            // Transparency mode: fully open and unresonant passes the input
            // through untouched. The stages keep charging above.
            if base_cutoff >= CUTOFF_MAX * 0.98 && resonance <= 0.1 && cv.abs() < 1e-3 {
                self.dc.reset();
                self.out[i] = input;
                continue;
            }

            self.out[i] = soft_clip(self.dc.process(out));
        }
    }

    pub fn output(&self) -> &[f32] {
        &self.out
    }
}
