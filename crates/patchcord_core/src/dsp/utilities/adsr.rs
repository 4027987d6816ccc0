//! ADSR envelope generator, gate-triggered with per-sample edge detection.

use crate::dsp::{ParamBlock, param_or};

const ATTACK_DEFAULT: f32 = 0.01;
const DECAY_DEFAULT: f32 = 0.1;
const SUSTAIN_DEFAULT: f32 = 0.7;
const RELEASE_DEFAULT: f32 = 0.3;

/// Floor for time params before taking a reciprocal rate.
const MIN_STAGE_TIME: f32 = 0.001;

const GATE_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum EnvelopeStage {
    #[default]
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

pub struct Adsr {
    sample_rate: f32,
    stage: EnvelopeStage,
    envelope: f32,
    gate_was_high: bool,
    out: Vec<f32>,
}

impl Adsr {
    pub fn new(sample_rate: f32, max_block: usize) -> Self {
        Adsr {
            sample_rate,
            stage: EnvelopeStage::Idle,
            envelope: 0.0,
            gate_was_high: false,
            out: vec![0.0; max_block],
        }
    }

    /// Params: attack, decay, sustain, release. Input: gate.
    ///
    /// Edge detection runs per sample on the gate block; a rising edge
    /// re-enters Attack without resetting the envelope level, so retriggers
    /// mid-Release ramp up from wherever the envelope currently sits.
    pub fn process(&mut self, gate_in: Option<&[f32]>, params: &[ParamBlock<'_>], frames: usize) {
        let attack = param_or(params, 0, ATTACK_DEFAULT);
        let decay = param_or(params, 1, DECAY_DEFAULT);
        let sustain = param_or(params, 2, SUSTAIN_DEFAULT);
        let release = param_or(params, 3, RELEASE_DEFAULT);

        for i in 0..frames {
            let gate_high = gate_in.map_or(false, |g| g[i] > GATE_THRESHOLD);

            let attack_rate = 1.0 / (attack.at(i).max(MIN_STAGE_TIME) * self.sample_rate);
            let decay_rate = 1.0 / (decay.at(i).max(MIN_STAGE_TIME) * self.sample_rate);
            let release_rate = 1.0 / (release.at(i).max(MIN_STAGE_TIME) * self.sample_rate);
            let sustain_level = sustain.at(i);

            let gate_rising = gate_high && !self.gate_was_high;
            let gate_falling = !gate_high && self.gate_was_high;

            if gate_rising {
                self.stage = EnvelopeStage::Attack;
            } else if gate_falling
                && self.stage != EnvelopeStage::Idle
                && self.stage != EnvelopeStage::Release
            {
                self.stage = EnvelopeStage::Release;
            }

            match self.stage {
                EnvelopeStage::Idle => {
                    self.envelope = 0.0;
                }
                EnvelopeStage::Attack => {
                    self.envelope += attack_rate;
                    if self.envelope >= 1.0 {
                        self.envelope = 1.0;
                        self.stage = EnvelopeStage::Decay;
                    }
                }
                EnvelopeStage::Decay => {
                    self.envelope -= decay_rate;
                    if self.envelope <= sustain_level {
                        self.envelope = sustain_level;
                        self.stage = EnvelopeStage::Sustain;
                    }
                }
                EnvelopeStage::Sustain => {
                    self.envelope = sustain_level;
                }
                EnvelopeStage::Release => {
                    self.envelope -= release_rate;
                    if self.envelope <= 0.0 {
                        self.envelope = 0.0;
                        self.stage = EnvelopeStage::Idle;
                    }
                }
            }

            self.gate_was_high = gate_high;
            self.out[i] = self.envelope;
        }
    }

    pub fn output(&self) -> &[f32] {
        &self.out
    }
}
