//! The DSP units and their block-processing contract.
//!
//! Each unit is an isolated state machine that processes one block per
//! invocation. Inputs arrive as one optional sample slice per declared input
//! port and one [`ParamBlock`] per declared parameter, both in the order the
//! module's catalog definition lists them; outputs are buffers owned by the
//! unit, read back per port after `process`. Units never allocate, block, or
//! perform I/O inside `process`.

pub mod core;
pub mod filters;
pub mod oscillators;
pub mod utilities;
pub mod utils;

use crate::types::ModuleKind;

pub use self::core::{Mixer, Vca};
pub use filters::Svf;
pub use oscillators::{Noise, Vco};
pub use utilities::{Adsr, Lfo};

/// Upper bound on declared parameters per module type. Lets callers build
/// parameter lists in fixed storage.
pub const MAX_PARAMS: usize = 8;

/// A parameter's value over one block: constant (control-rate) or one value
/// per sample (sample-accurate).
#[derive(Debug, Clone, Copy)]
pub enum ParamBlock<'a> {
    Scalar(f32),
    Block(&'a [f32]),
}

impl ParamBlock<'_> {
    /// Value at sample `i`. Length-1 blocks behave like scalars.
    #[inline]
    pub fn at(&self, i: usize) -> f32 {
        match *self {
            ParamBlock::Scalar(v) => v,
            ParamBlock::Block(values) => {
                if values.len() > 1 {
                    values[i]
                } else {
                    values.first().copied().unwrap_or(0.0)
                }
            }
        }
    }
}

/// Input slice for port `index`, `None` when unconnected.
#[inline]
pub(crate) fn input<'a>(inputs: &[Option<&'a [f32]>], index: usize) -> Option<&'a [f32]> {
    inputs.get(index).copied().flatten()
}

/// Parameter block for `index`, falling back to the declared default.
#[inline]
pub(crate) fn param_or<'a>(
    params: &[ParamBlock<'a>],
    index: usize,
    default: f32,
) -> ParamBlock<'a> {
    params.get(index).copied().unwrap_or(ParamBlock::Scalar(default))
}

/// The closed set of DSP units, one variant per signal-processing module
/// kind. [`Unit::create`] is the single factory from kind to instance.
pub enum Unit {
    Oscillator(Vco),
    Filter(Svf),
    Vca(Vca),
    Envelope(Adsr),
    Lfo(Lfo),
    Noise(Noise),
    Mixer(Mixer),
}

impl Unit {
    /// Build the unit for a module kind, or `None` for catalog kinds that
    /// are rendered outside the engine (`delay`, `reverb`, `output`).
    ///
    /// `max_block` fixes the output buffer size; `process` must never be
    /// called with more frames than that.
    pub fn create(kind: ModuleKind, sample_rate: f32, max_block: usize) -> Option<Unit> {
        match kind {
            ModuleKind::Oscillator => Some(Unit::Oscillator(Vco::new(sample_rate, max_block))),
            ModuleKind::Filter => Some(Unit::Filter(Svf::new(sample_rate, max_block))),
            ModuleKind::Vca => Some(Unit::Vca(Vca::new(sample_rate, max_block))),
            ModuleKind::Envelope => Some(Unit::Envelope(Adsr::new(sample_rate, max_block))),
            ModuleKind::Lfo => Some(Unit::Lfo(Lfo::new(sample_rate, max_block))),
            ModuleKind::Noise => Some(Unit::Noise(Noise::new(sample_rate, max_block))),
            ModuleKind::Mixer => Some(Unit::Mixer(Mixer::new(max_block))),
            ModuleKind::Delay | ModuleKind::Reverb | ModuleKind::Output => None,
        }
    }

    pub fn kind(&self) -> ModuleKind {
        match self {
            Unit::Oscillator(_) => ModuleKind::Oscillator,
            Unit::Filter(_) => ModuleKind::Filter,
            Unit::Vca(_) => ModuleKind::Vca,
            Unit::Envelope(_) => ModuleKind::Envelope,
            Unit::Lfo(_) => ModuleKind::Lfo,
            Unit::Noise(_) => ModuleKind::Noise,
            Unit::Mixer(_) => ModuleKind::Mixer,
        }
    }

    /// Process one block. `inputs` and `params` are ordered per the module's
    /// catalog definition; absent inputs are silence, missing params fall
    /// back to their declared defaults.
    pub fn process(
        &mut self,
        inputs: &[Option<&[f32]>],
        params: &[ParamBlock<'_>],
        frames: usize,
    ) {
        match self {
            Unit::Oscillator(vco) => {
                vco.process(input(inputs, 0), input(inputs, 1), params, frames)
            }
            Unit::Filter(svf) => svf.process(input(inputs, 0), input(inputs, 1), params, frames),
            Unit::Vca(vca) => vca.process(input(inputs, 0), input(inputs, 1), params, frames),
            Unit::Envelope(adsr) => adsr.process(input(inputs, 0), params, frames),
            Unit::Lfo(lfo) => lfo.process(params, frames),
            Unit::Noise(noise) => noise.process(frames),
            Unit::Mixer(mixer) => mixer.process(inputs, params, frames),
        }
    }

    /// Output buffer for a declared output port id. Only the first `frames`
    /// samples of the most recent `process` call are meaningful.
    pub fn output(&self, port: &str) -> Option<&[f32]> {
        match (self, port) {
            (Unit::Oscillator(vco), "sine_out") => Some(vco.sine_output()),
            (Unit::Oscillator(vco), "pulse_out") => Some(vco.pulse_output()),
            (Unit::Filter(svf), "vcf_out") => Some(svf.output()),
            (Unit::Vca(vca), "vca_out") => Some(vca.output()),
            (Unit::Envelope(adsr), "env_out") => Some(adsr.output()),
            (Unit::Lfo(lfo), "lfo_out") => Some(lfo.output()),
            (Unit::Noise(noise), "noise_out") => Some(noise.output()),
            (Unit::Mixer(mixer), "mix_out") => Some(mixer.output()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_block_scalar() {
        let p = ParamBlock::Scalar(2.5);
        assert_eq!(p.at(0), 2.5);
        assert_eq!(p.at(99), 2.5);
    }

    #[test]
    fn test_param_block_per_sample() {
        let values = [1.0, 2.0, 3.0];
        let p = ParamBlock::Block(&values);
        assert_eq!(p.at(0), 1.0);
        assert_eq!(p.at(2), 3.0);
    }

    #[test]
    fn test_param_block_length_one_acts_like_scalar() {
        let values = [7.0];
        let p = ParamBlock::Block(&values);
        assert_eq!(p.at(5), 7.0);
    }

    #[test]
    fn test_factory_covers_dsp_kinds_only() {
        use crate::registry;
        for def in registry::definitions() {
            let unit = Unit::create(def.kind, 48000.0, 128);
            assert_eq!(unit.is_some(), def.kind.has_dsp_unit());
            if let Some(unit) = unit {
                assert_eq!(unit.kind(), def.kind);
            }
        }
    }

    #[test]
    fn test_output_ports_match_catalog() {
        use crate::registry;
        for def in registry::definitions() {
            let Some(unit) = Unit::create(def.kind, 48000.0, 128) else {
                continue;
            };
            for port in def.outputs {
                assert!(
                    unit.output(port.id).is_some(),
                    "unit '{}' missing output '{}'",
                    def.kind,
                    port.id
                );
            }
            assert!(unit.output("nope").is_none());
        }
    }
}
