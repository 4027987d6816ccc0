//! The module catalog: one immutable [`ModuleDefinition`] per module type.
//!
//! Loaded once, never mutated. The patch graph validates instance creation
//! against it and the renderer/editor enumerate ports and parameters from it.

use std::collections::HashMap;

use crate::types::{
    ParamScaling,
    ModuleCategory, ModuleDefinition, ModuleKind, ParamConfig, PortConfig, PortDirection,
    SignalType,
};

const fn in_port(id: &'static str, name: &'static str, signal_type: SignalType) -> PortConfig {
    PortConfig {
        id,
        name,
        direction: PortDirection::Input,
        signal_type,
    }
}

const fn out_port(id: &'static str, name: &'static str, signal_type: SignalType) -> PortConfig {
    PortConfig {
        id,
        name,
        direction: PortDirection::Output,
        signal_type,
    }
}

const fn param(id: &'static str, name: &'static str, min: f64, max: f64, default: f64) -> ParamConfig {
    ParamConfig {
        id,
        name,
        min,
        max,
        default,
        unit: None,
        scaling: None,
        step: None,
    }
}

static OSCILLATOR: ModuleDefinition = ModuleDefinition {
    kind: ModuleKind::Oscillator,
    label: "VCO",
    category: ModuleCategory::Source,
    color: "#E3C330",
    inputs: &[
        in_port("v_oct", "1V/Oct", SignalType::Cv),
        in_port("fm_in", "FM In", SignalType::Audio),
    ],
    outputs: &[
        out_port("sine_out", "Sine", SignalType::Audio),
        out_port("pulse_out", "Pulse", SignalType::Audio),
    ],
    params: &[
        ParamConfig {
            unit: Some("Hz"),
            scaling: Some(ParamScaling::Exp),
            ..param("tune", "Tune", 20.0, 10000.0, 440.0)
        },
        param("shape", "Shape", 0.0, 1.0, 0.5),
        param("fm", "FM", 0.0, 1.0, 0.0),
    ],
};

static FILTER: ModuleDefinition = ModuleDefinition {
    kind: ModuleKind::Filter,
    label: "VCF",
    category: ModuleCategory::Filter,
    color: "#4A9EDE",
    inputs: &[
        in_port("audio_in", "Audio In", SignalType::Audio),
        in_port("cv_in", "CV In", SignalType::Cv),
    ],
    outputs: &[out_port("vcf_out", "Out", SignalType::Audio)],
    params: &[
        ParamConfig {
            unit: Some("Hz"),
            scaling: Some(ParamScaling::Exp),
            ..param("cutoff", "Cutoff", 40.0, 20000.0, 1000.0)
        },
        param("resonance", "Resonance", 0.0, 1.0, 0.0),
        param("cv_amount", "CV Amt", 0.0, 1.0, 0.5),
    ],
};

static VCA: ModuleDefinition = ModuleDefinition {
    kind: ModuleKind::Vca,
    label: "VCA",
    category: ModuleCategory::Amplifier,
    color: "#5DBE6E",
    inputs: &[
        in_port("audio_in", "Audio In", SignalType::Audio),
        in_port("cv_in", "CV In", SignalType::Cv),
    ],
    outputs: &[out_port("vca_out", "Out", SignalType::Audio)],
    params: &[param("gain", "Gain", 0.0, 1.0, 0.5)],
};

static ENVELOPE: ModuleDefinition = ModuleDefinition {
    kind: ModuleKind::Envelope,
    label: "ADSR",
    category: ModuleCategory::Modulation,
    color: "#DE6B4A",
    inputs: &[in_port("gate_in", "Gate", SignalType::Gate)],
    outputs: &[out_port("env_out", "Out", SignalType::Cv)],
    params: &[
        ParamConfig {
            unit: Some("s"),
            scaling: Some(ParamScaling::Exp),
            ..param("attack", "Attack", 0.001, 10.0, 0.01)
        },
        ParamConfig {
            unit: Some("s"),
            scaling: Some(ParamScaling::Exp),
            ..param("decay", "Decay", 0.001, 10.0, 0.1)
        },
        param("sustain", "Sustain", 0.0, 1.0, 0.7),
        ParamConfig {
            unit: Some("s"),
            scaling: Some(ParamScaling::Exp),
            ..param("release", "Release", 0.001, 10.0, 0.3)
        },
    ],
};

static LFO: ModuleDefinition = ModuleDefinition {
    kind: ModuleKind::Lfo,
    label: "LFO",
    category: ModuleCategory::Modulation,
    color: "#B84ADE",
    inputs: &[],
    outputs: &[out_port("lfo_out", "Out", SignalType::Cv)],
    params: &[
        ParamConfig {
            unit: Some("Hz"),
            scaling: Some(ParamScaling::Exp),
            ..param("rate", "Rate", 0.01, 50.0, 1.0)
        },
        ParamConfig {
            // 0=sine 1=triangle 2=square 3=saw 4=sample&hold
            step: Some(1.0),
            ..param("shape", "Shape", 0.0, 4.0, 0.0)
        },
        param("depth", "Depth", 0.0, 1.0, 1.0),
    ],
};

static NOISE: ModuleDefinition = ModuleDefinition {
    kind: ModuleKind::Noise,
    label: "Noise",
    category: ModuleCategory::Source,
    color: "#888888",
    inputs: &[],
    outputs: &[out_port("noise_out", "Out", SignalType::Audio)],
    params: &[],
};

static MIXER: ModuleDefinition = ModuleDefinition {
    kind: ModuleKind::Mixer,
    label: "Mixer",
    category: ModuleCategory::Utility,
    color: "#7A7A7A",
    inputs: &[
        in_port("ch1_in", "Ch 1", SignalType::Audio),
        in_port("ch2_in", "Ch 2", SignalType::Audio),
        in_port("ch3_in", "Ch 3", SignalType::Audio),
        in_port("ch4_in", "Ch 4", SignalType::Audio),
    ],
    outputs: &[out_port("mix_out", "Mix Out", SignalType::Audio)],
    params: &[
        param("ch1_level", "Ch 1", 0.0, 2.0, 1.0),
        param("ch2_level", "Ch 2", 0.0, 2.0, 1.0),
        param("ch3_level", "Ch 3", 0.0, 2.0, 1.0),
        param("ch4_level", "Ch 4", 0.0, 2.0, 0.0),
    ],
};

static DELAY: ModuleDefinition = ModuleDefinition {
    kind: ModuleKind::Delay,
    label: "Delay",
    category: ModuleCategory::Effect,
    color: "#4ABCDE",
    inputs: &[in_port("audio_in", "In", SignalType::Audio)],
    outputs: &[out_port("delay_out", "Out", SignalType::Audio)],
    params: &[
        ParamConfig {
            unit: Some("s"),
            ..param("time", "Time", 0.01, 1.0, 0.3)
        },
        param("feedback", "Feedback", 0.0, 0.95, 0.4),
        param("wet", "Wet", 0.0, 1.0, 0.5),
    ],
};

static REVERB: ModuleDefinition = ModuleDefinition {
    kind: ModuleKind::Reverb,
    label: "Reverb",
    category: ModuleCategory::Effect,
    color: "#4ABCDE",
    inputs: &[in_port("audio_in", "In", SignalType::Audio)],
    outputs: &[out_port("reverb_out", "Out", SignalType::Audio)],
    params: &[
        ParamConfig {
            unit: Some("s"),
            ..param("decay", "Decay", 0.1, 10.0, 2.5)
        },
        param("wet", "Wet", 0.0, 1.0, 0.3),
    ],
};

static OUTPUT: ModuleDefinition = ModuleDefinition {
    kind: ModuleKind::Output,
    label: "Output",
    category: ModuleCategory::Output,
    color: "#f0f0ef",
    inputs: &[in_port("audio_in", "In", SignalType::Audio)],
    outputs: &[],
    params: &[param("volume", "Volume", 0.0, 1.0, 0.7)],
};

/// Ordered palette list, as the editor presents it.
pub static MODULE_LIST: [&ModuleDefinition; 10] = [
    &OSCILLATOR,
    &FILTER,
    &VCA,
    &ENVELOPE,
    &LFO,
    &NOISE,
    &MIXER,
    &DELAY,
    &REVERB,
    &OUTPUT,
];

lazy_static! {
    static ref REGISTRY: HashMap<&'static str, &'static ModuleDefinition> = MODULE_LIST
        .iter()
        .map(|def| (def.kind.as_str(), *def))
        .collect();
}

/// Look up a module definition by its type string.
pub fn lookup(module_type: &str) -> Option<&'static ModuleDefinition> {
    REGISTRY.get(module_type).copied()
}

/// Look up the definition for a known kind.
pub fn definition(kind: ModuleKind) -> &'static ModuleDefinition {
    // Every kind has exactly one catalog entry.
    REGISTRY[kind.as_str()]
}

/// All definitions in palette order.
pub fn definitions() -> &'static [&'static ModuleDefinition] {
    &MODULE_LIST
}
