//! Shared data model: the module catalog types, the patch wire format, and
//! parameter smoothing.
//!
//! Catalog types (`ModuleDefinition`, `PortConfig`, `ParamConfig`) are
//! process-wide constants and only ever serialized (for the editor/UI).
//! Patch types (`PatchState`, `NodeState`, `Connection`) round-trip through
//! JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Signal classes carried by patch cables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Audio,
    Cv,
    Gate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleCategory {
    Source,
    Filter,
    Amplifier,
    Modulation,
    Effect,
    Utility,
    Output,
}

/// UI-facing knob response curve. Does not affect DSP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamScaling {
    Linear,
    Exp,
    Log,
}

/// The closed set of module types. The catalog has a definition for every
/// kind; only the seven signal-processing kinds have a DSP unit (`delay` and
/// `reverb` are opaque external effect processors, `output` belongs to the
/// host audio layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Oscillator,
    Filter,
    Vca,
    Envelope,
    Lfo,
    Noise,
    Mixer,
    Delay,
    Reverb,
    Output,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Oscillator => "oscillator",
            ModuleKind::Filter => "filter",
            ModuleKind::Vca => "vca",
            ModuleKind::Envelope => "envelope",
            ModuleKind::Lfo => "lfo",
            ModuleKind::Noise => "noise",
            ModuleKind::Mixer => "mixer",
            ModuleKind::Delay => "delay",
            ModuleKind::Reverb => "reverb",
            ModuleKind::Output => "output",
        }
    }

    /// True for kinds processed in-engine rather than by an external node.
    pub fn has_dsp_unit(&self) -> bool {
        !matches!(
            self,
            ModuleKind::Delay | ModuleKind::Reverb | ModuleKind::Output
        )
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub direction: PortDirection,
    pub signal_type: SignalType,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaling: Option<ParamScaling>,
    /// Quantization grid for discrete choices (e.g. waveform select).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// Declarative schema for one module type: its ports and parameters in the
/// order the editor shows them and the engine delivers them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDefinition {
    #[serde(rename = "type")]
    pub kind: ModuleKind,
    pub label: &'static str,
    pub category: ModuleCategory,
    pub color: &'static str,
    pub inputs: &'static [PortConfig],
    pub outputs: &'static [PortConfig],
    pub params: &'static [ParamConfig],
}

/// Addresses one port of one module instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortId {
    pub module_id: String,
    pub port_id: String,
}

impl PortId {
    pub fn new(module_id: impl Into<String>, port_id: impl Into<String>) -> Self {
        PortId {
            module_id: module_id.into(),
            port_id: port_id.into(),
        }
    }
}

impl std::fmt::Display for PortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module_id, self.port_id)
    }
}

/// A patch cable. `signal_type` is copied from the source port when the
/// connection is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub from: PortId,
    pub to: PortId,
    pub signal_type: SignalType,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

/// One module instance in a patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ModuleKind,
    pub position: Position,
    pub params: BTreeMap<String, f64>,
}

/// The serialized patch: the structure exchanged with the editor and
/// persistence layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchState {
    pub version: u32,
    pub name: String,
    pub nodes: Vec<NodeState>,
    pub connections: Vec<Connection>,
}

/// Time constant for control-path parameter smoothing. Roughly the shortest
/// ramp that keeps knob moves free of audible stepping.
pub const SMOOTHING_TIME_SECONDS: f32 = 0.010;

/// One-pole exponential approach toward a target value, advanced once per
/// sample on the render path. Prevents clicks from control-path parameter
/// writes.
#[derive(Debug, Clone, Copy)]
pub struct Smoothed {
    current: f32,
    target: f32,
    coeff: f32,
}

impl Smoothed {
    pub fn new(value: f32, sample_rate: f32) -> Self {
        Smoothed {
            current: value,
            target: value,
            coeff: (-1.0 / (SMOOTHING_TIME_SECONDS * sample_rate)).exp(),
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump straight to `value` with no ramp.
    pub fn snap(&mut self, value: f32) {
        self.current = value;
        self.target = value;
    }

    pub fn value(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// Advance one sample toward the target and return the new value.
    pub fn advance(&mut self) -> f32 {
        self.current = self.target + (self.current - self.target) * self.coeff;
        self.current
    }
}
