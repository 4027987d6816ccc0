//! Modular synthesizer signal-processing core.
//!
//! This crate holds the module catalog, the patch graph model and its JSON
//! codec, and the per-module DSP units with their block-processing contract.
//! It is a pure library with no I/O or threading concerns; those belong to
//! the engine host layer.

#[macro_use]
extern crate lazy_static;

pub mod codec;
pub mod dsp;
pub mod patch;
pub mod registry;
pub mod types;

// Re-export commonly used items
pub use patch::{Patch, PatchError, SignalTypePolicy};
pub use types::{
    Connection, ModuleDefinition, ModuleKind, NodeState, PatchState, PortId, Position, SignalType,
};
