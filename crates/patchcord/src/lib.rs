//! Engine host for the patchcord synthesizer core.
//!
//! Bridges the non-real-time control path (editor, persistence) and the
//! real-time render path: patch mutations and parameter writes are validated
//! here, delivered over lock-free queues, smoothed on the render side, and
//! retired units are handed back for deallocation off the render thread.

pub mod commands;
pub mod engine;

pub use engine::{Engine, RenderSide};
