//! Command queue types for control-path to render-path communication.
//!
//! The control path computes a complete change and sends it as one unit;
//! the render path drains the queue between blocks, so a block never sees a
//! half-applied update.

use patchcord_core::types::Connection;

use crate::engine::RenderSlot;

/// A module instance travelling to the render side, pre-constructed on the
/// control path so the render path never allocates buffers.
pub struct NodeInsert {
    pub id: String,
    pub slot: RenderSlot,
}

/// A single atomic patch update - always applied as a complete unit.
#[derive(Default)]
pub struct PatchUpdate {
    pub inserts: Vec<NodeInsert>,
    /// Node ids whose units should be retired.
    pub removals: Vec<String>,
    pub connects: Vec<Connection>,
    /// Connection ids to drop (applied before removals/inserts).
    pub disconnects: Vec<String>,
}

impl PatchUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty()
            && self.removals.is_empty()
            && self.connects.is_empty()
            && self.disconnects.is_empty()
    }
}

/// Commands sent to the render path via the command queue.
pub enum EngineCommand {
    /// Atomic structural update.
    Update(PatchUpdate),

    /// Lightweight param-only write (e.g. slider moves). The value is
    /// already clamped; `snap` skips the smoothing ramp for step-quantized
    /// params.
    SetParam {
        node_id: String,
        param_index: usize,
        value: f32,
        snap: bool,
    },

    /// Replace the whole render graph (patch load). Every existing unit is
    /// retired first.
    ReplaceAll {
        inserts: Vec<NodeInsert>,
        connections: Vec<Connection>,
    },
}

/// Items to be deallocated on the control path instead of the render path.
/// The render path pushes retired units here; the control path drains and
/// drops them. A unit is only retired between blocks, so nothing in flight
/// can still reference it.
pub enum GarbageItem {
    Node(RenderSlot),
}

/// Capacity for the command queue (control -> render).
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Capacity for the garbage queue (render -> control). Generous so the
/// render path is not forced to drop retired units itself when the control
/// path is slow to drain.
pub const GARBAGE_QUEUE_CAPACITY: usize = 4096;
