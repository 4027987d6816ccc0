//! The engine host: one control path, one render path.
//!
//! [`Engine`] is the control side. It owns the authoritative patch graph,
//! validates every mutation against the catalog, and hands changes to the
//! render side through a lock-free SPSC queue. [`RenderSide`] lives on the
//! real-time execution context: it applies pending changes only between
//! blocks, smooths control-path parameter writes into per-sample ramps, and
//! runs DSP units on demand for the external scheduler. Retired units travel
//! back over a garbage queue and are dropped on the control path.

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use parking_lot::Mutex;
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{debug, info, trace};

use patchcord_core::codec;
use patchcord_core::dsp::{MAX_PARAMS, ParamBlock, Unit};
use patchcord_core::patch::{Patch, SignalTypePolicy};
use patchcord_core::registry;
use patchcord_core::types::{Connection, NodeState, PatchState, PortId, Position, Smoothed};

use crate::commands::{
    COMMAND_QUEUE_CAPACITY, EngineCommand, GARBAGE_QUEUE_CAPACITY, GarbageItem, NodeInsert,
    PatchUpdate,
};

/// A DSP unit plus its render-side parameter state. Constructed on the
/// control path; all buffers are sized up front.
pub struct RenderSlot {
    unit: Unit,
    smoothers: Vec<Smoothed>,
    param_bufs: Vec<Vec<f32>>,
    param_scalar: Vec<Option<f32>>,
}

impl RenderSlot {
    pub fn new(unit: Unit, initial_params: &[f32], sample_rate: f32, max_block: usize) -> Self {
        let count = initial_params.len();
        RenderSlot {
            unit,
            smoothers: initial_params
                .iter()
                .map(|&v| Smoothed::new(v, sample_rate))
                .collect(),
            param_bufs: vec![vec![0.0; max_block]; count],
            param_scalar: vec![None; count],
        }
    }

    /// Advance smoothers for one block. Settled params are delivered as
    /// scalars, moving params as per-sample ramps.
    fn prepare(&mut self, frames: usize) {
        for (index, smoother) in self.smoothers.iter_mut().enumerate() {
            if smoother.is_settled() {
                self.param_scalar[index] = Some(smoother.value());
            } else {
                self.param_scalar[index] = None;
                for sample in self.param_bufs[index].iter_mut().take(frames) {
                    *sample = smoother.advance();
                }
            }
        }
    }
}

/// Control-path handle. All methods validate against the catalog, update the
/// authoritative patch, then enqueue the change for the render side.
pub struct Engine {
    sample_rate: f32,
    max_block: usize,
    patch: Mutex<Patch>,
    commands: Mutex<Producer<EngineCommand>>,
    garbage: Mutex<Consumer<GarbageItem>>,
}

impl Engine {
    /// Build a connected control/render pair. `max_block` is the largest
    /// block the render side will ever be asked for.
    pub fn new(sample_rate: f32, max_block: usize) -> (Engine, RenderSide) {
        let (command_tx, command_rx) = RingBuffer::new(COMMAND_QUEUE_CAPACITY);
        let (garbage_tx, garbage_rx) = RingBuffer::new(GARBAGE_QUEUE_CAPACITY);

        let engine = Engine {
            sample_rate,
            max_block,
            patch: Mutex::new(Patch::new()),
            commands: Mutex::new(command_tx),
            garbage: Mutex::new(garbage_rx),
        };
        let render = RenderSide {
            commands: command_rx,
            garbage: garbage_tx,
            slots: HashMap::new(),
            connections: Vec::new(),
            frames: 0,
            max_block,
        };
        (engine, render)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn set_signal_type_policy(&self, policy: SignalTypePolicy) {
        self.patch.lock().set_policy(policy);
    }

    /// Add a node and ship its DSP unit to the render side. Returns the new
    /// node id.
    pub fn add_node(&self, module_type: &str, position: Position) -> Result<String> {
        let node = {
            let mut patch = self.patch.lock();
            let id = patch.add_node(module_type, position)?;
            patch.node(&id).cloned()
        };
        let Some(node) = node else {
            return Err(anyhow!("node lookup failed after insert"));
        };

        if let Some(slot) = self.make_slot(&node) {
            let mut update = PatchUpdate::new();
            update.inserts.push(NodeInsert {
                id: node.id.clone(),
                slot,
            });
            self.push(EngineCommand::Update(update))?;
        }

        info!(node_id = %node.id, module_type, "added node");
        Ok(node.id)
    }

    /// Remove a node, its cables, and (deferred) its render-side unit.
    pub fn remove_node(&self, id: &str) -> Result<()> {
        let removed_connections = {
            let mut patch = self.patch.lock();
            let connections = patch.connections_for(id);
            patch.remove_node(id)?;
            connections
        };

        let mut update = PatchUpdate::new();
        update.removals.push(id.to_string());
        update
            .disconnects
            .extend(removed_connections.into_iter().map(|c| c.id));
        self.push(EngineCommand::Update(update))?;

        info!(node_id = %id, "removed node");
        Ok(())
    }

    pub fn connect(&self, from: PortId, to: PortId) -> Result<String> {
        let connection = {
            let mut patch = self.patch.lock();
            let id = patch.connect(from, to)?;
            patch.connections().iter().find(|c| c.id == id).cloned()
        };
        let Some(connection) = connection else {
            return Err(anyhow!("connection lookup failed after insert"));
        };

        let id = connection.id.clone();
        let mut update = PatchUpdate::new();
        update.connects.push(connection);
        self.push(EngineCommand::Update(update))?;

        debug!(connection = %id, "connected");
        Ok(id)
    }

    /// Returns `true` when a cable was actually removed.
    pub fn disconnect(&self, from: &PortId, to: &PortId) -> Result<bool> {
        let removed = self.patch.lock().disconnect(from, to);
        match removed {
            Some(id) => {
                let mut update = PatchUpdate::new();
                update.disconnects.push(id.clone());
                self.push(EngineCommand::Update(update))?;
                debug!(connection = %id, "disconnected");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Write a parameter. The stored value is clamped (and step-snapped)
    /// per the catalog; the render side ramps toward it. Returns the
    /// effective value.
    pub fn set_param(&self, node_id: &str, param_id: &str, value: f64) -> Result<f64> {
        let (effective, kind) = {
            let mut patch = self.patch.lock();
            let effective = patch.set_param(node_id, param_id, value)?;
            (effective, patch.node(node_id).map(|n| n.kind))
        };

        let Some(kind) = kind else {
            return Ok(effective);
        };
        let def = registry::definition(kind);
        let Some(param_index) = def.params.iter().position(|p| p.id == param_id) else {
            return Ok(effective);
        };

        if kind.has_dsp_unit() {
            self.push(EngineCommand::SetParam {
                node_id: node_id.to_string(),
                param_index,
                value: effective as f32,
                snap: def.params[param_index].step.is_some(),
            })?;
        }

        trace!(node_id, param_id, value = effective, "set param");
        Ok(effective)
    }

    /// Replace the whole patch from a validated wire state. Old units are
    /// retired before the new ones are installed.
    pub fn load_patch(&self, state: PatchState) -> Result<()> {
        self.install(Patch::from_state(state)?)
    }

    /// Replace the whole patch from JSON. On any parse or validation error
    /// the current patch stays in place.
    pub fn load_json(&self, json: &str) -> Result<()> {
        self.install(codec::import_json(json)?)
    }

    /// Load the init patch.
    pub fn load_default_patch(&self) -> Result<()> {
        self.install(codec::default_patch())
    }

    pub fn patch_state(&self) -> PatchState {
        self.patch.lock().to_state()
    }

    pub fn export_json(&self) -> String {
        codec::export_json(&self.patch.lock())
    }

    /// Drop units the render side has retired. Call periodically from the
    /// control path. Returns how many were reclaimed.
    pub fn collect_garbage(&self) -> usize {
        let mut garbage = self.garbage.lock();
        let mut count = 0;
        while let Ok(item) = garbage.pop() {
            drop(item);
            count += 1;
        }
        if count > 0 {
            debug!(count, "collected retired units");
        }
        count
    }

    fn install(&self, new_patch: Patch) -> Result<()> {
        let mut inserts = Vec::new();
        for node in new_patch.nodes() {
            if let Some(slot) = self.make_slot(node) {
                inserts.push(NodeInsert {
                    id: node.id.clone(),
                    slot,
                });
            }
        }
        let connections = new_patch.connections().to_vec();
        let name = new_patch.name().to_string();

        self.push(EngineCommand::ReplaceAll {
            inserts,
            connections,
        })?;
        *self.patch.lock() = new_patch;

        info!(patch = %name, "loaded patch");
        Ok(())
    }

    fn make_slot(&self, node: &NodeState) -> Option<RenderSlot> {
        let unit = Unit::create(node.kind, self.sample_rate, self.max_block)?;
        let def = registry::definition(node.kind);
        let initial: Vec<f32> = def
            .params
            .iter()
            .map(|p| node.params.get(p.id).copied().unwrap_or(p.default) as f32)
            .collect();
        Some(RenderSlot::new(
            unit,
            &initial,
            self.sample_rate,
            self.max_block,
        ))
    }

    fn push(&self, command: EngineCommand) -> Result<()> {
        self.commands
            .lock()
            .push(command)
            .map_err(|_| anyhow!("command queue full"))
    }
}

/// Render-path handle, owned by the real-time execution context. The
/// external scheduler calls [`begin_block`](RenderSide::begin_block) once
/// per block, then [`process_node`](RenderSide::process_node) per node in
/// its own traversal order, copying upstream outputs into its own input
/// buffers between calls.
pub struct RenderSide {
    commands: Consumer<EngineCommand>,
    garbage: Producer<GarbageItem>,
    slots: HashMap<String, RenderSlot>,
    connections: Vec<Connection>,
    frames: usize,
    max_block: usize,
}

impl RenderSide {
    /// Apply every pending control-path change, then advance parameter
    /// smoothers for a block of `frames` samples. Changes are only ever
    /// applied here, between blocks, so the rest of the block observes one
    /// consistent snapshot.
    pub fn begin_block(&mut self, frames: usize) {
        self.frames = frames.min(self.max_block);

        while let Ok(command) = self.commands.pop() {
            match command {
                EngineCommand::Update(update) => self.apply_update(update),
                EngineCommand::SetParam {
                    node_id,
                    param_index,
                    value,
                    snap,
                } => {
                    if let Some(slot) = self.slots.get_mut(&node_id) {
                        if let Some(smoother) = slot.smoothers.get_mut(param_index) {
                            if snap {
                                smoother.snap(value);
                            } else {
                                smoother.set_target(value);
                            }
                        }
                    }
                }
                EngineCommand::ReplaceAll {
                    inserts,
                    connections,
                } => {
                    for (_, slot) in self.slots.drain() {
                        let _ = self.garbage.push(GarbageItem::Node(slot));
                    }
                    for insert in inserts {
                        self.slots.insert(insert.id, insert.slot);
                    }
                    self.connections = connections;
                }
            }
        }

        for slot in self.slots.values_mut() {
            slot.prepare(self.frames);
        }
    }

    /// Run one node's unit over the current block. `inputs` carries one
    /// optional slice per declared input port, in catalog order. Returns
    /// `false` if the node has no render-side unit.
    pub fn process_node(&mut self, id: &str, inputs: &[Option<&[f32]>]) -> bool {
        let frames = self.frames;
        let Some(slot) = self.slots.get_mut(id) else {
            return false;
        };

        let RenderSlot {
            unit,
            param_bufs,
            param_scalar,
            ..
        } = slot;

        let mut blocks = [ParamBlock::Scalar(0.0); MAX_PARAMS];
        let count = param_scalar.len().min(MAX_PARAMS);
        for index in 0..count {
            blocks[index] = match param_scalar[index] {
                Some(value) => ParamBlock::Scalar(value),
                None => ParamBlock::Block(&param_bufs[index][..frames]),
            };
        }

        unit.process(inputs, &blocks[..count], frames);
        true
    }

    /// Output of a node's port over the current block.
    pub fn node_output(&self, id: &str, port: &str) -> Option<&[f32]> {
        let buffer = self.slots.get(id)?.unit.output(port)?;
        Some(&buffer[..self.frames])
    }

    /// The topology snapshot the current block was started with.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.slots.len()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    fn apply_update(&mut self, update: PatchUpdate) {
        self.connections
            .retain(|c| !update.disconnects.contains(&c.id));
        for id in &update.removals {
            if let Some(slot) = self.slots.remove(id) {
                // If the garbage queue is full the slot drops here; bounded
                // fallback for a control path that stopped draining.
                let _ = self.garbage.push(GarbageItem::Node(slot));
            }
        }
        for insert in update.inserts {
            self.slots.insert(insert.id, insert.slot);
        }
        for connection in update.connects {
            if !self.connections.iter().any(|c| c.id == connection.id) {
                self.connections.push(connection);
            }
        }
    }
}
