//! The patch graph: module instances and the cables between their ports.
//!
//! This is the structural model shared by the editor and the renderer. It
//! validates every mutation against the module catalog, but deliberately
//! enforces no acyclic constraint: feedback loops are legal structure, and
//! whether the renderer tolerates them is the renderer's concern.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::registry;
use crate::types::{
    Connection, ModuleDefinition, NodeState, ParamConfig, PatchState, PortConfig, PortDirection,
    PortId, Position, SignalType,
};

pub const PATCH_VERSION: u32 = 1;

/// Errors from graph mutations and patch import. Every failing operation
/// leaves the graph unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchError {
    /// Instance creation for a type the catalog does not know.
    UnknownModuleType { module_type: String },

    /// A connection endpoint references a missing node/port, or the port
    /// directions do not match (source must be an output, destination an
    /// input).
    InvalidEndpoint { message: String },

    /// Source and destination declare different signal types
    /// (only under [`SignalTypePolicy::Enforced`]).
    SignalTypeMismatch { from: SignalType, to: SignalType },

    /// Operation addressed a node id not present in the graph.
    UnknownNode { node_id: String },

    /// Parameter write addressed an id the node's type does not declare.
    UnknownParam { node_id: String, param_id: String },

    /// Patch import could not be parsed or validated.
    MalformedPatch { message: String },
}

impl std::fmt::Display for PatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchError::UnknownModuleType { module_type } => {
                write!(f, "unknown module type: {}", module_type)
            }
            PatchError::InvalidEndpoint { message } => {
                write!(f, "invalid endpoint: {}", message)
            }
            PatchError::SignalTypeMismatch { from, to } => {
                write!(f, "signal type mismatch: {:?} -> {:?}", from, to)
            }
            PatchError::UnknownNode { node_id } => write!(f, "unknown node: {}", node_id),
            PatchError::UnknownParam { node_id, param_id } => {
                write!(f, "unknown param '{}' on node '{}'", param_id, node_id)
            }
            PatchError::MalformedPatch { message } => {
                write!(f, "malformed patch: {}", message)
            }
        }
    }
}

impl std::error::Error for PatchError {}

/// Whether `connect` checks the destination port's declared signal type
/// against the source's.
///
/// `Permissive` reproduces the historical behavior: the connection's type is
/// copied from the source port and the destination's declaration is never
/// consulted. `Enforced` rejects mismatched cables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalTypePolicy {
    #[default]
    Permissive,
    Enforced,
}

/// A mutable patch graph. Serializes to/from [`PatchState`].
#[derive(Debug, Clone)]
pub struct Patch {
    name: String,
    version: u32,
    nodes: Vec<NodeState>,
    connections: Vec<Connection>,
    policy: SignalTypePolicy,
}

impl Default for Patch {
    fn default() -> Self {
        Self::new()
    }
}

impl Patch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Patch {
            name: "Untitled".to_string(),
            version: PATCH_VERSION,
            nodes: Vec::new(),
            connections: Vec::new(),
            policy: SignalTypePolicy::default(),
        }
    }

    pub fn with_policy(policy: SignalTypePolicy) -> Self {
        Patch {
            policy,
            ..Self::new()
        }
    }

    pub fn set_policy(&mut self, policy: SignalTypePolicy) {
        self.policy = policy;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn nodes(&self) -> &[NodeState] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node(&self, id: &str) -> Option<&NodeState> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Add an instance of `module_type`, with every parameter at its default.
    /// Returns the generated node id.
    pub fn add_node(&mut self, module_type: &str, position: Position) -> Result<String, PatchError> {
        let def = registry::lookup(module_type).ok_or_else(|| PatchError::UnknownModuleType {
            module_type: module_type.to_string(),
        })?;

        let uuid = Uuid::new_v4().simple().to_string();
        let id = format!("{}_{}", module_type, &uuid[..8]);

        let params: BTreeMap<String, f64> = def
            .params
            .iter()
            .map(|p| (p.id.to_string(), p.default))
            .collect();

        self.nodes.push(NodeState {
            id: id.clone(),
            kind: def.kind,
            position,
            params,
        });
        Ok(id)
    }

    /// Remove a node and every connection touching it.
    pub fn remove_node(&mut self, id: &str) -> Result<(), PatchError> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| PatchError::UnknownNode {
                node_id: id.to_string(),
            })?;
        self.nodes.remove(index);
        self.connections
            .retain(|c| c.from.module_id != id && c.to.module_id != id);
        Ok(())
    }

    /// Connections that touch the given node.
    pub fn connections_for(&self, node_id: &str) -> Vec<Connection> {
        self.connections
            .iter()
            .filter(|c| c.from.module_id == node_id || c.to.module_id == node_id)
            .cloned()
            .collect()
    }

    /// Cable an output port to an input port. The connection's signal type
    /// is the source port's declared type. Connecting identical endpoints
    /// twice returns the existing connection id.
    pub fn connect(
        &mut self,
        from: PortId,
        to: PortId,
    ) -> Result<String, PatchError> {
        let from_port = self.resolve_port(&from, PortDirection::Output)?;
        let to_port = self.resolve_port(&to, PortDirection::Input)?;

        if self.policy == SignalTypePolicy::Enforced
            && from_port.signal_type != to_port.signal_type
        {
            return Err(PatchError::SignalTypeMismatch {
                from: from_port.signal_type,
                to: to_port.signal_type,
            });
        }

        if let Some(existing) = self
            .connections
            .iter()
            .find(|c| c.from == from && c.to == to)
        {
            return Ok(existing.id.clone());
        }

        let id = format!("{}->{}", from, to);
        self.connections.push(Connection {
            id: id.clone(),
            from,
            to,
            signal_type: from_port.signal_type,
        });
        Ok(id)
    }

    /// Remove the cable between two ports. Returns the removed connection's
    /// id, or `None` if no such cable existed.
    pub fn disconnect(
        &mut self,
        from: &PortId,
        to: &PortId,
    ) -> Option<String> {
        let index = self
            .connections
            .iter()
            .position(|c| &c.from == from && &c.to == to)?;
        Some(self.connections.remove(index).id)
    }

    /// Write a parameter value, clamped into the parameter's `[min, max]`
    /// and snapped to its step grid when one is declared. Out-of-range
    /// values are never rejected. Returns the effective stored value.
    pub fn set_param(
        &mut self,
        node_id: &str,
        param_id: &str,
        value: f64,
    ) -> Result<f64, PatchError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| PatchError::UnknownNode {
                node_id: node_id.to_string(),
            })?;
        let def = registry::definition(node.kind);
        let config = def
            .params
            .iter()
            .find(|p| p.id == param_id)
            .ok_or_else(|| PatchError::UnknownParam {
                node_id: node_id.to_string(),
                param_id: param_id.to_string(),
            })?;

        let effective = effective_param_value(config, value);
        node.params.insert(param_id.to_string(), effective);
        Ok(effective)
    }

    /// Current value of a parameter (its default if never written).
    pub fn param(&self, node_id: &str, param_id: &str) -> Option<f64> {
        let node = self.node(node_id)?;
        match node.params.get(param_id) {
            Some(v) => Some(*v),
            None => registry::definition(node.kind)
                .params
                .iter()
                .find(|p| p.id == param_id)
                .map(|p| p.default),
        }
    }

    /// Snapshot into the serializable wire form.
    pub fn to_state(&self) -> PatchState {
        PatchState {
            version: self.version,
            name: self.name.clone(),
            nodes: self.nodes.clone(),
            connections: self.connections.clone(),
        }
    }

    /// Validate a wire-form patch against the catalog and build a graph from
    /// it. Node order is preserved; parameter values are clamped; unknown
    /// param ids and dangling connection endpoints are rejected. On error
    /// nothing is constructed, so the caller's current graph is untouched.
    pub fn from_state(state: PatchState) -> Result<Self, PatchError> {
        Self::from_state_with_policy(state, SignalTypePolicy::default())
    }

    pub fn from_state_with_policy(
        state: PatchState,
        policy: SignalTypePolicy,
    ) -> Result<Self, PatchError> {
        let mut patch = Patch {
            name: state.name,
            version: state.version,
            nodes: Vec::with_capacity(state.nodes.len()),
            connections: Vec::new(),
            policy,
        };

        for node in state.nodes {
            let NodeState {
                id,
                kind,
                position,
                params: raw_params,
            } = node;
            if patch.node(&id).is_some() {
                return Err(PatchError::MalformedPatch {
                    message: format!("duplicate node id '{}'", id),
                });
            }
            let def = registry::definition(kind);
            let mut params = BTreeMap::new();
            for (param_id, value) in raw_params {
                let config = def
                    .params
                    .iter()
                    .find(|p| p.id == param_id)
                    .ok_or_else(|| PatchError::UnknownParam {
                        node_id: id.clone(),
                        param_id: param_id.clone(),
                    })?;
                params.insert(param_id, effective_param_value(config, value));
            }
            patch.nodes.push(NodeState {
                id,
                kind,
                position,
                params,
            });
        }

        for conn in state.connections {
            patch.resolve_port(&conn.from, PortDirection::Output)?;
            patch.resolve_port(&conn.to, PortDirection::Input)?;
            patch.connections.push(conn);
        }

        Ok(patch)
    }

    fn resolve_port(
        &self,
        port: &PortId,
        direction: PortDirection,
    ) -> Result<&'static PortConfig, PatchError> {
        let node = self
            .node(&port.module_id)
            .ok_or_else(|| PatchError::InvalidEndpoint {
                message: format!("no node '{}'", port.module_id),
            })?;
        let def: &'static ModuleDefinition = registry::definition(node.kind);
        let ports = match direction {
            PortDirection::Input => def.inputs,
            PortDirection::Output => def.outputs,
        };
        ports.iter().find(|p| p.id == port.port_id).ok_or_else(|| {
            // Distinguish a wrong-direction port from a missing one.
            let other = match direction {
                PortDirection::Input => def.outputs,
                PortDirection::Output => def.inputs,
            };
            let message = if other.iter().any(|p| p.id == port.port_id) {
                format!("port '{}' has the wrong direction", port)
            } else {
                format!("no port '{}'", port)
            };
            PatchError::InvalidEndpoint { message }
        })
    }
}

fn effective_param_value(config: &ParamConfig, value: f64) -> f64 {
    let mut value = value.clamp(config.min, config.max);
    if let Some(step) = config.step {
        if step > 0.0 {
            value = config.min + ((value - config.min) / step).round() * step;
            value = value.clamp(config.min, config.max);
        }
    }
    value
}
