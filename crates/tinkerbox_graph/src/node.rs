// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions: the behavior trait, node instances, and the type registry.

use crate::connection::ConnectionId;
use crate::evaluation::{ExecuteError, TickContext};
use crate::interaction;
use crate::port::{Port, PortId, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Port set declared by a behavior at construction time.
#[derive(Debug, Default)]
pub struct NodePorts {
    /// Input ports, top to bottom
    pub inputs: Vec<Port>,
    /// Output ports, top to bottom
    pub outputs: Vec<Port>,
}

/// Behavior of one node variant: its port set, per-tick execution, and
/// private state.
///
/// One implementation exists per built-in variant; externally supplied
/// variants implement this trait and register a factory under their own tag
/// (see [`NodeRegistry`]), so the engine stays closed over a single dispatch
/// point.
pub trait NodeBehavior: 'static {
    /// Display name given to freshly created nodes
    fn name(&self) -> &str;

    /// Ports the node is constructed with.
    ///
    /// Called once at construction; the port set is fixed for the node's
    /// lifetime.
    fn ports(&self) -> NodePorts;

    /// Run one tick: read resolved inputs, write outputs, mutate private state.
    fn execute(
        &mut self,
        io: &mut NodeIo<'_>,
        ctx: &mut TickContext<'_>,
    ) -> Result<(), ExecuteError>;

    /// Private state for the document's custom-data bag
    fn save_state(&self) -> Option<serde_json::Value> {
        None
    }

    /// Restore private state from the custom-data bag
    fn load_state(&mut self, _state: &serde_json::Value) {}

    /// Per-tick pointer level: true while the primary button is held over the
    /// node's on-screen bounds
    fn pointer_held(&mut self, _held: bool) {}

    /// Per-tick level for nodes driven by injected key state
    fn key_held(&mut self, _held: bool) {}
}

static NIL: Value = Value::Nil;

/// Port access handed to a behavior during `execute`.
///
/// Inputs are read-only, outputs are writable. Indices follow the order the
/// behavior declared its ports in.
pub struct NodeIo<'a> {
    inputs: &'a IndexMap<PortId, Port>,
    outputs: &'a mut IndexMap<PortId, Port>,
}

impl NodeIo<'_> {
    /// Value carried by an input port; `Nil` if the index is out of range.
    pub fn input(&self, index: usize) -> &Value {
        self.inputs
            .get_index(index)
            .map_or(&NIL, |(_, port)| &port.value)
    }

    /// Input value looked up by port name
    pub fn input_named(&self, name: &str) -> Option<&Value> {
        self.inputs
            .values()
            .find(|port| port.name == name)
            .map(|port| &port.value)
    }

    /// Iterate input (name, value) pairs in declaration order
    pub fn inputs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.inputs
            .values()
            .map(|port| (port.name.as_str(), &port.value))
    }

    /// Write an output port value; out-of-range indices are ignored.
    pub fn set_output(&mut self, index: usize, value: Value) {
        if let Some((_, port)) = self.outputs.get_index_mut(index) {
            port.value = value;
        }
    }

    /// Write an output port value by name; unknown names are ignored.
    pub fn set_output_named(&mut self, name: &str, value: Value) {
        if let Some(port) = self.outputs.values_mut().find(|port| port.name == name) {
            port.value = value;
        }
    }
}

/// A node instance in the graph.
///
/// The common fields live here; everything variant-specific (oscillator
/// phase, toggle state, compiled script handle) lives behind the boxed
/// [`NodeBehavior`].
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Registered type tag this node was created from
    pub type_tag: String,
    /// Display name (can be customized)
    pub name: String,
    /// Position in world space
    pub position: [f32; 2],
    /// Body size in world units, used for hit-testing
    pub size: [f32; 2],
    /// Disabled nodes are skipped by evaluation and keep their last outputs.
    pub enabled: bool,
    /// Custom header color (optional)
    pub color: Option<[u8; 3]>,
    /// Index into the cached execution order; refreshed when the order is
    pub order_index: usize,
    pub(crate) inputs: IndexMap<PortId, Port>,
    pub(crate) outputs: IndexMap<PortId, Port>,
    pub(crate) behavior: Box<dyn NodeBehavior>,
}

impl Node {
    /// Create a node of the given type from its behavior
    pub fn new(type_tag: impl Into<String>, behavior: Box<dyn NodeBehavior>) -> Self {
        let NodePorts { inputs, outputs } = behavior.ports();
        let size = interaction::default_node_size(inputs.len(), outputs.len());
        Self {
            id: NodeId::new(),
            type_tag: type_tag.into(),
            name: behavior.name().to_string(),
            position: [0.0, 0.0],
            size,
            enabled: true,
            color: None,
            order_index: 0,
            inputs: inputs.into_iter().map(|port| (port.id, port)).collect(),
            outputs: outputs.into_iter().map(|port| (port.id, port)).collect(),
            behavior,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Get an input port by index
    pub fn input(&self, index: usize) -> Option<&Port> {
        self.inputs.get_index(index).map(|(_, port)| port)
    }

    /// Get an output port by index
    pub fn output(&self, index: usize) -> Option<&Port> {
        self.outputs.get_index(index).map(|(_, port)| port)
    }

    /// Set the value carried by an input port (authoring surface)
    pub fn set_input(&mut self, index: usize, value: Value) {
        if let Some((_, port)) = self.inputs.get_index_mut(index) {
            port.value = value;
        }
    }

    /// Get a port by ID, searching inputs then outputs
    pub fn port(&self, port_id: PortId) -> Option<&Port> {
        self.inputs
            .get(&port_id)
            .or_else(|| self.outputs.get(&port_id))
    }

    /// Iterate input ports in declaration order
    pub fn inputs(&self) -> impl DoubleEndedIterator<Item = &Port> {
        self.inputs.values()
    }

    /// Iterate output ports in declaration order
    pub fn outputs(&self) -> impl DoubleEndedIterator<Item = &Port> {
        self.outputs.values()
    }

    /// All ports, inputs first
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.values().chain(self.outputs.values())
    }

    /// Forward the per-tick pointer level to the behavior
    pub fn pointer_held(&mut self, held: bool) {
        self.behavior.pointer_held(held);
    }

    /// Forward injected key state to the behavior
    pub fn key_held(&mut self, held: bool) {
        self.behavior.key_held(held);
    }

    /// Private behavior state for the document's custom-data bag
    pub fn save_state(&self) -> Option<serde_json::Value> {
        self.behavior.save_state()
    }

    pub(crate) fn load_state(&mut self, state: &serde_json::Value) {
        self.behavior.load_state(state);
    }

    pub(crate) fn execute(&mut self, ctx: &mut TickContext<'_>) -> Result<(), ExecuteError> {
        let mut io = NodeIo {
            inputs: &self.inputs,
            outputs: &mut self.outputs,
        };
        self.behavior.execute(&mut io, ctx)
    }

    pub(crate) fn set_input_value(&mut self, port_id: PortId, value: Value) {
        if let Some(port) = self.inputs.get_mut(&port_id) {
            port.value = value;
        }
    }

    pub(crate) fn port_mut(&mut self, port_id: PortId) -> Option<&mut Port> {
        match self.inputs.get_mut(&port_id) {
            Some(port) => Some(port),
            None => self.outputs.get_mut(&port_id),
        }
    }

    pub(crate) fn attach_connection(&mut self, port_id: PortId, connection: ConnectionId) {
        if let Some(port) = self.port_mut(port_id) {
            port.connections.push(connection);
        }
    }

    pub(crate) fn detach_connection(&mut self, connection: ConnectionId) {
        for port in self.inputs.values_mut().chain(self.outputs.values_mut()) {
            port.connections.retain(|id| *id != connection);
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type_tag", &self.type_tag)
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("order_index", &self.order_index)
            .finish_non_exhaustive()
    }
}

/// Factory producing a fresh behavior for a node type
pub type NodeFactory = Box<dyn Fn() -> Box<dyn NodeBehavior>>;

/// Registry of available node types, keyed by string tag.
///
/// Built-ins and plugin-supplied variants register through the same call, so
/// node creation stays closed over one polymorphic dispatch point.
pub struct NodeRegistry {
    factories: IndexMap<String, NodeFactory>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    /// Registry preloaded with the built-in node set
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::nodes::register_builtins(&mut registry);
        registry
    }

    /// Register a node type under a tag.
    ///
    /// A later registration replaces an earlier one with the same tag.
    pub fn register_type<F>(&mut self, tag: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn NodeBehavior> + 'static,
    {
        self.factories.insert(tag.into(), Box::new(factory));
    }

    /// Whether a tag is registered
    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Registered tags, in registration order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Fresh behavior for a tag
    pub fn behavior(&self, tag: &str) -> Option<Box<dyn NodeBehavior>> {
        self.factories.get(tag).map(|factory| factory())
    }

    /// Create a node of the given type at a world position
    pub fn create(&self, tag: &str, position: [f32; 2]) -> Option<Node> {
        let behavior = self.behavior(tag)?;
        Some(Node::new(tag, behavior).with_position(position[0], position[1]))
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("tags", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortType;

    #[test]
    fn test_registry_create() {
        let registry = NodeRegistry::with_builtins();
        let node = registry.create("math.add", [10.0, 20.0]).unwrap();
        assert_eq!(node.type_tag, "math.add");
        assert_eq!(node.position, [10.0, 20.0]);
        assert_eq!(node.inputs().count(), 2);
        assert_eq!(node.outputs().count(), 1);
        assert!(node.enabled);
    }

    #[test]
    fn test_registry_unknown_tag() {
        let registry = NodeRegistry::with_builtins();
        assert!(registry.create("no.such.node", [0.0, 0.0]).is_none());
    }

    #[test]
    fn test_registration_replaces_same_tag() {
        let mut registry = NodeRegistry::new();
        registry.register_type("x", || {
            Box::new(crate::nodes::LogicGate::new(crate::nodes::GateOp::And))
        });
        registry.register_type("x", || Box::new(crate::nodes::Oscillator::default()));
        let node = registry.create("x", [0.0, 0.0]).unwrap();
        assert_eq!(node.name, "Oscillator");
    }

    #[test]
    fn test_node_port_lookup() {
        let registry = NodeRegistry::with_builtins();
        let node = registry.create("logic.and", [0.0, 0.0]).unwrap();
        let first = node.input(0).unwrap();
        assert_eq!(first.port_type, PortType::Bool);
        assert_eq!(node.port(first.id).unwrap().name, first.name);
    }
}
