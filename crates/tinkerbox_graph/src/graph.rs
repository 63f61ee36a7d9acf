// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure: nodes, connections, and tick evaluation.

use crate::connection::{Connection, ConnectionId};
use crate::evaluation::TickContext;
use crate::node::{Node, NodeId};
use crate::port::{PortDirection, PortId, PortType, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Unique identifier for a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub Uuid);

impl GraphId {
    /// Create a new random graph ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

/// A node graph.
///
/// The graph exclusively owns its nodes and connections; everything outside
/// refers to them by id, so removal while iterating elsewhere can never leave
/// a dangling reference. Structural changes mark the graph dirty, which
/// forces the execution order to be recomputed on the next evaluation; moving
/// a node does not, since topology is unaffected.
#[derive(Debug)]
pub struct Graph {
    /// Unique graph ID
    pub id: GraphId,
    /// Graph name
    pub name: String,
    pub(crate) nodes: IndexMap<NodeId, Node>,
    pub(crate) connections: IndexMap<ConnectionId, Connection>,
    pub(crate) order: Vec<NodeId>,
    pub(crate) dirty: bool,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GraphId::new(),
            name: name.into(),
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            order: Vec::new(),
            dirty: false,
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        self.dirty = true;
        id
    }

    /// Remove a node, cascading every connection that references it
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.swap_remove(&node_id)?;
        let dropped: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|connection| connection.involves_node(node_id))
            .map(|connection| connection.id)
            .collect();
        for id in dropped {
            if let Some(connection) = self.connections.swap_remove(&id) {
                if let Some(other) = self.nodes.get_mut(&connection.from_node) {
                    other.detach_connection(id);
                }
                if let Some(other) = self.nodes.get_mut(&connection.to_node) {
                    other.detach_connection(id);
                }
            }
        }
        self.dirty = true;
        Some(node)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes in declaration order
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all nodes mutably
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a connection from an output port to an input port.
    ///
    /// Rejected without mutation when an endpoint is missing, the ports do
    /// not form an output→input pair, the declared types are incompatible, or
    /// an identical connection already exists.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_port: PortId,
        to_node: NodeId,
        to_port: PortId,
    ) -> Result<ConnectionId, ConnectionError> {
        let source = self
            .nodes
            .get(&from_node)
            .ok_or(ConnectionError::NodeNotFound(from_node))?;
        let target = self
            .nodes
            .get(&to_node)
            .ok_or(ConnectionError::NodeNotFound(to_node))?;

        let source_port = source
            .port(from_port)
            .ok_or(ConnectionError::PortNotFound(from_port))?;
        let target_port = target
            .port(to_port)
            .ok_or(ConnectionError::PortNotFound(to_port))?;

        if source_port.direction != PortDirection::Output
            || target_port.direction != PortDirection::Input
        {
            return Err(ConnectionError::WrongDirection);
        }

        if !source_port.port_type.is_compatible(target_port.port_type) {
            return Err(ConnectionError::Incompatible(
                source_port.port_type,
                target_port.port_type,
            ));
        }

        if self.connections.values().any(|c| {
            c.from_node == from_node
                && c.from_port == from_port
                && c.to_node == to_node
                && c.to_port == to_port
        }) {
            return Err(ConnectionError::Duplicate);
        }

        let connection = Connection::new(from_node, from_port, to_node, to_port);
        let id = connection.id;
        self.connections.insert(id, connection);
        if let Some(node) = self.nodes.get_mut(&from_node) {
            node.attach_connection(from_port, id);
        }
        if let Some(node) = self.nodes.get_mut(&to_node) {
            node.attach_connection(to_port, id);
        }
        self.dirty = true;
        Ok(id)
    }

    /// Remove a connection; a stale id is a no-op
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.swap_remove(&connection_id)?;
        if let Some(node) = self.nodes.get_mut(&connection.from_node) {
            node.detach_connection(connection_id);
        }
        if let Some(node) = self.nodes.get_mut(&connection.to_node) {
            node.detach_connection(connection_id);
        }
        self.dirty = true;
        Some(connection)
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get connections targeting a specific port
    pub fn connections_to(&self, port_id: PortId) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |c| c.to_port == port_id)
    }

    /// Get connections leaving a specific port
    pub fn connections_from(&self, port_id: PortId) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |c| c.from_port == port_id)
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// The cached execution order.
    ///
    /// A valid topological order while the graph is acyclic; declaration
    /// order otherwise. Stale until the first evaluation after a structural
    /// change.
    pub fn execution_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Whether a structural change is pending an order recomputation
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Evaluate every enabled node once, in execution order.
    ///
    /// Input ports are refreshed from their connected source outputs before
    /// each node runs. A node failure is logged and skipped over; the tick
    /// always completes.
    pub fn evaluate(&mut self, ctx: &mut TickContext<'_>) {
        if self.dirty {
            self.recompute_order();
        }
        ctx.graph = self.id;

        let order = self.order.clone();
        for node_id in order {
            let enabled = match self.nodes.get(&node_id) {
                Some(node) => node.enabled,
                None => continue,
            };
            if !enabled {
                continue;
            }

            // Pull source output values across this node's incoming
            // connections. With several connections into one input, the last
            // one visited wins; which that is is unspecified.
            let updates: Vec<(PortId, Value)> = self
                .connections
                .values()
                .filter(|connection| connection.to_node == node_id)
                .filter_map(|connection| {
                    let source = self.nodes.get(&connection.from_node)?;
                    let port = source.port(connection.from_port)?;
                    Some((connection.to_port, port.value.clone()))
                })
                .collect();

            let Some(node) = self.nodes.get_mut(&node_id) else {
                continue;
            };
            for (port_id, value) in updates {
                node.set_input_value(port_id, value);
            }

            ctx.node = node_id;
            if let Err(err) = node.execute(ctx) {
                tracing::warn!("Node '{}' ({:?}) failed: {err}", node.name, node_id);
            }
        }
    }

    /// Recompute the execution order with Kahn's algorithm.
    ///
    /// When a cycle keeps the order from covering every node, fall back to
    /// declaration order so evaluation still makes forward progress each tick
    /// (values cross the cycle with a one-tick lag).
    fn recompute_order(&mut self) {
        let mut in_degree: IndexMap<NodeId, usize> =
            self.nodes.keys().map(|id| (*id, 0)).collect();
        for connection in self.connections.values() {
            if let Some(degree) = in_degree.get_mut(&connection.to_node) {
                *degree += 1;
            }
        }

        let mut queue: VecDeque<NodeId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node_id) = queue.pop_front() {
            order.push(node_id);
            for connection in self.connections.values() {
                if connection.from_node != node_id {
                    continue;
                }
                if let Some(degree) = in_degree.get_mut(&connection.to_node) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(connection.to_node);
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            order = self.nodes.keys().copied().collect();
        }

        for (index, node_id) in order.iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.order_index = index;
            }
        }
        self.order = order;
        self.dirty = false;
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when creating a connection
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("port not found: {0:?}")]
    PortNotFound(PortId),

    /// The ports do not form an output→input pair
    #[error("connections must run from an output port to an input port")]
    WrongDirection,

    /// Incompatible port types
    #[error("incompatible port types: {0:?} -> {1:?}")]
    Incompatible(PortType, PortType),

    /// An identical connection already exists
    #[error("duplicate connection")]
    Duplicate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{ExecuteError, NoScriptHost};
    use crate::node::{NodeBehavior, NodeIo, NodePorts, NodeRegistry};
    use crate::port::Port;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Passes its input through and counts how often it ran.
    #[derive(Debug, Default)]
    struct Probe {
        runs: Rc<Cell<usize>>,
    }

    impl NodeBehavior for Probe {
        fn name(&self) -> &str {
            "Probe"
        }

        fn ports(&self) -> NodePorts {
            NodePorts {
                inputs: vec![Port::input("In", PortType::Any)],
                outputs: vec![Port::output("Out", PortType::Any)],
            }
        }

        fn execute(
            &mut self,
            io: &mut NodeIo<'_>,
            _ctx: &mut TickContext<'_>,
        ) -> Result<(), ExecuteError> {
            self.runs.set(self.runs.get() + 1);
            let value = io.input(0).clone();
            io.set_output(0, value);
            Ok(())
        }
    }

    /// Always fails.
    #[derive(Debug)]
    struct Faulty;

    impl NodeBehavior for Faulty {
        fn name(&self) -> &str {
            "Faulty"
        }

        fn ports(&self) -> NodePorts {
            NodePorts {
                inputs: vec![Port::input("In", PortType::Any)],
                outputs: vec![Port::output("Out", PortType::Any)],
            }
        }

        fn execute(
            &mut self,
            _io: &mut NodeIo<'_>,
            _ctx: &mut TickContext<'_>,
        ) -> Result<(), ExecuteError> {
            Err(ExecuteError::Other("boom".into()))
        }
    }

    /// Constant integer source.
    #[derive(Debug)]
    struct ConstInt(i32);

    impl NodeBehavior for ConstInt {
        fn name(&self) -> &str {
            "Const"
        }

        fn ports(&self) -> NodePorts {
            NodePorts {
                outputs: vec![Port::output("Out", PortType::Int)],
                ..NodePorts::default()
            }
        }

        fn execute(
            &mut self,
            io: &mut NodeIo<'_>,
            _ctx: &mut TickContext<'_>,
        ) -> Result<(), ExecuteError> {
            io.set_output(0, Value::Int(self.0));
            Ok(())
        }
    }

    fn probe_node(graph: &mut Graph, runs: &Rc<Cell<usize>>) -> NodeId {
        graph.add_node(Node::new(
            "test.probe",
            Box::new(Probe { runs: runs.clone() }),
        ))
    }

    fn tick(graph: &mut Graph) {
        let mut scripts = NoScriptHost;
        let mut ctx = TickContext::new(1.0 / 60.0, 0.0, graph.id, &mut scripts);
        graph.evaluate(&mut ctx);
    }

    fn out_port(graph: &Graph, node: NodeId) -> PortId {
        graph.node(node).unwrap().output(0).unwrap().id
    }

    fn in_port(graph: &Graph, node: NodeId) -> PortId {
        graph.node(node).unwrap().input(0).unwrap().id
    }

    #[test]
    fn test_topological_order() {
        let runs = Rc::new(Cell::new(0));
        let mut graph = Graph::new("test");
        // Insert in reverse so declaration order alone would be wrong.
        let c = probe_node(&mut graph, &runs);
        let b = probe_node(&mut graph, &runs);
        let a = probe_node(&mut graph, &runs);
        graph
            .connect(a, out_port(&graph, a), b, in_port(&graph, b))
            .unwrap();
        graph
            .connect(b, out_port(&graph, b), c, in_port(&graph, c))
            .unwrap();

        tick(&mut graph);

        for connection in graph.connections() {
            let source = graph.node(connection.from_node).unwrap().order_index;
            let target = graph.node(connection.to_node).unwrap().order_index;
            assert!(source < target);
        }
        assert_eq!(graph.execution_order().len(), 3);
        assert!(!graph.is_dirty());
    }

    #[test]
    fn test_cycle_falls_back_to_declaration_order() {
        let runs = Rc::new(Cell::new(0));
        let mut graph = Graph::new("test");
        let a = probe_node(&mut graph, &runs);
        let b = probe_node(&mut graph, &runs);
        graph
            .connect(a, out_port(&graph, a), b, in_port(&graph, b))
            .unwrap();
        graph
            .connect(b, out_port(&graph, b), a, in_port(&graph, a))
            .unwrap();

        tick(&mut graph);

        // One pass, every node exactly once, declaration order.
        assert_eq!(runs.get(), 2);
        assert_eq!(graph.execution_order(), [a, b]);
    }

    #[test]
    fn test_connect_idempotent() {
        let runs = Rc::new(Cell::new(0));
        let mut graph = Graph::new("test");
        let a = probe_node(&mut graph, &runs);
        let b = probe_node(&mut graph, &runs);
        let (from, to) = (out_port(&graph, a), in_port(&graph, b));
        assert!(graph.connect(a, from, b, to).is_ok());
        assert!(matches!(
            graph.connect(a, from, b, to),
            Err(ConnectionError::Duplicate)
        ));
        assert_eq!(graph.connection_count(), 1);
    }

    #[test]
    fn test_connect_incompatible_rejected() {
        let registry = NodeRegistry::with_builtins();
        let mut graph = Graph::new("test");
        let gate = graph.add_node(registry.create("logic.and", [0.0, 0.0]).unwrap());
        let math = graph.add_node(registry.create("math.add", [0.0, 0.0]).unwrap());
        // Bool output into a Float input.
        let result = graph.connect(
            gate,
            out_port(&graph, gate),
            math,
            in_port(&graph, math),
        );
        assert!(matches!(result, Err(ConnectionError::Incompatible(_, _))));
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_int_output_widens_to_float_input() {
        let registry = NodeRegistry::with_builtins();
        let mut graph = Graph::new("test");
        let constant = graph.add_node(Node::new("test.const", Box::new(ConstInt(7))));
        let math = graph.add_node(registry.create("math.add", [0.0, 0.0]).unwrap());
        graph
            .connect(
                constant,
                out_port(&graph, constant),
                math,
                in_port(&graph, math),
            )
            .unwrap();
        assert_eq!(graph.connection_count(), 1);

        tick(&mut graph);
        let sum = graph.node(math).unwrap().output(0).unwrap();
        assert_eq!(sum.value, Value::Float(7.0));
    }

    #[test]
    fn test_connect_rejects_wrong_direction() {
        let runs = Rc::new(Cell::new(0));
        let mut graph = Graph::new("test");
        let a = probe_node(&mut graph, &runs);
        let b = probe_node(&mut graph, &runs);
        let result = graph.connect(a, in_port(&graph, a), b, in_port(&graph, b));
        assert!(matches!(result, Err(ConnectionError::WrongDirection)));
    }

    #[test]
    fn test_remove_node_cascades_connections() {
        let runs = Rc::new(Cell::new(0));
        let mut graph = Graph::new("test");
        let a = probe_node(&mut graph, &runs);
        let b = probe_node(&mut graph, &runs);
        let c = probe_node(&mut graph, &runs);
        graph
            .connect(a, out_port(&graph, a), b, in_port(&graph, b))
            .unwrap();
        graph
            .connect(b, out_port(&graph, b), c, in_port(&graph, c))
            .unwrap();

        graph.remove_node(b);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.connection_count(), 0);
        // The surviving endpoints no longer list the dropped connections.
        assert!(graph.node(a).unwrap().output(0).unwrap().connections.is_empty());
        assert!(graph.node(c).unwrap().input(0).unwrap().connections.is_empty());
    }

    #[test]
    fn test_disconnect_keeps_nodes() {
        let runs = Rc::new(Cell::new(0));
        let mut graph = Graph::new("test");
        let a = probe_node(&mut graph, &runs);
        let b = probe_node(&mut graph, &runs);
        let id = graph
            .connect(a, out_port(&graph, a), b, in_port(&graph, b))
            .unwrap();
        assert!(graph.disconnect(id).is_some());
        assert_eq!(graph.node_count(), 2);
        // Stale id is a no-op.
        assert!(graph.disconnect(id).is_none());
    }

    #[test]
    fn test_disabled_node_is_skipped() {
        let runs = Rc::new(Cell::new(0));
        let mut graph = Graph::new("test");
        let a = probe_node(&mut graph, &runs);
        tick(&mut graph);
        assert_eq!(runs.get(), 1);

        graph.node_mut(a).unwrap().enabled = false;
        tick(&mut graph);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_failing_node_does_not_abort_tick() {
        let runs = Rc::new(Cell::new(0));
        let mut graph = Graph::new("test");
        let faulty = graph.add_node(Node::new("test.faulty", Box::new(Faulty)));
        let probe = probe_node(&mut graph, &runs);
        graph
            .connect(
                faulty,
                out_port(&graph, faulty),
                probe,
                in_port(&graph, probe),
            )
            .unwrap();

        tick(&mut graph);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_value_propagates_along_connection() {
        let runs = Rc::new(Cell::new(0));
        let mut graph = Graph::new("test");
        let constant = graph.add_node(Node::new("test.const", Box::new(ConstInt(42))));
        let probe = probe_node(&mut graph, &runs);
        graph
            .connect(
                constant,
                out_port(&graph, constant),
                probe,
                in_port(&graph, probe),
            )
            .unwrap();

        tick(&mut graph);
        let out = graph.node(probe).unwrap().output(0).unwrap();
        assert_eq!(out.value, Value::Int(42));
    }
}
