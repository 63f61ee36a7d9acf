// SPDX-License-Identifier: MIT OR Apache-2.0
//! The graph manager: graph ownership, the node-type registry, selection,
//! and the authoring state machine.
//!
//! One manager is owned by the application root and injected into the
//! collaborators that need it; there is no global instance. Pointer and
//! keyboard events are handled one at a time, and `tick` runs after the
//! frame's events, so a press is visible to node execution within the same
//! tick.

use crate::connection::ConnectionId;
use crate::evaluation::{NoScriptHost, ScriptHost, TickContext};
use crate::graph::{Graph, GraphId};
use crate::interaction::{self, ConnectionDrag, InteractionMode, Projection};
use crate::node::{NodeId, NodeRegistry};
use crate::port::{PortDirection, PortId};
use egui::{pos2, Modifiers, Pos2};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;

/// Current selection set
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Selected nodes
    pub nodes: HashSet<NodeId>,
    /// Selected connections
    pub connections: HashSet<ConnectionId>,
}

impl Selection {
    /// Clear selection
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty()
    }

    /// Select a node, either replacing the selection or toggling membership
    pub fn select_node(&mut self, node: NodeId, toggle: bool) {
        if toggle {
            if !self.nodes.remove(&node) {
                self.nodes.insert(node);
            }
        } else {
            self.clear();
            self.nodes.insert(node);
        }
    }

    /// Select a connection, either replacing the selection or toggling membership
    pub fn select_connection(&mut self, connection: ConnectionId, toggle: bool) {
        if toggle {
            if !self.connections.remove(&connection) {
                self.connections.insert(connection);
            }
        } else {
            self.clear();
            self.connections.insert(connection);
        }
    }
}

/// Orchestrator owning every graph, the active-graph choice, the node-type
/// registry, the selection, and the live authoring state machine.
pub struct GraphManager {
    pub(crate) graphs: IndexMap<GraphId, Graph>,
    pub(crate) active: Option<GraphId>,
    pub(crate) registry: NodeRegistry,
    pub(crate) selection: Selection,
    pub(crate) mode: InteractionMode,
    snapshot_hook: Option<Box<dyn FnMut()>>,
    scripts: Box<dyn ScriptHost>,
    elapsed: f64,
}

impl GraphManager {
    /// Manager with the built-in node set and no graphs
    pub fn new() -> Self {
        Self {
            graphs: IndexMap::new(),
            active: None,
            registry: NodeRegistry::with_builtins(),
            selection: Selection::default(),
            mode: InteractionMode::Idle,
            snapshot_hook: None,
            scripts: Box::new(NoScriptHost),
            elapsed: 0.0,
        }
    }

    /// Install the snapshot callback, invoked once after each committed
    /// structural mutation
    pub fn set_snapshot_hook(&mut self, hook: impl FnMut() + 'static) {
        self.snapshot_hook = Some(Box::new(hook));
    }

    /// Install the embedded script evaluator
    pub fn set_script_host(&mut self, host: impl ScriptHost + 'static) {
        self.scripts = Box::new(host);
    }

    /// The node-type registry
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Mutable access to the node-type registry (plugin loading)
    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    /// The current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The current interaction state
    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    /// Seconds elapsed since the simulation started
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    // --- graph ownership -------------------------------------------------

    /// Create an empty graph; the first one becomes active
    pub fn add_graph(&mut self, name: impl Into<String>) -> GraphId {
        let graph = Graph::new(name);
        let id = graph.id;
        self.graphs.insert(id, graph);
        if self.active.is_none() {
            self.active = Some(id);
        }
        id
    }

    /// Remove a graph and everything in it
    pub fn remove_graph(&mut self, id: GraphId) -> Option<Graph> {
        let graph = self.graphs.swap_remove(&id)?;
        if self.active == Some(id) {
            self.active = self.graphs.keys().next().copied();
            self.selection.clear();
            self.mode = InteractionMode::Idle;
        }
        Some(graph)
    }

    /// Switch the active graph; unknown ids are ignored
    pub fn set_active_graph(&mut self, id: GraphId) {
        if self.graphs.contains_key(&id) && self.active != Some(id) {
            self.active = Some(id);
            self.selection.clear();
            self.mode = InteractionMode::Idle;
        }
    }

    /// Id of the active graph
    pub fn active_id(&self) -> Option<GraphId> {
        self.active
    }

    /// The active graph
    pub fn active_graph(&self) -> Option<&Graph> {
        self.graphs.get(&self.active?)
    }

    /// The active graph, mutably
    pub fn active_graph_mut(&mut self) -> Option<&mut Graph> {
        self.graphs.get_mut(&self.active?)
    }

    /// Get a graph by ID
    pub fn graph(&self, id: GraphId) -> Option<&Graph> {
        self.graphs.get(&id)
    }

    /// All graphs, in creation order
    pub fn graphs(&self) -> impl Iterator<Item = &Graph> {
        self.graphs.values()
    }

    // --- structural mutation ---------------------------------------------

    /// Create a node of a registered type in the active graph
    pub fn spawn_node(&mut self, tag: &str, position: [f32; 2]) -> Option<NodeId> {
        let active = self.active?;
        let Some(node) = self.registry.create(tag, position) else {
            tracing::debug!("Unknown node type: {tag}");
            return None;
        };
        let id = node.id;
        self.graphs.get_mut(&active)?.add_node(node);
        self.fire_snapshot();
        Some(id)
    }

    /// Remove a node from the active graph, cascading its connections and
    /// clearing it from the selection
    pub fn remove_node(&mut self, node_id: NodeId) -> bool {
        let Some(active) = self.active else {
            return false;
        };
        let Some(graph) = self.graphs.get_mut(&active) else {
            return false;
        };
        if graph.remove_node(node_id).is_none() {
            return false;
        }
        self.selection.nodes.remove(&node_id);
        if let Some(graph) = self.graphs.get(&active) {
            self.selection
                .connections
                .retain(|id| graph.connection(*id).is_some());
        }
        self.fire_snapshot();
        true
    }

    /// Wire an output port to an input port in the active graph.
    ///
    /// A rejected connection (missing endpoint, incompatible types,
    /// duplicate) leaves the graph untouched and surfaces only as an advisory
    /// log line.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_port: PortId,
        to_node: NodeId,
        to_port: PortId,
    ) -> Option<ConnectionId> {
        let graph = self.graphs.get_mut(&self.active?)?;
        match graph.connect(from_node, from_port, to_node, to_port) {
            Ok(id) => {
                self.fire_snapshot();
                Some(id)
            }
            Err(err) => {
                tracing::debug!("Connection rejected: {err}");
                None
            }
        }
    }

    /// Remove a connection from the active graph; a stale id is a no-op
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> bool {
        let Some(graph) = self.active.and_then(|id| self.graphs.get_mut(&id)) else {
            return false;
        };
        if graph.disconnect(connection_id).is_none() {
            return false;
        }
        self.selection.connections.remove(&connection_id);
        self.fire_snapshot();
        true
    }

    /// Remove everything selected: connections first, then nodes (each
    /// cascading its own connections). One snapshot if anything was removed.
    pub fn delete_selected(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        let connections: Vec<ConnectionId> = self.selection.connections.drain().collect();
        let nodes: Vec<NodeId> = self.selection.nodes.drain().collect();
        let Some(graph) = self.active.and_then(|id| self.graphs.get_mut(&id)) else {
            return;
        };
        let mut removed = false;
        for id in connections {
            removed |= graph.disconnect(id).is_some();
        }
        for id in nodes {
            removed |= graph.remove_node(id).is_some();
        }
        if removed {
            self.fire_snapshot();
        }
    }

    // --- interaction state machine ---------------------------------------

    /// Handle a primary-button press at a screen position
    pub fn pointer_pressed(&mut self, screen: Pos2, modifiers: Modifiers, projection: &dyn Projection) {
        let Some(graph) = self.active.and_then(|id| self.graphs.get(&id)) else {
            return;
        };

        // Ports first: their hit radius reaches past the node edge.
        if let Some((node_id, port_id)) = interaction::find_port_at(graph, screen, projection) {
            let Some(port) = graph.node(node_id).and_then(|node| node.port(port_id)) else {
                return;
            };
            self.mode = InteractionMode::DraggingConnection(ConnectionDrag {
                node: node_id,
                port: port_id,
                direction: port.direction,
                port_type: port.port_type,
                current: screen,
            });
            return;
        }

        if let Some(node_id) = interaction::find_node_at(graph, screen, projection) {
            let Some(node) = graph.node(node_id) else {
                return;
            };
            let world = projection.screen_to_world(screen);
            let offset = world - pos2(node.position[0], node.position[1]);
            self.selection.select_node(node_id, modifiers.shift);
            self.mode = InteractionMode::DraggingNode {
                node: node_id,
                offset,
            };
            return;
        }

        if let Some(connection) = interaction::find_connection_at(graph, screen, projection) {
            self.selection.select_connection(connection, modifiers.shift);
            return;
        }

        self.selection.clear();
    }

    /// Handle pointer movement at a screen position
    pub fn pointer_moved(&mut self, screen: Pos2, projection: &dyn Projection) {
        match &mut self.mode {
            InteractionMode::Idle => {}
            InteractionMode::DraggingNode { node, offset } => {
                let node = *node;
                let offset = *offset;
                let world = projection.screen_to_world(screen);
                // Topology-preserving: the graph is not marked dirty.
                if let Some(node) = self
                    .active
                    .and_then(|id| self.graphs.get_mut(&id))
                    .and_then(|graph| graph.node_mut(node))
                {
                    node.position = [world.x - offset.x, world.y - offset.y];
                }
            }
            InteractionMode::DraggingConnection(drag) => {
                drag.current = screen;
            }
        }
    }

    /// Handle a primary-button release at a screen position
    pub fn pointer_released(&mut self, screen: Pos2, projection: &dyn Projection) {
        match std::mem::take(&mut self.mode) {
            InteractionMode::Idle => {}
            InteractionMode::DraggingNode { .. } => {
                // Position changes commit straight to the snapshot hook.
                self.fire_snapshot();
            }
            InteractionMode::DraggingConnection(drag) => {
                let candidate = self
                    .active
                    .and_then(|id| self.graphs.get(&id))
                    .and_then(|graph| {
                        interaction::find_compatible_port(graph, screen, projection, &drag)
                    });
                let Some((node, port)) = candidate else {
                    // Released over nothing valid: cancel without mutating.
                    return;
                };
                // Stored edges always run output -> input, whichever end was
                // grabbed first.
                let (from_node, from_port, to_node, to_port) =
                    if drag.direction == PortDirection::Output {
                        (drag.node, drag.port, node, port)
                    } else {
                        (node, port, drag.node, drag.port)
                    };
                self.connect(from_node, from_port, to_node, to_port);
            }
        }
    }

    // --- per-tick simulation ---------------------------------------------

    /// Feed the per-tick pointer level to interactive nodes (buttons,
    /// toggles).
    ///
    /// Call once per tick before [`GraphManager::tick`] so a press lands in
    /// the same tick it occurred.
    pub fn update_interactive_nodes(
        &mut self,
        pointer: Pos2,
        pressed: bool,
        projection: &dyn Projection,
    ) {
        let Some(graph) = self.active.and_then(|id| self.graphs.get_mut(&id)) else {
            return;
        };
        for node in graph.nodes_mut() {
            let held =
                pressed && interaction::node_screen_rect(node, projection).contains(pointer);
            node.pointer_held(held);
        }
    }

    /// Inject external key state into a node.
    ///
    /// Nodes never read an input subsystem directly; variants that want key
    /// input are fed a boolean through this call each tick.
    pub fn inject_key_state(&mut self, node_id: NodeId, held: bool) {
        if let Some(node) = self
            .active
            .and_then(|id| self.graphs.get_mut(&id))
            .and_then(|graph| graph.node_mut(node_id))
        {
            node.key_held(held);
        }
    }

    /// Advance the simulation one tick: evaluate the active graph
    pub fn tick(&mut self, dt: f32) {
        self.elapsed += f64::from(dt);
        let Some(active) = self.active else {
            return;
        };
        let Some(graph) = self.graphs.get_mut(&active) else {
            return;
        };
        let mut ctx = TickContext::new(dt, self.elapsed, graph.id, self.scripts.as_mut());
        graph.evaluate(&mut ctx);
    }

    fn fire_snapshot(&mut self) {
        if let Some(hook) = &mut self.snapshot_hook {
            hook();
        }
    }
}

impl Default for GraphManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GraphManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphManager")
            .field("graphs", &self.graphs.len())
            .field("active", &self.active)
            .field("selection", &self.selection)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
