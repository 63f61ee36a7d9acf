// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persistence schema for graphs and the manager.
//!
//! Documents are plain serde structs saved as RON. The whole manager (every
//! graph plus the active choice) serializes as one unit. Ports carry their
//! current values through the round trip, and per-variant private state rides
//! in an opaque JSON bag so plugin types serialize without the engine knowing
//! their layout. An unknown type tag on load degrades to an inert placeholder
//! node instead of failing the document.

use crate::connection::Connection;
use crate::graph::{Graph, GraphId};
use crate::interaction::InteractionMode;
use crate::manager::GraphManager;
use crate::node::{Node, NodeId, NodeRegistry};
use crate::nodes::UnknownNode;
use crate::port::Port;
use serde::{Deserialize, Serialize};

/// Error raised while saving or loading a document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// RON serialization failed
    #[error("serialize error: {0}")]
    Serialize(#[from] ron::Error),

    /// RON parsing failed
    #[error("parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Document form of a single node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDoc {
    /// Node id
    pub id: NodeId,
    /// Registered type tag
    pub type_tag: String,
    /// Display name
    pub name: String,
    /// World position
    pub position: [f32; 2],
    /// Body size
    pub size: [f32; 2],
    /// Enabled flag
    pub enabled: bool,
    /// Header color override
    pub color: Option<[u8; 3]>,
    /// Execution-order index at save time
    pub order_index: usize,
    /// Input ports with their current values and attachments
    pub inputs: Vec<Port>,
    /// Output ports with their current values and attachments
    pub outputs: Vec<Port>,
    /// Per-variant private state bag
    pub state: Option<serde_json::Value>,
}

/// Document form of one graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDoc {
    /// Graph id
    pub id: GraphId,
    /// Graph name
    pub name: String,
    /// Nodes in declaration order
    pub nodes: Vec<NodeDoc>,
    /// Connections in declaration order
    pub connections: Vec<Connection>,
}

/// Document form of the whole manager: every graph plus the active choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerDoc {
    /// Graphs in creation order
    pub graphs: Vec<GraphDoc>,
    /// Active graph at save time
    pub active: Option<GraphId>,
}

impl ManagerDoc {
    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, DocumentError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Parse from RON
    pub fn from_ron(text: &str) -> Result<Self, DocumentError> {
        Ok(ron::from_str(text)?)
    }
}

fn node_to_doc(node: &Node) -> NodeDoc {
    NodeDoc {
        id: node.id,
        type_tag: node.type_tag.clone(),
        name: node.name.clone(),
        position: node.position,
        size: node.size,
        enabled: node.enabled,
        color: node.color,
        order_index: node.order_index,
        inputs: node.inputs().cloned().collect(),
        outputs: node.outputs().cloned().collect(),
        state: node.save_state(),
    }
}

fn node_from_doc(doc: NodeDoc, registry: &NodeRegistry) -> Node {
    let behavior = registry.behavior(&doc.type_tag).unwrap_or_else(|| {
        tracing::warn!("Unknown node type '{}', loading as inert", doc.type_tag);
        Box::new(UnknownNode::new(doc.type_tag.as_str()))
    });
    let mut node = Node {
        id: doc.id,
        type_tag: doc.type_tag,
        name: doc.name,
        position: doc.position,
        size: doc.size,
        enabled: doc.enabled,
        color: doc.color,
        order_index: doc.order_index,
        // Saved ports win over the factory's defaults: ids, values, and
        // attachments all survive the round trip.
        inputs: doc.inputs.into_iter().map(|port| (port.id, port)).collect(),
        outputs: doc
            .outputs
            .into_iter()
            .map(|port| (port.id, port))
            .collect(),
        behavior,
    };
    if let Some(state) = &doc.state {
        node.load_state(state);
    }
    node
}

impl Graph {
    /// Document form of this graph
    pub fn to_doc(&self) -> GraphDoc {
        GraphDoc {
            id: self.id,
            name: self.name.clone(),
            nodes: self.nodes().map(node_to_doc).collect(),
            connections: self.connections().cloned().collect(),
        }
    }

    /// Rebuild a graph from its document, resolving type tags in `registry`
    pub fn from_doc(doc: GraphDoc, registry: &NodeRegistry) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            nodes: doc
                .nodes
                .into_iter()
                .map(|node_doc| {
                    let node = node_from_doc(node_doc, registry);
                    (node.id, node)
                })
                .collect(),
            connections: doc
                .connections
                .into_iter()
                .map(|connection| (connection.id, connection))
                .collect(),
            order: Vec::new(),
            dirty: true,
        }
    }
}

impl GraphManager {
    /// Document form of the whole manager
    pub fn to_document(&self) -> ManagerDoc {
        ManagerDoc {
            graphs: self.graphs().map(Graph::to_doc).collect(),
            active: self.active_id(),
        }
    }

    /// Replace every graph from a document.
    ///
    /// Node types resolve against the current registry; unknown tags load as
    /// inert placeholders so the document never fails wholesale.
    pub fn load_document(&mut self, doc: ManagerDoc) {
        self.graphs = doc
            .graphs
            .into_iter()
            .map(|graph_doc| {
                let graph = Graph::from_doc(graph_doc, &self.registry);
                (graph.id, graph)
            })
            .collect();
        self.active = doc
            .active
            .filter(|id| self.graphs.contains_key(id))
            .or_else(|| self.graphs.keys().next().copied());
        self.selection.clear();
        self.mode = InteractionMode::Idle;
    }
}
