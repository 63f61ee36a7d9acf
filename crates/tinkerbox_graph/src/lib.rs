// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph dataflow engine for the Tinkerbox sandbox.
//!
//! This crate is the visual-programming runtime behind Tinkerbox's circuit
//! panel: typed nodes (logic gates, math operators, oscillators, script
//! nodes, interactive buttons and toggles) wired into a directed graph that
//! is re-evaluated every simulation tick, while the user keeps editing it.
//!
//! ## Architecture
//!
//! - Typed input/output ports with authoring-time compatibility checks
//! - Tick evaluation in topological order, with a declaration-order fallback
//!   that keeps cyclic graphs running (one tick of lag around the cycle)
//! - A live authoring state machine: node dragging, drag-to-connect with
//!   type-checked candidates, selection, deletion
//! - Serialization of the whole manager as one RON document, with inert
//!   placeholders for node types that are not registered on load
//!
//! Everything outside the graph is an injected collaborator: the camera is a
//! [`Projection`](interaction::Projection), the script sandbox a
//! [`ScriptHost`](evaluation::ScriptHost), undo/redo a snapshot callback, and
//! extra node types come in through the [`NodeRegistry`].

pub mod connection;
pub mod document;
pub mod evaluation;
pub mod graph;
pub mod interaction;
pub mod manager;
pub mod node;
pub mod nodes;
pub mod port;

pub use connection::{Connection, ConnectionId};
pub use document::{DocumentError, GraphDoc, ManagerDoc, NodeDoc};
pub use evaluation::{ExecuteError, ScriptHandle, ScriptHost, ScriptScope, TickContext};
pub use graph::{ConnectionError, Graph, GraphId};
pub use interaction::{InteractionMode, Projection};
pub use manager::{GraphManager, Selection};
pub use node::{Node, NodeBehavior, NodeId, NodeIo, NodePorts, NodeRegistry};
pub use port::{Port, PortDirection, PortId, PortType, Value};
