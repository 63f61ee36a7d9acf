// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hit-testing and authoring-interaction geometry.
//!
//! All hit tests take a [`Projection`] supplied per call by the host's
//! camera, so the engine never assumes a concrete view transform. Port and
//! connection hits are judged in screen space (fixed pixel thresholds); node
//! bodies are judged in world space.

use crate::connection::ConnectionId;
use crate::graph::Graph;
use crate::node::{Node, NodeId};
use crate::port::{PortDirection, PortId, PortType};
use egui::{pos2, Pos2, Rect, Vec2};

/// Node body width in world units
pub const NODE_WIDTH: f32 = 180.0;
/// Header strip height above the port rows
pub const NODE_HEADER_HEIGHT: f32 = 24.0;
/// Vertical spacing of one port row
pub const PORT_HEIGHT: f32 = 22.0;
/// Screen-space radius within which a press grabs a port
pub const PORT_HIT_RADIUS: f32 = 9.0;
/// Screen-space distance within which a press selects a connection
pub const CONNECTION_HIT_DISTANCE: f32 = 6.0;

/// Horizontal pull of connection control points
const BEZIER_CURVATURE: f32 = 50.0;
/// Fixed parameter steps used when sampling a connection curve
const BEZIER_SAMPLES: usize = 32;

/// Camera projection supplied per frame by the host's rendering layer.
pub trait Projection {
    /// World position to screen position
    fn world_to_screen(&self, world: Pos2) -> Pos2;
    /// Screen position to world position
    fn screen_to_world(&self, screen: Pos2) -> Pos2;
}

/// Projection that maps world units straight to screen pixels
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProjection;

impl Projection for IdentityProjection {
    fn world_to_screen(&self, world: Pos2) -> Pos2 {
        world
    }

    fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        screen
    }
}

/// Dragging state for creating a connection
#[derive(Debug, Clone)]
pub struct ConnectionDrag {
    /// Node the drag started on
    pub node: NodeId,
    /// Port the drag started on
    pub port: PortId,
    /// Direction of the grabbed port
    pub direction: PortDirection,
    /// Declared type of the grabbed port
    pub port_type: PortType,
    /// Current pointer position (screen space)
    pub current: Pos2,
}

/// Authoring interaction state
#[derive(Debug, Clone, Default)]
pub enum InteractionMode {
    /// No drag in progress
    #[default]
    Idle,
    /// A node body is being dragged
    DraggingNode {
        /// Node being dragged
        node: NodeId,
        /// Pointer-to-node offset recorded at press (world space)
        offset: Vec2,
    },
    /// A connection is being dragged out of a port
    DraggingConnection(ConnectionDrag),
}

/// Default body size for a node with the given port counts
pub fn default_node_size(inputs: usize, outputs: usize) -> [f32; 2] {
    let rows = inputs.max(outputs).max(1);
    [
        NODE_WIDTH,
        NODE_HEADER_HEIGHT + rows as f32 * PORT_HEIGHT + 8.0,
    ]
}

/// World-space bounds of a node body
pub fn node_rect(node: &Node) -> Rect {
    Rect::from_min_size(
        pos2(node.position[0], node.position[1]),
        Vec2::new(node.size[0], node.size[1]),
    )
}

/// Screen-space bounds of a node body under the given projection
pub fn node_screen_rect(node: &Node, projection: &dyn Projection) -> Rect {
    let rect = node_rect(node);
    Rect::from_two_pos(
        projection.world_to_screen(rect.min),
        projection.world_to_screen(rect.max),
    )
}

/// World-space anchor of a port: inputs on the left edge, outputs on the right
pub fn port_anchor(node: &Node, port_id: PortId) -> Option<Pos2> {
    if let Some(row) = node.inputs().position(|port| port.id == port_id) {
        return Some(pos2(node.position[0], port_row_y(node, row)));
    }
    if let Some(row) = node.outputs().position(|port| port.id == port_id) {
        return Some(pos2(node.position[0] + node.size[0], port_row_y(node, row)));
    }
    None
}

fn port_row_y(node: &Node, row: usize) -> f32 {
    node.position[1] + NODE_HEADER_HEIGHT + row as f32 * PORT_HEIGHT + PORT_HEIGHT / 2.0
}

/// Topmost node whose body contains the pointer
pub fn find_node_at(graph: &Graph, screen: Pos2, projection: &dyn Projection) -> Option<NodeId> {
    let world = projection.screen_to_world(screen);
    // Later nodes draw on top; test them first.
    graph
        .nodes()
        .rev()
        .find(|node| node_rect(node).contains(world))
        .map(|node| node.id)
}

/// Port whose projected anchor lies within the hit radius of the pointer
pub fn find_port_at(
    graph: &Graph,
    screen: Pos2,
    projection: &dyn Projection,
) -> Option<(NodeId, PortId)> {
    let mut best: Option<(f32, NodeId, PortId)> = None;
    for node in graph.nodes() {
        for port in node.ports() {
            let Some(anchor) = port_anchor(node, port.id) else {
                continue;
            };
            let distance = projection.world_to_screen(anchor).distance(screen);
            if distance <= PORT_HIT_RADIUS && best.map_or(true, |(d, _, _)| distance < d) {
                best = Some((distance, node.id, port.id));
            }
        }
    }
    best.map(|(_, node, port)| (node, port))
}

/// Connection whose sampled curve passes within the hit distance of the pointer
pub fn find_connection_at(
    graph: &Graph,
    screen: Pos2,
    projection: &dyn Projection,
) -> Option<ConnectionId> {
    for connection in graph.connections() {
        let (Some(from), Some(to)) = (
            graph.node(connection.from_node),
            graph.node(connection.to_node),
        ) else {
            continue;
        };
        let (Some(a), Some(b)) = (
            port_anchor(from, connection.from_port),
            port_anchor(to, connection.to_port),
        ) else {
            continue;
        };
        let a = projection.world_to_screen(a);
        let b = projection.world_to_screen(b);
        if distance_to_connection(a, b, screen) <= CONNECTION_HIT_DISTANCE {
            return Some(connection.id);
        }
    }
    None
}

/// Nearest valid completion target for a connection drag: a port on a
/// different node, with the opposite direction and a compatible type
pub fn find_compatible_port(
    graph: &Graph,
    screen: Pos2,
    projection: &dyn Projection,
    drag: &ConnectionDrag,
) -> Option<(NodeId, PortId)> {
    let wanted = drag.direction.opposite();
    let mut best: Option<(f32, NodeId, PortId)> = None;
    for node in graph.nodes() {
        if node.id == drag.node {
            continue;
        }
        for port in node.ports() {
            if port.direction != wanted || !drag.port_type.is_compatible(port.port_type) {
                continue;
            }
            let Some(anchor) = port_anchor(node, port.id) else {
                continue;
            };
            let distance = projection.world_to_screen(anchor).distance(screen);
            if distance <= PORT_HIT_RADIUS && best.map_or(true, |(d, _, _)| distance < d) {
                best = Some((distance, node.id, port.id));
            }
        }
    }
    best.map(|(_, node, port)| (node, port))
}

/// Control points of the curve drawn for a connection between two anchors
pub fn connection_curve(from: Pos2, to: Pos2) -> [Pos2; 4] {
    let curvature = BEZIER_CURVATURE.min((to.x - from.x).abs() * 0.5);
    [
        from,
        pos2(from.x + curvature, from.y),
        pos2(to.x - curvature, to.y),
        to,
    ]
}

/// Minimum distance from a point to the sampled connection curve
pub fn distance_to_connection(from: Pos2, to: Pos2, point: Pos2) -> f32 {
    let [p0, p1, p2, p3] = connection_curve(from, to);
    let mut min = f32::MAX;
    for i in 0..=BEZIER_SAMPLES {
        let t = i as f32 / BEZIER_SAMPLES as f32;
        min = min.min(cubic_point(p0, p1, p2, p3, t).distance(point));
    }
    min
}

/// Point on a cubic bezier at parameter `t`
fn cubic_point(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, t: f32) -> Pos2 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;
    let mt3 = mt2 * mt;
    pos2(
        mt3 * p0.x + 3.0 * mt2 * t * p1.x + 3.0 * mt * t2 * p2.x + t3 * p3.x,
        mt3 * p0.y + 3.0 * mt2 * t * p1.y + 3.0 * mt * t2 * p2.y + t3 * p3.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeRegistry;

    fn test_graph() -> (Graph, NodeId) {
        let registry = NodeRegistry::with_builtins();
        let mut graph = Graph::new("test");
        let id = graph.add_node(registry.create("math.add", [100.0, 50.0]).unwrap());
        (graph, id)
    }

    #[test]
    fn test_port_anchors_sit_on_node_edges() {
        let (graph, id) = test_graph();
        let node = graph.node(id).unwrap();
        let input = node.input(0).unwrap().id;
        let output = node.output(0).unwrap().id;

        let left = port_anchor(node, input).unwrap();
        let right = port_anchor(node, output).unwrap();
        assert_eq!(left.x, 100.0);
        assert_eq!(right.x, 100.0 + node.size[0]);
        // Second input row sits one row lower.
        let second = node.input(1).unwrap().id;
        let below = port_anchor(node, second).unwrap();
        assert_eq!(below.y, left.y + PORT_HEIGHT);
    }

    #[test]
    fn test_find_node_at_body() {
        let (graph, id) = test_graph();
        let projection = IdentityProjection;
        assert_eq!(
            find_node_at(&graph, pos2(150.0, 60.0), &projection),
            Some(id)
        );
        assert_eq!(find_node_at(&graph, pos2(0.0, 0.0), &projection), None);
    }

    #[test]
    fn test_find_port_within_radius() {
        let (graph, id) = test_graph();
        let projection = IdentityProjection;
        let node = graph.node(id).unwrap();
        let input = node.input(0).unwrap().id;
        let anchor = port_anchor(node, input).unwrap();

        let near = pos2(anchor.x - 4.0, anchor.y + 3.0);
        assert_eq!(find_port_at(&graph, near, &projection), Some((id, input)));
        let far = pos2(anchor.x - 40.0, anchor.y);
        assert_eq!(find_port_at(&graph, far, &projection), None);
    }

    #[test]
    fn test_connection_distance_straight_segment() {
        // A horizontal curve degenerates to a straight line.
        let from = pos2(0.0, 0.0);
        let to = pos2(100.0, 0.0);
        assert!(distance_to_connection(from, to, pos2(50.0, 2.0)) <= 2.5);
        assert!(distance_to_connection(from, to, pos2(50.0, 30.0)) > 20.0);
    }
}
