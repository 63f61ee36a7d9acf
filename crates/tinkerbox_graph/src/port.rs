// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use crate::connection::ConnectionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    /// Create a new random port ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

impl PortDirection {
    /// The opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// Declared data type of a port.
///
/// The declared type is an authoring-time compatibility hint used when wiring
/// connections; the value a port carries at runtime is not checked against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortType {
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// String value
    String,
    /// 2D vector
    Vector,
    /// Structured object
    Object,
    /// Raw bytes
    Binary,
    /// Any type (for generic nodes)
    Any,
}

impl PortType {
    /// Check if an output of this type may be wired to an input of `other`.
    ///
    /// `Any` connects to everything, identical types connect, and the
    /// `{Int, Float}` pair connects in both directions (numeric widening).
    /// Every other pair is incompatible. This runs once, at
    /// connection-creation time, never during evaluation.
    pub fn is_compatible(self, other: PortType) -> bool {
        if matches!(self, Self::Any) || matches!(other, Self::Any) {
            return true;
        }
        if self == other {
            return true;
        }
        matches!(
            (self, other),
            (Self::Int, Self::Float) | (Self::Float, Self::Int)
        )
    }
}

/// Dynamically typed payload carried by a port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// No value yet
    Nil,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
    /// String
    String(String),
    /// 2D vector
    Vector([f32; 2]),
    /// Structured object
    Object(serde_json::Value),
    /// Raw bytes
    Binary(Vec<u8>),
}

impl Value {
    /// The port type matching this payload (`Any` for `Nil`).
    pub fn port_type(&self) -> PortType {
        match self {
            Self::Nil => PortType::Any,
            Self::Bool(_) => PortType::Bool,
            Self::Int(_) => PortType::Int,
            Self::Float(_) => PortType::Float,
            Self::String(_) => PortType::String,
            Self::Vector(_) => PortType::Vector,
            Self::Object(_) => PortType::Object,
            Self::Binary(_) => PortType::Binary,
        }
    }

    /// Boolean coercion: numbers are truthy when nonzero, everything else is false.
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Bool(v) => *v,
            Self::Int(v) => *v != 0,
            Self::Float(v) => *v != 0.0,
            _ => false,
        }
    }

    /// Numeric coercion: booleans become 0/1, non-numbers become 0.
    pub fn as_f32(&self) -> f32 {
        match self {
            Self::Bool(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Int(v) => *v as f32,
            Self::Float(v) => *v,
            _ => 0.0,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Nil
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Vector([x, y]) => write!(f, "({x}, {y})"),
            Self::Object(v) => write!(f, "{v}"),
            Self::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// A port on a node.
///
/// Ports are created at node-construction time and the set is fixed for the
/// node's lifetime; only the carried value and the attachment list change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Unique port ID
    pub id: PortId,
    /// Port name
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Declared data type
    pub port_type: PortType,
    /// Value currently carried by the port
    pub value: Value,
    /// Connections attached to this port, in attachment order
    pub connections: Vec<ConnectionId>,
}

impl Port {
    /// Create a new port
    pub fn new(name: impl Into<String>, port_type: PortType, direction: PortDirection) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            direction,
            port_type,
            value: Value::Nil,
            connections: Vec::new(),
        }
    }

    /// Create a new input port
    pub fn input(name: impl Into<String>, port_type: PortType) -> Self {
        Self::new(name, port_type, PortDirection::Input)
    }

    /// Create a new output port
    pub fn output(name: impl Into<String>, port_type: PortType) -> Self {
        Self::new(name, port_type, PortDirection::Output)
    }

    /// Set the initial value
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    /// Check if a connection between this port and another is valid
    pub fn can_connect(&self, other: &Port) -> bool {
        self.direction != other.direction && self.port_type.is_compatible(other.port_type)
    }
}
