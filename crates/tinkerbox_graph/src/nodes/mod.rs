// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node variants.
//!
//! Every variant implements [`NodeBehavior`](crate::node::NodeBehavior) and
//! is registered under a string tag; externally supplied variants go through
//! the same registration path, so nothing here is special-cased by the
//! engine.

pub mod debug;
pub mod interactive;
pub mod logic;
pub mod math;
pub mod oscillator;
pub mod script;
pub mod unknown;

pub use debug::{PrintNode, SinkNode};
pub use interactive::{Button, Toggle};
pub use logic::{GateOp, LogicGate};
pub use math::{MathNode, MathOp};
pub use oscillator::Oscillator;
pub use script::ScriptNode;
pub use unknown::UnknownNode;

use crate::node::NodeRegistry;

/// Register every built-in node type
pub fn register_builtins(registry: &mut NodeRegistry) {
    registry.register_type("logic.and", || Box::new(LogicGate::new(GateOp::And)));
    registry.register_type("logic.or", || Box::new(LogicGate::new(GateOp::Or)));
    registry.register_type("logic.not", || Box::new(LogicGate::new(GateOp::Not)));
    registry.register_type("logic.xor", || Box::new(LogicGate::new(GateOp::Xor)));
    registry.register_type("math.add", || Box::new(MathNode::new(MathOp::Add)));
    registry.register_type("math.sub", || Box::new(MathNode::new(MathOp::Sub)));
    registry.register_type("math.mul", || Box::new(MathNode::new(MathOp::Mul)));
    registry.register_type("math.div", || Box::new(MathNode::new(MathOp::Div)));
    registry.register_type("signal.oscillator", || Box::new(Oscillator::default()));
    registry.register_type("script.inline", || Box::new(ScriptNode::default()));
    registry.register_type("widget.button", || Box::new(Button::default()));
    registry.register_type("widget.toggle", || Box::new(Toggle::default()));
    registry.register_type("debug.print", || Box::new(PrintNode::default()));
    registry.register_type("debug.sink", || Box::new(SinkNode));
}
