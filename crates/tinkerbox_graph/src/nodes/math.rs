// SPDX-License-Identifier: MIT OR Apache-2.0
//! Arithmetic operator nodes.

use crate::evaluation::{ExecuteError, TickContext};
use crate::node::{NodeBehavior, NodeIo, NodePorts};
use crate::port::{Port, PortType, Value};
use serde::{Deserialize, Serialize};

/// Arithmetic operator selecting a math node's function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathOp {
    /// `A + B`
    Add,
    /// `A - B`
    Sub,
    /// `A * B`
    Mul,
    /// `A / B`, zero when `B` is zero
    Div,
}

/// Two-input arithmetic node.
///
/// Inputs coerce to floats; division by zero yields zero rather than failing.
#[derive(Debug, Clone)]
pub struct MathNode {
    op: MathOp,
}

impl MathNode {
    /// Node computing the given operator
    pub fn new(op: MathOp) -> Self {
        Self { op }
    }
}

impl NodeBehavior for MathNode {
    fn name(&self) -> &str {
        match self.op {
            MathOp::Add => "Add",
            MathOp::Sub => "Subtract",
            MathOp::Mul => "Multiply",
            MathOp::Div => "Divide",
        }
    }

    fn ports(&self) -> NodePorts {
        NodePorts {
            inputs: vec![
                Port::input("A", PortType::Float),
                Port::input("B", PortType::Float),
            ],
            outputs: vec![Port::output("Out", PortType::Float)],
        }
    }

    fn execute(
        &mut self,
        io: &mut NodeIo<'_>,
        _ctx: &mut TickContext<'_>,
    ) -> Result<(), ExecuteError> {
        let a = io.input(0).as_f32();
        let b = io.input(1).as_f32();
        let out = match self.op {
            MathOp::Add => a + b,
            MathOp::Sub => a - b,
            MathOp::Mul => a * b,
            MathOp::Div => {
                if b == 0.0 {
                    0.0
                } else {
                    a / b
                }
            }
        };
        io.set_output(0, Value::Float(out));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::NoScriptHost;
    use crate::graph::{Graph, GraphId};
    use crate::node::Node;

    fn run_op(op: MathOp, a: Value, b: Value) -> Value {
        let mut graph = Graph::new("test");
        let id = graph.add_node(Node::new("math", Box::new(MathNode::new(op))));
        {
            let node = graph.node_mut(id).unwrap();
            node.set_input(0, a);
            node.set_input(1, b);
        }
        let mut scripts = NoScriptHost;
        let mut ctx = TickContext::new(0.016, 0.0, GraphId::new(), &mut scripts);
        graph.evaluate(&mut ctx);
        graph.node(id).unwrap().output(0).unwrap().value.clone()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            run_op(MathOp::Add, Value::Float(2.0), Value::Float(3.0)),
            Value::Float(5.0)
        );
        assert_eq!(
            run_op(MathOp::Sub, Value::Float(2.0), Value::Float(3.0)),
            Value::Float(-1.0)
        );
        assert_eq!(
            run_op(MathOp::Mul, Value::Float(2.0), Value::Float(3.0)),
            Value::Float(6.0)
        );
        assert_eq!(
            run_op(MathOp::Div, Value::Float(9.0), Value::Float(3.0)),
            Value::Float(3.0)
        );
    }

    #[test]
    fn test_division_by_zero_yields_zero() {
        assert_eq!(
            run_op(MathOp::Div, Value::Float(10.0), Value::Float(0.0)),
            Value::Float(0.0)
        );
    }

    #[test]
    fn test_integer_inputs_coerce() {
        assert_eq!(
            run_op(MathOp::Add, Value::Int(2), Value::Int(3)),
            Value::Float(5.0)
        );
    }
}
