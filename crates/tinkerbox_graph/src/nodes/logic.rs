// SPDX-License-Identifier: MIT OR Apache-2.0
//! Boolean logic gates.

use crate::evaluation::{ExecuteError, TickContext};
use crate::node::{NodeBehavior, NodeIo, NodePorts};
use crate::port::{Port, PortType, Value};
use serde::{Deserialize, Serialize};

/// Boolean operator selecting a gate's function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateOp {
    /// Both inputs true
    And,
    /// Either input true
    Or,
    /// Inverted first input
    Not,
    /// Exactly one input true
    Xor,
}

/// Two-input boolean gate; `Not` ignores its second input.
///
/// Pure function of its inputs, no private state.
#[derive(Debug, Clone)]
pub struct LogicGate {
    op: GateOp,
}

impl LogicGate {
    /// Gate computing the given operator
    pub fn new(op: GateOp) -> Self {
        Self { op }
    }
}

impl NodeBehavior for LogicGate {
    fn name(&self) -> &str {
        match self.op {
            GateOp::And => "And",
            GateOp::Or => "Or",
            GateOp::Not => "Not",
            GateOp::Xor => "Xor",
        }
    }

    fn ports(&self) -> NodePorts {
        NodePorts {
            inputs: vec![
                Port::input("A", PortType::Bool),
                Port::input("B", PortType::Bool),
            ],
            outputs: vec![Port::output("Out", PortType::Bool)],
        }
    }

    fn execute(
        &mut self,
        io: &mut NodeIo<'_>,
        _ctx: &mut TickContext<'_>,
    ) -> Result<(), ExecuteError> {
        let a = io.input(0).as_bool();
        let b = io.input(1).as_bool();
        let out = match self.op {
            GateOp::And => a && b,
            GateOp::Or => a || b,
            GateOp::Not => !a,
            GateOp::Xor => a ^ b,
        };
        io.set_output(0, Value::Bool(out));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::NoScriptHost;
    use crate::graph::{Graph, GraphId};
    use crate::node::Node;

    fn run_gate(op: GateOp, a: bool, b: bool) -> Value {
        let mut graph = Graph::new("test");
        let id = graph.add_node(Node::new("gate", Box::new(LogicGate::new(op))));
        {
            let node = graph.node_mut(id).unwrap();
            node.set_input(0, Value::Bool(a));
            node.set_input(1, Value::Bool(b));
        }
        let mut scripts = NoScriptHost;
        let mut ctx = TickContext::new(0.016, 0.0, GraphId::new(), &mut scripts);
        graph.evaluate(&mut ctx);
        graph.node(id).unwrap().output(0).unwrap().value.clone()
    }

    #[test]
    fn test_truth_tables() {
        assert_eq!(run_gate(GateOp::And, true, true), Value::Bool(true));
        assert_eq!(run_gate(GateOp::And, true, false), Value::Bool(false));
        assert_eq!(run_gate(GateOp::Or, false, true), Value::Bool(true));
        assert_eq!(run_gate(GateOp::Or, false, false), Value::Bool(false));
        assert_eq!(run_gate(GateOp::Xor, true, true), Value::Bool(false));
        assert_eq!(run_gate(GateOp::Xor, true, false), Value::Bool(true));
    }

    #[test]
    fn test_not_ignores_second_input() {
        assert_eq!(run_gate(GateOp::Not, false, true), Value::Bool(true));
        assert_eq!(run_gate(GateOp::Not, true, true), Value::Bool(false));
    }
}
