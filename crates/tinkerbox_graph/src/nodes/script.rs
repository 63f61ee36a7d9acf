// SPDX-License-Identifier: MIT OR Apache-2.0
//! Embedded-script node.

use crate::evaluation::{ExecuteError, ScriptHandle, ScriptScope, TickContext};
use crate::node::{NodeBehavior, NodeIo, NodePorts};
use crate::port::{Port, PortType, Value};

/// Node running a user-authored snippet each tick.
///
/// The snippet is compiled once through the host's
/// [`ScriptHost`](crate::evaluation::ScriptHost) and re-run with the node's
/// inputs in scope; outputs come back by port name. The node knows nothing
/// about the script language or its sandbox.
#[derive(Debug, Default)]
pub struct ScriptNode {
    source: String,
    compiled: Option<ScriptHandle>,
}

impl ScriptNode {
    /// Node with the given source snippet
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            compiled: None,
        }
    }

    /// Current source snippet
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replace the source; the next execution recompiles
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.compiled = None;
    }
}

impl NodeBehavior for ScriptNode {
    fn name(&self) -> &str {
        "Script"
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
        ctx: &mut TickContext<'_>,
    ) -> Result<(), ExecuteError> {
        let handle = match self.compiled {
            Some(handle) => handle,
            None => {
                let handle = ctx.scripts.compile(&self.source)?;
                self.compiled = Some(handle);
                handle
            }
        };

        let inputs: Vec<(String, Value)> = io
            .inputs()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        let outputs = ctx.scripts.run(
            handle,
            ScriptScope {
                node: ctx.node,
                graph: ctx.graph,
                inputs: &inputs,
            },
        )?;
        for (name, value) in outputs {
            io.set_output_named(&name, value);
        }
        Ok(())
    }

    fn save_state(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({ "source": self.source }))
    }

    fn load_state(&mut self, state: &serde_json::Value) {
        if let Some(source) = state.get("source").and_then(serde_json::Value::as_str) {
            self.source = source.to_string();
            self.compiled = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{ScriptError, ScriptHost};
    use crate::graph::Graph;
    use crate::node::Node;

    /// Echoes the first input back out and counts compiles.
    #[derive(Debug, Default)]
    struct EchoHost {
        compiles: usize,
    }

    impl ScriptHost for EchoHost {
        fn compile(&mut self, _source: &str) -> Result<ScriptHandle, ScriptError> {
            self.compiles += 1;
            Ok(ScriptHandle(self.compiles as u64))
        }

        fn run(
            &mut self,
            _script: ScriptHandle,
            scope: ScriptScope<'_>,
        ) -> Result<Vec<(String, Value)>, ScriptError> {
            let value = scope
                .inputs
                .first()
                .map(|(_, value)| value.clone())
                .unwrap_or(Value::Nil);
            Ok(vec![("Out".to_string(), value)])
        }
    }

    #[test]
    fn test_compiles_once_and_echoes() {
        let mut graph = Graph::new("test");
        let id = graph.add_node(Node::new(
            "script.inline",
            Box::new(ScriptNode::with_source("outputs.Out = inputs.In")),
        ));
        graph.node_mut(id).unwrap().set_input(0, Value::Int(7));

        let mut host = EchoHost::default();
        for _ in 0..3 {
            let mut ctx = TickContext::new(0.016, 0.0, graph.id, &mut host);
            graph.evaluate(&mut ctx);
        }

        assert_eq!(host.compiles, 1);
        assert_eq!(
            graph.node(id).unwrap().output(0).unwrap().value,
            Value::Int(7)
        );
    }

    #[test]
    fn test_set_source_recompiles() {
        let mut node = ScriptNode::with_source("a");
        node.compiled = Some(ScriptHandle(1));
        node.set_source("b");
        assert!(node.compiled.is_none());
    }

    #[test]
    fn test_state_round_trip() {
        let node = ScriptNode::with_source("outputs.Out = 1");
        let saved = node.save_state().unwrap();
        let mut restored = ScriptNode::default();
        restored.load_state(&saved);
        assert_eq!(restored.source(), "outputs.Out = 1");
    }
}
