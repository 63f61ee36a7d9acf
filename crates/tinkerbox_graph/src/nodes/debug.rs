// SPDX-License-Identifier: MIT OR Apache-2.0
//! Debug and display nodes.

use crate::evaluation::{ExecuteError, TickContext};
use crate::node::{NodeBehavior, NodeIo, NodePorts};
use crate::port::{Port, PortType, Value};

/// Logs its input to the console.
///
/// To keep the log readable at tick rate, a line is emitted only when the
/// stringified value changes or the trigger input rises from false to true.
#[derive(Debug, Clone, Default)]
pub struct PrintNode {
    last_value: Option<String>,
    last_trigger: bool,
}

impl PrintNode {
    /// Advance the latch; true when this tick's value should be logged.
    fn should_log(&mut self, text: &str, trigger: bool) -> bool {
        let rising = trigger && !self.last_trigger;
        self.last_trigger = trigger;

        if rising || self.last_value.as_deref() != Some(text) {
            self.last_value = Some(text.to_string());
            return true;
        }
        false
    }
}

impl NodeBehavior for PrintNode {
    fn name(&self) -> &str {
        "Print"
    }

    fn ports(&self) -> NodePorts {
        NodePorts {
            inputs: vec![
                Port::input("Value", PortType::Any),
                Port::input("Trigger", PortType::Bool),
            ],
            ..NodePorts::default()
        }
    }

    fn execute(
        &mut self,
        io: &mut NodeIo<'_>,
        ctx: &mut TickContext<'_>,
    ) -> Result<(), ExecuteError> {
        let text = io.input(0).to_string();
        let trigger = io.input(1).as_bool();
        if self.should_log(&text, trigger) {
            tracing::info!("[{:?}] {text}", ctx.node);
        }
        Ok(())
    }
}

/// Stringifies its input for display on a terminal widget
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkNode;

impl NodeBehavior for SinkNode {
    fn name(&self) -> &str {
        "Output"
    }

    fn ports(&self) -> NodePorts {
        NodePorts {
            inputs: vec![Port::input("In", PortType::Any)],
            outputs: vec![Port::output("Text", PortType::String)],
        }
    }

    fn execute(
        &mut self,
        io: &mut NodeIo<'_>,
        _ctx: &mut TickContext<'_>,
    ) -> Result<(), ExecuteError> {
        io.set_output(0, Value::String(io.input(0).to_string()));
        Ok(())
    }
}
