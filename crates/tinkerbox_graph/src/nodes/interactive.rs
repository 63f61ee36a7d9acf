// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer-driven widget nodes.
//!
//! These nodes are fed a per-tick pointer level by the manager (pressed and
//! over the node's projected bounds); they never read an input subsystem
//! themselves. Events are applied before evaluation, so a press is visible to
//! `execute` within the tick it occurred.

use crate::evaluation::{ExecuteError, TickContext};
use crate::node::{NodeBehavior, NodeIo, NodePorts};
use crate::port::{Port, PortType, Value};

/// Momentary push button.
///
/// Emits a single-tick pulse on each new press (rising edge), not a held
/// level.
#[derive(Debug, Clone, Default)]
pub struct Button {
    held: bool,
    pending: bool,
}

impl NodeBehavior for Button {
    fn name(&self) -> &str {
        "Button"
    }

    fn ports(&self) -> NodePorts {
        NodePorts {
            outputs: vec![Port::output("Pressed", PortType::Bool)],
            ..NodePorts::default()
        }
    }

    fn execute(
        &mut self,
        io: &mut NodeIo<'_>,
        _ctx: &mut TickContext<'_>,
    ) -> Result<(), ExecuteError> {
        io.set_output(0, Value::Bool(self.pending));
        self.pending = false;
        Ok(())
    }

    fn pointer_held(&mut self, held: bool) {
        if held && !self.held {
            self.pending = true;
        }
        self.held = held;
    }
}

/// Latching toggle.
///
/// Flips its persistent state on each new press; holding the pointer down
/// does not flip again. The state survives save/load.
#[derive(Debug, Clone, Default)]
pub struct Toggle {
    state: bool,
    held: bool,
}

impl NodeBehavior for Toggle {
    fn name(&self) -> &str {
        "Toggle"
    }

    fn ports(&self) -> NodePorts {
        NodePorts {
            outputs: vec![Port::output("On", PortType::Bool)],
            ..NodePorts::default()
        }
    }

    fn execute(
        &mut self,
        io: &mut NodeIo<'_>,
        _ctx: &mut TickContext<'_>,
    ) -> Result<(), ExecuteError> {
        io.set_output(0, Value::Bool(self.state));
        Ok(())
    }

    fn pointer_held(&mut self, held: bool) {
        if held && !self.held {
            self.state = !self.state;
        }
        self.held = held;
    }

    fn save_state(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({ "state": self.state }))
    }

    fn load_state(&mut self, state: &serde_json::Value) {
        if let Some(on) = state.get("state").and_then(serde_json::Value::as_bool) {
            self.state = on;
        }
    }
}
