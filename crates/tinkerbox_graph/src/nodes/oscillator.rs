// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time-varying signal source.

use crate::evaluation::{ExecuteError, TickContext};
use crate::node::{NodeBehavior, NodeIo, NodePorts};
use crate::port::{Port, PortType, Value};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Sine oscillator: `sin(2π·frequency·t)·amplitude + offset`.
///
/// `t` is an internal phase accumulator advanced by the tick step, so the
/// signal stays continuous when the surrounding simulation pauses and
/// resumes. Disabling the node freezes both outputs at their last values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Oscillator {
    /// Cycles per second
    pub frequency: f32,
    /// Peak deviation from the offset
    pub amplitude: f32,
    /// Constant added to the signal
    pub offset: f32,
    /// Seconds accumulated so far
    phase: f32,
}

impl Oscillator {
    /// Oscillator with the given settings
    pub fn new(frequency: f32, amplitude: f32, offset: f32) -> Self {
        Self {
            frequency,
            amplitude,
            offset,
            phase: 0.0,
        }
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(1.0, 1.0, 0.0)
    }
}

impl NodeBehavior for Oscillator {
    fn name(&self) -> &str {
        "Oscillator"
    }

    fn ports(&self) -> NodePorts {
        NodePorts {
            outputs: vec![
                Port::output("Value", PortType::Float),
                Port::output("Sign", PortType::Bool),
            ],
            ..NodePorts::default()
        }
    }

    fn execute(
        &mut self,
        io: &mut NodeIo<'_>,
        ctx: &mut TickContext<'_>,
    ) -> Result<(), ExecuteError> {
        self.phase += ctx.dt;
        let value = (TAU * self.frequency * self.phase).sin() * self.amplitude + self.offset;
        io.set_output(0, Value::Float(value));
        io.set_output(1, Value::Bool(value >= 0.0));
        Ok(())
    }

    fn save_state(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self).ok()
    }

    fn load_state(&mut self, state: &serde_json::Value) {
        if let Ok(restored) = serde_json::from_value::<Self>(state.clone()) {
            *self = restored;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::NoScriptHost;
    use crate::graph::{Graph, GraphId};
    use crate::node::Node;

    #[test]
    fn test_quarter_period_peaks() {
        let mut graph = Graph::new("test");
        let id = graph.add_node(Node::new(
            "osc",
            Box::new(Oscillator::new(1.0, 2.0, 1.0)),
        ));
        let mut scripts = NoScriptHost;
        // Four ticks of 1/16 s: t = 0.25, a quarter period at 1 Hz.
        for step in 0..4 {
            let mut ctx = TickContext::new(0.0625, 0.0625 * f64::from(step + 1), graph.id, &mut scripts);
            graph.evaluate(&mut ctx);
        }
        let node = graph.node(id).unwrap();
        let Value::Float(value) = node.output(0).unwrap().value else {
            panic!("expected a float output");
        };
        // sin(π/2)·2 + 1 = 3
        assert!((value - 3.0).abs() < 1e-4);
        assert_eq!(node.output(1).unwrap().value, Value::Bool(true));
    }

    #[test]
    fn test_state_round_trip() {
        let mut original = Oscillator::new(2.0, 0.5, -1.0);
        original.phase = 1.25;
        let saved = original.save_state().unwrap();

        let mut restored = Oscillator::default();
        restored.load_state(&saved);
        assert_eq!(restored.frequency, 2.0);
        assert_eq!(restored.amplitude, 0.5);
        assert_eq!(restored.offset, -1.0);
        assert_eq!(restored.phase, 1.25);
    }
}
