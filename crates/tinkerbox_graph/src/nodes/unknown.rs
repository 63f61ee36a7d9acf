// SPDX-License-Identifier: MIT OR Apache-2.0
//! Inert fallback for unregistered node types.

use crate::evaluation::{ExecuteError, TickContext};
use crate::node::{NodeBehavior, NodeIo, NodePorts};

/// Stand-in for a node type with no registered factory.
///
/// Documents referencing an unknown tag (a plugin that is not loaded, a
/// newer save) load into one of these instead of failing the whole load:
/// the ports and their values are restored from the document, `execute` does
/// nothing, and the custom-data bag is carried through the next save
/// untouched.
#[derive(Debug, Clone)]
pub struct UnknownNode {
    tag: String,
    state: Option<serde_json::Value>,
}

impl UnknownNode {
    /// Placeholder for the given unregistered tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            state: None,
        }
    }
}

impl NodeBehavior for UnknownNode {
    fn name(&self) -> &str {
        &self.tag
    }

    fn ports(&self) -> NodePorts {
        // The real port set comes from the document on load.
        NodePorts::default()
    }

    fn execute(
        &mut self,
        _io: &mut NodeIo<'_>,
        _ctx: &mut TickContext<'_>,
    ) -> Result<(), ExecuteError> {
        Ok(())
    }

    fn save_state(&self) -> Option<serde_json::Value> {
        self.state.clone()
    }

    fn load_state(&mut self, state: &serde_json::Value) {
        self.state = Some(state.clone());
    }
}
