// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-tick evaluation context and the embedded-script seam.

use crate::graph::GraphId;
use crate::node::NodeId;
use crate::port::Value;
use uuid::Uuid;

/// Error raised by a node's `execute`.
///
/// Failures are caught per node by the evaluation loop, logged with the
/// node's identity, and never abort the tick.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// The embedded script evaluator failed
    #[error("script error: {0}")]
    Script(#[from] ScriptError),

    /// Variant-specific failure
    #[error("{0}")]
    Other(String),
}

/// Handle to a snippet compiled by the host's script evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptHandle(pub u64);

/// Error from the embedded script evaluator
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The snippet failed to compile
    #[error("compile error: {0}")]
    Compile(String),

    /// The compiled snippet failed at runtime
    #[error("runtime error: {0}")]
    Runtime(String),

    /// No script host is installed
    #[error("no script host installed")]
    Unavailable,
}

/// Everything a script invocation sees: the node's inputs plus handles to the
/// node and graph it runs inside.
pub struct ScriptScope<'a> {
    /// Node the script belongs to
    pub node: NodeId,
    /// Graph the node lives in
    pub graph: GraphId,
    /// Input port values by name, in declaration order
    pub inputs: &'a [(String, Value)],
}

/// Sandboxed script evaluator supplied by the host application.
///
/// The graph engine compiles a node's snippet once and re-runs the handle
/// every tick; what language the snippet is in, and how it is sandboxed, is
/// entirely the host's business.
pub trait ScriptHost {
    /// Compile a snippet, returning a reusable handle
    fn compile(&mut self, source: &str) -> Result<ScriptHandle, ScriptError>;

    /// Run a compiled snippet; returns output port values by name
    fn run(
        &mut self,
        script: ScriptHandle,
        scope: ScriptScope<'_>,
    ) -> Result<Vec<(String, Value)>, ScriptError>;
}

/// Script host used when none has been installed; every call fails closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoScriptHost;

impl ScriptHost for NoScriptHost {
    fn compile(&mut self, _source: &str) -> Result<ScriptHandle, ScriptError> {
        Err(ScriptError::Unavailable)
    }

    fn run(
        &mut self,
        _script: ScriptHandle,
        _scope: ScriptScope<'_>,
    ) -> Result<Vec<(String, Value)>, ScriptError> {
        Err(ScriptError::Unavailable)
    }
}

/// Per-tick data shared with every node's `execute`.
pub struct TickContext<'a> {
    /// Seconds advanced by this tick
    pub dt: f32,
    /// Seconds elapsed since the simulation started
    pub elapsed: f64,
    /// Graph being evaluated
    pub graph: GraphId,
    /// Node currently executing; set by the evaluation loop before each call
    pub node: NodeId,
    /// Embedded script evaluator
    pub scripts: &'a mut dyn ScriptHost,
}

impl<'a> TickContext<'a> {
    /// Context for one tick over the given graph
    pub fn new(dt: f32, elapsed: f64, graph: GraphId, scripts: &'a mut dyn ScriptHost) -> Self {
        Self {
            dt,
            elapsed,
            graph,
            node: NodeId(Uuid::nil()),
            scripts,
        }
    }
}
