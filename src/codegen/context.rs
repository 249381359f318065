//! Mutable state threaded through one generation run.

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;

use super::imports::ImportSet;
use super::value_expr::variable_name;
use super::writer::CodeWriter;
use crate::error::Diagnostics;
use crate::parse::graph::FlowNode;
use crate::pattern::SyntaxPattern;

/// How the body is being walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlowMode {
    /// Following execution edges from the entry points.
    Execution,
    /// No entry points: every node in execution order, returns collected at the end.
    DataFlow,
}

/// Patterns fetched during initialization, keyed by node.
#[derive(Debug, Default)]
pub(crate) struct PatternTable {
    pub found: HashMap<NodeIndex, SyntaxPattern>,
    /// Nodes whose function id had no pattern (or whose lookup failed).
    pub missing: HashMap<NodeIndex, String>,
}

impl PatternTable {
    pub fn get(&self, idx: NodeIndex) -> Option<&SyntaxPattern> {
        self.found.get(&idx)
    }
}

pub(crate) struct EmitContext {
    pub writer: CodeWriter,
    pub visited: HashSet<NodeIndex>,
    /// `(node, output port)` to the expression holding its value.
    pub variables: HashMap<(NodeIndex, String), String>,
    pub diagnostics: Diagnostics,
    pub imports: ImportSet,
    pub mode: FlowMode,
    /// Output nodes reached in data-flow mode, returned together at the end.
    pub deferred_returns: Vec<NodeIndex>,
    /// Variable assigned to each node, unique across the graph.
    pub names: HashMap<NodeIndex, String>,
    /// Nodes that execution walks stop at until the enclosing block is closed.
    pub barriers: HashSet<NodeIndex>,
}

impl EmitContext {
    pub fn new(
        writer: CodeWriter,
        mode: FlowMode,
        diagnostics: Diagnostics,
        names: HashMap<NodeIndex, String>,
    ) -> Self {
        Self {
            writer,
            visited: HashSet::new(),
            variables: HashMap::new(),
            diagnostics,
            imports: ImportSet::default(),
            mode,
            deferred_returns: Vec::new(),
            names,
            barriers: HashSet::new(),
        }
    }

    pub fn bind(&mut self, idx: NodeIndex, port_id: &str, expr: &str) {
        self.variables.insert((idx, port_id.to_string()), expr.to_string());
    }

    /// The node's variable, falling back to its derived name if unassigned.
    pub fn variable(&self, idx: NodeIndex, node: &FlowNode) -> String {
        self.names
            .get(&idx)
            .cloned()
            .unwrap_or_else(|| variable_name(node))
    }

    pub fn lookup(&self, idx: NodeIndex, port_id: &str) -> Option<&String> {
        self.variables.get(&(idx, port_id.to_string()))
    }
}
