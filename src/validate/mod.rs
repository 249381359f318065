//! Graph lint: structural rules plus per-connection type checks.
//!
//! Nothing here blocks generation; the editor shows these before compiling.

pub mod structural;

use crate::error::Diagnostic;
use crate::parse::graph::FlowGraph;
use crate::typing::validator::TypeValidator;

/// Structural lint followed by type checks for every data connection.
pub fn validate_graph(graph: &FlowGraph) -> Vec<Diagnostic> {
    validate_graph_with(graph, &TypeValidator::default())
}

pub fn validate_graph_with(graph: &FlowGraph, validator: &TypeValidator) -> Vec<Diagnostic> {
    let mut diagnostics = structural::validate_structural(graph);
    diagnostics.extend(validator.validate_all_connections(graph));
    tracing::debug!(count = diagnostics.len(), "graph validation finished");
    diagnostics
}
