//! Structural lint rules over the built graph.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::error::{Diagnostic, DiagnosticKind};
use crate::parse::graph::{EdgeKind, FlowGraph, NodeKind};
use crate::resolve::labels::{BODY_LABELS, THEN_LABELS, matches_label};

/// Run all structural rules. Returns every finding, in rule order.
pub fn validate_structural(graph: &FlowGraph) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    no_duplicate_connections(graph, &mut diagnostics);
    no_self_loops(graph, &mut diagnostics);
    conditionals_have_then_branch(graph, &mut diagnostics);
    loops_have_body(graph, &mut diagnostics);

    diagnostics
}

fn label_of(graph: &FlowGraph, idx: NodeIndex) -> (&str, &str) {
    graph
        .node(idx)
        .map(|n| (n.id.as_str(), n.label.as_str()))
        .unwrap_or(("", ""))
}

fn no_duplicate_connections(graph: &FlowGraph, diagnostics: &mut Vec<Diagnostic>) {
    let mut seen = HashSet::new();
    for (source, target, edge) in graph.edges() {
        let key = (source, target, edge.kind, edge.source_port.as_str(), edge.target_port.as_str());
        if !seen.insert(key) {
            let (source_id, _) = label_of(graph, source);
            let (target_id, target_label) = label_of(graph, target);
            diagnostics.push(Diagnostic::for_node(
                DiagnosticKind::DuplicateConnection,
                format!(
                    "Duplicate connection '{}' from '{source_id}' to '{target_id}'",
                    edge.id
                ),
                target_id,
                target_label,
            ));
        }
    }
}

fn no_self_loops(graph: &FlowGraph, diagnostics: &mut Vec<Diagnostic>) {
    for (source, target, edge) in graph.edges() {
        if source == target {
            let (id, label) = label_of(graph, source);
            diagnostics.push(Diagnostic::for_node(
                DiagnosticKind::SelfLoop,
                format!("Connection '{}' links node '{id}' to itself", edge.id),
                id,
                label,
            ));
        }
    }
}

/// Whether any labelled execution edge leaving `idx` matches `accepted`.
fn has_branch(graph: &FlowGraph, idx: NodeIndex, accepted: &[&str]) -> bool {
    graph.edges().any(|(source, _, edge)| {
        source == idx
            && edge.kind == EdgeKind::Execution
            && edge.label.as_deref().is_some_and(|l| matches_label(l, accepted))
    })
}

fn conditionals_have_then_branch(graph: &FlowGraph, diagnostics: &mut Vec<Diagnostic>) {
    for (idx, node) in graph.nodes() {
        if node.kind == NodeKind::Conditional
            && node.has_execution_ports()
            && !has_branch(graph, idx, THEN_LABELS)
        {
            diagnostics.push(Diagnostic::for_node(
                DiagnosticKind::MissingBranch,
                format!("Conditional '{}' has no connected then-branch", node.label),
                &node.id,
                &node.label,
            ));
        }
    }
}

fn loops_have_body(graph: &FlowGraph, diagnostics: &mut Vec<Diagnostic>) {
    for (idx, node) in graph.nodes() {
        if node.kind == NodeKind::Loop && node.has_execution_ports() && !has_branch(graph, idx, BODY_LABELS) {
            diagnostics.push(Diagnostic::for_node(
                DiagnosticKind::MissingBranch,
                format!("Loop '{}' has no connected body", node.label),
                &node.id,
                &node.label,
            ));
        }
    }
}
