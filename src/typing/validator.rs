//! Connection compatibility between port types.

use std::collections::HashSet;

use serde::Serialize;

use super::{ANY, ARRAY, BOOLEAN, NUMBER, OBJECT, STRING, canonical, is_known};
use crate::error::{ConnectionInfo, Diagnostic, DiagnosticKind};
use crate::parse::graph::{EdgeKind, FlowGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Compatibility {
    Compatible,
    CompatibleWithConversion,
    Incompatible,
    Unknown,
}

/// A port addressed by node id and port id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRef<'a> {
    pub node_id: &'a str,
    pub port_id: &'a str,
}

impl<'a> PortRef<'a> {
    pub fn new(node_id: &'a str, port_id: &'a str) -> Self {
        Self { node_id, port_id }
    }
}

#[derive(Debug, Clone)]
pub struct TypeValidator {
    conversions: HashSet<(String, String)>,
}

impl TypeValidator {
    /// Validator with the default conversion pairs.
    pub fn new() -> Self {
        let defaults = [
            (NUMBER, STRING),
            (STRING, NUMBER),
            (BOOLEAN, STRING),
            (STRING, BOOLEAN),
            (BOOLEAN, NUMBER),
            (NUMBER, BOOLEAN),
            (ARRAY, STRING),
            (OBJECT, STRING),
        ];
        Self {
            conversions: defaults
                .into_iter()
                .map(|(s, t)| (s.to_string(), t.to_string()))
                .collect(),
        }
    }

    /// Validator that only knows identity and `any`.
    pub fn without_conversions() -> Self {
        Self {
            conversions: HashSet::new(),
        }
    }

    pub fn with_conversion(mut self, source: &str, target: &str) -> Self {
        self.conversions.insert((canonical(source), canonical(target)));
        self
    }

    pub fn check_compatibility(&self, source_type: &str, target_type: &str) -> Compatibility {
        let source = canonical(source_type);
        let target = canonical(target_type);

        if source == target || source == ANY || target == ANY {
            return Compatibility::Compatible;
        }
        if self.conversions.contains(&(source.clone(), target.clone())) {
            return Compatibility::CompatibleWithConversion;
        }
        if !is_known(&source) || !is_known(&target) {
            return Compatibility::Unknown;
        }
        Compatibility::Incompatible
    }

    /// Check an output port against an input port, both resolved by id.
    pub fn can_connect(&self, graph: &FlowGraph, source: PortRef<'_>, target: PortRef<'_>) -> Compatibility {
        let source_port = graph
            .node_by_id(source.node_id)
            .and_then(|n| n.output(source.port_id));
        let target_port = graph
            .node_by_id(target.node_id)
            .and_then(|n| n.input(target.port_id));

        match (source_port, target_port) {
            (Some(s), Some(t)) => self.check_compatibility(&s.port_type, &t.port_type),
            _ => Compatibility::Unknown,
        }
    }

    /// One diagnostic per data edge that is incompatible or needs a conversion.
    pub fn validate_all_connections(&self, graph: &FlowGraph) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (s, t, edge) in graph.edges() {
            if edge.kind != EdgeKind::Data {
                continue;
            }
            let (Some(source), Some(target)) = (graph.node(s), graph.node(t)) else {
                continue;
            };
            let compatibility = self.can_connect(
                graph,
                PortRef::new(&source.id, &edge.source_port),
                PortRef::new(&target.id, &edge.target_port),
            );
            let kind = match compatibility {
                Compatibility::Incompatible => DiagnosticKind::TypeIncompatible,
                Compatibility::CompatibleWithConversion => DiagnosticKind::TypeConversionApplied,
                Compatibility::Compatible | Compatibility::Unknown => continue,
            };

            let source_type = graph.output_type(s, &edge.source_port).to_string();
            let target_type = target
                .input(&edge.target_port)
                .map(|p| p.port_type.clone())
                .unwrap_or_default();
            let message = match kind {
                DiagnosticKind::TypeIncompatible => format!(
                    "Cannot connect '{}' ({}) to '{}' ({})",
                    source.label, source_type, target.label, target_type
                ),
                _ => format!(
                    "Connection from '{}' ({}) to '{}' ({}) requires a type conversion",
                    source.label, source_type, target.label, target_type
                ),
            };

            diagnostics.push(
                Diagnostic::for_node(kind, message, &target.id, &target.label).with_connection(
                    ConnectionInfo {
                        edge_id: edge.id.clone(),
                        source_node: source.id.clone(),
                        source_port: edge.source_port.clone(),
                        source_type,
                        target_node: target.id.clone(),
                        target_port: edge.target_port.clone(),
                        target_type,
                    },
                ),
            );
        }

        diagnostics
    }
}

impl Default for TypeValidator {
    fn default() -> Self {
        Self::new()
    }
}
