//! Per-node emission: patterns, input declarations, outputs and argument resolution.

use petgraph::graph::NodeIndex;

use super::context::{EmitContext, FlowMode, PatternTable};
use super::value_expr::{NEUTRAL_LITERAL, default_for_type, emit_literal};
use crate::error::{ConnectionInfo, Diagnostic, DiagnosticKind, GenerationError};
use crate::parse::graph::{FlowGraph, FlowNode, NodeKind, Port};
use crate::pattern::{PatternKind, SyntaxPattern, apply_pattern};
use crate::resolve::{Binding, Resolution};
use crate::typing::conversion::TypeConversionService;
use crate::typing::validator::Compatibility;

/// Read-only inputs of one generation run.
pub(crate) struct Emitter<'a> {
    pub graph: &'a FlowGraph,
    pub resolution: &'a Resolution<'a>,
    pub patterns: &'a PatternTable,
    pub conversions: &'a TypeConversionService,
}

impl Emitter<'_> {
    pub(super) fn node(&self, idx: NodeIndex) -> Result<&FlowNode, GenerationError> {
        self.graph
            .node(idx)
            .ok_or(GenerationError::UnknownNode(idx.index()))
    }

    /// Mark `idx` visited and emit its data dependencies first.
    /// Returns false when the node was already visited.
    pub fn enter(&self, ctx: &mut EmitContext, idx: NodeIndex) -> bool {
        if !ctx.visited.insert(idx) {
            return false;
        }
        for &dep in self.resolution.data_dependencies(idx) {
            self.emit_standalone(ctx, dep);
        }
        true
    }

    /// Emit a node reached through a data edge. Execution successors are not
    /// followed, so a block that opens a scope gets an empty `pass` body.
    pub fn emit_standalone(&self, ctx: &mut EmitContext, idx: NodeIndex) {
        if !self.enter(ctx, idx) {
            return;
        }
        self.emit_guarded(ctx, idx);
        if self.patterns.get(idx).is_some_and(SyntaxPattern::opens_scope) {
            ctx.writer.indent();
            ctx.writer.line("pass");
            ctx.writer.dedent();
        }
    }

    /// Emit a node reached through execution flow, then follow its successors.
    /// Nodes behind a barrier are left for the block that set it.
    pub fn emit_flow(&self, ctx: &mut EmitContext, idx: NodeIndex) {
        if ctx.barriers.contains(&idx) || !self.enter(ctx, idx) {
            return;
        }

        let kind = self.graph.node(idx).map(|n| n.kind);
        let shaped = match kind {
            Some(NodeKind::Conditional) => self.emit_conditional(ctx, idx),
            Some(NodeKind::Loop) => self.emit_loop(ctx, idx),
            _ => false,
        };
        if shaped {
            return;
        }

        self.emit_guarded(ctx, idx);

        let successors = self.resolution.execution_successors(idx);
        if self.patterns.get(idx).is_some_and(SyntaxPattern::opens_scope) {
            ctx.writer.indent();
            self.emit_branch(ctx, successors);
            ctx.writer.dedent();
        } else {
            for &next in successors {
                self.emit_flow(ctx, next);
            }
        }
    }

    /// Emit every target in order; write `pass` if nothing came out.
    pub(super) fn emit_branch(&self, ctx: &mut EmitContext, targets: &[NodeIndex]) {
        let before = ctx.writer.line_count();
        for &target in targets {
            self.emit_flow(ctx, target);
        }
        if ctx.writer.line_count() == before {
            ctx.writer.line("pass");
        }
    }

    /// Emit one node; an internal failure becomes a comment and a diagnostic.
    pub fn emit_guarded(&self, ctx: &mut EmitContext, idx: NodeIndex) {
        if let Err(err) = self.emit_node(ctx, idx) {
            let (id, label) = self
                .graph
                .node(idx)
                .map(|n| (n.id.as_str(), n.label.as_str()))
                .unwrap_or(("?", ""));
            tracing::warn!(node = %id, error = %err, "node generation failed");
            ctx.writer
                .line(&format!("# error: failed to generate node '{label}' ({id}): {err}"));
            ctx.diagnostics.push(Diagnostic::for_node(
                DiagnosticKind::InternalGenerationFailure,
                format!("Failed to generate code: {err}"),
                id,
                label,
            ));
        }
    }

    fn emit_node(&self, ctx: &mut EmitContext, idx: NodeIndex) -> Result<(), GenerationError> {
        let node = self.node(idx)?;

        if let Some(pattern) = self.patterns.get(idx) {
            self.emit_pattern(ctx, idx, node, pattern);
            return Ok(());
        }
        if let Some(function_id) = self.patterns.missing.get(&idx) {
            ctx.writer.line(&format!(
                "# missing syntax pattern '{function_id}' for node '{}' ({})",
                node.label, node.id
            ));
            return Ok(());
        }

        match node.kind {
            NodeKind::Input => {
                self.declare_input(ctx, idx, node);
                Ok(())
            }
            NodeKind::Output => self.emit_output(ctx, idx, node),
            _ => {
                tracing::debug!(node = %node.id, kind = ?node.kind, "no pattern, nothing emitted");
                Ok(())
            }
        }
    }

    fn emit_pattern(&self, ctx: &mut EmitContext, idx: NodeIndex, node: &FlowNode, pattern: &SyntaxPattern) {
        let args = self.resolve_arguments(ctx, idx, node);
        let substitution = apply_pattern(&pattern.pattern, &args);
        for index in &substitution.unresolved {
            ctx.diagnostics.push(Diagnostic::for_node(
                DiagnosticKind::UnresolvedPlaceholder,
                format!(
                    "Placeholder {{{index}}} has no matching input ({} available)",
                    args.len()
                ),
                &node.id,
                &node.label,
            ));
        }
        ctx.imports.extend(&pattern.imports);

        match pattern.kind {
            PatternKind::Expression => {
                let var = ctx.variable(idx, node);
                ctx.writer.lines(&format!("{var} = {}", substitution.text.trim()));
                bind_outputs(ctx, idx, node, &var);
            }
            PatternKind::Statement => {
                for line in substitution.text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                    ctx.writer.line(line);
                }
            }
            PatternKind::Block => ctx.writer.lines(substitution.text.trim_end()),
        }
    }

    /// Declare an input node's variable from its value, its first output's
    /// default, or the type default, in that order.
    fn declare_input(&self, ctx: &mut EmitContext, idx: NodeIndex, node: &FlowNode) {
        let var = ctx.variable(idx, node);
        let first = node.outputs.first();
        let value = node
            .value
            .as_ref()
            .or_else(|| first.and_then(|p| p.default_value.as_ref()))
            .map(emit_literal)
            .unwrap_or_else(|| {
                default_for_type(first.map_or("any", |p| p.port_type.as_str())).to_string()
            });
        ctx.writer.line(&format!("{var} = {value}"));
        bind_outputs(ctx, idx, node, &var);
    }

    fn emit_output(&self, ctx: &mut EmitContext, idx: NodeIndex, node: &FlowNode) -> Result<(), GenerationError> {
        if ctx.mode == FlowMode::DataFlow {
            ctx.deferred_returns.push(idx);
            return Ok(());
        }
        if node.inputs.is_empty() {
            ctx.writer.line("return");
        } else {
            let expr = self.resolve_input(ctx, idx, node, 0)?;
            ctx.writer.line(&format!("return {expr}"));
        }
        Ok(())
    }

    pub(super) fn resolve_arguments(&self, ctx: &mut EmitContext, idx: NodeIndex, node: &FlowNode) -> Vec<String> {
        node.inputs
            .iter()
            .map(|port| self.resolve_port(ctx, idx, node, port))
            .collect()
    }

    pub(super) fn resolve_input(
        &self,
        ctx: &mut EmitContext,
        idx: NodeIndex,
        node: &FlowNode,
        index: usize,
    ) -> Result<String, GenerationError> {
        let port = node.inputs.get(index).ok_or_else(|| GenerationError::MissingInput {
            node_id: node.id.clone(),
            index,
        })?;
        Ok(self.resolve_port(ctx, idx, node, port))
    }

    /// Expression for one input port: the bound source variable (converted
    /// if the types need it), else the declared default, else the type default.
    pub(super) fn resolve_port(&self, ctx: &mut EmitContext, idx: NodeIndex, node: &FlowNode, port: &Port) -> String {
        if let Some(binding) = self.resolution.binding(idx, &port.id) {
            let expr = ctx
                .lookup(binding.source, &binding.source_port)
                .cloned()
                .or_else(|| self.graph.node(binding.source).map(|n| ctx.variable(binding.source, n)))
                .unwrap_or_else(|| NEUTRAL_LITERAL.to_string());
            return self.convert(ctx, &expr, node, port, binding);
        }

        if let Some(value) = &port.default_value {
            return emit_literal(value);
        }

        let fallback = default_for_type(&port.port_type);
        if port.required {
            ctx.diagnostics.push(Diagnostic::for_node(
                DiagnosticKind::DisconnectedRequiredInput,
                format!("Required input '{}' is not connected; using {fallback}", port.name),
                &node.id,
                &node.label,
            ));
        }
        fallback.to_string()
    }

    fn convert(&self, ctx: &mut EmitContext, expr: &str, node: &FlowNode, port: &Port, binding: &Binding) -> String {
        let source_type = self.graph.output_type(binding.source, &binding.source_port);
        let conversion = self.conversions.convert(expr, source_type, &port.port_type);

        let source_node = self.graph.node(binding.source).map_or("", |n| n.id.as_str());
        let connection = || ConnectionInfo {
            edge_id: binding.edge_id.clone(),
            source_node: source_node.to_string(),
            source_port: binding.source_port.clone(),
            source_type: source_type.to_string(),
            target_node: node.id.clone(),
            target_port: port.id.clone(),
            target_type: port.port_type.clone(),
        };

        let diagnostic = match conversion.compatibility {
            Compatibility::CompatibleWithConversion if conversion.applied() => Some((
                DiagnosticKind::TypeConversionApplied,
                format!(
                    "Converted {source_type} to {} for input '{}'",
                    port.port_type, port.name
                ),
            )),
            Compatibility::CompatibleWithConversion => Some((
                DiagnosticKind::TypeIncompatible,
                format!(
                    "No conversion from {source_type} to {} is available for input '{}'",
                    port.port_type, port.name
                ),
            )),
            Compatibility::Incompatible => Some((
                DiagnosticKind::TypeIncompatible,
                format!(
                    "Cannot pass {source_type} to input '{}' of type {}",
                    port.name, port.port_type
                ),
            )),
            Compatibility::Compatible | Compatibility::Unknown => None,
        };
        if let Some((kind, message)) = diagnostic {
            ctx.diagnostics.push(
                Diagnostic::for_node(kind, message, &node.id, &node.label).with_connection(connection()),
            );
        }

        conversion.expression
    }
}

/// Every output port of `node` resolves to `expr`.
pub(super) fn bind_outputs(ctx: &mut EmitContext, idx: NodeIndex, node: &FlowNode, expr: &str) {
    for port in &node.outputs {
        ctx.bind(idx, &port.id, expr);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::codegen::writer::CodeWriter;
    use crate::error::Diagnostics;
    use crate::parse::types::{GraphInput, NodeInput};
    use crate::resolve::DependencyResolver;

    fn context() -> EmitContext {
        EmitContext::new(CodeWriter::new(), FlowMode::Execution, Diagnostics::new(), HashMap::new())
    }

    #[test]
    fn failed_node_becomes_error_comment_and_diagnostic() {
        let graph = FlowGraph::build(&GraphInput::default());
        let resolution = DependencyResolver::new(&graph).resolve();
        let patterns = PatternTable::default();
        let conversions = TypeConversionService::default();
        let emitter = Emitter {
            graph: &graph,
            resolution: &resolution,
            patterns: &patterns,
            conversions: &conversions,
        };
        let mut ctx = context();

        emitter.emit_guarded(&mut ctx, NodeIndex::new(7));

        let (errors, warnings) = ctx.diagnostics.into_split();
        assert_eq!(
            ctx.writer.finish(),
            "# error: failed to generate node '' (?): node index 7 is not part of the graph\n"
        );
        assert!(warnings.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, DiagnosticKind::InternalGenerationFailure);
        assert_eq!(
            errors[0].message,
            "Failed to generate code: node index 7 is not part of the graph"
        );
    }

    #[test]
    fn resolving_a_missing_input_fails() {
        let input = GraphInput {
            nodes: vec![NodeInput {
                id: "1".into(),
                label: "Sink".into(),
                ..Default::default()
            }],
            edges: vec![],
        };
        let graph = FlowGraph::build(&input);
        let resolution = DependencyResolver::new(&graph).resolve();
        let patterns = PatternTable::default();
        let conversions = TypeConversionService::default();
        let emitter = Emitter {
            graph: &graph,
            resolution: &resolution,
            patterns: &patterns,
            conversions: &conversions,
        };
        let mut ctx = context();
        let idx = NodeIndex::new(0);
        let node = emitter.node(idx).unwrap();

        let err = emitter.resolve_input(&mut ctx, idx, node, 0).unwrap_err();
        assert!(matches!(err, GenerationError::MissingInput { ref node_id, index: 0 } if node_id == "1"));
    }
}
