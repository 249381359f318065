//! Codegen pass: FlowGraph → target-language program text.
//!
//! Public API: [`ExecutionBasedCodeGenerator::generate_code`]. Execution edges
//! drive the structure of the program; data edges only decide which values
//! each node's pattern receives.

mod context;
mod control_flow;
mod emit;
pub mod imports;
pub mod value_expr;
pub mod writer;

use std::collections::HashMap;

use serde::Serialize;

use crate::config::GeneratorConfig;
use crate::error::{Diagnostic, DiagnosticKind, Diagnostics, GenerationError};
use crate::parse::graph::{FlowGraph, NodeKind};
use crate::pattern::{PatternRegistry, SyntaxPattern};
use crate::resolve::{DependencyResolver, Resolution};
use crate::typing::conversion::TypeConversionService;
use context::{EmitContext, FlowMode, PatternTable};
use emit::Emitter;
use imports::ImportSet;
use writer::CodeWriter;

/// Program text plus the diagnostics collected while producing it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub code: String,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl GenerationResult {
    fn from_parts(code: String, diagnostics: Diagnostics) -> Self {
        let (errors, warnings) = diagnostics.into_split();
        GenerationResult {
            code,
            errors,
            warnings,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Generates one program per call. Patterns fetched from the registry are
/// cached per function id for the lifetime of the generator.
pub struct ExecutionBasedCodeGenerator<'a, R: PatternRegistry + ?Sized> {
    graph: &'a FlowGraph,
    registry: &'a R,
    config: GeneratorConfig,
    conversions: TypeConversionService,
    pattern_cache: HashMap<String, Option<SyntaxPattern>>,
}

impl<'a, R: PatternRegistry + ?Sized> ExecutionBasedCodeGenerator<'a, R> {
    pub fn new(graph: &'a FlowGraph, registry: &'a R) -> Self {
        Self::with_config(graph, registry, GeneratorConfig::default())
    }

    pub fn with_config(graph: &'a FlowGraph, registry: &'a R, config: GeneratorConfig) -> Self {
        Self {
            graph,
            registry,
            config,
            conversions: TypeConversionService::default(),
            pattern_cache: HashMap::new(),
        }
    }

    pub fn with_conversions(mut self, conversions: TypeConversionService) -> Self {
        self.conversions = conversions;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate the program. Never fails: problems are reported in the
    /// result's `errors`/`warnings`, and an internal fault replaces the whole
    /// program with a single comment.
    pub async fn generate_code(&mut self) -> GenerationResult {
        let graph = self.graph;
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            language = %self.config.language_id,
            "starting code generation"
        );

        // Reset
        let mut diagnostics = Diagnostics::new();

        // Initialize
        let patterns = self.load_patterns(&mut diagnostics).await;
        let resolution = DependencyResolver::new(graph).resolve();
        diagnostics.extend(resolution.cycle_diagnostics());

        // Generate
        let mode = if graph.any_execution_ports() && !resolution.entry_points().is_empty() {
            FlowMode::Execution
        } else {
            if graph.any_execution_ports() {
                tracing::info!("no execution entry points, falling back to data-flow order");
            }
            FlowMode::DataFlow
        };
        let mut body = CodeWriter::with_indent(&self.config.indent);
        if self.config.emit_entry_point {
            body.indent();
        }
        let names = value_expr::assign_variable_names(graph);
        let mut ctx = EmitContext::new(body, mode, diagnostics, names);
        let emitter = Emitter {
            graph,
            resolution: &resolution,
            patterns: &patterns,
            conversions: &self.conversions,
        };
        let outcome = match mode {
            FlowMode::Execution => render_execution(&emitter, &resolution, &mut ctx),
            FlowMode::DataFlow => render_data_flow(&emitter, &resolution, &mut ctx),
        };

        // Finalize
        let EmitContext {
            writer,
            imports,
            mut diagnostics,
            ..
        } = ctx;
        let code = match outcome {
            Ok(()) => self.assemble(writer, &imports),
            Err(err) => {
                tracing::error!(error = %err, "code generation failed");
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::InternalGenerationFailure,
                    format!("Code generation failed: {err}"),
                ));
                format!("# Code generation failed: {err}\n")
            }
        };

        let result = GenerationResult::from_parts(code, diagnostics);
        tracing::info!(
            bytes = result.code.len(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "code generation finished"
        );
        result
    }

    /// Fetch the pattern of every node that names a function.
    async fn load_patterns(&mut self, diagnostics: &mut Diagnostics) -> PatternTable {
        let graph = self.graph;
        let language = self.config.language_id.clone();
        let mut table = PatternTable::default();

        for (idx, node) in graph.nodes() {
            let Some(function_id) = node.function_id.as_deref() else {
                continue;
            };

            let lookup = match self.pattern_cache.get(function_id) {
                Some(cached) => Ok(cached.clone()),
                None => {
                    let fetched = self.registry.get_syntax_pattern(function_id, &language).await;
                    if let Ok(found) = &fetched {
                        self.pattern_cache.insert(function_id.to_string(), found.clone());
                    }
                    fetched
                }
            };

            match lookup {
                Ok(Some(pattern)) => {
                    table.found.insert(idx, pattern);
                }
                Ok(None) => {
                    tracing::warn!(node = %node.id, function = function_id, "no syntax pattern");
                    diagnostics.push(Diagnostic::for_node(
                        DiagnosticKind::SyntaxPatternMissing,
                        format!("No syntax pattern '{function_id}' for language '{language}'"),
                        &node.id,
                        &node.label,
                    ));
                    table.missing.insert(idx, function_id.to_string());
                }
                Err(err) => {
                    tracing::warn!(node = %node.id, function = function_id, error = %err, "pattern lookup failed");
                    diagnostics.push(Diagnostic::for_node(
                        DiagnosticKind::InitializationFailure,
                        format!("Failed to load syntax pattern '{function_id}': {err}"),
                        &node.id,
                        &node.label,
                    ));
                    table.missing.insert(idx, function_id.to_string());
                }
            }
        }

        table
    }

    /// Header, imports, then the body wrapped in the entry function.
    fn assemble(&self, body: CodeWriter, imports: &ImportSet) -> String {
        let mut w = CodeWriter::with_indent(&self.config.indent);

        if let Some(header) = &self.config.header_comment {
            for line in header.lines() {
                if line.is_empty() {
                    w.line("#");
                } else {
                    w.line(&format!("# {line}"));
                }
            }
            w.blank();
        }

        if !imports.is_empty() {
            imports::emit_imports(imports, &mut w);
            w.blank();
        }

        if !self.config.emit_entry_point {
            w.raw(&body.finish());
            return w.finish();
        }

        let entry = &self.config.entry_function;
        w.block_open(&format!("def {entry}():"));
        if body.is_empty() {
            w.line("pass");
        } else {
            w.raw(&body.finish());
        }
        w.dedent();
        w.blank();
        w.blank();
        w.block_open("if __name__ == \"__main__\":");
        w.line(&format!("{entry}()"));
        w.dedent();

        w.finish()
    }
}

/// Walk each entry point's flow, declaring the group's plain input nodes
/// first, then sweep anything unreached in execution order.
fn render_execution(
    emitter: &Emitter<'_>,
    resolution: &Resolution<'_>,
    ctx: &mut EmitContext,
) -> Result<(), GenerationError> {
    for &entry in resolution.entry_points() {
        if let Some(group) = resolution.group_of(entry) {
            for &member in &group.members {
                let node = emitter.node(member)?;
                if node.kind == NodeKind::Input && !node.has_execution_ports() {
                    emitter.emit_standalone(ctx, member);
                }
            }
        }
        emitter.emit_flow(ctx, entry);
    }

    for &idx in resolution.execution_order() {
        emitter.emit_flow(ctx, idx);
    }
    Ok(())
}

/// Every node in execution order, inputs first, with output nodes returned
/// together at the end.
fn render_data_flow(
    emitter: &Emitter<'_>,
    resolution: &Resolution<'_>,
    ctx: &mut EmitContext,
) -> Result<(), GenerationError> {
    let order = resolution.execution_order();
    for &idx in order {
        if emitter.node(idx)?.kind == NodeKind::Input {
            emitter.emit_standalone(ctx, idx);
        }
    }
    for &idx in order {
        emitter.emit_standalone(ctx, idx);
    }

    let deferred = std::mem::take(&mut ctx.deferred_returns);
    let mut values = Vec::with_capacity(deferred.len());
    for idx in deferred {
        let node = emitter.node(idx)?;
        if !node.inputs.is_empty() {
            values.push(emitter.resolve_input(ctx, idx, node, 0)?);
        }
    }
    if !values.is_empty() {
        ctx.writer.line(&format!("return {}", values.join(", ")));
    }
    Ok(())
}

/// Generate with a fresh generator and the default configuration.
pub async fn generate_code<R: PatternRegistry + ?Sized>(graph: &FlowGraph, registry: &R) -> GenerationResult {
    ExecutionBasedCodeGenerator::new(graph, registry).generate_code().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::InMemoryRegistry;
    use crate::parse::types::{GraphInput, NodeInput, PortInput};

    fn output_port(id: &str, port_type: &str) -> PortInput {
        PortInput {
            id: id.into(),
            port_type: port_type.into(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_graph_yields_pass_body() {
        let graph = FlowGraph::build(&GraphInput::default());
        let registry = InMemoryRegistry::new();
        let result = futures::executor::block_on(generate_code(&graph, &registry));
        assert_eq!(
            result.code,
            "def main():\n    pass\n\n\nif __name__ == \"__main__\":\n    main()\n"
        );
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn header_and_unwrapped_body() {
        let input = GraphInput {
            nodes: vec![NodeInput {
                id: "1".into(),
                label: "Count".into(),
                category: Some("input".into()),
                outputs: vec![output_port("value", "number")],
                value: Some(serde_json::json!(5)),
                ..Default::default()
            }],
            edges: vec![],
        };
        let graph = FlowGraph::build(&input);
        let registry = InMemoryRegistry::new();
        let config = GeneratorConfig {
            emit_entry_point: false,
            header_comment: Some("generated\n\nby graphcode".into()),
            ..Default::default()
        };
        let mut generator = ExecutionBasedCodeGenerator::with_config(&graph, &registry, config);
        let result = futures::executor::block_on(generator.generate_code());
        assert_eq!(result.code, "# generated\n#\n# by graphcode\n\ncount_1 = 5\n");
    }

    #[test]
    fn render_fails_when_resolution_and_graph_disagree() {
        let input = GraphInput {
            nodes: vec![NodeInput {
                id: "1".into(),
                label: "Count".into(),
                category: Some("input".into()),
                outputs: vec![output_port("value", "number")],
                ..Default::default()
            }],
            edges: vec![],
        };
        let resolved = FlowGraph::build(&input);
        let resolution = DependencyResolver::new(&resolved).resolve();
        let empty = FlowGraph::build(&GraphInput::default());
        let patterns = PatternTable::default();
        let conversions = TypeConversionService::default();
        let emitter = Emitter {
            graph: &empty,
            resolution: &resolution,
            patterns: &patterns,
            conversions: &conversions,
        };
        let mut ctx = EmitContext::new(CodeWriter::new(), FlowMode::DataFlow, Diagnostics::new(), HashMap::new());

        let err = render_data_flow(&emitter, &resolution, &mut ctx).unwrap_err();
        assert!(matches!(err, GenerationError::UnknownNode(0)));
        assert_eq!(err.to_string(), "node index 0 is not part of the graph");
    }
}
