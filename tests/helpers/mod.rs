#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use graphcode::error::RegistryError;
use graphcode::parse::{self, FlowGraph};
use graphcode::pattern::{InMemoryRegistry, PatternRegistry, SyntaxPattern};

// =============================================================================
// Graph builders
// =============================================================================

/// Build a graph from editor JSON.
pub fn graph(value: Value) -> FlowGraph {
    let input = serde_json::from_value(value).expect("graph JSON should deserialize");
    FlowGraph::build(&input)
}

pub fn graph_from_str(json: &str) -> FlowGraph {
    parse::parse_and_build(json).expect("fixture should parse")
}

/// Data-only input node with a single `value` output.
pub fn input_node(id: &str, label: &str, port_type: &str, value: Value) -> Value {
    json!({
        "id": id,
        "label": label,
        "category": "input",
        "outputs": [{ "id": "value", "type": port_type }],
        "value": value,
    })
}

/// Data-only output node with a single `value` input.
pub fn output_node(id: &str, label: &str, port_type: &str) -> Value {
    json!({
        "id": id,
        "label": label,
        "category": "output",
        "inputs": [{ "id": "value", "type": port_type }],
    })
}

/// Data-only node calling `function_id`. Ports are `(id, type)` pairs.
pub fn function_node(
    id: &str,
    label: &str,
    function_id: &str,
    inputs: &[(&str, &str)],
    outputs: &[(&str, &str)],
) -> Value {
    json!({
        "id": id,
        "label": label,
        "functionId": function_id,
        "inputs": ports(inputs),
        "outputs": ports(outputs),
    })
}

/// Like [`function_node`], with one `in` and one `out` execution port.
pub fn exec_function_node(
    id: &str,
    label: &str,
    function_id: &str,
    inputs: &[(&str, &str)],
    outputs: &[(&str, &str)],
) -> Value {
    let mut node = function_node(id, label, function_id, inputs, outputs);
    node["executionInputs"] = json!([{ "id": "in" }]);
    node["executionOutputs"] = json!([{ "id": "out" }]);
    node
}

pub fn start_node(id: &str) -> Value {
    json!({
        "id": id,
        "label": "Start",
        "kind": "start",
        "executionOutputs": [{ "id": "out" }],
    })
}

pub fn ports(ports: &[(&str, &str)]) -> Value {
    Value::Array(
        ports
            .iter()
            .map(|(id, port_type)| json!({ "id": id, "type": port_type }))
            .collect(),
    )
}

pub fn data_edge(id: &str, source: &str, source_port: &str, target: &str, target_port: &str) -> Value {
    json!({
        "id": id,
        "source": source,
        "target": target,
        "sourceHandle": format!("output-{source_port}"),
        "targetHandle": format!("input-{target_port}"),
    })
}

pub fn exec_edge(id: &str, source: &str, source_port: &str, target: &str) -> Value {
    json!({
        "id": id,
        "source": source,
        "target": target,
        "sourceHandle": format!("exec-output-{source_port}"),
        "targetHandle": "exec-input-in",
    })
}

// =============================================================================
// Registries
// =============================================================================

/// The built-in pattern list used across tests.
pub fn registry() -> InMemoryRegistry {
    InMemoryRegistry::from_json(include_str!("../fixtures/patterns.json"))
        .expect("pattern fixture should parse")
}

pub fn registry_with(function_id: &str, pattern: SyntaxPattern) -> InMemoryRegistry {
    registry().with_pattern(function_id, pattern)
}

/// Lookups of one function id fail; the rest come from the fixture registry.
pub struct FailingRegistry {
    function_id: &'static str,
    inner: InMemoryRegistry,
}

impl FailingRegistry {
    pub fn for_function(function_id: &'static str) -> Self {
        Self {
            function_id,
            inner: registry(),
        }
    }
}

#[async_trait]
impl PatternRegistry for FailingRegistry {
    async fn get_syntax_pattern(
        &self,
        function_id: &str,
        language_id: &str,
    ) -> Result<Option<SyntaxPattern>, RegistryError> {
        if function_id == self.function_id {
            return Err(RegistryError::Lookup {
                function_id: function_id.to_string(),
                reason: "backend offline".into(),
            });
        }
        self.inner.get_syntax_pattern(function_id, language_id).await
    }
}

/// Wraps the fixture registry and counts lookups.
pub struct CountingRegistry {
    inner: InMemoryRegistry,
    pub lookups: AtomicUsize,
}

impl CountingRegistry {
    pub fn new() -> Self {
        Self {
            inner: registry(),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PatternRegistry for CountingRegistry {
    async fn get_syntax_pattern(
        &self,
        function_id: &str,
        language_id: &str,
    ) -> Result<Option<SyntaxPattern>, RegistryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_syntax_pattern(function_id, language_id).await
    }
}

/// Wrap a body in the default entry function and program-entry invocation.
pub fn program(body: &str) -> String {
    format!("def main():\n{body}\n\nif __name__ == \"__main__\":\n    main()\n")
}
