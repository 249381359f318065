//! Literal rendering, neutral defaults and variable naming for the target language.

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;
use serde_json::Value;

use crate::parse::graph::{FlowGraph, FlowNode};
use crate::typing::{ARRAY, BOOLEAN, NUMBER, OBJECT, STRING, canonical};

/// Substituted for placeholders and values that cannot be resolved.
pub const NEUTRAL_LITERAL: &str = "None";

/// Render a JSON value as a target-language literal.
pub fn emit_literal(value: &Value) -> String {
    match value {
        Value::Null => NEUTRAL_LITERAL.to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("\"{}\"", escape_string(s)),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(emit_literal).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("\"{}\": {}", escape_string(k), emit_literal(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

/// Neutral default for a port type.
pub fn default_for_type(type_name: &str) -> &'static str {
    match canonical(type_name).as_str() {
        STRING => "\"\"",
        NUMBER => "0",
        BOOLEAN => "False",
        ARRAY => "[]",
        OBJECT => "{}",
        _ => NEUTRAL_LITERAL,
    }
}

/// Output variable for a node: normalized label + `_` + normalized id.
pub fn variable_name(node: &FlowNode) -> String {
    variable_name_for(&node.label, &node.id)
}

pub fn variable_name_for(label: &str, id: &str) -> String {
    let base = normalize(&label.to_ascii_lowercase());
    let base = if base.is_empty() { "node".to_string() } else { base };
    let suffix = normalize(id);
    let name = if suffix.is_empty() {
        base
    } else {
        format!("{base}_{suffix}")
    };
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("n_{name}")
    } else {
        name
    }
}

/// One variable per node, distinct across the graph. Nodes are named in
/// declaration order; a name already taken gets `_2`, `_3`, ... appended.
pub fn assign_variable_names(graph: &FlowGraph) -> HashMap<NodeIndex, String> {
    let mut taken = HashSet::new();
    let mut names = HashMap::with_capacity(graph.node_count());
    for (idx, node) in graph.nodes() {
        let base = variable_name(node);
        let mut name = base.clone();
        let mut n = 2;
        while taken.contains(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        taken.insert(name.clone());
        names.insert(idx, name);
    }
    names
}

/// Use `text` as an identifier if it can be one after normalization.
pub fn identifier(text: &str) -> Option<String> {
    let name = normalize(text);
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        None
    } else {
        Some(name)
    }
}

/// Collapse every run of non-alphanumeric characters into one `_`, trimmed at both ends.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_sep = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn literals() {
        assert_eq!(emit_literal(&json!(null)), "None");
        assert_eq!(emit_literal(&json!(true)), "True");
        assert_eq!(emit_literal(&json!(42)), "42");
        assert_eq!(emit_literal(&json!(1.5)), "1.5");
        assert_eq!(emit_literal(&json!("say \"hi\"\n")), "\"say \\\"hi\\\"\\n\"");
        assert_eq!(emit_literal(&json!([1, "a", false])), "[1, \"a\", False]");
        assert_eq!(emit_literal(&json!({"k": [1]})), "{\"k\": [1]}");
    }

    #[test]
    fn defaults_by_type() {
        assert_eq!(default_for_type("String"), "\"\"");
        assert_eq!(default_for_type("int"), "0");
        assert_eq!(default_for_type("boolean"), "False");
        assert_eq!(default_for_type("list"), "[]");
        assert_eq!(default_for_type("object"), "{}");
        assert_eq!(default_for_type("any"), "None");
        assert_eq!(default_for_type("Vector3"), "None");
    }

    #[test]
    fn variable_names() {
        assert_eq!(variable_name_for("Add Numbers", "node-1"), "add_numbers_node_1");
        assert_eq!(variable_name_for("  Print!!  Value ", "n.7"), "print_value_n_7");
        assert_eq!(variable_name_for("", "abc"), "node_abc");
        assert_eq!(variable_name_for("2x", "1"), "n_2x_1");
        assert_eq!(variable_name_for("Flag", "Node-A"), "flag_Node_A");
    }

    #[test]
    fn assigned_names_are_distinct() {
        use crate::parse::types::{GraphInput, NodeInput};

        let node = |id: &str| NodeInput {
            id: id.into(),
            label: "Step".into(),
            ..Default::default()
        };
        let graph = FlowGraph::build(&GraphInput {
            nodes: vec![node("n-1"), node("n.1"), node("n_1")],
            edges: vec![],
        });
        let names = assign_variable_names(&graph);
        let ordered: Vec<&str> = graph.nodes().map(|(idx, _)| names[&idx].as_str()).collect();
        assert_eq!(ordered, vec!["step_n_1", "step_n_1_2", "step_n_1_3"]);
    }

    #[test]
    fn identifiers() {
        assert_eq!(identifier("item").as_deref(), Some("item"));
        assert_eq!(identifier("my item").as_deref(), Some("my_item"));
        assert_eq!(identifier("9lives"), None);
        assert_eq!(identifier("--"), None);
    }
}
