//! Integration tests for port type compatibility and conversion insertion.

mod helpers;

use serde_json::json;

use graphcode::error::DiagnosticKind;
use graphcode::typing::{Compatibility, PortRef, TypeConversionService, TypeValidator};

const TYPES: [&str; 6] = ["any", "number", "string", "boolean", "array", "object"];

fn expected(source: &str, target: &str) -> Compatibility {
    match (source, target) {
        (s, t) if s == t => Compatibility::Compatible,
        ("any", _) | (_, "any") => Compatibility::Compatible,
        ("number", "string")
        | ("string", "number")
        | ("boolean", "string")
        | ("string", "boolean")
        | ("boolean", "number")
        | ("number", "boolean")
        | ("array", "string")
        | ("object", "string") => Compatibility::CompatibleWithConversion,
        _ => Compatibility::Incompatible,
    }
}

#[test]
fn default_matrix() {
    let validator = TypeValidator::default();
    for source in TYPES {
        for target in TYPES {
            assert_eq!(
                validator.check_compatibility(source, target),
                expected(source, target),
                "{source} -> {target}"
            );
        }
    }
}

#[test]
fn conversion_is_applied_only_when_needed() {
    let service = TypeConversionService::default();
    for source in TYPES {
        for target in TYPES {
            let conversion = service.convert("v", source, target);
            match expected(source, target) {
                Compatibility::CompatibleWithConversion => {
                    assert!(conversion.applied(), "{source} -> {target}");
                    assert_ne!(conversion.expression, "v");
                }
                _ => assert_eq!(conversion.expression, "v", "{source} -> {target}"),
            }
        }
    }
}

#[test]
fn can_connect_resolves_ports_by_id() {
    let graph = helpers::graph_from_str(include_str!("fixtures/loop.json"));
    let validator = TypeValidator::default();

    assert_eq!(
        validator.can_connect(&graph, PortRef::new("3", "current"), PortRef::new("4", "message")),
        Compatibility::CompatibleWithConversion
    );
    assert_eq!(
        validator.can_connect(&graph, PortRef::new("2", "value"), PortRef::new("3", "items")),
        Compatibility::Compatible
    );
    assert_eq!(
        validator.can_connect(&graph, PortRef::new("2", "missing"), PortRef::new("3", "items")),
        Compatibility::Unknown
    );
}

#[test]
fn validate_all_connections_reports_each_data_edge() {
    let graph = helpers::graph(json!({
        "nodes": [
            helpers::input_node("1", "Items", "array", json!([])),
            helpers::input_node("2", "Count", "number", json!(1)),
            helpers::function_node(
                "3",
                "Join",
                "add",
                &[("a", "number"), ("b", "string")],
                &[("sum", "string")],
            ),
        ],
        "edges": [
            helpers::data_edge("e1", "1", "value", "3", "a"),
            helpers::data_edge("e2", "2", "value", "3", "b"),
        ],
    }));

    let diagnostics = TypeValidator::default().validate_all_connections(&graph);
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::TypeIncompatible);
    assert!(diagnostics[0].is_error());
    assert_eq!(diagnostics[0].connection.as_ref().map(|c| c.edge_id.as_str()), Some("e1"));
    assert_eq!(diagnostics[1].kind, DiagnosticKind::TypeConversionApplied);
    assert!(!diagnostics[1].is_error());
}
