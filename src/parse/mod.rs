//! Parse phase: editor JSON → Rust types + graph construction.

pub mod graph;
pub mod types;

pub use graph::{EdgeKind, ExecPort, FlowEdge, FlowGraph, FlowNode, NodeKind, Port};
pub use types::*;

use crate::error::ParseError;

/// Deserialize an editor graph JSON string into a `GraphInput`.
pub fn parse(json: &str) -> Result<GraphInput, ParseError> {
    serde_json::from_str::<GraphInput>(json).map_err(ParseError::Graph)
}

/// Parse JSON and build the graph in one step.
pub fn parse_and_build(json: &str) -> Result<FlowGraph, ParseError> {
    let input = parse(json)?;
    Ok(FlowGraph::build(&input))
}
