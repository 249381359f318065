//! Serde types mirroring the editor's graph JSON.
//!
//! These are the raw input shapes. `FlowGraph::build` turns them into the
//! indexed graph the resolver and generator work on.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// TOP-LEVEL GRAPH
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphInput {
    pub nodes: Vec<NodeInput>,
    #[serde(default)]
    pub edges: Vec<EdgeInput>,
}

// =============================================================================
// NODES
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInput {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Explicit node kind. Overrides classification from category/label.
    #[serde(default)]
    pub kind: Option<NodeKindTag>,
    #[serde(default)]
    pub inputs: Vec<PortInput>,
    #[serde(default)]
    pub outputs: Vec<PortInput>,
    #[serde(default)]
    pub has_execution_ports: Option<bool>,
    #[serde(default)]
    pub execution_inputs: Vec<ExecPortInput>,
    #[serde(default)]
    pub execution_outputs: Vec<ExecPortInput>,
    #[serde(default)]
    pub function_id: Option<String>,
    /// Declared literal, used by input nodes.
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKindTag {
    Plain,
    Input,
    Output,
    Start,
    End,
    Conditional,
    Loop,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortInput {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub port_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, alias = "value")]
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecPortInput {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

// =============================================================================
// EDGES
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeInput {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
    #[serde(default)]
    pub data: Option<EdgeData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    #[serde(rename = "type", default)]
    pub edge_type: Option<EdgeTypeTag>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeTypeTag {
    Data,
    #[serde(alias = "exec")]
    Execution,
}

// =============================================================================
// HANDLES
// =============================================================================

pub const INPUT_PREFIX: &str = "input-";
pub const OUTPUT_PREFIX: &str = "output-";
pub const EXEC_INPUT_PREFIX: &str = "exec-input-";
pub const EXEC_OUTPUT_PREFIX: &str = "exec-output-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleRole {
    Input,
    Output,
    ExecInput,
    ExecOutput,
    /// No recognised prefix; the whole string is the port id.
    Raw,
}

impl HandleRole {
    pub fn is_execution(self) -> bool {
        matches!(self, HandleRole::ExecInput | HandleRole::ExecOutput)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle<'a> {
    pub role: HandleRole,
    pub port_id: &'a str,
}

impl<'a> Handle<'a> {
    /// Split a handle string like `exec-output-then` into role and port id.
    pub fn parse(handle: &'a str) -> Self {
        let prefixes = [
            (EXEC_INPUT_PREFIX, HandleRole::ExecInput),
            (EXEC_OUTPUT_PREFIX, HandleRole::ExecOutput),
            (INPUT_PREFIX, HandleRole::Input),
            (OUTPUT_PREFIX, HandleRole::Output),
        ];
        for (prefix, role) in prefixes {
            if let Some(port_id) = handle.strip_prefix(prefix) {
                return Handle { role, port_id };
            }
        }
        Handle {
            role: HandleRole::Raw,
            port_id: handle,
        }
    }
}
