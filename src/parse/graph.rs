//! petgraph-based directed graph over the editor's nodes and edges.
//!
//! Data and execution edges share one `DiGraph`; `NodeIndex` doubles as the
//! arena index the resolver uses for its adjacency lists.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde_json::Value;

use super::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Plain,
    Input,
    Output,
    Start,
    End,
    Conditional,
    Loop,
}

impl NodeKind {
    pub fn is_control_flow(self) -> bool {
        matches!(self, NodeKind::Conditional | NodeKind::Loop)
    }

    /// Classify a node once, from its explicit tag or its category/label words.
    pub fn classify(tag: Option<NodeKindTag>, category: Option<&str>, label: &str) -> Self {
        if let Some(tag) = tag {
            return match tag {
                NodeKindTag::Plain => NodeKind::Plain,
                NodeKindTag::Input => NodeKind::Input,
                NodeKindTag::Output => NodeKind::Output,
                NodeKindTag::Start => NodeKind::Start,
                NodeKindTag::End => NodeKind::End,
                NodeKindTag::Conditional => NodeKind::Conditional,
                NodeKindTag::Loop => NodeKind::Loop,
            };
        }

        let category_words = words(category.unwrap_or(""));
        let has_category = |set: &[&str]| category_words.iter().any(|w| set.contains(&w.as_str()));
        if has_category(&["input", "inputs"]) {
            return NodeKind::Input;
        }
        if has_category(&["output", "outputs"]) {
            return NodeKind::Output;
        }

        let all_words: Vec<String> = category_words.iter().cloned().chain(words(label)).collect();
        let has_any = |set: &[&str]| all_words.iter().any(|w| set.contains(&w.as_str()));
        if has_any(&["if", "branch", "condition", "conditional"]) {
            NodeKind::Conditional
        } else if has_any(&["for", "foreach", "loop", "each"]) {
            NodeKind::Loop
        } else if has_any(&["start", "begin", "entry"]) {
            NodeKind::Start
        } else if has_any(&["end", "finish", "exit"]) {
            NodeKind::End
        } else {
            NodeKind::Plain
        }
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub id: String,
    pub name: String,
    pub port_type: String,
    pub required: bool,
    pub default_value: Option<Value>,
}

impl From<&PortInput> for Port {
    fn from(p: &PortInput) -> Self {
        Port {
            id: p.id.clone(),
            name: if p.name.is_empty() { p.id.clone() } else { p.name.clone() },
            port_type: p.port_type.clone(),
            required: p.required,
            default_value: p.default_value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecPort {
    pub id: String,
    pub name: String,
}

impl From<&ExecPortInput> for ExecPort {
    fn from(p: &ExecPortInput) -> Self {
        ExecPort {
            id: p.id.clone(),
            name: if p.name.is_empty() { p.id.clone() } else { p.name.clone() },
        }
    }
}

#[derive(Debug, Clone)]
pub struct FlowNode {
    pub id: String,
    pub label: String,
    pub category: Option<String>,
    pub kind: NodeKind,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
    pub execution_inputs: Vec<ExecPort>,
    pub execution_outputs: Vec<ExecPort>,
    pub function_id: Option<String>,
    pub value: Option<Value>,
    has_execution_flag: bool,
}

impl FlowNode {
    pub fn from_input(node: &NodeInput) -> Self {
        let kind = NodeKind::classify(node.kind, node.category.as_deref(), &node.label);
        FlowNode {
            id: node.id.clone(),
            label: node.label.clone(),
            category: node.category.clone(),
            kind,
            inputs: node.inputs.iter().map(Port::from).collect(),
            outputs: node.outputs.iter().map(Port::from).collect(),
            execution_inputs: node.execution_inputs.iter().map(ExecPort::from).collect(),
            execution_outputs: node.execution_outputs.iter().map(ExecPort::from).collect(),
            function_id: node.function_id.clone().filter(|f| !f.is_empty()),
            value: node.value.clone(),
            has_execution_flag: node.has_execution_ports.unwrap_or(false),
        }
    }

    /// Whether the node takes part in execution flow at all.
    pub fn has_execution_ports(&self) -> bool {
        self.has_execution_flag
            || !self.execution_inputs.is_empty()
            || !self.execution_outputs.is_empty()
    }

    pub fn input(&self, port_id: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.id == port_id)
    }

    pub fn output(&self, port_id: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.id == port_id)
    }

    pub fn execution_output(&self, port_id: &str) -> Option<&ExecPort> {
        self.execution_outputs.iter().find(|p| p.id == port_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Data,
    Execution,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    pub id: String,
    pub kind: EdgeKind,
    pub source_port: String,
    pub target_port: String,
    /// Branch label, execution edges only.
    pub label: Option<String>,
}

pub struct FlowGraph {
    pub graph: DiGraph<FlowNode, FlowEdge>,
    pub node_indices: HashMap<String, NodeIndex>,
}

impl FlowGraph {
    /// Build the graph. Duplicate node ids keep the first occurrence; edges that
    /// reference unknown nodes are dropped.
    pub fn build(input: &GraphInput) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for node in &input.nodes {
            if node_indices.contains_key(&node.id) {
                tracing::warn!(node = %node.id, "duplicate node id, keeping the first definition");
                continue;
            }
            let flow_node = FlowNode::from_input(node);
            tracing::debug!(node = %node.id, kind = ?flow_node.kind, "classified node");
            let idx = graph.add_node(flow_node);
            node_indices.insert(node.id.clone(), idx);
        }

        for edge in &input.edges {
            let (Some(&s), Some(&t)) = (node_indices.get(&edge.source), node_indices.get(&edge.target))
            else {
                tracing::debug!(
                    edge = %edge.id,
                    source = %edge.source,
                    target = %edge.target,
                    "dropping edge that references an unknown node"
                );
                continue;
            };

            let source_handle = Handle::parse(edge.source_handle.as_deref().unwrap_or(""));
            let target_handle = Handle::parse(edge.target_handle.as_deref().unwrap_or(""));
            let data = edge.data.as_ref();

            let kind = match data.and_then(|d| d.edge_type) {
                Some(EdgeTypeTag::Data) => EdgeKind::Data,
                Some(EdgeTypeTag::Execution) => EdgeKind::Execution,
                None if source_handle.role.is_execution() || target_handle.role.is_execution() => {
                    EdgeKind::Execution
                }
                None => EdgeKind::Data,
            };

            let label = match kind {
                EdgeKind::Data => None,
                EdgeKind::Execution => data
                    .and_then(|d| d.label.clone())
                    .filter(|l| !l.is_empty())
                    .or_else(|| {
                        graph[s]
                            .execution_output(source_handle.port_id)
                            .map(|p: &ExecPort| p.name.clone())
                    })
                    .or_else(|| {
                        (!source_handle.port_id.is_empty()).then(|| source_handle.port_id.to_string())
                    }),
            };

            let flow_edge = FlowEdge {
                id: edge.id.clone(),
                kind,
                source_port: source_handle.port_id.to_string(),
                target_port: target_handle.port_id.to_string(),
                label,
            };
            graph.add_edge(s, t, flow_edge);
        }

        FlowGraph { graph, node_indices }
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&FlowNode> {
        self.graph.node_weight(idx)
    }

    pub fn index_of(&self, node_id: &str) -> Option<NodeIndex> {
        self.node_indices.get(node_id).copied()
    }

    pub fn node_by_id(&self, node_id: &str) -> Option<&FlowNode> {
        self.index_of(node_id).and_then(|idx| self.node(idx))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &FlowNode)> {
        self.graph.node_indices().map(move |idx| (idx, &self.graph[idx]))
    }

    /// Edges in declaration order, as `(source, target, edge)`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &FlowEdge)> {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight()))
    }

    pub fn any_execution_ports(&self) -> bool {
        self.graph.node_weights().any(FlowNode::has_execution_ports)
    }

    /// Declared type of an output port, `any` when the port is unknown.
    pub fn output_type(&self, idx: NodeIndex, port_id: &str) -> &str {
        self.node(idx)
            .and_then(|n| n.output(port_id))
            .map(|p| p.port_type.as_str())
            .unwrap_or("any")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, label: &str, category: Option<&str>) -> NodeInput {
        NodeInput {
            id: id.into(),
            label: label.into(),
            category: category.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn classify_by_words_not_substrings() {
        assert_eq!(NodeKind::classify(None, None, "If"), NodeKind::Conditional);
        assert_eq!(NodeKind::classify(None, None, "Notify User"), NodeKind::Plain);
        assert_eq!(NodeKind::classify(None, Some("control"), "For Each"), NodeKind::Loop);
        assert_eq!(NodeKind::classify(None, Some("input"), "If"), NodeKind::Input);
        assert_eq!(NodeKind::classify(None, None, "Start"), NodeKind::Start);
        assert_eq!(NodeKind::classify(None, None, "End"), NodeKind::End);
        assert_eq!(
            NodeKind::classify(Some(NodeKindTag::Plain), None, "If"),
            NodeKind::Plain
        );
    }

    #[test]
    fn dangling_edges_are_dropped() {
        let input = GraphInput {
            nodes: vec![node("a", "A", None), node("b", "B", None)],
            edges: vec![
                EdgeInput {
                    id: "e1".into(),
                    source: "a".into(),
                    target: "b".into(),
                    source_handle: Some("output-out".into()),
                    target_handle: Some("input-in".into()),
                    data: None,
                },
                EdgeInput {
                    id: "e2".into(),
                    source: "a".into(),
                    target: "ghost".into(),
                    ..Default::default()
                },
            ],
        };
        let graph = FlowGraph::build(&input);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let (_, _, edge) = graph.edges().next().unwrap();
        assert_eq!(edge.kind, EdgeKind::Data);
        assert_eq!(edge.source_port, "out");
        assert_eq!(edge.target_port, "in");
    }

    #[test]
    fn execution_kind_inferred_from_handles_and_labelled_by_port_name() {
        let mut cond = node("c", "If", None);
        cond.execution_outputs = vec![ExecPortInput { id: "t".into(), name: "then".into() }];
        let input = GraphInput {
            nodes: vec![cond, node("p", "Print", None)],
            edges: vec![EdgeInput {
                id: "e1".into(),
                source: "c".into(),
                target: "p".into(),
                source_handle: Some("exec-output-t".into()),
                target_handle: Some("exec-input-in".into()),
                data: None,
            }],
        };
        let graph = FlowGraph::build(&input);
        let (_, _, edge) = graph.edges().next().unwrap();
        assert_eq!(edge.kind, EdgeKind::Execution);
        assert_eq!(edge.label.as_deref(), Some("then"));
    }
}
