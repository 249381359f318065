//! Dependency resolution over the dual data/execution graph.
//!
//! Produces the execution order, per-port data bindings, execution
//! entry/exit points and execution groups. Everything is recomputed per call.

mod groups;
pub mod labels;
mod topo;

use petgraph::graph::NodeIndex;

use crate::error::{Diagnostic, DiagnosticKind};
use crate::parse::graph::{EdgeKind, FlowGraph};

pub use groups::ExecutionGroup;
pub use topo::CycleWarning;

/// The `(sourceNode, sourcePort)` pair feeding one data input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub edge_id: String,
    pub target_port: String,
    pub source: NodeIndex,
    pub source_port: String,
}

/// Adjacency lists indexed by `NodeIndex::index()`.
pub(crate) struct Adjacency {
    pub data_deps: Vec<Vec<NodeIndex>>,
    pub bindings: Vec<Vec<Binding>>,
    pub exec_successors: Vec<Vec<NodeIndex>>,
    pub exec_predecessors: Vec<Vec<NodeIndex>>,
    pub branches: Vec<Vec<(String, NodeIndex)>>,
}

impl Adjacency {
    fn build(graph: &FlowGraph) -> Self {
        let n = graph.node_count();
        let mut adj = Adjacency {
            data_deps: vec![Vec::new(); n],
            bindings: vec![Vec::new(); n],
            exec_successors: vec![Vec::new(); n],
            exec_predecessors: vec![Vec::new(); n],
            branches: vec![Vec::new(); n],
        };

        for (source, target, edge) in graph.edges() {
            let (s, t) = (source.index(), target.index());
            match edge.kind {
                EdgeKind::Data => {
                    push_unique(&mut adj.data_deps[t], source);
                    let binding = Binding {
                        edge_id: edge.id.clone(),
                        target_port: edge.target_port.clone(),
                        source,
                        source_port: edge.source_port.clone(),
                    };
                    let slot = &mut adj.bindings[t];
                    match slot.iter_mut().find(|b| b.target_port == binding.target_port) {
                        Some(existing) => *existing = binding,
                        None => slot.push(binding),
                    }
                }
                EdgeKind::Execution => {
                    push_unique(&mut adj.exec_successors[s], target);
                    push_unique(&mut adj.exec_predecessors[t], source);
                    if let Some(label) = &edge.label {
                        adj.branches[s].push((label.clone(), target));
                    }
                }
            }
        }

        adj
    }
}

fn push_unique(list: &mut Vec<NodeIndex>, idx: NodeIndex) {
    if !list.contains(&idx) {
        list.push(idx);
    }
}

pub struct DependencyResolver<'g> {
    graph: &'g FlowGraph,
}

impl<'g> DependencyResolver<'g> {
    pub fn new(graph: &'g FlowGraph) -> Self {
        Self { graph }
    }

    /// Resolve the graph. Never fails: cycles become warnings and dangling
    /// edges were already dropped when the graph was built.
    pub fn resolve(&self) -> Resolution<'g> {
        let graph = self.graph;
        let adj = Adjacency::build(graph);

        let any_exec = graph.any_execution_ports();
        let mut entry_points = Vec::new();
        let mut exit_points = Vec::new();
        for (idx, node) in graph.nodes() {
            let i = idx.index();
            if any_exec {
                if node.has_execution_ports() && adj.exec_predecessors[i].is_empty() {
                    entry_points.push(idx);
                }
            } else if node.kind == crate::parse::NodeKind::Input {
                entry_points.push(idx);
            }
            if node.has_execution_ports() && adj.exec_successors[i].is_empty() {
                exit_points.push(idx);
            }
        }

        let (groups, group_of) = groups::build_groups(graph.node_count(), &entry_points, &adj);
        let (order, cycles) = topo::topo_order(graph, &adj);

        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            entry_points = entry_points.len(),
            groups = groups.len(),
            cycles = cycles.len(),
            "resolved graph dependencies"
        );

        Resolution {
            graph,
            adj,
            entry_points,
            exit_points,
            groups,
            group_of,
            order,
            cycles,
        }
    }
}

pub struct Resolution<'g> {
    graph: &'g FlowGraph,
    adj: Adjacency,
    entry_points: Vec<NodeIndex>,
    exit_points: Vec<NodeIndex>,
    groups: Vec<ExecutionGroup>,
    group_of: Vec<usize>,
    order: Vec<NodeIndex>,
    cycles: Vec<CycleWarning>,
}

impl<'g> Resolution<'g> {
    pub fn graph(&self) -> &'g FlowGraph {
        self.graph
    }

    pub fn execution_order(&self) -> &[NodeIndex] {
        &self.order
    }

    pub fn entry_points(&self) -> &[NodeIndex] {
        &self.entry_points
    }

    pub fn exit_points(&self) -> &[NodeIndex] {
        &self.exit_points
    }

    pub fn groups(&self) -> &[ExecutionGroup] {
        &self.groups
    }

    pub fn group_of(&self, idx: NodeIndex) -> Option<&ExecutionGroup> {
        self.group_of.get(idx.index()).and_then(|&g| self.groups.get(g))
    }

    pub fn cycles(&self) -> &[CycleWarning] {
        &self.cycles
    }

    pub fn data_dependencies(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.adj.data_deps.get(idx.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn bindings(&self, idx: NodeIndex) -> &[Binding] {
        self.adj.bindings.get(idx.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn binding(&self, idx: NodeIndex, target_port: &str) -> Option<&Binding> {
        self.bindings(idx).iter().find(|b| b.target_port == target_port)
    }

    pub fn execution_successors(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.adj.exec_successors.get(idx.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn execution_predecessors(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.adj.exec_predecessors.get(idx.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Labelled execution successors, in edge order.
    pub fn branches(&self, idx: NodeIndex) -> &[(String, NodeIndex)] {
        self.adj.branches.get(idx.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    // -------------------------------------------------------------------------
    // id-based views
    // -------------------------------------------------------------------------

    fn id(&self, idx: NodeIndex) -> &'g str {
        self.graph.node(idx).map(|n| n.id.as_str()).unwrap_or("")
    }

    fn ids(&self, list: &[NodeIndex]) -> Vec<&'g str> {
        list.iter().map(|&idx| self.id(idx)).collect()
    }

    pub fn execution_order_ids(&self) -> Vec<&'g str> {
        self.ids(&self.order)
    }

    pub fn entry_point_ids(&self) -> Vec<&'g str> {
        self.ids(&self.entry_points)
    }

    pub fn exit_point_ids(&self) -> Vec<&'g str> {
        self.ids(&self.exit_points)
    }

    pub fn dependency_ids(&self, node_id: &str) -> Vec<&'g str> {
        self.graph
            .index_of(node_id)
            .map(|idx| self.ids(self.data_dependencies(idx)))
            .unwrap_or_default()
    }

    pub fn successor_ids(&self, node_id: &str) -> Vec<&'g str> {
        self.graph
            .index_of(node_id)
            .map(|idx| self.ids(self.execution_successors(idx)))
            .unwrap_or_default()
    }

    /// Target of the first execution edge leaving `node_id` with `label`.
    pub fn branch_target_id(&self, node_id: &str, label: &str) -> Option<&'g str> {
        let idx = self.graph.index_of(node_id)?;
        self.branches(idx)
            .iter()
            .find(|(l, _)| l.eq_ignore_ascii_case(label))
            .map(|&(_, t)| self.id(t))
    }

    /// `(sourceNodeId, sourcePortId)` feeding `(node_id, port_id)`.
    pub fn binding_source(&self, node_id: &str, port_id: &str) -> Option<(&'g str, &str)> {
        let idx = self.graph.index_of(node_id)?;
        self.binding(idx, port_id)
            .map(|b| (self.id(b.source), b.source_port.as_str()))
    }

    pub fn group_member_ids(&self) -> Vec<Vec<&'g str>> {
        self.groups.iter().map(|g| self.ids(&g.members)).collect()
    }

    /// Cycle warnings as diagnostics.
    pub fn cycle_diagnostics(&self) -> Vec<Diagnostic> {
        self.cycles
            .iter()
            .map(|c| {
                let label = self.graph.node_by_id(&c.node_id).map(|n| n.label.as_str()).unwrap_or("");
                Diagnostic::for_node(
                    DiagnosticKind::DependencyCycle,
                    format!("Dependency cycle detected at node '{}' (reached from '{}')", c.node_id, c.via),
                    &c.node_id,
                    label,
                )
            })
            .collect()
    }
}
