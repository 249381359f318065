//! Cycle-tolerant topological order over data dependencies and execution predecessors.
//!
//! petgraph's `toposort` rejects cyclic graphs outright; here a cycle only
//! abandons the offending edge so that every node still appears exactly once.

use petgraph::graph::NodeIndex;

use super::Adjacency;
use crate::parse::graph::FlowGraph;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleWarning {
    /// The node encountered again while still being visited.
    pub node_id: String,
    /// The dependent node whose edge closed the cycle.
    pub via: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Temp,
    Done,
}

/// Returns node indices with every dependency ahead of its dependents,
/// plus one warning per edge that closed a cycle.
pub(crate) fn topo_order(graph: &FlowGraph, adj: &Adjacency) -> (Vec<NodeIndex>, Vec<CycleWarning>) {
    let mut walk = Walk {
        graph,
        adj,
        marks: vec![Mark::Unvisited; graph.node_count()],
        order: Vec::with_capacity(graph.node_count()),
        cycles: Vec::new(),
    };

    for (idx, _) in graph.nodes() {
        walk.visit(idx);
    }

    (walk.order, walk.cycles)
}

struct Walk<'a> {
    graph: &'a FlowGraph,
    adj: &'a Adjacency,
    marks: Vec<Mark>,
    order: Vec<NodeIndex>,
    cycles: Vec<CycleWarning>,
}

impl Walk<'_> {
    fn visit(&mut self, idx: NodeIndex) {
        if self.marks[idx.index()] != Mark::Unvisited {
            return;
        }
        self.marks[idx.index()] = Mark::Temp;

        let adj = self.adj;
        let deps = adj.data_deps[idx.index()]
            .iter()
            .chain(adj.exec_predecessors[idx.index()].iter());
        for &dep in deps {
            match self.marks[dep.index()] {
                Mark::Done => {}
                Mark::Temp => self.record_cycle(dep, idx),
                Mark::Unvisited => self.visit(dep),
            }
        }

        self.marks[idx.index()] = Mark::Done;
        self.order.push(idx);
    }

    fn record_cycle(&mut self, node: NodeIndex, via: NodeIndex) {
        let id_of = |idx: NodeIndex| {
            self.graph
                .node(idx)
                .map(|n| n.id.clone())
                .unwrap_or_default()
        };
        let warning = CycleWarning {
            node_id: id_of(node),
            via: id_of(via),
        };
        tracing::warn!(
            node = %warning.node_id,
            via = %warning.via,
            "dependency cycle detected, ignoring the closing edge"
        );
        self.cycles.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::{EdgeInput, GraphInput, NodeInput};

    fn graph(ids: &[&str], data_edges: &[(&str, &str)]) -> FlowGraph {
        let input = GraphInput {
            nodes: ids
                .iter()
                .map(|id| NodeInput { id: id.to_string(), label: id.to_string(), ..Default::default() })
                .collect(),
            edges: data_edges
                .iter()
                .enumerate()
                .map(|(i, (s, t))| EdgeInput {
                    id: format!("e{i}"),
                    source: s.to_string(),
                    target: t.to_string(),
                    source_handle: Some("output-out".into()),
                    target_handle: Some(format!("input-in{i}")),
                    data: None,
                })
                .collect(),
        };
        FlowGraph::build(&input)
    }

    fn order_ids(g: &FlowGraph) -> (Vec<String>, Vec<CycleWarning>) {
        let adj = Adjacency::build(g);
        let (order, cycles) = topo_order(g, &adj);
        let ids = order.iter().map(|&i| g.node(i).unwrap().id.clone()).collect();
        (ids, cycles)
    }

    #[test]
    fn dependencies_come_first() {
        // Declared in reverse so the walk has to recurse.
        let g = graph(&["c", "b", "a"], &[("a", "b"), ("b", "c")]);
        let (ids, cycles) = order_ids(&g);
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(cycles.is_empty());
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let g = graph(&["a"], &[("a", "a")]);
        let (ids, cycles) = order_ids(&g);
        assert_eq!(ids, vec!["a"]);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].node_id, "a");
    }

    #[test]
    fn three_cycle_keeps_every_node_once() {
        let g = graph(&["1", "2", "3"], &[("1", "2"), ("2", "3"), ("3", "1")]);
        let (ids, cycles) = order_ids(&g);
        assert_eq!(cycles.len(), 1);
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["1", "2", "3"]);
        // Walk starts at 1, whose dependency 3 depends on 2, which closes on 1.
        assert_eq!(ids, vec!["2", "3", "1"]);
        assert_eq!(cycles[0].node_id, "1");
        assert_eq!(cycles[0].via, "2");
    }
}
