//! Execution groups: what each entry point pulls in through execution edges
//! and, transitively, through the data dependencies of those nodes.

use petgraph::graph::NodeIndex;

use super::Adjacency;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionGroup {
    /// `None` for the singleton groups swept up after the entry-point pass.
    pub entry: Option<NodeIndex>,
    /// Members in discovery order.
    pub members: Vec<NodeIndex>,
}

impl ExecutionGroup {
    pub fn is_data_only(&self) -> bool {
        self.entry.is_none()
    }

    pub fn contains(&self, idx: NodeIndex) -> bool {
        self.members.contains(&idx)
    }
}

/// Returns the groups and, per node index, the index of its group.
pub(crate) fn build_groups(
    node_count: usize,
    entry_points: &[NodeIndex],
    adj: &Adjacency,
) -> (Vec<ExecutionGroup>, Vec<usize>) {
    let mut assigned: Vec<Option<usize>> = vec![None; node_count];
    let mut groups = Vec::new();

    for &entry in entry_points {
        if assigned[entry.index()].is_some() {
            continue;
        }
        let group_idx = groups.len();
        let mut members = Vec::new();
        collect_flow(entry, group_idx, adj, &mut assigned, &mut members);
        groups.push(ExecutionGroup {
            entry: Some(entry),
            members,
        });
    }

    for i in 0..node_count {
        if assigned[i].is_none() {
            assigned[i] = Some(groups.len());
            groups.push(ExecutionGroup {
                entry: None,
                members: vec![NodeIndex::new(i)],
            });
        }
    }

    let group_of = assigned.into_iter().map(|g| g.unwrap_or_default()).collect();
    (groups, group_of)
}

fn collect_flow(
    idx: NodeIndex,
    group: usize,
    adj: &Adjacency,
    assigned: &mut [Option<usize>],
    members: &mut Vec<NodeIndex>,
) {
    if assigned[idx.index()].is_some() {
        return;
    }
    assigned[idx.index()] = Some(group);
    members.push(idx);

    for &dep in &adj.data_deps[idx.index()] {
        collect_data(dep, group, adj, assigned, members);
    }
    for &next in &adj.exec_successors[idx.index()] {
        collect_flow(next, group, adj, assigned, members);
    }
}

/// Data dependencies only; their execution successors are not followed.
fn collect_data(
    idx: NodeIndex,
    group: usize,
    adj: &Adjacency,
    assigned: &mut [Option<usize>],
    members: &mut Vec<NodeIndex>,
) {
    if assigned[idx.index()].is_some() {
        return;
    }
    assigned[idx.index()] = Some(group);
    members.push(idx);

    for &dep in &adj.data_deps[idx.index()] {
        collect_data(dep, group, adj, assigned, members);
    }
}
