//! Conditional and loop shapes.

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;

use super::context::EmitContext;
use super::emit::{Emitter, bind_outputs};
use super::value_expr::identifier;
use crate::parse::graph::{FlowNode, Port};
use crate::resolve::labels::{BODY_LABELS, ELSE_LABELS, THEN_LABELS, matches_label};

impl Emitter<'_> {
    /// Targets of labelled execution edges whose label is in `accepted`, in edge order.
    fn branch_targets(&self, idx: NodeIndex, accepted: &[&str]) -> Vec<NodeIndex> {
        let mut targets = Vec::new();
        for (label, target) in self.resolution.branches(idx) {
            if matches_label(label, accepted) && !targets.contains(target) {
                targets.push(*target);
            }
        }
        targets
    }

    /// Execution successors not claimed by any branch; emitted after the block.
    fn continuation(&self, idx: NodeIndex, claimed: &[NodeIndex]) -> Vec<NodeIndex> {
        self.resolution
            .execution_successors(idx)
            .iter()
            .copied()
            .filter(|t| !claimed.contains(t))
            .collect()
    }

    /// `if <condition>:` with then/else branches. Returns false when the node
    /// has no condition input and should be emitted as an ordinary node.
    pub(super) fn emit_conditional(&self, ctx: &mut EmitContext, idx: NodeIndex) -> bool {
        let Some(node) = self.graph.node(idx) else {
            return false;
        };
        let Some(condition_port) = node.inputs.first() else {
            return false;
        };

        let condition = self.resolve_port(ctx, idx, node, condition_port);
        let then_targets = self.branch_targets(idx, THEN_LABELS);
        let else_targets: Vec<NodeIndex> = self
            .branch_targets(idx, ELSE_LABELS)
            .into_iter()
            .filter(|t| !then_targets.contains(t))
            .collect();
        let claimed: Vec<NodeIndex> = then_targets.iter().chain(&else_targets).copied().collect();
        let rest = self.continuation(idx, &claimed);

        let held = self.split_regions(
            ctx,
            idx,
            &[then_targets.as_slice(), else_targets.as_slice(), rest.as_slice()],
        );

        ctx.writer.block_open(&format!("if {condition}:"));
        self.emit_branch(ctx, &then_targets);
        if !else_targets.is_empty() {
            ctx.writer.block_else();
            self.emit_branch(ctx, &else_targets);
        }
        ctx.writer.dedent();

        self.release(ctx, &rest, held);
        true
    }

    /// `for <var> in <collection>:` over the body branch. Returns false when
    /// the node has no inputs at all.
    pub(super) fn emit_loop(&self, ctx: &mut EmitContext, idx: NodeIndex) -> bool {
        let Some(node) = self.graph.node(idx) else {
            return false;
        };

        let (var, collection) = match node.inputs.as_slice() {
            [single] => (
                format!("{}_item", ctx.variable(idx, node)),
                self.resolve_port(ctx, idx, node, single),
            ),
            [variable, collection, ..] => (
                self.iteration_variable(ctx, idx, node, variable),
                self.resolve_port(ctx, idx, node, collection),
            ),
            [] => return false,
        };
        bind_outputs(ctx, idx, node, &var);

        let body = self.branch_targets(idx, BODY_LABELS);
        let rest = self.continuation(idx, &body);

        let held = self.split_regions(ctx, idx, &[body.as_slice(), rest.as_slice()]);

        ctx.writer.block_open(&format!("for {var} in {collection}:"));
        self.emit_branch(ctx, &body);
        ctx.writer.dedent();

        self.release(ctx, &rest, held);
        true
    }

    /// Loop variable from the first input: its connected expression, a string
    /// default usable as an identifier, or `<node var>_item`.
    fn iteration_variable(&self, ctx: &mut EmitContext, idx: NodeIndex, node: &FlowNode, port: &Port) -> String {
        if self.resolution.binding(idx, &port.id).is_some() {
            return self.resolve_port(ctx, idx, node, port);
        }
        port.default_value
            .as_ref()
            .and_then(|v| v.as_str())
            .and_then(identifier)
            .unwrap_or_else(|| format!("{}_item", ctx.variable(idx, node)))
    }

    /// Split the flow after a block into regions, one per slice of `starts`;
    /// the last slice is what runs after the block. Data-only nodes needed by
    /// more than one region are emitted now, ahead of the block header. Nodes
    /// reachable from more than one region are put behind barriers and
    /// returned in execution order, to be emitted once the block is closed.
    fn split_regions(&self, ctx: &mut EmitContext, owner: NodeIndex, starts: &[&[NodeIndex]]) -> Vec<NodeIndex> {
        let regions: Vec<HashSet<NodeIndex>> = starts.iter().map(|s| self.flow_region(ctx, s)).collect();

        let mut reach: HashMap<NodeIndex, usize> = HashMap::new();
        for &n in regions.iter().flatten() {
            *reach.entry(n).or_default() += 1;
        }
        let joins: HashSet<NodeIndex> = reach
            .into_iter()
            .filter(|&(_, count)| count > 1)
            .map(|(n, _)| n)
            .collect();

        let last = regions.len().saturating_sub(1);
        let mut needs: HashMap<NodeIndex, usize> = HashMap::new();
        for (i, region) in regions.iter().enumerate() {
            let walked: HashSet<NodeIndex> = if i == last {
                region.union(&joins).copied().collect()
            } else {
                region.difference(&joins).copied().collect()
            };
            for dep in self.data_needs(ctx, &walked) {
                *needs.entry(dep).or_default() += 1;
            }
        }

        let order = self.resolution.execution_order();
        for &n in order {
            if needs.get(&n).is_some_and(|&count| count > 1) && self.hoistable(ctx, n, owner, &mut HashSet::new()) {
                tracing::debug!(node = n.index(), "hoisting shared dependency");
                self.emit_standalone(ctx, n);
            }
        }

        let held: Vec<NodeIndex> = order
            .iter()
            .copied()
            .filter(|n| joins.contains(n) && !ctx.barriers.contains(n))
            .collect();
        ctx.barriers.extend(held.iter().copied());
        held
    }

    /// Lift the barriers set by [`Self::split_regions`], then emit the
    /// continuation followed by the held join nodes.
    fn release(&self, ctx: &mut EmitContext, rest: &[NodeIndex], held: Vec<NodeIndex>) {
        for n in &held {
            ctx.barriers.remove(n);
        }
        for &next in rest {
            self.emit_flow(ctx, next);
        }
        for next in held {
            self.emit_flow(ctx, next);
        }
    }

    /// Unvisited nodes reachable from `targets` over execution edges.
    fn flow_region(&self, ctx: &EmitContext, targets: &[NodeIndex]) -> HashSet<NodeIndex> {
        let mut region = HashSet::new();
        let mut stack = targets.to_vec();
        while let Some(n) = stack.pop() {
            if ctx.visited.contains(&n) || ctx.barriers.contains(&n) || !region.insert(n) {
                continue;
            }
            stack.extend(self.resolution.execution_successors(n).iter().copied());
        }
        region
    }

    /// Unvisited data-only nodes that `region` reads, directly or through
    /// other data-only nodes.
    fn data_needs(&self, ctx: &EmitContext, region: &HashSet<NodeIndex>) -> HashSet<NodeIndex> {
        let mut needs = HashSet::new();
        let mut stack: Vec<NodeIndex> = region
            .iter()
            .flat_map(|&n| self.resolution.data_dependencies(n).iter().copied())
            .collect();
        while let Some(dep) = stack.pop() {
            if ctx.visited.contains(&dep) || region.contains(&dep) || !self.is_data_only(dep) || !needs.insert(dep) {
                continue;
            }
            stack.extend(self.resolution.data_dependencies(dep).iter().copied());
        }
        needs
    }

    /// True when `idx` and its unvisited dependencies can all be computed
    /// before `owner`'s block, without reading `owner` itself.
    fn hoistable(&self, ctx: &EmitContext, idx: NodeIndex, owner: NodeIndex, seen: &mut HashSet<NodeIndex>) -> bool {
        if !seen.insert(idx) {
            return true;
        }
        self.resolution.data_dependencies(idx).iter().all(|&dep| {
            if dep == owner {
                false
            } else if ctx.visited.contains(&dep) {
                true
            } else {
                self.is_data_only(dep) && self.hoistable(ctx, dep, owner, seen)
            }
        })
    }

    fn is_data_only(&self, idx: NodeIndex) -> bool {
        self.graph.node(idx).is_some_and(|n| !n.has_execution_ports())
    }
}
