//! Equal-cost shortest-path enumeration
//!
//! Two-phase search: a label-setting pass finds the minimum total cost,
//! then an ordered depth-first walk of the minimum-cost subgraph
//! enumerates every path achieving that cost. Costs are strictly
//! positive, so the minimum-cost subgraph is acyclic and every
//! enumerated path is simple.

use std::collections::{BTreeMap, HashMap};

use petgraph::algo::dijkstra;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{EdgeRef, Reversed};
use serde::{Deserialize, Serialize};
use tracing::trace;
use viaduct_core::{InterfaceKey, NodeId};

use crate::graph::Link;

/// Tolerance when comparing summed path costs; integral costs compare
/// exactly, fractional ones are not summation-order-sensitive
const COST_TOLERANCE: f64 = 1e-9;

/// An ordered interface sequence from source to destination
pub type Hops = Vec<InterfaceKey>;

/// The set of minimum-cost paths between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSet {
    /// Total cost shared by every path in the set
    pub cost: f64,
    /// Equal-cost paths, lexicographic by interface-key sequence
    pub paths: Vec<Hops>,
}

impl PathSet {
    /// The empty set: no feasible path (callers read this as unrouted)
    pub fn empty() -> Self {
        Self {
            cost: 0.0,
            paths: Vec::new(),
        }
    }

    /// Whether no feasible path was found
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Number of equal-cost paths found
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// The first path in tie-break order
    pub fn first(&self) -> Option<&Hops> {
        self.paths.first()
    }
}

/// Edge payload: traversal cost plus the index of the snapshotted link
#[derive(Debug, Clone, Copy)]
struct EdgeInfo {
    cost: f64,
    link: usize,
}

/// Equal-cost multipath finder
#[derive(Debug, Clone)]
pub struct PathFinder {
    max_paths: usize,
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new(64)
    }
}

impl PathFinder {
    /// Create a finder that enumerates at most `max_paths` paths per query
    pub fn new(max_paths: usize) -> Self {
        Self { max_paths }
    }

    /// All minimum-cost paths from `src` to `dst` over links with
    /// `reservable >= min_reservable`
    ///
    /// Pass `0.0` for an unconstrained search. Returns the empty set
    /// when either endpoint has no usable link or no path survives the
    /// filter.
    pub fn equal_cost_paths(
        &self,
        links: &[Link],
        src: &NodeId,
        dst: &NodeId,
        min_reservable: f64,
    ) -> PathSet {
        if src == dst {
            return PathSet::empty();
        }

        let usable: Vec<&Link> = links
            .iter()
            .filter(|link| link.reservable >= min_reservable)
            .collect();

        let mut graph: DiGraph<(), EdgeInfo> = DiGraph::new();
        let mut node_ix: BTreeMap<&NodeId, NodeIndex> = BTreeMap::new();
        for (index, link) in usable.iter().enumerate() {
            let from = *node_ix
                .entry(&link.from)
                .or_insert_with(|| graph.add_node(()));
            let to = *node_ix
                .entry(&link.to)
                .or_insert_with(|| graph.add_node(()));
            graph.add_edge(
                from,
                to,
                EdgeInfo {
                    cost: link.cost,
                    link: index,
                },
            );
        }

        let (Some(&source), Some(&target)) = (node_ix.get(src), node_ix.get(dst)) else {
            return PathSet::empty();
        };

        let forward = dijkstra(&graph, source, Some(target), |edge| edge.weight().cost);
        let Some(&min_cost) = forward.get(&target) else {
            return PathSet::empty();
        };
        // Remaining distance to the destination, for pruning the walk
        let remaining: HashMap<NodeIndex, f64> =
            dijkstra(Reversed(&graph), target, None, |edge| edge.weight().cost)
                .into_iter()
                .collect();

        let mut paths = Vec::new();
        let mut hops = Vec::new();
        self.walk(
            &graph, &usable, &remaining, source, target, 0.0, min_cost, &mut hops, &mut paths,
        );

        trace!(
            "{} equal-cost path(s) from {} to {} at cost {}",
            paths.len(),
            src,
            dst,
            min_cost
        );
        PathSet {
            cost: min_cost,
            paths,
        }
    }

    /// Depth-first walk keeping only edges on some minimum-cost path,
    /// exploring links in interface-key order
    #[allow(clippy::too_many_arguments)]
    fn walk(
        &self,
        graph: &DiGraph<(), EdgeInfo>,
        usable: &[&Link],
        remaining: &HashMap<NodeIndex, f64>,
        at: NodeIndex,
        target: NodeIndex,
        spent: f64,
        min_cost: f64,
        hops: &mut Vec<usize>,
        out: &mut Vec<Hops>,
    ) {
        if out.len() == self.max_paths {
            return;
        }
        if at == target {
            out.push(
                hops.iter()
                    .map(|&index| usable[index].interface.clone())
                    .collect(),
            );
            return;
        }

        let mut edges: Vec<(usize, NodeIndex)> = graph
            .edges(at)
            .map(|edge| (edge.weight().link, edge.target()))
            .collect();
        edges.sort_by(|a, b| usable[a.0].interface.cmp(&usable[b.0].interface));

        for (index, next) in edges {
            let Some(&rest) = remaining.get(&next) else {
                continue;
            };
            let spent = spent + usable[index].cost;
            if (spent + rest - min_cost).abs() > COST_TOLERANCE {
                continue;
            }
            hops.push(index);
            self.walk(
                graph, usable, remaining, next, target, spent, min_cost, hops, out,
            );
            hops.pop();
        }
    }
}
