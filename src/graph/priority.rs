//! Degree-ordered graph for greedy removal heuristics.
//!
//! Nodes are kept in an ordered index keyed by `(degree, Reverse(id))`, so
//! the top is always the node with the most neighbors, ties going to the
//! smallest id. Every mutation re-keys the touched nodes before returning.

use crate::error::{Error, Result};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

/// Undirected graph with a max-degree priority index.
#[derive(Debug, Clone, Default)]
pub struct PriorityGraph {
    adjacency: BTreeMap<usize, BTreeSet<usize>>,
    order: BTreeSet<(usize, Reverse<usize>)>,
}

impl PriorityGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` with no neighbors. Returns `false` if it already exists.
    pub fn add_node(&mut self, id: usize) -> bool {
        if self.adjacency.contains_key(&id) {
            return false;
        }
        let _ = self.adjacency.insert(id, BTreeSet::new());
        let _ = self.order.insert((0, Reverse(id)));
        true
    }

    /// Connect `u` and `v`. Adding an existing edge is a no-op.
    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<()> {
        if u == v {
            return Err(Error::SelfLoop { id: u });
        }
        for id in [u, v] {
            if !self.adjacency.contains_key(&id) {
                return Err(Error::UnknownNode { id });
            }
        }
        if self.adjacency[&u].contains(&v) {
            return Ok(());
        }
        self.link(u, v);
        self.link(v, u);
        Ok(())
    }

    /// Neighbors of `id`, ascending. Empty for unknown ids.
    pub fn neighbors(&self, id: usize) -> Vec<usize> {
        self.adjacency
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Current degree of `id`.
    pub fn degree(&self, id: usize) -> Option<usize> {
        self.adjacency.get(&id).map(BTreeSet::len)
    }

    /// All remaining nodes, ascending.
    pub fn nodes(&self) -> Vec<usize> {
        self.adjacency.keys().copied().collect()
    }

    /// Number of remaining nodes.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Whether no nodes remain.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Number of remaining edges.
    pub fn n_edges(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Highest-degree node (smallest id on ties).
    pub fn top(&self) -> Option<usize> {
        self.order.last().map(|&(_, Reverse(id))| id)
    }

    /// Degree of [`top`](Self::top), or 0 when empty.
    pub fn max_degree(&self) -> usize {
        self.order.last().map_or(0, |&(deg, _)| deg)
    }

    /// Remove `id` and all its edges, appending it to `removed`.
    ///
    /// Returns `false` if `id` was not present.
    pub fn remove_node(&mut self, id: usize, removed: &mut Vec<usize>) -> bool {
        let Some(neighbors) = self.adjacency.remove(&id) else {
            return false;
        };
        let _ = self.order.remove(&(neighbors.len(), Reverse(id)));

        for n in neighbors {
            if let Some(set) = self.adjacency.get_mut(&n) {
                let old = set.len();
                let _ = set.remove(&id);
                let _ = self.order.remove(&(old, Reverse(n)));
                let _ = self.order.insert((old - 1, Reverse(n)));
            }
        }
        removed.push(id);
        true
    }

    fn link(&mut self, from: usize, to: usize) {
        if let Some(set) = self.adjacency.get_mut(&from) {
            let old = set.len();
            let _ = set.insert(to);
            let _ = self.order.remove(&(old, Reverse(from)));
            let _ = self.order.insert((old + 1, Reverse(from)));
        }
    }
}
