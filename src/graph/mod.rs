//! Weighted graphs over dense integer node ids.
//!
//! Construction is two-phase. A [`GraphBuilder`] accepts node and edge
//! insertions in any order; [`GraphBuilder::flush`] validates the batch and
//! commits it into an immutable, queryable [`Graph`]. Queries only exist on
//! the committed type, so reading half-built state is impossible.
//!
//! ```rust
//! use blockgraph::graph::GraphBuilder;
//!
//! let mut draft = GraphBuilder::new();
//! draft.add_node(0, 1).unwrap();
//! draft.add_node(1, 1).unwrap();
//! draft.add_node(2, 5).unwrap();
//! draft.add_edge(0, 1).unwrap();
//! draft.add_edge(1, 0).unwrap(); // duplicate, collapses
//! draft.add_weighted_edge(1, 2, 0.25).unwrap();
//!
//! let graph = draft.flush().unwrap();
//! assert_eq!(graph.n_edges(), 2);
//! assert_eq!(graph.neighbors(1), vec![0, 2]);
//! assert_eq!(graph.weight(2), 5);
//! ```
//!
//! # Simple-graph text format
//!
//! ```text
//! <nNodes+dummyNodes> <nEdges> <hasWeights: 0|1>
//! [<nodeWeight> ]<neighbor1> <neighbor2> ...
//! ```
//!
//! One line per real node, neighbors 1-based.

pub mod hypergraph;
pub(crate) mod io;
pub mod priority;

pub use hypergraph::{Hypergraph, HypergraphBuilder};
pub use priority::PriorityGraph;

use crate::error::{Error, Result};
use log::debug;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

/// Mutable draft of a [`Graph`].
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    /// Registered nodes and their weights.
    weights: BTreeMap<usize, i64>,
    /// Edge-seen set keyed by the ordered pair `(min, max)`.
    edges: BTreeMap<(usize, usize), f64>,
    /// Nodes reported in totals without being materialized.
    dummy_nodes: usize,
}

impl GraphBuilder {
    /// Create an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register node `id` with an integer weight.
    pub fn add_node(&mut self, id: usize, weight: i64) -> Result<()> {
        match self.weights.entry(id) {
            Entry::Occupied(_) => Err(Error::DuplicateNode { id }),
            Entry::Vacant(slot) => {
                slot.insert(weight);
                Ok(())
            }
        }
    }

    /// Record an unweighted edge (weight `1.0`).
    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<()> {
        self.add_weighted_edge(u, v, 1.0)
    }

    /// Record an edge with a real-valued weight.
    ///
    /// Endpoints may be registered later in the same batch. Repeated edges
    /// keep the first weight.
    pub fn add_weighted_edge(&mut self, u: usize, v: usize, weight: f64) -> Result<()> {
        if u == v {
            return Err(Error::SelfLoop { id: u });
        }
        let _ = self.edges.entry((u.min(v), u.max(v))).or_insert(weight);
        Ok(())
    }

    /// Whether the edge `{u, v}` is already in the batch.
    pub fn contains_edge(&self, u: usize, v: usize) -> bool {
        self.edges.contains_key(&(u.min(v), u.max(v)))
    }

    /// Whether node `id` is already registered.
    pub fn contains_node(&self, id: usize) -> bool {
        self.weights.contains_key(&id)
    }

    /// Number of registered nodes.
    pub fn n_nodes(&self) -> usize {
        self.weights.len()
    }

    /// Pad reported node totals with `n` nodes that are never materialized.
    pub fn set_dummy_nodes(&mut self, n: usize) {
        self.dummy_nodes = n;
    }

    /// Commit the batch.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingNode`] if registered ids do not form `0..n`.
    /// - [`Error::UnknownNode`] if an edge names an unregistered node.
    pub fn flush(self) -> Result<Graph> {
        let n = self.weights.len();
        let mut inner = UnGraph::<i64, f64>::with_capacity(n, self.edges.len());

        for (expected, (&id, &weight)) in self.weights.iter().enumerate() {
            if id != expected {
                return Err(Error::MissingNode { id: expected });
            }
            let _ = inner.add_node(weight);
        }

        for (&(u, v), &w) in &self.edges {
            // Keys are ordered, so `v` is the larger endpoint.
            if v >= n {
                return Err(Error::UnknownNode { id: v });
            }
            let _ = inner.add_edge(NodeIndex::new(u), NodeIndex::new(v), w);
        }

        debug!(
            "flushed graph: {} nodes (+{} dummy), {} edges",
            n,
            self.dummy_nodes,
            inner.edge_count()
        );

        Ok(Graph {
            inner,
            dummy_nodes: self.dummy_nodes,
            partition: vec![None; n],
        })
    }
}

/// Committed, queryable weighted graph.
#[derive(Debug, Clone)]
pub struct Graph {
    inner: UnGraph<i64, f64>,
    dummy_nodes: usize,
    partition: Vec<Option<usize>>,
}

impl Graph {
    /// Number of real nodes.
    pub fn n_nodes(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of distinct edges.
    pub fn n_edges(&self) -> usize {
        self.inner.edge_count()
    }

    /// Number of dummy nodes added to reported totals.
    pub fn n_dummy_nodes(&self) -> usize {
        self.dummy_nodes
    }

    /// Neighbors of `id`, ascending.
    ///
    /// # Panics
    ///
    /// If `id` is not a node of the graph.
    pub fn neighbors(&self, id: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .inner
            .neighbors(self.index(id))
            .map(|n| n.index())
            .collect();
        out.sort_unstable();
        out
    }

    /// Neighbors of `id` with the connecting edge weight, ascending by neighbor.
    pub fn neighbor_weights(&self, id: usize) -> Vec<(usize, f64)> {
        let idx = self.index(id);
        let mut out: Vec<(usize, f64)> = self
            .inner
            .edges(idx)
            .map(|e| {
                let other = if e.source() == idx { e.target() } else { e.source() };
                (other.index(), *e.weight())
            })
            .collect();
        out.sort_unstable_by_key(|&(n, _)| n);
        out
    }

    /// Degree of `id`.
    pub fn n_neighbors(&self, id: usize) -> usize {
        self.inner.neighbors(self.index(id)).count()
    }

    /// Weight of node `id`.
    pub fn weight(&self, id: usize) -> i64 {
        self.inner[self.index(id)]
    }

    /// Whether `{u, v}` is an edge.
    pub fn edge_exists(&self, u: usize, v: usize) -> bool {
        self.edge_weight(u, v).is_some()
    }

    /// Weight of the edge `{u, v}`, if present.
    pub fn edge_weight(&self, u: usize, v: usize) -> Option<f64> {
        if u >= self.n_nodes() || v >= self.n_nodes() {
            return None;
        }
        self.inner
            .find_edge(NodeIndex::new(u), NodeIndex::new(v))
            .map(|e| self.inner[e])
    }

    /// All edges as `(u, v, weight)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.inner.edge_references().map(|e| {
            let (a, b) = (e.source().index(), e.target().index());
            (a.min(b), a.max(b), *e.weight())
        })
    }

    /// Underlying petgraph representation (node index == node id).
    pub fn as_petgraph(&self) -> &UnGraph<i64, f64> {
        &self.inner
    }

    /// Assign `node` to `block`.
    pub fn set_partition(&mut self, node: usize, block: usize) {
        let _ = self.index(node);
        if self.partition.len() < self.n_nodes() {
            self.partition.resize(self.n_nodes(), None);
        }
        self.partition[node] = Some(block);
    }

    /// Current block labels, `None` for unassigned nodes.
    pub fn partition(&self) -> &[Option<usize>] {
        &self.partition
    }

    /// Replace the whole partition.
    pub fn set_partition_labels(&mut self, labels: Vec<Option<usize>>) -> Result<()> {
        if labels.len() != self.n_nodes() {
            return Err(Error::DimensionMismatch {
                expected: self.n_nodes(),
                found: labels.len(),
            });
        }
        self.partition = labels;
        Ok(())
    }

    /// Load the partition from a file with one label per line.
    ///
    /// The current partition is left untouched on error.
    pub fn read_partition(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.partition = io::read_partition_file(path.as_ref(), self.n_nodes())?;
        Ok(())
    }

    /// Write the simple-graph adjacency format.
    pub fn write_to_file<W: Write>(&self, mut out: W, write_weights: bool) -> Result<()> {
        writeln!(
            out,
            "{} {} {}",
            self.n_nodes() + self.dummy_nodes,
            self.n_edges(),
            u8::from(write_weights)
        )?;
        for id in 0..self.n_nodes() {
            let mut tokens: Vec<String> = Vec::with_capacity(self.n_neighbors(id) + 1);
            if write_weights {
                tokens.push(self.weight(id).to_string());
            }
            tokens.extend(self.neighbors(id).into_iter().map(|n| (n + 1).to_string()));
            writeln!(out, "{}", tokens.join(" "))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Create `path` and write the adjacency format into it.
    pub fn write_to_path(&self, path: impl AsRef<Path>, write_weights: bool) -> Result<()> {
        let file = File::create(path)?;
        self.write_to_file(BufWriter::new(file), write_weights)
    }

    /// Parse the simple-graph adjacency format.
    ///
    /// Node lines beyond the header count are rejected; missing node lines
    /// are interpreted as dummy nodes.
    pub fn read_from<R: BufRead>(reader: R) -> Result<Graph> {
        let mut lines = reader.lines();
        let header = lines.next().ok_or(Error::EmptyInput)??;
        let [total, n_edges, has_weights] = io::parse_header::<3>(&header)?;

        let mut draft = GraphBuilder::new();
        let mut id = 0;
        for line in lines {
            let line = line?;
            let line_no = id + 2;
            if id >= total {
                if line.trim().is_empty() {
                    continue;
                }
                return Err(Error::DimensionMismatch {
                    expected: total,
                    found: id + 1,
                });
            }
            let mut tokens = line.split_whitespace();
            let weight = if has_weights == 1 {
                match tokens.next() {
                    Some(t) => io::parse_token(t, line_no)?,
                    None => {
                        return Err(Error::Parse {
                            line: line_no,
                            token: line.clone(),
                        })
                    }
                }
            } else {
                1
            };
            draft.add_node(id, weight)?;
            for token in tokens {
                let neighbor: usize = io::parse_token(token, line_no)?;
                if neighbor == 0 || neighbor > total {
                    return Err(Error::Parse {
                        line: line_no,
                        token: token.to_string(),
                    });
                }
                draft.add_edge(id, neighbor - 1)?;
            }
            id += 1;
        }
        draft.set_dummy_nodes(total - id);

        let graph = draft.flush()?;
        if graph.n_edges() != n_edges {
            return Err(Error::DimensionMismatch {
                expected: n_edges,
                found: graph.n_edges(),
            });
        }
        Ok(graph)
    }

    fn index(&self, id: usize) -> NodeIndex {
        assert!(
            id < self.n_nodes(),
            "node {id} out of range (graph has {} nodes)",
            self.n_nodes()
        );
        NodeIndex::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn path_graph(n: usize) -> Graph {
        let mut draft = GraphBuilder::new();
        for i in 0..n {
            draft.add_node(i, i as i64 + 1).unwrap();
        }
        for i in 1..n {
            draft.add_edge(i - 1, i).unwrap();
        }
        draft.flush().unwrap()
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut draft = GraphBuilder::new();
        draft.add_node(0, 1).unwrap();
        assert_eq!(draft.add_node(0, 2), Err(Error::DuplicateNode { id: 0 }));
    }

    #[test]
    fn test_rejected_duplicate_keeps_first_weight() {
        let mut draft = GraphBuilder::new();
        draft.add_node(0, 5).unwrap();
        assert!(draft.add_node(0, 99).is_err());
        let g = draft.flush().unwrap();
        assert_eq!(g.weight(0), 5);
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut draft = GraphBuilder::new();
        assert_eq!(draft.add_edge(3, 3), Err(Error::SelfLoop { id: 3 }));
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut draft = GraphBuilder::new();
        draft.add_node(0, 1).unwrap();
        draft.add_node(1, 1).unwrap();
        draft.add_weighted_edge(0, 1, 0.5).unwrap();
        draft.add_weighted_edge(1, 0, 0.9).unwrap();
        assert!(draft.contains_edge(1, 0));

        let g = draft.flush().unwrap();
        assert_eq!(g.n_edges(), 1);
        assert_eq!(g.edge_weight(0, 1), Some(0.5));
        assert_eq!(g.n_neighbors(0), 1);
    }

    #[test]
    fn test_edge_before_node_is_fine() {
        let mut draft = GraphBuilder::new();
        draft.add_edge(0, 1).unwrap();
        draft.add_node(1, 1).unwrap();
        draft.add_node(0, 1).unwrap();
        let g = draft.flush().unwrap();
        assert!(g.edge_exists(1, 0));
    }

    #[test]
    fn test_flush_unknown_endpoint() {
        let mut draft = GraphBuilder::new();
        draft.add_node(0, 1).unwrap();
        draft.add_edge(0, 4).unwrap();
        assert_eq!(draft.flush().unwrap_err(), Error::UnknownNode { id: 4 });
    }

    #[test]
    fn test_flush_sparse_ids() {
        let mut draft = GraphBuilder::new();
        draft.add_node(0, 1).unwrap();
        draft.add_node(2, 1).unwrap();
        assert_eq!(draft.flush().unwrap_err(), Error::MissingNode { id: 1 });
    }

    #[test]
    fn test_partition_set_and_get() {
        let mut g = path_graph(3);
        assert_eq!(g.partition(), &[None, None, None]);
        g.set_partition(1, 4);
        assert_eq!(g.partition(), &[None, Some(4), None]);
        assert!(g.set_partition_labels(vec![Some(0)]).is_err());
    }

    #[test]
    fn test_read_partition_file() {
        let mut g = path_graph(3);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.txt");
        std::fs::write(&path, "1\n-1\n0\n").unwrap();
        g.read_partition(&path).unwrap();
        assert_eq!(g.partition(), &[Some(1), None, Some(0)]);
    }

    #[test]
    fn test_read_partition_missing_or_short() {
        let mut g = path_graph(3);
        let dir = tempfile::tempdir().unwrap();

        let err = g.read_partition(dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::NotFound,
                ..
            }
        ));

        let path = dir.path().join("short.txt");
        std::fs::write(&path, "1\n").unwrap();
        assert!(matches!(
            g.read_partition(&path),
            Err(Error::TruncatedPartition { .. })
        ));
        // Untouched after failure.
        assert_eq!(g.partition(), &[None, None, None]);
    }

    #[test]
    fn test_write_format() {
        let mut draft = GraphBuilder::new();
        for i in 0..3 {
            draft.add_node(i, 7).unwrap();
        }
        draft.add_edge(0, 2).unwrap();
        draft.set_dummy_nodes(2);
        let g = draft.flush().unwrap();

        let mut buf = Vec::new();
        g.write_to_file(&mut buf, true).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "5 1 1\n7 3\n7\n7 1\n");

        let mut buf = Vec::new();
        g.write_to_file(&mut buf, false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "5 1 0\n3\n\n1\n");
    }

    #[test]
    fn test_write_then_read() {
        let g = path_graph(4);
        let mut buf = Vec::new();
        g.write_to_file(&mut buf, true).unwrap();

        let back = Graph::read_from(Cursor::new(buf)).unwrap();
        assert_eq!(back.n_nodes(), 4);
        assert_eq!(back.n_edges(), 3);
        for i in 0..4 {
            assert_eq!(back.neighbors(i), g.neighbors(i));
            assert_eq!(back.weight(i), g.weight(i));
        }
    }

    #[test]
    fn test_write_to_unwritable_path() {
        let g = path_graph(2);
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("missing-dir").join("g.txt");
        assert!(matches!(g.write_to_path(bad, false), Err(Error::Io { .. })));
    }

    proptest! {
        #[test]
        fn neighbors_are_symmetric_and_irreflexive(
            n in 1usize..25,
            pairs in proptest::collection::vec((0usize..25, 0usize..25), 0..80),
        ) {
            let mut draft = GraphBuilder::new();
            for i in 0..n {
                draft.add_node(i, 1).unwrap();
            }
            for (u, v) in pairs {
                let (u, v) = (u % n, v % n);
                if u != v {
                    draft.add_edge(u, v).unwrap();
                }
            }
            let g = draft.flush().unwrap();
            for i in 0..n {
                let ns = g.neighbors(i);
                prop_assert!(!ns.contains(&i));
                for j in ns {
                    prop_assert!(g.neighbors(j).contains(&i));
                }
            }
        }
    }
}
