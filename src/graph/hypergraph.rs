//! Hypergraphs encoded as bipartite simple graphs.
//!
//! Every hyperedge becomes an extra node of an underlying [`Graph`],
//! connected to each of its members. Logical node and hyperedge indices
//! are translated to physical graph ids through a slot arena: physical id
//! `p` is owned by exactly one [`Slot`], either `Node(i)` or `Hyperedge(h)`.
//!
//! ```text
//!  logical:   n0   n1   n2        h0 = {n0, n1}   h1 = {n1, n2}
//!
//!  physical:  0:n0  1:n1  2:h0  3:n2  4:h1
//!             0 - 2 - 1 - 4 - 3
//! ```
//!
//! Members may be named before they are declared: [`HypergraphBuilder::compute_node_id`]
//! reserves the next physical slot for an unseen logical node, and a later
//! [`HypergraphBuilder::add_node`] fills in its weight.
//!
//! # Text format
//!
//! ```text
//! <nNodes+dummyNodes> <nHyperedges>
//! [<hyperedgeWeight> ]<node1> <node2> ... <nodeK>
//! ```
//!
//! One line per hyperedge, member indices 1-based.

use super::{io, Graph, GraphBuilder};
use crate::error::{Error, Result};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

/// Owner of a physical graph id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// A logical node (matrix row, column or nonzero).
    Node(usize),
    /// A logical hyperedge.
    Hyperedge(usize),
}

/// Mutable draft of a [`Hypergraph`].
#[derive(Debug, Clone, Default)]
pub struct HypergraphBuilder {
    graph: GraphBuilder,
    /// Logical node -> physical id (reserved or declared).
    nodes: Vec<Option<usize>>,
    /// Logical hyperedge -> physical id.
    hedges: Vec<usize>,
    /// Physical id -> owner.
    slots: Vec<Slot>,
}

impl HypergraphBuilder {
    /// Create an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare logical node `node` with an integer weight.
    ///
    /// Reuses the physical slot if a hyperedge already reserved one.
    pub fn add_node(&mut self, node: usize, weight: i64) -> Result<()> {
        let physical = match self.nodes.get(node).copied().flatten() {
            Some(p) if self.graph.contains_node(p) => {
                return Err(Error::DuplicateNode { id: node });
            }
            Some(p) => p,
            None => self.reserve(node),
        };
        self.graph.add_node(physical, weight)
    }

    /// Add a hyperedge over logical `members` and return its logical index.
    pub fn add_hyperedge(&mut self, members: &[usize], weight: i64) -> Result<usize> {
        let hedge = self.hedges.len();
        let physical = self.allocate(Slot::Hyperedge(hedge));
        self.hedges.push(physical);
        self.graph.add_node(physical, weight)?;

        for &member in members {
            let target = self.compute_node_id(member);
            self.graph.add_edge(physical, target)?;
        }
        Ok(hedge)
    }

    /// Add one more member to an existing hyperedge.
    pub fn add_node_to_hyperedge(&mut self, node: usize, hedge: usize) -> Result<()> {
        let physical = *self
            .hedges
            .get(hedge)
            .ok_or(Error::UnknownNode { id: hedge })?;
        let target = self.compute_node_id(node);
        self.graph.add_edge(physical, target)
    }

    /// Physical id of logical `node`, reserving the next slot if unseen.
    pub fn compute_node_id(&mut self, node: usize) -> usize {
        match self.nodes.get(node).copied().flatten() {
            Some(p) => p,
            None => self.reserve(node),
        }
    }

    /// Number of logical nodes declared or reserved so far.
    pub fn n_nodes(&self) -> usize {
        self.nodes.iter().filter(|p| p.is_some()).count()
    }

    /// Number of hyperedges so far.
    pub fn n_hyperedges(&self) -> usize {
        self.hedges.len()
    }

    /// Pad the reported node total with `n` dummy nodes.
    pub fn set_dummy_nodes(&mut self, n: usize) {
        self.graph.set_dummy_nodes(n);
    }

    /// Commit the batch.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownNode`] if a member was referenced but never declared.
    /// - [`Error::MissingNode`] if logical node indices are not dense.
    pub fn flush(self) -> Result<Hypergraph> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (logical, physical) in self.nodes.iter().enumerate() {
            match physical {
                Some(p) if self.graph.contains_node(*p) => nodes.push(*p),
                Some(_) => return Err(Error::UnknownNode { id: logical }),
                None => return Err(Error::MissingNode { id: logical }),
            }
        }

        let graph = self.graph.flush()?;
        debug!(
            "flushed hypergraph: {} nodes, {} hyperedges, {} incidences",
            nodes.len(),
            self.hedges.len(),
            graph.n_edges()
        );

        let n = nodes.len();
        Ok(Hypergraph {
            graph,
            nodes,
            hedges: self.hedges,
            slots: self.slots,
            partition: vec![None; n],
        })
    }

    fn reserve(&mut self, node: usize) -> usize {
        let physical = self.allocate(Slot::Node(node));
        if self.nodes.len() <= node {
            self.nodes.resize(node + 1, None);
        }
        self.nodes[node] = Some(physical);
        physical
    }

    fn allocate(&mut self, slot: Slot) -> usize {
        self.slots.push(slot);
        self.slots.len() - 1
    }
}

/// Committed hypergraph.
#[derive(Debug, Clone)]
pub struct Hypergraph {
    graph: Graph,
    nodes: Vec<usize>,
    hedges: Vec<usize>,
    slots: Vec<Slot>,
    partition: Vec<Option<usize>>,
}

impl Hypergraph {
    /// Number of logical nodes.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of hyperedges.
    pub fn n_hyperedges(&self) -> usize {
        self.hedges.len()
    }

    /// Number of dummy nodes added to reported totals.
    pub fn n_dummy_nodes(&self) -> usize {
        self.graph.n_dummy_nodes()
    }

    /// Owner of physical id `physical`.
    pub fn slot(&self, physical: usize) -> Slot {
        self.slots[physical]
    }

    /// Underlying bipartite simple graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Weight of logical node `node`.
    pub fn weight(&self, node: usize) -> i64 {
        self.graph.weight(self.nodes[node])
    }

    /// Weight of hyperedge `hedge`.
    pub fn hyperedge_weight(&self, hedge: usize) -> i64 {
        self.graph.weight(self.hedges[hedge])
    }

    /// Nodes sharing at least one hyperedge with `node`, ascending, never `node` itself.
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        let mut out = Vec::new();
        for hedge in self.graph.neighbors(self.nodes[node]) {
            for physical in self.graph.neighbors(hedge) {
                if let Slot::Node(other) = self.slots[physical] {
                    if other != node {
                        out.push(other);
                    }
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Number of distinct neighbors of `node`.
    pub fn n_neighbors(&self, node: usize) -> usize {
        self.neighbors(node).len()
    }

    /// Members of hyperedge `hedge`, ascending.
    pub fn hyperedge_nodes(&self, hedge: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .graph
            .neighbors(self.hedges[hedge])
            .into_iter()
            .filter_map(|p| match self.slots[p] {
                Slot::Node(n) => Some(n),
                Slot::Hyperedge(_) => None,
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Hyperedges containing `node`, ascending.
    pub fn incident_hyperedges(&self, node: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .graph
            .neighbors(self.nodes[node])
            .into_iter()
            .filter_map(|p| match self.slots[p] {
                Slot::Hyperedge(h) => Some(h),
                Slot::Node(_) => None,
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Assign logical node `node` to `block`.
    pub fn set_partition(&mut self, node: usize, block: usize) {
        assert!(node < self.n_nodes(), "node {node} out of range");
        self.partition[node] = Some(block);
    }

    /// Current block labels over logical nodes.
    pub fn partition(&self) -> &[Option<usize>] {
        &self.partition
    }

    /// Load labels for all logical nodes from a partition file.
    pub fn read_partition(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.partition = io::read_partition_file(path.as_ref(), self.n_nodes())?;
        Ok(())
    }

    /// Write the hyperedge adjacency format.
    pub fn write_to_file<W: Write>(&self, mut out: W, write_weights: bool) -> Result<()> {
        writeln!(
            out,
            "{} {}",
            self.n_nodes() + self.n_dummy_nodes(),
            self.n_hyperedges()
        )?;
        for hedge in 0..self.n_hyperedges() {
            let members = self.hyperedge_nodes(hedge);
            let mut tokens: Vec<String> = Vec::with_capacity(members.len() + 1);
            if write_weights {
                tokens.push(self.hyperedge_weight(hedge).to_string());
            }
            tokens.extend(members.into_iter().map(|n| (n + 1).to_string()));
            writeln!(out, "{}", tokens.join(" "))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Create `path` and write the hyperedge format into it.
    pub fn write_to_path(&self, path: impl AsRef<Path>, write_weights: bool) -> Result<()> {
        let file = File::create(path)?;
        self.write_to_file(BufWriter::new(file), write_weights)
    }

    /// Parse the hyperedge format.
    ///
    /// The header node count becomes the number of logical nodes (weight 1).
    pub fn read_from<R: BufRead>(reader: R, with_weights: bool) -> Result<Hypergraph> {
        let mut lines = reader.lines();
        let header = lines.next().ok_or(Error::EmptyInput)??;
        let [n_nodes, n_hedges] = io::parse_header::<2>(&header)?;

        let mut draft = HypergraphBuilder::new();
        for node in 0..n_nodes {
            draft.add_node(node, 1)?;
        }

        for (offset, line) in lines.take(n_hedges).enumerate() {
            let line = line?;
            let line_no = offset + 2;
            let mut tokens = line.split_whitespace();
            let weight = if with_weights {
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
            let mut members = Vec::new();
            for token in tokens {
                let member: usize = io::parse_token(token, line_no)?;
                if member == 0 || member > n_nodes {
                    return Err(Error::Parse {
                        line: line_no,
                        token: token.to_string(),
                    });
                }
                members.push(member - 1);
            }
            let _ = draft.add_hyperedge(&members, weight)?;
        }

        if draft.n_hyperedges() != n_hedges {
            return Err(Error::DimensionMismatch {
                expected: n_hedges,
                found: draft.n_hyperedges(),
            });
        }
        draft.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use std::io::Cursor;

    fn sample() -> Hypergraph {
        let mut draft = HypergraphBuilder::new();
        for i in 0..4 {
            draft.add_node(i, 10 + i as i64).unwrap();
        }
        draft.add_hyperedge(&[0, 1], 3).unwrap();
        draft.add_hyperedge(&[1, 2, 3], 5).unwrap();
        draft.flush().unwrap()
    }

    #[test]
    fn test_neighbors_two_hop() {
        let h = sample();
        assert_eq!(h.neighbors(0), vec![1]);
        assert_eq!(h.neighbors(1), vec![0, 2, 3]);
        assert_eq!(h.neighbors(3), vec![1, 2]);
        assert_eq!(h.n_neighbors(1), 3);
    }

    #[test]
    fn test_hyperedge_nodes_and_weights() {
        let h = sample();
        assert_eq!(h.hyperedge_nodes(1), vec![1, 2, 3]);
        assert_eq!(h.hyperedge_weight(0), 3);
        assert_eq!(h.weight(2), 12);
        assert_eq!(h.incident_hyperedges(1), vec![0, 1]);
    }

    #[test]
    fn test_hyperedge_before_members() {
        let mut draft = HypergraphBuilder::new();
        draft.add_hyperedge(&[2, 0], 1).unwrap();
        draft.add_node(0, 4).unwrap();
        draft.add_node(1, 5).unwrap();
        draft.add_node(2, 6).unwrap();
        let h = draft.flush().unwrap();

        assert_eq!(h.n_nodes(), 3);
        assert_eq!(h.hyperedge_nodes(0), vec![0, 2]);
        assert_eq!(h.weight(2), 6);
        assert!(h.neighbors(1).is_empty());
    }

    #[test]
    fn test_slots_have_single_owner() {
        let h = sample();
        let total = h.n_nodes() + h.n_hyperedges();
        let mut nodes = BTreeSet::new();
        let mut hedges = BTreeSet::new();
        for p in 0..total {
            match h.slot(p) {
                Slot::Node(n) => assert!(nodes.insert(n)),
                Slot::Hyperedge(e) => assert!(hedges.insert(e)),
            }
        }
        assert_eq!(nodes.len(), 4);
        assert_eq!(hedges.len(), 2);
    }

    #[test]
    fn test_add_node_to_hyperedge() {
        let mut draft = HypergraphBuilder::new();
        for i in 0..3 {
            draft.add_node(i, 1).unwrap();
        }
        let e = draft.add_hyperedge(&[], 1).unwrap();
        draft.add_node_to_hyperedge(2, e).unwrap();
        draft.add_node_to_hyperedge(0, e).unwrap();
        assert!(draft.add_node_to_hyperedge(0, 9).is_err());

        let h = draft.flush().unwrap();
        assert_eq!(h.hyperedge_nodes(e), vec![0, 2]);
    }

    #[test]
    fn test_referenced_but_undeclared_member() {
        let mut draft = HypergraphBuilder::new();
        draft.add_node(0, 1).unwrap();
        draft.add_hyperedge(&[0, 1], 1).unwrap();
        assert_eq!(draft.flush().unwrap_err(), Error::UnknownNode { id: 1 });
    }

    #[test]
    fn test_duplicate_declaration() {
        let mut draft = HypergraphBuilder::new();
        draft.add_hyperedge(&[0], 1).unwrap();
        draft.add_node(0, 1).unwrap();
        assert_eq!(draft.add_node(0, 1), Err(Error::DuplicateNode { id: 0 }));
    }

    #[test]
    fn test_write_format() {
        let h = sample();
        let mut buf = Vec::new();
        h.write_to_file(&mut buf, true).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "4 2\n3 1 2\n5 2 3 4\n");
    }

    #[test]
    fn test_write_with_dummy_nodes() {
        let mut draft = HypergraphBuilder::new();
        draft.add_node(0, 1).unwrap();
        draft.add_node(1, 1).unwrap();
        draft.add_hyperedge(&[0, 1], 1).unwrap();
        draft.set_dummy_nodes(3);
        let h = draft.flush().unwrap();

        let mut buf = Vec::new();
        h.write_to_file(&mut buf, false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "5 1\n1 2\n");
    }

    #[test]
    fn test_read_partition() {
        let mut h = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p");
        std::fs::write(&path, "0\n0\n1\n1\n").unwrap();
        h.read_partition(&path).unwrap();
        assert_eq!(h.partition(), &[Some(0), Some(0), Some(1), Some(1)]);
    }

    fn membership(h: &Hypergraph) -> BTreeSet<Vec<usize>> {
        (0..h.n_hyperedges()).map(|e| h.hyperedge_nodes(e)).collect()
    }

    proptest! {
        #[test]
        fn write_read_preserves_incidence(
            n in 1usize..20,
            edges in proptest::collection::vec(
                proptest::collection::btree_set(0usize..20, 1..6), 0..15),
            weights in any::<bool>(),
        ) {
            let mut draft = HypergraphBuilder::new();
            for i in 0..n {
                draft.add_node(i, 1).unwrap();
            }
            for (k, members) in edges.iter().enumerate() {
                let members: Vec<usize> = members.iter().map(|m| m % n).collect();
                draft.add_hyperedge(&members, k as i64 + 1).unwrap();
            }
            let h = draft.flush().unwrap();

            let mut buf = Vec::new();
            h.write_to_file(&mut buf, weights).unwrap();
            let text = String::from_utf8(buf.clone()).unwrap();
            if !weights {
                for line in text.lines().skip(1) {
                    for token in line.split_whitespace() {
                        let idx: usize = token.parse().unwrap();
                        prop_assert!(idx >= 1 && idx <= n);
                    }
                }
            }

            let back = Hypergraph::read_from(Cursor::new(buf), weights).unwrap();
            prop_assert_eq!(back.n_nodes(), n);
            prop_assert_eq!(membership(&back), membership(&h));
            if weights {
                for e in 0..h.n_hyperedges() {
                    prop_assert_eq!(back.hyperedge_weight(e), h.hyperedge_weight(e));
                }
            }
        }

        #[test]
        fn neighbors_never_contain_self(
            n in 1usize..15,
            edges in proptest::collection::vec(
                proptest::collection::btree_set(0usize..15, 1..5), 0..10),
        ) {
            let mut draft = HypergraphBuilder::new();
            for i in 0..n {
                draft.add_node(i, 1).unwrap();
            }
            for members in &edges {
                let members: Vec<usize> = members.iter().map(|m| m % n).collect();
                draft.add_hyperedge(&members, 1).unwrap();
            }
            let h = draft.flush().unwrap();
            for i in 0..n {
                prop_assert!(!h.neighbors(i).contains(&i));
            }
        }
    }
}
