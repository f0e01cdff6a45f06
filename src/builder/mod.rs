//! Matrix-to-graph transformations.
//!
//! A constraint/variable incidence matrix can be read as a graph in several
//! ways. Each [`GraphKind`] is one adjacency convention:
//!
//! | Kind | Nodes | Adjacency |
//! |------|-------|-----------|
//! | [`Row`](GraphKind::Row) | constraints | share a relevant variable |
//! | [`Column`](GraphKind::Column) | variables | appear in a common constraint |
//! | [`Bipartite`](GraphKind::Bipartite) | constraints, then variables | one edge per relevant nonzero |
//! | [`Hypercol`](GraphKind::Hypercol) | constraints | one hyperedge per variable |
//! | [`Hyperrowcol`](GraphKind::Hyperrowcol) | nonzeros | one hyperedge per constraint and per variable |
//!
//! Variables rejected by [`MatrixAccess::is_relevant`](crate::matrix::MatrixAccess::is_relevant)
//! never create adjacency.
//!
//! ```rust
//! use blockgraph::builder::{GraphKind, MatrixGraph};
//! use blockgraph::matrix::{IncidenceMatrix, MatrixContext};
//!
//! let m = IncidenceMatrix::new(3, vec![vec![0, 1], vec![1], vec![2]]).unwrap();
//! let ctx = MatrixContext::unweighted(&m);
//!
//! let rows = MatrixGraph::build(GraphKind::Row, &ctx).unwrap();
//! assert_eq!(rows.neighbors(0), vec![1]);
//! assert!(rows.neighbors(2).is_empty());
//! ```

mod bipartite;
mod column;
mod hypercol;
mod hyperrowcol;
mod row;

use crate::error::{Error, Result};
use crate::graph::{Graph, Hypergraph};
use crate::matrix::{MatrixContext, MatrixDomain};
use log::debug;
use std::io::Write;
use std::path::Path;

/// Adjacency convention used to turn a matrix into a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GraphKind {
    /// Constraints adjacent when they share a variable.
    Row,
    /// Variables adjacent when they share a constraint.
    Column,
    /// Constraint and variable nodes, edges for nonzeros.
    Bipartite,
    /// Constraint nodes, variable hyperedges.
    Hypercol,
    /// Nonzero nodes, constraint and variable hyperedges.
    Hyperrowcol,
}

impl GraphKind {
    /// Every kind, in declaration order.
    pub const ALL: [GraphKind; 5] = [
        GraphKind::Row,
        GraphKind::Column,
        GraphKind::Bipartite,
        GraphKind::Hypercol,
        GraphKind::Hyperrowcol,
    ];

    /// Whether this kind produces a [`Hypergraph`].
    pub fn is_hypergraph(self) -> bool {
        matches!(self, GraphKind::Hypercol | GraphKind::Hyperrowcol)
    }
}

/// What a graph node stands for, in matrix indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOrigin {
    /// A constraint (row).
    Constraint(usize),
    /// A variable (column).
    Variable(usize),
    /// A nonzero entry.
    Nonzero {
        /// Row of the entry.
        constraint: usize,
        /// Column of the entry.
        variable: usize,
    },
}

/// What a hyperedge stands for, in matrix indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HyperedgeOrigin {
    /// All entries of a constraint.
    Constraint(usize),
    /// All entries of a variable.
    Variable(usize),
}

#[derive(Debug, Clone)]
enum Storage {
    Simple(Graph),
    Hyper(Hypergraph),
}

/// Output of one builder run.
struct Parts {
    storage: Storage,
    nodes: Vec<NodeOrigin>,
    hyperedges: Vec<HyperedgeOrigin>,
}

/// A graph built from a matrix under one [`GraphKind`].
#[derive(Debug, Clone)]
pub struct MatrixGraph {
    kind: GraphKind,
    storage: Storage,
    nodes: Vec<NodeOrigin>,
    hyperedges: Vec<HyperedgeOrigin>,
}

impl MatrixGraph {
    /// Build over the whole matrix.
    pub fn build(kind: GraphKind, ctx: &MatrixContext<'_>) -> Result<Self> {
        let domain = MatrixDomain::full(ctx.matrix());
        Self::build_partial(kind, ctx, &domain)
    }

    /// Build over the open rows and columns of `domain`.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyInput`] if the domain has no constraints or no
    /// variables; accessor failures are passed through.
    pub fn build_partial(
        kind: GraphKind,
        ctx: &MatrixContext<'_>,
        domain: &MatrixDomain,
    ) -> Result<Self> {
        if domain.n_constraints() == 0 || domain.n_variables() == 0 {
            return Err(Error::EmptyInput);
        }
        let rows = ctx.restricted_rows(domain)?;

        let parts = match kind {
            GraphKind::Row => row::build(ctx, domain, &rows)?,
            GraphKind::Column => column::build(ctx, domain, &rows)?,
            GraphKind::Bipartite => bipartite::build(ctx, domain, &rows)?,
            GraphKind::Hypercol => hypercol::build(ctx, domain, &rows)?,
            GraphKind::Hyperrowcol => hyperrowcol::build(ctx, domain, &rows)?,
        };

        let graph = Self {
            kind,
            storage: parts.storage,
            nodes: parts.nodes,
            hyperedges: parts.hyperedges,
        };
        debug!(
            "built {:?} graph from {}x{} domain: {} nodes, {} edges",
            kind,
            domain.n_constraints(),
            domain.n_variables(),
            graph.n_nodes(),
            graph.n_edges()
        );
        Ok(graph)
    }

    /// The adjacency convention used.
    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    /// Number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges, or of hyperedges for hypergraph kinds.
    pub fn n_edges(&self) -> usize {
        match &self.storage {
            Storage::Simple(g) => g.n_edges(),
            Storage::Hyper(h) => h.n_hyperedges(),
        }
    }

    /// Adjacent nodes of `node`, ascending, never `node` itself.
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        match &self.storage {
            Storage::Simple(g) => g.neighbors(node),
            Storage::Hyper(h) => h.neighbors(node),
        }
    }

    /// Weight of `node`.
    pub fn weight(&self, node: usize) -> i64 {
        match &self.storage {
            Storage::Simple(g) => g.weight(node),
            Storage::Hyper(h) => h.weight(node),
        }
    }

    /// What `node` stands for.
    pub fn node_origin(&self, node: usize) -> NodeOrigin {
        self.nodes[node]
    }

    /// What hyperedge `hedge` stands for (`None` for simple graphs or out of range).
    pub fn hyperedge_origin(&self, hedge: usize) -> Option<HyperedgeOrigin> {
        self.hyperedges.get(hedge).copied()
    }

    /// Members of hyperedge `hedge` (`None` for simple graphs or out of range).
    pub fn hyperedge_nodes(&self, hedge: usize) -> Option<Vec<usize>> {
        match &self.storage {
            Storage::Hyper(h) if hedge < h.n_hyperedges() => Some(h.hyperedge_nodes(hedge)),
            _ => None,
        }
    }

    /// The committed simple graph, for non-hypergraph kinds.
    pub fn as_graph(&self) -> Option<&Graph> {
        match &self.storage {
            Storage::Simple(g) => Some(g),
            Storage::Hyper(_) => None,
        }
    }

    /// The committed hypergraph, for hypergraph kinds.
    pub fn as_hypergraph(&self) -> Option<&Hypergraph> {
        match &self.storage {
            Storage::Hyper(h) => Some(h),
            Storage::Simple(_) => None,
        }
    }

    /// Current block labels per node.
    pub fn partition(&self) -> &[Option<usize>] {
        match &self.storage {
            Storage::Simple(g) => g.partition(),
            Storage::Hyper(h) => h.partition(),
        }
    }

    /// Assign `node` to `block`.
    pub fn set_partition(&mut self, node: usize, block: usize) {
        match &mut self.storage {
            Storage::Simple(g) => g.set_partition(node, block),
            Storage::Hyper(h) => h.set_partition(node, block),
        }
    }

    /// Load labels for every node from a partition file.
    pub fn read_partition(&mut self, path: impl AsRef<Path>) -> Result<()> {
        match &mut self.storage {
            Storage::Simple(g) => g.read_partition(path),
            Storage::Hyper(h) => h.read_partition(path),
        }
    }

    /// Write the adjacency format matching this kind.
    pub fn write_to_file<W: Write>(&self, out: W, write_weights: bool) -> Result<()> {
        match &self.storage {
            Storage::Simple(g) => g.write_to_file(out, write_weights),
            Storage::Hyper(h) => h.write_to_file(out, write_weights),
        }
    }

    /// Create `path` and write the adjacency format into it.
    pub fn write_to_path(&self, path: impl AsRef<Path>, write_weights: bool) -> Result<()> {
        match &self.storage {
            Storage::Simple(g) => g.write_to_path(path, write_weights),
            Storage::Hyper(h) => h.write_to_path(path, write_weights),
        }
    }
}
