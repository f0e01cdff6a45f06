//! # blockgraph
//!
//! Graph views of sparse constraint matrices, plus row clustering for block
//! detection.
//!
//! A constraint matrix (rows = constraints, columns = variables) can be
//! viewed as five different graphs through [`MatrixGraph`]:
//!
//! | Kind | Nodes | Edges |
//! |------|-------|-------|
//! | Row | constraints | rows sharing a variable |
//! | Column | variables | variables sharing a row |
//! | Bipartite | constraints + variables | every nonzero |
//! | Hypercol | constraints | one hyperedge per column |
//! | Hyperrowcol | nonzeros | one hyperedge per row and per column |
//!
//! [`cluster::RowGraphWeighted`] weights the row graph by set similarity
//! and partitions it with DBSCAN, spanning-forest cuts or Markov clustering.
//! [`PriorityGraph`] is the max-degree structure behind the greedy
//! stable-set repair.

pub mod builder;
pub mod cluster;
/// Error types used across `blockgraph`.
pub mod error;
pub mod graph;
pub mod matrix;


pub use builder::{GraphKind, HyperedgeOrigin, MatrixGraph, NodeOrigin};
pub use cluster::{
    ClusteringConfig, MclConfig, MclOutcome, PostProcess, RowGraphWeighted, SimilarityMeasure,
    WeightType,
};
pub use error::{Error, Result};
pub use graph::{Graph, GraphBuilder, Hypergraph, HypergraphBuilder, PriorityGraph};
pub use matrix::{
    FnWeights, IncidenceMatrix, MatrixAccess, MatrixContext, MatrixDomain, NodeWeights,
    UnitWeights,
};
