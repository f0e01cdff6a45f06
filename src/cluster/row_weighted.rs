//! Weighted row-similarity graph and the three partitioning algorithms.
//!
//! Nodes are constraints; two constraints are joined when they share at
//! least one relevant variable, and the edge carries their
//! [`calculate_similarity`] score. The graph is then partitioned by one of:
//!
//! - **DBSCAN** on the graph pruned at `eps`: a row is a core point when it
//!   has at least `min_pts - 1` passing neighbors; clusters grow from core
//!   points and rows reachable from none stay unassigned.
//! - **MST**: minimum spanning forest over distances (maximum over
//!   similarities), then drop forest edges that do not pass `eps`. Each
//!   remaining component is a block.
//! - **MCL** (van Dongen, 2000): alternate expansion (matrix power) and
//!   inflation (entry-wise power + column normalization) of the
//!   column-stochastic affinity matrix until it stops changing; blocks are
//!   the components of what survives pruning.
//!
//! After each run the labels are optionally repaired by the configured
//! [`PostProcess`] strategy and compacted to `0..n_blocks` in order of
//! first appearance.

use super::compact_labels;
use super::postprocess::PostProcess;
use super::similarity::{calculate_similarity, SimilarityMeasure, WeightType};
use crate::error::{Error, Result};
use crate::graph::{Graph, GraphBuilder};
use crate::matrix::{transpose, MatrixContext, MatrixDomain};
use log::{info, warn};
use ndarray::Array2;
use petgraph::algo::min_spanning_tree;
use petgraph::data::Element;
use petgraph::graph::UnGraph;
use petgraph::unionfind::UnionFind;
use std::collections::BTreeSet;

/// Markov clustering parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MclConfig {
    /// Iteration cap.
    pub max_iter: usize,
    /// Matrix power used in the expansion step.
    pub expansion: u32,
    /// Largest entry change still counted as converged.
    pub tolerance: f64,
    /// Entries below this are zeroed after inflation.
    pub prune_threshold: f64,
}

impl Default for MclConfig {
    fn default() -> Self {
        Self {
            max_iter: 100,
            expansion: 2,
            tolerance: 1e-6,
            prune_threshold: 1e-5,
        }
    }
}

impl MclConfig {
    /// Set the iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the expansion power.
    pub fn with_expansion(mut self, expansion: u32) -> Self {
        self.expansion = expansion;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the pruning threshold.
    pub fn with_prune_threshold(mut self, prune_threshold: f64) -> Self {
        self.prune_threshold = prune_threshold;
        self
    }
}

/// Row graph construction and clustering parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusteringConfig {
    /// Overlap measure for edge weights.
    pub measure: SimilarityMeasure,
    /// Orientation of edge weights.
    pub weight_type: WeightType,
    /// DBSCAN density threshold, counting the row itself.
    pub min_pts: usize,
    /// Repair strategy used when post-processing is requested.
    pub post_process: PostProcess,
    /// Markov clustering parameters.
    pub mcl: MclConfig,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            measure: SimilarityMeasure::Jaccard,
            weight_type: WeightType::Distance,
            min_pts: 4,
            post_process: PostProcess::Majority,
            mcl: MclConfig::default(),
        }
    }
}

impl ClusteringConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the similarity measure.
    pub fn with_measure(mut self, measure: SimilarityMeasure) -> Self {
        self.measure = measure;
        self
    }

    /// Set the weight orientation.
    pub fn with_weight_type(mut self, weight_type: WeightType) -> Self {
        self.weight_type = weight_type;
        self
    }

    /// Set the DBSCAN density threshold.
    pub fn with_min_pts(mut self, min_pts: usize) -> Self {
        self.min_pts = min_pts;
        self
    }

    /// Set the repair strategy.
    pub fn with_post_process(mut self, post_process: PostProcess) -> Self {
        self.post_process = post_process;
        self
    }

    /// Set the Markov clustering parameters.
    pub fn with_mcl(mut self, mcl: MclConfig) -> Self {
        self.mcl = mcl;
        self
    }
}

/// How a Markov clustering run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MclOutcome {
    /// Whether the matrix stabilized before the iteration cap.
    pub converged: bool,
    /// Iterations performed.
    pub iterations: usize,
}

/// Weighted row graph with clustering state.
#[derive(Debug, Clone)]
pub struct RowGraphWeighted {
    graph: Graph,
    config: ClusteringConfig,
    labels: Vec<Option<usize>>,
}

impl RowGraphWeighted {
    /// Build over the whole matrix.
    pub fn create_from_matrix(ctx: &MatrixContext<'_>, config: ClusteringConfig) -> Result<Self> {
        let domain = MatrixDomain::full(ctx.matrix());
        Self::create_from_partial_matrix(ctx, &domain, config)
    }

    /// Build over the open rows and columns of `domain`.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyInput`] for an empty domain; accessor failures are passed through.
    pub fn create_from_partial_matrix(
        ctx: &MatrixContext<'_>,
        domain: &MatrixDomain,
        config: ClusteringConfig,
    ) -> Result<Self> {
        if domain.n_constraints() == 0 || domain.n_variables() == 0 {
            return Err(Error::EmptyInput);
        }
        let rows = ctx.restricted_rows(domain)?;
        let columns = transpose(&rows, domain.n_variables());

        let mut draft = GraphBuilder::new();
        for (i, &cons) in domain.constraints().iter().enumerate() {
            draft.add_node(i, ctx.weights().constraint_weight(cons))?;
        }

        for (i, row) in rows.iter().enumerate() {
            for &var in row {
                for &j in &columns[var] {
                    if j <= i || draft.contains_edge(i, j) {
                        continue;
                    }
                    let a = shared_count(row, &rows[j]);
                    let b = rows[j].len() - a;
                    let c = row.len() - a;
                    let w = calculate_similarity(a, b, c, config.measure, config.weight_type, false);
                    draft.add_weighted_edge(i, j, w)?;
                }
            }
        }

        Self::from_graph(draft.flush()?, config)
    }

    /// Wrap an already weighted graph (weights oriented per `config.weight_type`).
    pub fn from_graph(graph: Graph, config: ClusteringConfig) -> Result<Self> {
        if graph.n_nodes() == 0 {
            return Err(Error::EmptyInput);
        }
        let n = graph.n_nodes();
        Ok(Self {
            graph,
            config,
            labels: vec![None; n],
        })
    }

    /// The similarity graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Active configuration.
    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Similarity-graph neighbors of `row`.
    pub fn neighbors(&self, row: usize) -> Vec<usize> {
        self.graph.neighbors(row)
    }

    /// Labels from the last partitioning call.
    pub fn partition(&self) -> &[Option<usize>] {
        &self.labels
    }

    /// Number of distinct blocks in the last partition.
    pub fn n_blocks(&self) -> usize {
        self.labels.iter().flatten().collect::<BTreeSet<_>>().len()
    }

    /// Number of rows left unassigned by the last partition.
    pub fn non_clustered(&self) -> usize {
        self.labels.iter().filter(|l| l.is_none()).count()
    }

    /// All edge weights, ascending.
    pub fn edge_weights(&self) -> Vec<f64> {
        let mut weights: Vec<f64> = self.graph.edges().map(|(_, _, w)| w).collect();
        weights.sort_by(f64::total_cmp);
        weights
    }

    /// Nearest-rank `q`-quantile of the edge weights, `q ∈ [0, 1]`.
    pub fn edge_weight_percentile(&self, q: f64) -> Result<f64> {
        if !(0.0..=1.0).contains(&q) {
            return Err(Error::InvalidParameter {
                name: "q",
                message: "must lie in [0, 1]",
            });
        }
        let weights = self.edge_weights();
        if weights.is_empty() {
            return Err(Error::EmptyInput);
        }
        let rank = (q * weights.len() as f64).ceil() as usize;
        Ok(weights[rank.clamp(1, weights.len()) - 1])
    }

    /// Density-based clustering on the graph pruned at `eps`.
    pub fn compute_partition_dbscan(&mut self, eps: f64, postprocess: bool) -> Result<&[Option<usize>]> {
        check_eps(eps)?;
        if self.config.min_pts == 0 {
            return Err(Error::InvalidParameter {
                name: "min_pts",
                message: "must be at least 1",
            });
        }
        let n = self.graph.n_nodes();
        let weight_type = self.config.weight_type;
        let regions: Vec<Vec<usize>> = (0..n)
            .map(|i| {
                self.graph
                    .neighbor_weights(i)
                    .into_iter()
                    .filter(|&(_, w)| weight_type.passes(w, eps))
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();
        let is_core = |i: usize| regions[i].len() + 1 >= self.config.min_pts;

        let mut labels = vec![None; n];
        let mut visited = vec![false; n];
        let mut cluster = 0;

        for point in 0..n {
            if visited[point] {
                continue;
            }
            visited[point] = true;
            if !is_core(point) {
                continue;
            }

            labels[point] = Some(cluster);
            let mut to_process = regions[point].clone();
            while let Some(q) = to_process.pop() {
                // Border points keep the first cluster that reaches them.
                if labels[q].is_none() {
                    labels[q] = Some(cluster);
                }
                if visited[q] {
                    continue;
                }
                visited[q] = true;
                if is_core(q) {
                    // Rows the outer loop already rejected as noise may still be border points.
                    to_process.extend(
                        regions[q]
                            .iter()
                            .copied()
                            .filter(|&r| !visited[r] || labels[r].is_none()),
                    );
                }
            }
            cluster += 1;
        }

        self.finish("dbscan", eps, labels, postprocess)?;
        Ok(&self.labels)
    }

    /// Spanning-forest clustering: cut forest edges that do not pass `eps`.
    pub fn compute_partition_mst(&mut self, eps: f64, postprocess: bool) -> Result<&[Option<usize>]> {
        check_eps(eps)?;
        let n = self.graph.n_nodes();
        let weight_type = self.config.weight_type;

        // Maximum spanning forest on similarities == minimum on negated weights.
        let mut oriented = UnGraph::<(), f64>::with_capacity(n, self.graph.n_edges());
        let nodes: Vec<_> = (0..n).map(|_| oriented.add_node(())).collect();
        for (u, v, w) in self.graph.edges() {
            let key = match weight_type {
                WeightType::Distance => w,
                WeightType::Similarity => -w,
            };
            let _ = oriented.add_edge(nodes[u], nodes[v], key);
        }

        let mut components = UnionFind::<usize>::new(n);
        for element in min_spanning_tree(&oriented) {
            if let Element::Edge {
                source,
                target,
                weight,
            } = element
            {
                let w = match weight_type {
                    WeightType::Distance => weight,
                    WeightType::Similarity => -weight,
                };
                if weight_type.passes(w, eps) {
                    let _ = components.union(source, target);
                }
            }
        }

        let labels = (0..n).map(|i| Some(components.find(i))).collect();
        self.finish("mst", eps, labels, postprocess)?;
        Ok(&self.labels)
    }

    /// Markov clustering with inflation exponent `inflate`.
    pub fn compute_partition_mcl(&mut self, inflate: f64, postprocess: bool) -> Result<MclOutcome> {
        if !inflate.is_finite() || inflate <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "inflate",
                message: "must be positive and finite",
            });
        }
        let mcl = &self.config.mcl;
        if mcl.expansion == 0 {
            return Err(Error::InvalidParameter {
                name: "expansion",
                message: "must be at least 1",
            });
        }

        let n = self.graph.n_nodes();
        let mut m = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            m[[i, i]] = 1.0;
        }
        for (u, v, w) in self.graph.edges() {
            let affinity = match self.config.weight_type {
                WeightType::Similarity => w.max(0.0),
                WeightType::Distance => (1.0 - w).max(0.0),
            };
            m[[u, v]] = affinity;
            m[[v, u]] = affinity;
        }
        normalize_columns(&mut m);

        let mut outcome = MclOutcome {
            converged: false,
            iterations: 0,
        };
        while outcome.iterations < mcl.max_iter {
            outcome.iterations += 1;

            let mut next = m.clone();
            for _ in 1..mcl.expansion {
                next = next.dot(&m);
            }
            next.mapv_inplace(|x| {
                let x = x.powf(inflate);
                if x < mcl.prune_threshold {
                    0.0
                } else {
                    x
                }
            });
            normalize_columns(&mut next);

            let delta = (&next - &m).fold(0.0f64, |acc, x| acc.max(x.abs()));
            m = next;
            if delta < mcl.tolerance {
                outcome.converged = true;
                break;
            }
        }
        if !outcome.converged {
            warn!(
                "mcl stopped after {} iterations without converging",
                outcome.iterations
            );
        }

        let mut components = UnionFind::<usize>::new(n);
        for ((i, j), &x) in m.indexed_iter() {
            if i < j && x.max(m[[j, i]]) > mcl.prune_threshold {
                let _ = components.union(i, j);
            }
        }
        let labels = (0..n).map(|i| Some(components.find(i))).collect();
        self.finish("mcl", inflate, labels, postprocess)?;
        Ok(outcome)
    }

    /// Run the configured repair pass on `labels` when `enabled`.
    ///
    /// Returns the number of evicted rows.
    pub fn post_process(&self, labels: &mut [Option<usize>], enabled: bool) -> Result<usize> {
        if !enabled {
            return Ok(0);
        }
        if labels.len() != self.graph.n_nodes() {
            return Err(Error::DimensionMismatch {
                expected: self.graph.n_nodes(),
                found: labels.len(),
            });
        }
        self.config.post_process.apply(&self.graph, labels)
    }

    fn finish(
        &mut self,
        algorithm: &str,
        param: f64,
        mut labels: Vec<Option<usize>>,
        postprocess: bool,
    ) -> Result<()> {
        let _ = compact_labels(&mut labels);
        let _ = self.post_process(&mut labels, postprocess)?;
        self.labels = labels;
        info!(
            "{algorithm}({param}): {} blocks, {} of {} rows unclustered",
            self.n_blocks(),
            self.non_clustered(),
            self.labels.len()
        );
        Ok(())
    }
}

fn check_eps(eps: f64) -> Result<()> {
    if eps.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name: "eps",
            message: "must be finite",
        })
    }
}

/// Size of the intersection of two ascending lists.
fn shared_count(a: &[usize], b: &[usize]) -> usize {
    let (mut i, mut j, mut count) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}

fn normalize_columns(m: &mut Array2<f64>) {
    for mut column in m.columns_mut() {
        let sum = column.sum();
        if sum > 0.0 {
            column.mapv_inplace(|x| x / sum);
        }
    }
}
