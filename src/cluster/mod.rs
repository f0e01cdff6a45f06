//! Row clustering on the weighted similarity graph.
//!
//! Rows of the constraint matrix become nodes; rows sharing a variable are
//! joined by an edge weighted with one of the [`SimilarityMeasure`]s. A
//! partition assigns each row a block label in `0..n_blocks`, or `None`
//! when the row is left unclustered.
//!
//! ## Algorithms
//!
//! | Algorithm | Parameter | Unassigned rows |
//! |-----------|-----------|-----------------|
//! | DBSCAN | `eps`, `min_pts` | noise points |
//! | MST | `eps` | never |
//! | MCL | inflation | never |
//!
//! `eps` is read against the configured [`WeightType`]: an edge passes when
//! its distance is `<= eps`, or its similarity is `>= eps`.
//!
//! Every algorithm can be followed by a [`PostProcess`] pass that evicts rows
//! whose label disagrees with their neighborhood.
//!
//! ## Usage
//!
//! ```rust
//! use blockgraph::cluster::{ClusteringConfig, RowGraphWeighted};
//! use blockgraph::matrix::{IncidenceMatrix, MatrixContext};
//!
//! let m = IncidenceMatrix::new(4, vec![vec![0, 2], vec![1, 2], vec![3], vec![3]]).unwrap();
//! let ctx = MatrixContext::unweighted(&m);
//!
//! let mut rows = RowGraphWeighted::create_from_matrix(&ctx, ClusteringConfig::default()).unwrap();
//! let labels = rows.compute_partition_mst(0.9, true).unwrap();
//! assert_eq!(labels, &[Some(0), Some(0), Some(1), Some(1)]);
//! assert_eq!(rows.n_blocks(), 2);
//! ```

mod postprocess;
mod row_weighted;
mod similarity;

pub use postprocess::{majority, stable_set, PostProcess};
pub use row_weighted::{ClusteringConfig, MclConfig, MclOutcome, RowGraphWeighted};
pub use similarity::{calculate_similarity, SimilarityMeasure, WeightType};

use std::collections::HashMap;

/// Relabel to `0..k` in order of first appearance; returns `k`.
pub(crate) fn compact_labels(labels: &mut [Option<usize>]) -> usize {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    for label in labels.iter_mut().flatten() {
        let next = remap.len();
        *label = *remap.entry(*label).or_insert(next);
    }
    remap.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_labels() {
        let mut labels = vec![Some(7), None, Some(3), Some(7), Some(0)];
        assert_eq!(compact_labels(&mut labels), 3);
        assert_eq!(labels, vec![Some(0), None, Some(1), Some(0), Some(2)]);
    }

    #[test]
    fn test_compact_labels_is_stable() {
        let mut labels = vec![Some(0), Some(1), None, Some(1)];
        assert_eq!(compact_labels(&mut labels), 2);
        assert_eq!(labels, vec![Some(0), Some(1), None, Some(1)]);

        let mut empty: Vec<Option<usize>> = vec![None, None];
        assert_eq!(compact_labels(&mut empty), 0);
    }
}
