//! Repair passes for row labels that disagree with their neighborhood.
//!
//! Both strategies only ever evict rows (set their label to `None`); they
//! never move a row to another block.
//!
//! - **Majority**: a labelled row is evicted when a strict majority of its
//!   labelled neighbors carry one other label. Evictions change neighbor
//!   counts, so the pass repeats until nothing changes.
//! - **Stable set**: build a conflict graph whose edges join adjacent rows
//!   with different labels, then greedily evict the highest-degree row
//!   until the conflict graph has no edges. The survivors form a stable set.

use super::compact_labels;
use crate::error::{Error, Result};
use crate::graph::{Graph, PriorityGraph};
use log::trace;
use std::collections::HashMap;

/// Which repair pass to run after clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PostProcess {
    /// Evict rows outvoted by a strict majority of their neighbors.
    #[default]
    Majority,
    /// Greedy stable set over the conflict graph.
    StableSet,
}

impl PostProcess {
    /// Run this strategy on `labels` and re-compact them.
    ///
    /// Returns the number of evicted rows.
    pub fn apply(self, graph: &Graph, labels: &mut [Option<usize>]) -> Result<usize> {
        let evicted = match self {
            PostProcess::Majority => majority(graph, labels)?,
            PostProcess::StableSet => stable_set(graph, labels)?,
        };
        let _ = compact_labels(labels);
        Ok(evicted)
    }
}

/// Majority repair, iterated to a fixed point.
pub fn majority(graph: &Graph, labels: &mut [Option<usize>]) -> Result<usize> {
    check_len(graph, labels)?;
    let mut evicted = 0;
    loop {
        let snapshot = labels.to_vec();
        let mut changed = false;

        for (row, own) in snapshot.iter().enumerate() {
            let Some(own) = *own else { continue };

            let mut counts: HashMap<usize, usize> = HashMap::new();
            let mut total = 0;
            for n in graph.neighbors(row) {
                if let Some(l) = snapshot[n] {
                    *counts.entry(l).or_insert(0) += 1;
                    total += 1;
                }
            }

            let outvoted = counts
                .iter()
                .any(|(&label, &count)| label != own && 2 * count > total);
            if outvoted {
                trace!("evicting row {row} from block {own}: outvoted by neighbors");
                labels[row] = None;
                evicted += 1;
                changed = true;
            }
        }

        if !changed {
            return Ok(evicted);
        }
    }
}

/// Greedy stable-set repair.
pub fn stable_set(graph: &Graph, labels: &mut [Option<usize>]) -> Result<usize> {
    check_len(graph, labels)?;
    let mut conflicts = PriorityGraph::new();
    for (u, v, _) in graph.edges() {
        if let (Some(a), Some(b)) = (labels[u], labels[v]) {
            if a != b {
                let _ = conflicts.add_node(u);
                let _ = conflicts.add_node(v);
                conflicts.add_edge(u, v)?;
            }
        }
    }

    let mut removed = Vec::new();
    while conflicts.max_degree() > 0 {
        let Some(top) = conflicts.top() else { break };
        let _ = conflicts.remove_node(top, &mut removed);
    }

    for &row in &removed {
        trace!("evicting row {row}: in conflict with a differently labelled neighbor");
        labels[row] = None;
    }
    Ok(removed.len())
}

fn check_len(graph: &Graph, labels: &[Option<usize>]) -> Result<()> {
    if labels.len() == graph.n_nodes() {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            expected: graph.n_nodes(),
            found: labels.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use proptest::prelude::*;

    fn graph(n: usize, edges: &[(usize, usize)]) -> Graph {
        let mut draft = GraphBuilder::new();
        for i in 0..n {
            draft.add_node(i, 1).unwrap();
        }
        for &(u, v) in edges {
            draft.add_edge(u, v).unwrap();
        }
        draft.flush().unwrap()
    }

    #[test]
    fn test_majority_evicts_outvoted_row() {
        // Row 3 is labelled 1 but all its neighbors are in block 0.
        let g = graph(4, &[(0, 1), (0, 3), (1, 2), (1, 3), (2, 3)]);
        let mut labels = vec![Some(0), Some(0), Some(0), Some(1)];
        let evicted = PostProcess::Majority.apply(&g, &mut labels).unwrap();
        assert_eq!(evicted, 1);
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), None]);
    }

    #[test]
    fn test_majority_keeps_ties() {
        // Row 1 sees one neighbor of each block: no strict majority.
        let g = graph(3, &[(0, 1), (1, 2)]);
        let mut labels = vec![Some(0), Some(0), Some(1)];
        let _ = majority(&g, &mut labels).unwrap();
        assert_eq!(labels[1], Some(0));
    }

    #[test]
    fn test_majority_compacts_labels() {
        let g = graph(3, &[(0, 1)]);
        let mut labels = vec![Some(5), Some(2), Some(7)];
        // 0 and 1 outvote each other.
        let evicted = PostProcess::Majority.apply(&g, &mut labels).unwrap();
        assert_eq!(evicted, 2);
        assert_eq!(labels, vec![None, None, Some(0)]);
    }

    #[test]
    fn test_stable_set_removes_all_conflicts() {
        // Star: centre 0 in block 0, leaves in block 1.
        let g = graph(4, &[(0, 1), (0, 2), (0, 3)]);
        let mut labels = vec![Some(0), Some(1), Some(1), Some(1)];
        let evicted = PostProcess::StableSet.apply(&g, &mut labels).unwrap();
        assert_eq!(evicted, 1);
        assert_eq!(labels, vec![None, Some(0), Some(0), Some(0)]);
    }

    #[test]
    fn test_no_conflicts_is_noop() {
        let g = graph(4, &[(0, 1), (2, 3)]);
        for strategy in [PostProcess::Majority, PostProcess::StableSet] {
            let mut labels = vec![Some(0), Some(0), Some(1), Some(1)];
            assert_eq!(strategy.apply(&g, &mut labels).unwrap(), 0);
            assert_eq!(labels, vec![Some(0), Some(0), Some(1), Some(1)]);
        }
    }

    #[test]
    fn test_label_length_must_match_graph() {
        let g = graph(3, &[(0, 1), (1, 2)]);
        let mut short = vec![Some(0), Some(1)];
        let mismatch = Error::DimensionMismatch {
            expected: 3,
            found: 2,
        };
        assert_eq!(majority(&g, &mut short), Err(mismatch.clone()));
        assert_eq!(stable_set(&g, &mut short), Err(mismatch.clone()));
        for strategy in [PostProcess::Majority, PostProcess::StableSet] {
            assert_eq!(strategy.apply(&g, &mut short), Err(mismatch.clone()));
        }
        assert_eq!(short, vec![Some(0), Some(1)]);
    }

    proptest! {
        #[test]
        fn repair_is_idempotent(
            n in 1usize..20,
            pairs in proptest::collection::vec((0usize..20, 0usize..20), 0..60),
            raw in proptest::collection::vec(proptest::option::of(0usize..4), 20),
        ) {
            let edges: Vec<(usize, usize)> = pairs
                .into_iter()
                .map(|(u, v)| (u % n, v % n))
                .filter(|(u, v)| u != v)
                .collect();
            let g = graph(n, &edges);

            for strategy in [PostProcess::Majority, PostProcess::StableSet] {
                let mut once = raw[..n].to_vec();
                strategy.apply(&g, &mut once).unwrap();
                let mut twice = once.clone();
                strategy.apply(&g, &mut twice).unwrap();
                prop_assert_eq!(&once, &twice);
            }
        }

        #[test]
        fn stable_set_leaves_no_conflicting_edge(
            n in 1usize..20,
            pairs in proptest::collection::vec((0usize..20, 0usize..20), 0..60),
            raw in proptest::collection::vec(proptest::option::of(0usize..4), 20),
        ) {
            let edges: Vec<(usize, usize)> = pairs
                .into_iter()
                .map(|(u, v)| (u % n, v % n))
                .filter(|(u, v)| u != v)
                .collect();
            let g = graph(n, &edges);
            let mut labels = raw[..n].to_vec();
            stable_set(&g, &mut labels).unwrap();
            for (u, v, _) in g.edges() {
                if let (Some(a), Some(b)) = (labels[u], labels[v]) {
                    prop_assert_eq!(a, b);
                }
            }
        }
    }
}
