//! Column graph: variables adjacent when they appear in a common constraint.

use super::{NodeOrigin, Parts, Storage};
use crate::error::Result;
use crate::graph::GraphBuilder;
use crate::matrix::{MatrixContext, MatrixDomain};

pub(super) fn build(
    ctx: &MatrixContext<'_>,
    domain: &MatrixDomain,
    rows: &[Vec<usize>],
) -> Result<Parts> {
    let mut draft = GraphBuilder::new();

    for v in 0..domain.n_variables() {
        draft.add_node(v, ctx.weights().variable_weight(domain.variable(v)))?;
    }

    // Rows are sorted, so `a < b` for every pair below.
    for row in rows {
        for (k, &a) in row.iter().enumerate() {
            for &b in &row[k + 1..] {
                if !draft.contains_edge(a, b) {
                    draft.add_edge(a, b)?;
                }
            }
        }
    }

    Ok(Parts {
        storage: Storage::Simple(draft.flush()?),
        nodes: domain
            .variables()
            .iter()
            .map(|&v| NodeOrigin::Variable(v))
            .collect(),
        hyperedges: Vec::new(),
    })
}
