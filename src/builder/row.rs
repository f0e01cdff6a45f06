//! Row graph: constraints adjacent when they share a relevant variable.

use super::{NodeOrigin, Parts, Storage};
use crate::error::Result;
use crate::graph::GraphBuilder;
use crate::matrix::{transpose, MatrixContext, MatrixDomain};

pub(super) fn build(
    ctx: &MatrixContext<'_>,
    domain: &MatrixDomain,
    rows: &[Vec<usize>],
) -> Result<Parts> {
    let columns = transpose(rows, domain.n_variables());
    let mut draft = GraphBuilder::new();

    for i in 0..rows.len() {
        draft.add_node(i, ctx.weights().constraint_weight(domain.constraint(i)))?;
    }

    for (i, row) in rows.iter().enumerate() {
        for &var in row {
            for &j in &columns[var] {
                if j > i && !draft.contains_edge(i, j) {
                    draft.add_edge(i, j)?;
                }
            }
        }
    }

    Ok(Parts {
        storage: Storage::Simple(draft.flush()?),
        nodes: domain
            .constraints()
            .iter()
            .map(|&c| NodeOrigin::Constraint(c))
            .collect(),
        hyperedges: Vec::new(),
    })
}
