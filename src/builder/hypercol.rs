//! Hypercol graph: constraint nodes, one hyperedge per non-empty variable column.

use super::{HyperedgeOrigin, NodeOrigin, Parts, Storage};
use crate::error::Result;
use crate::graph::HypergraphBuilder;
use crate::matrix::{transpose, MatrixContext, MatrixDomain};

pub(super) fn build(
    ctx: &MatrixContext<'_>,
    domain: &MatrixDomain,
    rows: &[Vec<usize>],
) -> Result<Parts> {
    let columns = transpose(rows, domain.n_variables());
    let mut draft = HypergraphBuilder::new();

    for (i, &cons) in domain.constraints().iter().enumerate() {
        draft.add_node(i, ctx.weights().constraint_weight(cons))?;
    }

    let mut hyperedges = Vec::new();
    for (v, members) in columns.iter().enumerate() {
        if members.is_empty() {
            continue;
        }
        let var = domain.variable(v);
        let _ = draft.add_hyperedge(members, ctx.weights().variable_weight(var))?;
        hyperedges.push(HyperedgeOrigin::Variable(var));
    }

    Ok(Parts {
        storage: Storage::Hyper(draft.flush()?),
        nodes: domain
            .constraints()
            .iter()
            .map(|&c| NodeOrigin::Constraint(c))
            .collect(),
        hyperedges,
    })
}
