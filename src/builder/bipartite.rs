//! Bipartite graph: constraint nodes `0..m`, variable nodes `m..m+n`.

use super::{NodeOrigin, Parts, Storage};
use crate::error::Result;
use crate::graph::GraphBuilder;
use crate::matrix::{MatrixContext, MatrixDomain};

pub(super) fn build(
    ctx: &MatrixContext<'_>,
    domain: &MatrixDomain,
    rows: &[Vec<usize>],
) -> Result<Parts> {
    let offset = domain.n_constraints();
    let mut draft = GraphBuilder::new();
    let mut nodes = Vec::with_capacity(offset + domain.n_variables());

    for (i, &cons) in domain.constraints().iter().enumerate() {
        draft.add_node(i, ctx.weights().constraint_weight(cons))?;
        nodes.push(NodeOrigin::Constraint(cons));
    }
    for (v, &var) in domain.variables().iter().enumerate() {
        draft.add_node(offset + v, ctx.weights().variable_weight(var))?;
        nodes.push(NodeOrigin::Variable(var));
    }

    for (i, row) in rows.iter().enumerate() {
        for &v in row {
            draft.add_edge(i, offset + v)?;
        }
    }

    Ok(Parts {
        storage: Storage::Simple(draft.flush()?),
        nodes,
        hyperedges: Vec::new(),
    })
}
