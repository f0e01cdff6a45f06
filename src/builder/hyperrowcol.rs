//! Hyperrowcol graph: one node per nonzero, one hyperedge per row and per column.
//!
//! Row hyperedges come first (in row order), then column hyperedges (in
//! column order). Column hyperedges are opened empty and filled while
//! walking the nonzeros row by row.

use super::{HyperedgeOrigin, NodeOrigin, Parts, Storage};
use crate::error::Result;
use crate::graph::HypergraphBuilder;
use crate::matrix::{MatrixContext, MatrixDomain};

pub(super) fn build(
    ctx: &MatrixContext<'_>,
    domain: &MatrixDomain,
    rows: &[Vec<usize>],
) -> Result<Parts> {
    let weights = ctx.weights();
    let mut draft = HypergraphBuilder::new();
    let mut nodes = Vec::new();

    // nonzero k -> column, row-major
    let mut columns_of_entries = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        for &v in row {
            let k = columns_of_entries.len();
            let var = domain.variable(v);
            draft.add_node(k, weights.variable_weight(var))?;
            nodes.push(NodeOrigin::Nonzero {
                constraint: domain.constraint(i),
                variable: var,
            });
            columns_of_entries.push(v);
        }
    }

    let mut hyperedges = Vec::new();
    let mut start = 0;
    for (i, row) in rows.iter().enumerate() {
        let members: Vec<usize> = (start..start + row.len()).collect();
        start += row.len();
        if members.is_empty() {
            continue;
        }
        let cons = domain.constraint(i);
        let _ = draft.add_hyperedge(&members, weights.constraint_weight(cons))?;
        hyperedges.push(HyperedgeOrigin::Constraint(cons));
    }

    let mut used = vec![false; domain.n_variables()];
    for &v in &columns_of_entries {
        used[v] = true;
    }
    let mut column_hedge = vec![None; domain.n_variables()];
    for (v, _) in used.iter().enumerate().filter(|(_, &u)| u) {
        let var = domain.variable(v);
        column_hedge[v] = Some(draft.add_hyperedge(&[], weights.variable_weight(var))?);
        hyperedges.push(HyperedgeOrigin::Variable(var));
    }

    for (k, &v) in columns_of_entries.iter().enumerate() {
        if let Some(hedge) = column_hedge[v] {
            draft.add_node_to_hyperedge(k, hedge)?;
        }
    }

    Ok(Parts {
        storage: Storage::Hyper(draft.flush()?),
        nodes,
        hyperedges,
    })
}
