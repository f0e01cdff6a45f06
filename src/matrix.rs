//! Read-only access to a constraint/variable incidence structure.
//!
//! The host solver owns the real constraint and variable objects. Graph
//! builders only see them through [`MatrixAccess`] (which variables a
//! constraint touches, and which variables are relevant) and
//! [`NodeWeights`] (integer importance of rows and columns), bundled in a
//! [`MatrixContext`] that is passed explicitly into every build call.
//!
//! A [`MatrixDomain`] restricts construction to a subset of open rows and
//! columns. Logical indices inside a graph are positions within the domain.

use crate::error::{Error, Result};

/// Sparse constraint/variable incidence provided by the host.
pub trait MatrixAccess {
    /// Number of constraints (rows).
    fn n_constraints(&self) -> usize;

    /// Number of variables (columns).
    fn n_variables(&self) -> usize;

    /// Variables appearing in constraint `cons`.
    ///
    /// Failures are reported as [`Error::Matrix`] and propagated unchanged.
    fn constraint_variables(&self, cons: usize) -> Result<Vec<usize>>;

    /// Whether `var` takes part in the structure (not fixed or aggregated away).
    fn is_relevant(&self, var: usize) -> bool;
}

/// Integer importance of rows and columns.
pub trait NodeWeights {
    /// Weight of constraint `cons`.
    fn constraint_weight(&self, cons: usize) -> i64;
    /// Weight of variable `var`.
    fn variable_weight(&self, var: usize) -> i64;
}

/// Every row and column weighs 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitWeights;

impl NodeWeights for UnitWeights {
    fn constraint_weight(&self, _cons: usize) -> i64 {
        1
    }

    fn variable_weight(&self, _var: usize) -> i64 {
        1
    }
}

/// Weights computed by two closures.
#[derive(Debug, Clone, Copy)]
pub struct FnWeights<C, V> {
    cons: C,
    var: V,
}

impl<C, V> FnWeights<C, V>
where
    C: Fn(usize) -> i64,
    V: Fn(usize) -> i64,
{
    /// Weight constraints with `cons` and variables with `var`.
    pub fn new(cons: C, var: V) -> Self {
        Self { cons, var }
    }
}

impl<C, V> NodeWeights for FnWeights<C, V>
where
    C: Fn(usize) -> i64,
    V: Fn(usize) -> i64,
{
    fn constraint_weight(&self, cons: usize) -> i64 {
        (self.cons)(cons)
    }

    fn variable_weight(&self, var: usize) -> i64 {
        (self.var)(var)
    }
}

/// Everything a builder may read from the host.
#[derive(Clone, Copy)]
pub struct MatrixContext<'a> {
    matrix: &'a dyn MatrixAccess,
    weights: &'a dyn NodeWeights,
}

impl<'a> MatrixContext<'a> {
    /// Bundle a matrix accessor and a weight function.
    pub fn new(matrix: &'a dyn MatrixAccess, weights: &'a dyn NodeWeights) -> Self {
        Self { matrix, weights }
    }

    /// Matrix accessor with [`UnitWeights`].
    pub fn unweighted(matrix: &'a dyn MatrixAccess) -> Self {
        Self::new(matrix, &UnitWeights)
    }

    /// The matrix accessor.
    pub fn matrix(&self) -> &'a dyn MatrixAccess {
        self.matrix
    }

    /// The weight function.
    pub fn weights(&self) -> &'a dyn NodeWeights {
        self.weights
    }

    /// Relevant variables of every domain constraint, as sorted domain positions.
    pub(crate) fn restricted_rows(&self, domain: &MatrixDomain) -> Result<Vec<Vec<usize>>> {
        domain
            .constraints()
            .iter()
            .map(|&cons| {
                let mut row: Vec<usize> = self
                    .matrix
                    .constraint_variables(cons)?
                    .into_iter()
                    .filter(|&v| self.matrix.is_relevant(v))
                    .filter_map(|v| domain.variable_position(v))
                    .collect();
                row.sort_unstable();
                row.dedup();
                Ok(row)
            })
            .collect()
    }
}

impl std::fmt::Debug for MatrixContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixContext")
            .field("n_constraints", &self.matrix.n_constraints())
            .field("n_variables", &self.matrix.n_variables())
            .finish()
    }
}

/// Column lists of a row-wise incidence: `columns[v]` = rows containing `v`, ascending.
pub(crate) fn transpose(rows: &[Vec<usize>], n_columns: usize) -> Vec<Vec<usize>> {
    let mut columns = vec![Vec::new(); n_columns];
    for (r, row) in rows.iter().enumerate() {
        for &c in row {
            columns[c].push(r);
        }
    }
    columns
}

/// The open rows and columns a graph is built over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixDomain {
    constraints: Vec<usize>,
    variables: Vec<usize>,
    /// Matrix variable -> position in `variables`.
    var_positions: Vec<Option<usize>>,
}

impl MatrixDomain {
    /// Every constraint and variable of `matrix`.
    pub fn full(matrix: &dyn MatrixAccess) -> Self {
        let n_vars = matrix.n_variables();
        Self {
            constraints: (0..matrix.n_constraints()).collect(),
            variables: (0..n_vars).collect(),
            var_positions: (0..n_vars).map(Some).collect(),
        }
    }

    /// Only the given open constraints and variables, in the given order.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownNode`] for an index outside the matrix and
    /// [`Error::DuplicateNode`] for a repeated index.
    pub fn partial(
        matrix: &dyn MatrixAccess,
        open_constraints: &[usize],
        open_variables: &[usize],
    ) -> Result<Self> {
        let mut seen = vec![false; matrix.n_constraints()];
        for &c in open_constraints {
            match seen.get_mut(c) {
                None => return Err(Error::UnknownNode { id: c }),
                Some(true) => return Err(Error::DuplicateNode { id: c }),
                Some(flag) => *flag = true,
            }
        }

        let mut var_positions = vec![None; matrix.n_variables()];
        for (pos, &v) in open_variables.iter().enumerate() {
            match var_positions.get_mut(v) {
                None => return Err(Error::UnknownNode { id: v }),
                Some(Some(_)) => return Err(Error::DuplicateNode { id: v }),
                Some(slot) => *slot = Some(pos),
            }
        }

        Ok(Self {
            constraints: open_constraints.to_vec(),
            variables: open_variables.to_vec(),
            var_positions,
        })
    }

    /// Open constraints; position = logical row index.
    pub fn constraints(&self) -> &[usize] {
        &self.constraints
    }

    /// Open variables; position = logical column index.
    pub fn variables(&self) -> &[usize] {
        &self.variables
    }

    /// Number of open constraints.
    pub fn n_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Number of open variables.
    pub fn n_variables(&self) -> usize {
        self.variables.len()
    }

    /// Matrix index of logical row `row`.
    pub fn constraint(&self, row: usize) -> usize {
        self.constraints[row]
    }

    /// Matrix index of logical column `col`.
    pub fn variable(&self, col: usize) -> usize {
        self.variables[col]
    }

    /// Logical column of matrix variable `var`, if open.
    pub fn variable_position(&self, var: usize) -> Option<usize> {
        self.var_positions.get(var).copied().flatten()
    }
}

/// Owned sparse incidence matrix.
///
/// ```rust
/// use blockgraph::matrix::{IncidenceMatrix, MatrixAccess};
///
/// let m = IncidenceMatrix::new(3, vec![vec![0, 2], vec![1]]).unwrap();
/// assert_eq!(m.n_constraints(), 2);
/// assert_eq!(m.constraint_variables(0).unwrap(), vec![0, 2]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidenceMatrix {
    rows: Vec<Vec<usize>>,
    relevant: Vec<bool>,
}

impl IncidenceMatrix {
    /// Build from per-row variable lists over `n_variables` columns.
    pub fn new(n_variables: usize, rows: Vec<Vec<usize>>) -> Result<Self> {
        for row in &rows {
            if let Some(&bad) = row.iter().find(|&&v| v >= n_variables) {
                return Err(Error::UnknownNode { id: bad });
            }
        }
        Ok(Self {
            rows,
            relevant: vec![true; n_variables],
        })
    }

    /// Build from a dense 0/1 pattern (nonzero = incidence).
    pub fn from_dense<R: AsRef<[u8]>>(dense: &[R]) -> Result<Self> {
        let n_variables = dense.first().map_or(0, |r| r.as_ref().len());
        let mut rows = Vec::with_capacity(dense.len());
        for row in dense {
            let row = row.as_ref();
            if row.len() != n_variables {
                return Err(Error::DimensionMismatch {
                    expected: n_variables,
                    found: row.len(),
                });
            }
            rows.push(
                row.iter()
                    .enumerate()
                    .filter(|(_, &x)| x != 0)
                    .map(|(v, _)| v)
                    .collect(),
            );
        }
        Self::new(n_variables, rows)
    }

    /// Mark `var` as relevant or not.
    pub fn set_relevant(&mut self, var: usize, relevant: bool) {
        self.relevant[var] = relevant;
    }

    /// Same matrix with `vars` marked irrelevant.
    pub fn with_irrelevant(mut self, vars: &[usize]) -> Self {
        for &v in vars {
            self.set_relevant(v, false);
        }
        self
    }
}

impl MatrixAccess for IncidenceMatrix {
    fn n_constraints(&self) -> usize {
        self.rows.len()
    }

    fn n_variables(&self) -> usize {
        self.relevant.len()
    }

    fn constraint_variables(&self, cons: usize) -> Result<Vec<usize>> {
        self.rows
            .get(cons)
            .cloned()
            .ok_or_else(|| Error::Matrix(format!("no constraint {cons}")))
    }

    fn is_relevant(&self, var: usize) -> bool {
        self.relevant.get(var).copied().unwrap_or(false)
    }
}
