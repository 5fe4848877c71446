use std::collections::HashSet;

use log::debug;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use super::parser::{BoolExpr, parse};
use crate::data::{Matrix, Vector, gaussian_elimination};
use crate::error::{FeError, Result, malformed};

/// Monotone span program: a matrix together with the attribute labelling
/// each of its rows.
///
/// A set of attributes satisfies the program iff the rows it labels span
/// the all-ones vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msp {
    pub mat: Matrix,
    pub row_to_attrib: Vec<String>,
}

impl Msp {
    /// True when no attribute labels more than one row. Security of the
    /// attribute-based schemes is only established in that case.
    pub fn is_injective(&self) -> bool {
        let mut seen = HashSet::new();
        self.row_to_attrib.iter().all(|a| seen.insert(a))
    }

    /// Indices of the rows labelled by one of `attribs`.
    pub fn rows_for<S: AsRef<str>>(&self, attribs: &[S]) -> Vec<usize> {
        let owned: HashSet<&str> = attribs.iter().map(AsRef::as_ref).collect();
        self.row_to_attrib
            .iter()
            .enumerate()
            .filter(|(_, a)| owned.contains(a.as_str()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Coefficients `c` with `Σ cᵢ·rowᵢ ≡ (1, ..., 1) (mod p)` over the rows
    /// labelled by `attribs`, returned together with those row indices.
    ///
    /// Fails with [`FeError::InsufficientAttributes`] when the attributes do
    /// not satisfy the policy.
    pub fn reconstruction_coefficients<S: AsRef<str>>(
        &self,
        attribs: &[S],
        p: &BigInt,
    ) -> Result<(Vec<usize>, Vector)> {
        let rows = self.rows_for(attribs);
        if rows.is_empty() || self.mat.cols() == 0 {
            return Err(FeError::InsufficientAttributes);
        }

        let selected = self.mat.select_rows(&rows)?.transpose();
        let ones = Vector::constant(self.mat.cols(), &BigInt::from(1));
        match gaussian_elimination(&selected, &ones, p) {
            Ok(c) => Ok((rows, c)),
            Err(FeError::InconsistentSystem) => Err(FeError::InsufficientAttributes),
            Err(e) => Err(e),
        }
    }

    /// Labels parsed as integer indices into an attribute universe.
    pub fn attribute_indices(&self) -> Result<Vec<usize>> {
        self.row_to_attrib
            .iter()
            .map(|a| {
                a.parse::<usize>()
                    .map_err(|_| malformed!("attribute {:?} is not an index", a))
            })
            .collect()
    }
}

// Rows emitted for `node` given the vector its subtree must span, and the
// next unused column. Targets are left unpadded until the end.
fn lower(node: &BoolExpr, target: Vec<i64>, next_col: usize) -> (Vec<(Vec<i64>, String)>, usize) {
    match node {
        BoolExpr::Attr(a) => (vec![(target, a.clone())], next_col),
        BoolExpr::Or(l, r) => {
            let (mut rows, next_col) = lower(l, target.clone(), next_col);
            let (right, next_col) = lower(r, target, next_col);
            rows.extend(right);
            (rows, next_col)
        }
        BoolExpr::And(l, r) => {
            // both children are needed: (0, ..., 0, -1) + (t, 1) = (t, 0)
            let mut left_target = vec![0; next_col + 1];
            left_target[next_col] = -1;
            let mut right_target = target;
            right_target.resize(next_col + 1, 0);
            right_target[next_col] = 1;

            let (mut rows, col) = lower(l, left_target, next_col + 1);
            let (right, col) = lower(r, right_target, col);
            rows.extend(right);
            (rows, col)
        }
    }
}

/// Compiles an already parsed policy, see [`boolean_to_msp`].
pub fn expr_to_msp(expr: &BoolExpr, allow_repeats: bool) -> Result<Msp> {
    if !allow_repeats {
        let mut seen = HashSet::new();
        if let Some(a) = expr.attributes().into_iter().find(|a| !seen.insert(*a)) {
            return Err(FeError::RepeatedAttribute(a.to_string()));
        }
    }

    let (rows, width) = lower(expr, vec![1], 1);

    // Change of basis mapping the target (1, 0, ..., 0) to (1, ..., 1):
    // column j becomes column 0 + column j.
    let mut mat_rows = Vec::with_capacity(rows.len());
    let mut row_to_attrib = Vec::with_capacity(rows.len());
    for (mut row, attrib) in rows {
        row.resize(width, 0);
        let first = row[0];
        let converted: Vector = row
            .iter()
            .enumerate()
            .map(|(j, &x)| BigInt::from(if j == 0 { x } else { first + x }))
            .collect();
        mat_rows.push(converted);
        row_to_attrib.push(attrib);
    }

    let mat = Matrix::new(mat_rows)?;
    debug!("compiled policy into a {}x{} span program", mat.rows(), mat.cols());
    Ok(Msp { mat, row_to_attrib })
}

/// Parses `expr` and compiles it into a monotone span program.
///
/// With `allow_repeats` set to false, a label used in several leaves is
/// rejected with [`FeError::RepeatedAttribute`]. Otherwise it is accepted,
/// and the caller becomes responsible for the resulting non-injective
/// program.
pub fn boolean_to_msp(expr: &str, allow_repeats: bool) -> Result<Msp> {
    expr_to_msp(&parse(expr)?, allow_repeats)
}
