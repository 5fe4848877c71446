use log::trace;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};

use super::{Matrix, Vector};
use crate::error::{FeError, Result, malformed};
use crate::group::mod_inverse;

// Gauss-Jordan reduction of `rows` (each of length `width`) over Z_p,
// restricted to the first `pivot_cols` columns. Returns the pivot column of
// each of the leading rows; the rows below them are zero on those columns.
fn reduce_rows(rows: &mut [Vec<BigInt>], pivot_cols: usize, p: &BigInt) -> Result<Vec<usize>> {
    let mut pivots = Vec::new();

    for col in 0..pivot_cols {
        let pr = pivots.len();
        if pr == rows.len() {
            break;
        }

        let Some(found) = (pr..rows.len()).find(|&i| !rows[i][col].is_zero()) else {
            // free column
            continue;
        };
        rows.swap(pr, found);

        let inv = mod_inverse(&rows[pr][col], p)?;
        for x in rows[pr].iter_mut() {
            *x = (&*x * &inv).mod_floor(p);
        }

        let pivot_row = rows[pr].clone();
        for (i, row) in rows.iter_mut().enumerate() {
            if i == pr || row[col].is_zero() {
                continue;
            }
            let factor = row[col].clone();
            for (x, y) in row.iter_mut().zip(&pivot_row) {
                *x = (&*x - &factor * y).mod_floor(p);
            }
        }
        pivots.push(col);
    }

    Ok(pivots)
}

fn check_modulus(p: &BigInt) -> Result<()> {
    if *p <= BigInt::one() {
        return Err(malformed!("modulus must be larger than 1, got {}", p));
    }
    Ok(())
}

/// Solves `mat·x ≡ v (mod p)` for a prime `p`.
///
/// Free variables are set to 0, so an underdetermined system yields one of
/// its solutions. Fails with [`FeError::InconsistentSystem`] when there is
/// none.
pub fn gaussian_elimination(mat: &Matrix, v: &Vector, p: &BigInt) -> Result<Vector> {
    check_modulus(p)?;
    if mat.rows() == 0 || mat.cols() == 0 {
        return Err(malformed!("empty matrix"));
    }
    if v.len() != mat.rows() {
        return Err(malformed!(
            "{} rows but right-hand side of length {}",
            mat.rows(),
            v.len()
        ));
    }

    let cols = mat.cols();
    let mut aug: Vec<Vec<BigInt>> = mat
        .iter_rows()
        .zip(v.iter())
        .map(|(row, b)| {
            row.iter()
                .chain(std::iter::once(b))
                .map(|x| x.mod_floor(p))
                .collect()
        })
        .collect();

    let pivots = reduce_rows(&mut aug, cols, p)?;
    trace!(
        "gaussian elimination on {}x{} system: rank {}",
        mat.rows(),
        cols,
        pivots.len()
    );

    // leftover rows read 0 = aug[i][cols]
    if aug[pivots.len()..].iter().any(|row| !row[cols].is_zero()) {
        return Err(FeError::InconsistentSystem);
    }

    let mut x = vec![BigInt::zero(); cols];
    for (row, &col) in pivots.iter().enumerate() {
        x[col] = aug[row][cols].clone();
    }
    Ok(Vector::new(x))
}

impl Matrix {
    /// Inverse of a square matrix over Z_p, or [`FeError::NotInvertible`]
    /// when it is singular.
    pub fn inverse_mod(&self, p: &BigInt) -> Result<Matrix> {
        check_modulus(p)?;
        let n = self.rows();
        if n == 0 || n != self.cols() {
            return Err(malformed!(
                "cannot invert a {}x{} matrix",
                self.rows(),
                self.cols()
            ));
        }

        let id = Matrix::identity(n);
        let mut aug: Vec<Vec<BigInt>> = self
            .iter_rows()
            .zip(id.iter_rows())
            .map(|(a, b)| a.iter().chain(b.iter()).map(|x| x.mod_floor(p)).collect())
            .collect();

        let pivots = reduce_rows(&mut aug, n, p)?;
        if pivots.len() < n {
            return Err(FeError::NotInvertible);
        }

        Matrix::new(aug.into_iter().map(|row| row[n..].iter().cloned().collect()).collect())
    }

    /// Determinant of a 2×2 matrix.
    pub fn det2(&self) -> Result<BigInt> {
        if !self.check_dims(2, 2) {
            return Err(malformed!("determinant is only provided for 2x2 matrices"));
        }
        Ok(self.get(0, 0)? * self.get(1, 1)? - self.get(0, 1)? * self.get(1, 0)?)
    }
}
