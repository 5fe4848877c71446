use num_bigint::BigInt;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use super::Vector;
use crate::error::{FeError, Result, malformed};
use crate::traits::{PublicSampler, Sampler};

/// Row-major matrix of arbitrary precision integers, all rows of the same
/// length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    rows: Vec<Vector>,
    cols: usize,
}

impl Matrix {
    /// Builds a matrix from its rows, which must all have the same length.
    pub fn new(rows: Vec<Vector>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vector::len);
        if rows.iter().any(|r| r.len() != cols) {
            return Err(malformed!("rows of a matrix must have the same length"));
        }
        Ok(Matrix { rows, cols })
    }

    pub fn constant(rows: usize, cols: usize, value: &BigInt) -> Self {
        Matrix {
            rows: vec![Vector::constant(cols, value); rows],
            cols,
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::constant(rows, cols, &BigInt::zero())
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, BigInt::one());
        }
        m
    }

    pub fn random<S, R>(rows: usize, cols: usize, sampler: &S, rng: &mut R) -> Self
    where
        S: Sampler,
        R: RngCore + CryptoRng + ?Sized,
    {
        Matrix {
            rows: (0..rows).map(|_| Vector::random(cols, sampler, rng)).collect(),
            cols,
        }
    }

    pub fn random_public<S: PublicSampler>(rows: usize, cols: usize, sampler: &mut S) -> Self {
        Matrix {
            rows: (0..rows).map(|_| Vector::random_public(cols, sampler)).collect(),
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn check_dims(&self, rows: usize, cols: usize) -> bool {
        self.rows() == rows && self.cols() == cols
    }

    pub fn row(&self, i: usize) -> Result<&Vector> {
        self.rows
            .get(i)
            .ok_or_else(|| malformed!("row {} out of range for {} rows", i, self.rows()))
    }

    pub fn column(&self, j: usize) -> Result<Vector> {
        if j >= self.cols {
            return Err(malformed!("column {} out of range for {} columns", j, self.cols));
        }
        Ok(self.rows.iter().map(|r| r[j].clone()).collect())
    }

    pub fn get(&self, i: usize, j: usize) -> Result<&BigInt> {
        self.row(i)?
            .coords()
            .get(j)
            .ok_or_else(|| malformed!("column {} out of range for {} columns", j, self.cols))
    }

    pub(crate) fn set(&mut self, i: usize, j: usize, value: BigInt) {
        let mut coords = std::mem::take(&mut self.rows[i]).into_coords();
        coords[j] = value;
        self.rows[i] = Vector::new(coords);
    }

    pub fn iter_rows(&self) -> std::slice::Iter<'_, Vector> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Vector> {
        self.rows
    }

    /// Matrix made of the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Matrix> {
        let rows = indices
            .iter()
            .map(|&i| self.row(i).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(Matrix {
            rows,
            cols: self.cols,
        })
    }

    pub fn transpose(&self) -> Matrix {
        let rows = (0..self.cols)
            .map(|j| self.rows.iter().map(|r| r[j].clone()).collect())
            .collect();
        Matrix {
            rows,
            cols: self.rows(),
        }
    }

    fn check_same_dims(&self, other: &Matrix) -> Result<()> {
        if !other.check_dims(self.rows(), self.cols()) {
            return Err(malformed!(
                "matrix dimensions differ: {}x{} and {}x{}",
                self.rows(),
                self.cols(),
                other.rows(),
                other.cols()
            ));
        }
        Ok(())
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        self.check_same_dims(other)?;
        let rows = self
            .rows
            .iter()
            .zip(&other.rows)
            .map(|(a, b)| a.add(b))
            .collect::<Result<Vec<_>>>()?;
        Ok(Matrix {
            rows,
            cols: self.cols,
        })
    }

    pub fn sub(&self, other: &Matrix) -> Result<Matrix> {
        self.add(&other.neg())
    }

    pub fn neg(&self) -> Matrix {
        self.apply(|x| -x)
    }

    pub fn mul_scalar(&self, k: &BigInt) -> Matrix {
        self.apply(|x| x * k)
    }

    /// See [`Vector::modulo`].
    pub fn modulo(&self, modulus: &BigInt) -> Matrix {
        Matrix {
            rows: self.rows.iter().map(|r| r.modulo(modulus)).collect(),
            cols: self.cols,
        }
    }

    pub fn apply<F: Fn(&BigInt) -> BigInt>(&self, f: F) -> Matrix {
        Matrix {
            rows: self.rows.iter().map(|r| r.apply(&f)).collect(),
            cols: self.cols,
        }
    }

    /// `M·v`.
    pub fn mul_vec(&self, v: &Vector) -> Result<Vector> {
        if v.len() != self.cols {
            return Err(malformed!(
                "cannot multiply {}x{} matrix by vector of length {}",
                self.rows(),
                self.cols(),
                v.len()
            ));
        }
        self.rows.iter().map(|r| r.dot(v)).collect()
    }

    /// `M·N`.
    pub fn mul(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows() {
            return Err(malformed!(
                "cannot multiply {}x{} matrix by {}x{} matrix",
                self.rows(),
                self.cols(),
                other.rows(),
                other.cols()
            ));
        }

        let t = other.transpose();
        let rows = self
            .rows
            .iter()
            .map(|r| t.mul_vec(r))
            .collect::<Result<Vec<_>>>()?;
        Ok(Matrix {
            rows,
            cols: other.cols(),
        })
    }

    /// The bilinear form `xᵀ·M·y`.
    pub fn mul_x_mat_y(&self, x: &Vector, y: &Vector) -> Result<BigInt> {
        if x.len() != self.rows() {
            return Err(malformed!(
                "left vector of length {} for {} rows",
                x.len(),
                self.rows()
            ));
        }
        x.dot(&self.mul_vec(y)?)
    }

    /// Fails with [`FeError::BoundViolation`] unless every entry is strictly
    /// smaller than `bound` in absolute value.
    pub fn check_bound(&self, bound: &BigInt) -> Result<()> {
        self.rows.iter().try_for_each(|r| r.check_bound(bound))
    }

    /// Concatenation of the rows into a single vector.
    pub fn flatten(&self) -> Vector {
        self.rows.iter().flat_map(|r| r.iter().cloned()).collect()
    }

    /// Ring product of every row with `p`, see [`Vector::mul_as_poly_in_ring`].
    pub fn mul_rows_as_poly_in_ring(&self, p: &Vector) -> Result<Matrix> {
        let rows = self
            .rows
            .iter()
            .map(|r| r.mul_as_poly_in_ring(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Matrix {
            rows,
            cols: self.cols,
        })
    }
}

impl TryFrom<Vec<Vec<i64>>> for Matrix {
    type Error = FeError;

    fn try_from(rows: Vec<Vec<i64>>) -> Result<Self> {
        Matrix::new(rows.into_iter().map(Vector::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mat(rows: Vec<Vec<i64>>) -> Matrix {
        Matrix::try_from(rows).unwrap()
    }

    #[test]
    fn test_ragged_rows_rejected() {
        assert!(Matrix::try_from(vec![vec![1, 2], vec![3]]).is_err());
        assert!(Matrix::new(vec![]).unwrap().check_dims(0, 0));
    }

    #[test]
    fn test_transpose_and_columns() {
        let m = mat(vec![vec![1, 2, 3], vec![4, 5, 6]]);
        let t = m.transpose();

        assert!(t.check_dims(3, 2));
        assert_eq!(t, mat(vec![vec![1, 4], vec![2, 5], vec![3, 6]]));
        assert_eq!(m.column(1).unwrap(), Vector::from(vec![2, 5]));
        assert_eq!(t.transpose(), m);
        assert!(m.column(3).is_err());
        assert!(m.row(2).is_err());
        assert_eq!(m.get(1, 2).unwrap(), &BigInt::from(6));
        assert!(m.get(2, 0).is_err());
        assert!(m.get(0, 3).is_err());
    }

    #[test]
    fn test_products() {
        let m = mat(vec![vec![1, 2], vec![3, 4]]);
        let n = mat(vec![vec![0, 1], vec![-1, 0]]);
        let v = Vector::from(vec![5, -1]);

        assert_eq!(m.mul(&n).unwrap(), mat(vec![vec![-2, 1], vec![-4, 3]]));
        assert_eq!(m.mul_vec(&v).unwrap(), Vector::from(vec![3, 11]));
        assert_eq!(m.mul(&Matrix::identity(2)).unwrap(), m);

        // xᵀ·M·y = [1, 1]·[3, 11]
        let x = Vector::from(vec![1, 1]);
        assert_eq!(m.mul_x_mat_y(&x, &v).unwrap(), BigInt::from(14));
    }

    #[test]
    fn test_dimension_mismatch() {
        let m = mat(vec![vec![1, 2, 3], vec![4, 5, 6]]);

        assert!(m.mul(&m).is_err());
        assert!(m.mul_vec(&Vector::from(vec![1, 2])).is_err());
        assert!(m.add(&m.transpose()).is_err());
        assert!(
            m.mul_x_mat_y(&Vector::from(vec![1, 2, 3]), &Vector::from(vec![1, 2, 3]))
                .is_err()
        );
    }

    #[test]
    fn test_elementwise() {
        let m = mat(vec![vec![7, -8], vec![9, 10]]);

        assert_eq!(m.modulo(&BigInt::from(5)), mat(vec![vec![2, 2], vec![4, 0]]));
        assert_eq!(m.sub(&m).unwrap(), Matrix::zeros(2, 2));
        assert_eq!(m.mul_scalar(&BigInt::from(-1)), m.neg());
        assert_eq!(m.check_bound(&BigInt::from(10)), Err(FeError::BoundViolation));
        assert!(m.check_bound(&BigInt::from(11)).is_ok());
        assert_eq!(m.flatten(), Vector::from(vec![7, -8, 9, 10]));
        assert_eq!(
            m.select_rows(&[1, 1]).unwrap(),
            mat(vec![vec![9, 10], vec![9, 10]])
        );
    }
}
