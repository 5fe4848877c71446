use std::ops::Index;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{FeError, Result, malformed};
use crate::traits::{PublicSampler, Sampler};

/// Vector of arbitrary precision integers.
///
/// Operations work in the unreduced ring of integers; call
/// [`Vector::modulo`] to reduce.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vector(Vec<BigInt>);

impl Vector {
    pub fn new(coords: Vec<BigInt>) -> Self {
        Vector(coords)
    }

    pub fn constant(len: usize, value: &BigInt) -> Self {
        Vector(vec![value.clone(); len])
    }

    pub fn zeros(len: usize) -> Self {
        Self::constant(len, &BigInt::zero())
    }

    /// Vector whose coordinates are independent draws of `sampler`.
    pub fn random<S, R>(len: usize, sampler: &S, rng: &mut R) -> Self
    where
        S: Sampler,
        R: RngCore + CryptoRng + ?Sized,
    {
        Vector((0..len).map(|_| sampler.sample(rng)).collect())
    }

    /// Same as [`Vector::random`] for public, pseudo-random material.
    pub fn random_public<S: PublicSampler>(len: usize, sampler: &mut S) -> Self {
        Vector((0..len).map(|_| sampler.sample()).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn coords(&self) -> &[BigInt] {
        &self.0
    }

    pub fn into_coords(self) -> Vec<BigInt> {
        self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BigInt> {
        self.0.iter()
    }

    fn check_same_len(&self, other: &Vector) -> Result<()> {
        if self.len() != other.len() {
            return Err(malformed!(
                "vector lengths differ: {} and {}",
                self.len(),
                other.len()
            ));
        }
        Ok(())
    }

    pub fn dot(&self, other: &Vector) -> Result<BigInt> {
        self.check_same_len(other)?;
        Ok(self.iter().zip(other.iter()).map(|(a, b)| a * b).sum())
    }

    pub fn add(&self, other: &Vector) -> Result<Vector> {
        self.check_same_len(other)?;
        Ok(Vector(self.iter().zip(other.iter()).map(|(a, b)| a + b).collect()))
    }

    pub fn sub(&self, other: &Vector) -> Result<Vector> {
        self.check_same_len(other)?;
        Ok(Vector(self.iter().zip(other.iter()).map(|(a, b)| a - b).collect()))
    }

    pub fn neg(&self) -> Vector {
        self.apply(|x| -x)
    }

    pub fn mul_scalar(&self, k: &BigInt) -> Vector {
        self.apply(|x| x * k)
    }

    /// Reduces every coordinate into `[0, modulus)`.
    ///
    /// # Panics
    ///
    /// If `modulus` is zero, as `BigInt` division does.
    pub fn modulo(&self, modulus: &BigInt) -> Vector {
        self.apply(|x| x.mod_floor(modulus))
    }

    pub fn apply<F: Fn(&BigInt) -> BigInt>(&self, f: F) -> Vector {
        Vector(self.iter().map(f).collect())
    }

    /// Concatenation of `self` and `other`.
    pub fn concat(&self, other: &Vector) -> Vector {
        Vector(self.iter().chain(other.iter()).cloned().collect())
    }

    /// Fails with [`FeError::BoundViolation`] unless every coordinate is
    /// strictly smaller than `bound` in absolute value.
    pub fn check_bound(&self, bound: &BigInt) -> Result<()> {
        if self.iter().all(|x| x.abs() < *bound) {
            Ok(())
        } else {
            Err(FeError::BoundViolation)
        }
    }

    /// Product of `self` and `other` seen as coefficient vectors of
    /// polynomials in `Z[x] / (x^N + 1)`, `N` being their common length.
    pub fn mul_as_poly_in_ring(&self, other: &Vector) -> Result<Vector> {
        self.check_same_len(other)?;
        let n = self.len();
        if n == 0 {
            return Err(malformed!("empty polynomial"));
        }

        let mut res = vec![BigInt::zero(); n];
        for (i, a) in self.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in other.iter().enumerate() {
                let k = i + j;
                // x^N = -1
                if k < n {
                    res[k] += a * b;
                } else {
                    res[k - n] -= a * b;
                }
            }
        }
        Ok(Vector(res))
    }
}

impl Index<usize> for Vector {
    type Output = BigInt;

    fn index(&self, i: usize) -> &BigInt {
        &self.0[i]
    }
}

impl From<Vec<BigInt>> for Vector {
    fn from(coords: Vec<BigInt>) -> Self {
        Vector(coords)
    }
}

impl From<Vec<i64>> for Vector {
    fn from(coords: Vec<i64>) -> Self {
        Vector(coords.into_iter().map(BigInt::from).collect())
    }
}

impl FromIterator<BigInt> for Vector {
    fn from_iter<I: IntoIterator<Item = BigInt>>(iter: I) -> Self {
        Vector(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Vector {
    type Item = &'a BigInt;
    type IntoIter = std::slice::Iter<'a, BigInt>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
