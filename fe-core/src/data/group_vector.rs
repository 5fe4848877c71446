use std::ops::Index;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use super::Vector;
use crate::error::{Result, malformed};
use crate::group::{Ec, G1, G2, Gt};
use crate::traits::CyclicGroup;

/// Vector of group elements; scalar multiplication and the group law take
/// the place of integer product and sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVector<G>(Vec<G>);

pub type VectorEc = GroupVector<Ec>;
pub type VectorG1 = GroupVector<G1>;
pub type VectorG2 = GroupVector<G2>;
pub type VectorGt = GroupVector<Gt>;

impl<G: CyclicGroup> GroupVector<G> {
    pub fn new(elems: Vec<G>) -> Self {
        GroupVector(elems)
    }

    /// `[v₀·g, v₁·g, ...]`.
    pub fn from_scalars(v: &Vector, g: &G) -> Self {
        GroupVector(v.iter().map(|x| g.scalar_mult(x)).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, G> {
        self.0.iter()
    }

    pub fn elems(&self) -> &[G] {
        &self.0
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        if self.len() != other.len() {
            return Err(malformed!(
                "vector lengths differ: {} and {}",
                self.len(),
                other.len()
            ));
        }
        Ok(GroupVector(
            self.iter().zip(other.iter()).map(|(a, b)| a.add(b)).collect(),
        ))
    }

    pub fn neg(&self) -> Self {
        GroupVector(self.iter().map(G::neg).collect())
    }

    /// Multiplies every element by the same scalar.
    pub fn scalar_mult(&self, k: &BigInt) -> Self {
        GroupVector(self.iter().map(|p| p.scalar_mult(k)).collect())
    }

    /// Elementwise `kᵢ·Pᵢ`.
    pub fn mul_vector(&self, k: &Vector) -> Result<Self> {
        if self.len() != k.len() {
            return Err(malformed!(
                "{} group elements for {} scalars",
                self.len(),
                k.len()
            ));
        }
        Ok(GroupVector(
            self.iter().zip(k.iter()).map(|(p, x)| p.scalar_mult(x)).collect(),
        ))
    }

    /// `Σ kᵢ·Pᵢ`.
    pub fn mul_scalar_vector(&self, k: &Vector) -> Result<G> {
        Ok(self.mul_vector(k)?.sum())
    }

    /// Sum of all elements.
    pub fn sum(&self) -> G {
        self.iter().fold(G::identity(), |acc, p| acc.add(p))
    }
}

impl<G> Index<usize> for GroupVector<G> {
    type Output = G;

    fn index(&self, i: usize) -> &G {
        &self.0[i]
    }
}

impl<G> FromIterator<G> for GroupVector<G> {
    fn from_iter<I: IntoIterator<Item = G>>(iter: I) -> Self {
        GroupVector(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_scalars_matches_scalar_base_mult() {
        let v = Vector::from(vec![3, -7, 0]);
        let ec = VectorEc::from_scalars(&v, &Ec::base());

        assert_eq!(ec.len(), 3);
        assert_eq!(ec[1], Ec::scalar_base_mult(&BigInt::from(-7)));
        assert!(ec[2].is_identity());
    }

    #[test]
    fn test_mul_scalar_vector_is_inner_product_in_exponent() {
        let x = Vector::from(vec![2, -5, 11]);
        let y = Vector::from(vec![4, 6, -1]);
        let gx = VectorG1::from_scalars(&x, &G1::base());

        let expected = G1::scalar_base_mult(&x.dot(&y).unwrap());
        assert_eq!(gx.mul_scalar_vector(&y).unwrap(), expected);
        assert!(gx.mul_scalar_vector(&Vector::from(vec![1])).is_err());
    }

    #[test]
    fn test_add_neg_and_scale() {
        let g = Ec::base();
        let a = VectorEc::from_scalars(&Vector::from(vec![1, 2]), &g);
        let b = VectorEc::from_scalars(&Vector::from(vec![10, -2]), &g);

        let sum = a.add(&b).unwrap();
        assert_eq!(sum, VectorEc::from_scalars(&Vector::from(vec![11, 0]), &g));
        assert!(a.add(&a.neg()).unwrap().iter().all(|p| p.is_identity()));
        assert_eq!(
            a.scalar_mult(&BigInt::from(3)),
            VectorEc::from_scalars(&Vector::from(vec![3, 6]), &g)
        );
        assert!(a.add(&VectorEc::new(vec![g])).is_err());
    }
}
