use std::fmt::Debug;
use std::hash::Hash;

use num_bigint::{BigInt, BigUint};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which point arithmetic a group element uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKind {
    /// Prime-order elliptic curve group (Ristretto).
    Ec,
    /// One of the groups of the BLS12-381 pairing (G1, G2 or GT).
    Pairing,
}

/// Capability every cyclic group used by the engines must offer.
///
/// The group is written additively: `add` is the group law and
/// `scalar_mult` is repeated addition, whatever the underlying
/// representation.
pub trait CyclicGroup: Clone + PartialEq + Debug + Send + Sync {
    /// Hashable canonical encoding, used as key of discrete-log tables.
    /// Distinct elements must map to distinct keys.
    type Key: Hash + Eq + Clone + Debug + Send + Sync;

    const KIND: GroupKind;

    /// The fixed generator of the group.
    fn generator() -> Self;
    /// The neutral element.
    fn identity() -> Self;
    /// Prime order of the group.
    fn order() -> BigUint;

    fn add(&self, other: &Self) -> Self;
    fn neg(&self) -> Self;
    /// Computes `k·self` for a signed `k`.
    fn scalar_mult(&self, k: &BigInt) -> Self;
    fn table_key(&self) -> Result<Self::Key>;

    fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    fn scalar_base_mult(k: &BigInt) -> Self {
        Self::generator().scalar_mult(k)
    }
}

/// Sampler fit for secret material: every draw comes from a caller
/// supplied cryptographic RNG.
///
/// Implementations are immutable once built, so a single instance can be
/// shared by many threads as long as each brings its own RNG.
pub trait Sampler {
    fn sample<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> BigInt;
}

/// Sampler for public values only. It owns a seeded, non-cryptographic
/// generator, so it deliberately does not implement [`Sampler`].
pub trait PublicSampler {
    fn sample(&mut self) -> BigInt;
}
