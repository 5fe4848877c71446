use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use num_bigint::{BigInt, BigUint, RandBigInt};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use super::split_scalar;
use crate::error::Result;
use crate::traits::{CyclicGroup, GroupKind};

lazy_static::lazy_static! {
    // l = 2^252 + 27742317777372353535851937790883648493
    static ref RISTRETTO_ORDER: BigUint = BigUint::parse_bytes(
        b"7237005577332262213973186563042994240857116359379907606001950938285454250989",
        10,
    )
    .expect("the order of the Ristretto group is a valid decimal constant");
}

/// Element of the Ristretto group.
///
/// Identity and generator are fixed by the curve, see [`Ec::unit`] and
/// [`Ec::base`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ec(RistrettoPoint);

impl Ec {
    pub fn base() -> Self {
        Ec(RISTRETTO_BASEPOINT_POINT)
    }

    pub fn unit() -> Self {
        Ec(RistrettoPoint::identity())
    }

    /// Uniformly random element, as `k·G` for a uniform exponent `k`.
    pub fn random<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        let k = BigInt::from(rng.gen_biguint_below(&RISTRETTO_ORDER));
        Self::base().scalar_mult(&k)
    }

    pub fn point(&self) -> &RistrettoPoint {
        &self.0
    }
}

impl From<RistrettoPoint> for Ec {
    fn from(p: RistrettoPoint) -> Self {
        Ec(p)
    }
}

fn to_scalar(k: &BigUint) -> Scalar {
    let mut bytes = [0u8; 32];
    let le = k.to_bytes_le();
    bytes[..le.len()].copy_from_slice(&le);
    Scalar::from_bytes_mod_order(bytes)
}

impl CyclicGroup for Ec {
    type Key = [u8; 32];

    const KIND: GroupKind = GroupKind::Ec;

    fn generator() -> Self {
        Self::base()
    }

    fn identity() -> Self {
        Self::unit()
    }

    fn order() -> BigUint {
        RISTRETTO_ORDER.clone()
    }

    fn add(&self, other: &Self) -> Self {
        Ec(self.0 + other.0)
    }

    fn neg(&self) -> Self {
        Ec(-self.0)
    }

    fn scalar_mult(&self, k: &BigInt) -> Self {
        // k is reduced below the order, so it fits in 32 bytes
        let (abs, negative) = split_scalar(k, &RISTRETTO_ORDER);
        let p = Ec(self.0 * to_scalar(&abs));
        if negative { p.neg() } else { p }
    }

    fn table_key(&self) -> Result<Self::Key> {
        Ok(self.0.compress().to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_identity_and_negation() {
        let g = Ec::base();
        let p = Ec::random(&mut OsRng);

        assert_eq!(p.add(&Ec::unit()), p);
        assert!(p.add(&p.neg()).is_identity());
        assert_eq!(Ec::unit().neg(), Ec::unit());
        assert_eq!(g.sub(&g), Ec::unit());
    }

    #[test]
    fn test_scalar_mult_signed() {
        let g = Ec::base();
        let five = g.scalar_mult(&BigInt::from(5));
        let minus_five = g.scalar_mult(&BigInt::from(-5));

        assert_eq!(five, g.add(&g).add(&g).add(&g).add(&g));
        assert_eq!(minus_five, five.neg());
        assert!(five.add(&minus_five).is_identity());
        assert!(g.scalar_mult(&BigInt::from(0)).is_identity());
    }

    #[test]
    fn test_scalar_mult_by_order() {
        let g = Ec::base();
        let order = BigInt::from(Ec::order());

        assert!(g.scalar_mult(&order).is_identity());
        assert_eq!(g.scalar_mult(&(&order + 3)), g.scalar_mult(&BigInt::from(3)));
        assert_eq!(g.scalar_mult(&(&order - 1)), g.neg());
    }

    #[test]
    fn test_table_key_distinguishes() {
        let g = Ec::base();
        assert_eq!(g.table_key().unwrap(), Ec::base().table_key().unwrap());
        assert_ne!(g.table_key().unwrap(), g.neg().table_key().unwrap());
    }
}
