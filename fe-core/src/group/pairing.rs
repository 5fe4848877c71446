use ark_bls12_381::{Bls12_381, Fr, G1Projective, G2Projective};
use ark_ec::Group;
use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ff::{BigInteger, PrimeField, Zero};
use ark_serialize::CanonicalSerialize;
use num_bigint::{BigInt, BigUint, RandBigInt};
use rand::{CryptoRng, RngCore};

use super::split_scalar;
use crate::error::{FeError, Result};
use crate::traits::{CyclicGroup, GroupKind};

lazy_static::lazy_static! {
    // G1, G2 and GT all share the order of the scalar field
    static ref PAIRING_ORDER: BigUint = BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le());
}

/// Maps a signed integer to the scalar field, reducing modulo its order.
pub(crate) fn to_fr(k: &BigInt) -> Fr {
    let (abs, negative) = split_scalar(k, &PAIRING_ORDER);
    let f = Fr::from_le_bytes_mod_order(&abs.to_bytes_le());
    if negative { -f } else { f }
}

fn compressed<T: CanonicalSerialize>(v: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(v.compressed_size());
    v.serialize_compressed(&mut buf)
        .map_err(|e| FeError::Serialization(e.to_string()))?;
    Ok(buf)
}

macro_rules! pairing_group {
    ($(#[$meta:meta])* $name:ident, $inner:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub(crate) $inner);

        impl $name {
            pub fn base() -> Self {
                $name(<$inner>::generator())
            }

            pub fn unit() -> Self {
                $name(<$inner>::zero())
            }

            pub fn random<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Self {
                let k = BigInt::from(rng.gen_biguint_below(&PAIRING_ORDER));
                Self::base().scalar_mult(&k)
            }
        }

        impl CyclicGroup for $name {
            type Key = Vec<u8>;

            const KIND: GroupKind = GroupKind::Pairing;

            fn generator() -> Self {
                Self::base()
            }

            fn identity() -> Self {
                Self::unit()
            }

            fn order() -> BigUint {
                PAIRING_ORDER.clone()
            }

            fn add(&self, other: &Self) -> Self {
                $name(self.0 + other.0)
            }

            fn neg(&self) -> Self {
                $name(-self.0)
            }

            fn scalar_mult(&self, k: &BigInt) -> Self {
                $name(self.0 * to_fr(k))
            }

            fn table_key(&self) -> Result<Self::Key> {
                compressed(&self.0)
            }
        }
    };
}

pairing_group!(
    /// Element of the first source group of BLS12-381.
    G1,
    G1Projective
);
pairing_group!(
    /// Element of the second source group of BLS12-381.
    G2,
    G2Projective
);
pairing_group!(
    /// Element of the target group of BLS12-381, written additively.
    Gt,
    PairingOutput<Bls12_381>
);

/// Bilinear map `e(a, b)`, with `e(G1::base(), G2::base()) == Gt::base()`.
pub fn pair(a: &G1, b: &G2) -> Gt {
    Gt(Bls12_381::pairing(a.0, b.0))
}

/// Computes `Σ e(aᵢ, bᵢ)` with a single final exponentiation.
pub fn pair_sum(pairs: &[(G1, G2)]) -> Gt {
    if pairs.is_empty() {
        return Gt::unit();
    }
    let lhs = pairs.iter().map(|(a, _)| a.0);
    let rhs = pairs.iter().map(|(_, b)| b.0);
    Gt(Bls12_381::multi_pairing(lhs, rhs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_generators_pair_to_gt_generator() {
        assert_eq!(pair(&G1::base(), &G2::base()), Gt::base());
    }

    #[test]
    fn test_bilinearity() {
        let a = BigInt::from(-12);
        let b = BigInt::from(35);

        let lhs = pair(&G1::base().scalar_mult(&a), &G2::base().scalar_mult(&b));
        let rhs = Gt::base().scalar_mult(&(&a * &b));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_pair_sum_matches_sum_of_pairings() {
        let pairs: Vec<(G1, G2)> = (0..3)
            .map(|_| (G1::random(&mut OsRng), G2::random(&mut OsRng)))
            .collect();

        let expected = pairs
            .iter()
            .fold(Gt::unit(), |acc, (a, b)| acc.add(&pair(a, b)));
        assert_eq!(pair_sum(&pairs), expected);
        assert_eq!(pair_sum(&[]), Gt::unit());
    }

    #[test]
    fn test_order_annihilates() {
        let order = BigInt::from(Gt::order());
        assert!(G1::base().scalar_mult(&order).is_identity());
        assert!(Gt::base().scalar_mult(&order).is_identity());
        assert_eq!(G2::base().scalar_mult(&(order - 1)), G2::base().neg());
    }

    #[test]
    fn test_table_key_is_canonical() {
        // same element reached through different projective representations
        let a = G1::base().scalar_mult(&BigInt::from(7));
        let b = G1::base()
            .scalar_mult(&BigInt::from(3))
            .add(&G1::base().scalar_mult(&BigInt::from(4)));
        assert_eq!(a.table_key().unwrap(), b.table_key().unwrap());
        assert_ne!(a.table_key().unwrap(), a.neg().table_key().unwrap());
        assert_eq!(a.table_key().unwrap().len(), 48);
    }
}
