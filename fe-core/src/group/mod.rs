//! Group and ring arithmetic.
//!
//! * [`Ec`]: the Ristretto prime-order group over Curve25519.
//! * [`G1`], [`G2`], [`Gt`]: the groups of the BLS12-381 pairing, see [`pair`].
//! * Modular exponentiation that accepts negative exponents and prime
//!   generation for the schemes that need their own moduli.

mod ec;
mod pairing;
mod prime;

pub use ec::Ec;
pub use pairing::{G1, G2, Gt, pair, pair_sum};
pub use prime::{is_probable_prime, random_prime, random_prime_congruent_one, random_safe_prime};

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::Signed;

use crate::error::{Result, malformed};

/// Computes `base^exponent mod modulus`, where a negative exponent means
/// exponentiation of the modular inverse of `base`.
///
/// Fails with [`crate::FeError::NotInvertible`] if the exponent is negative
/// and `base` has no inverse modulo `modulus`.
pub fn mod_exp(base: &BigInt, exponent: &BigInt, modulus: &BigInt) -> Result<BigInt> {
    if modulus.sign() != Sign::Plus {
        return Err(malformed!("modulus must be positive, got {}", modulus));
    }

    if exponent.is_negative() {
        let inv = mod_inverse(base, modulus)?;
        Ok(inv.modpow(&exponent.abs(), modulus))
    } else {
        Ok(base.modpow(exponent, modulus))
    }
}

/// Inverse of `a` modulo `modulus`, in `[0, modulus)`.
pub fn mod_inverse(a: &BigInt, modulus: &BigInt) -> Result<BigInt> {
    if modulus.sign() != Sign::Plus {
        return Err(malformed!("modulus must be positive, got {}", modulus));
    }
    a.modinv(modulus).ok_or(crate::FeError::NotInvertible)
}

/// Canonical representative of `x` in `[0, modulus)`.
pub fn reduce(x: &BigInt, modulus: &BigInt) -> BigInt {
    x.mod_floor(modulus)
}

/// Signed representative of `x` in `(-modulus/2, modulus/2]`.
pub fn centered(x: &BigInt, modulus: &BigInt) -> BigInt {
    let r = x.mod_floor(modulus);
    if r > modulus / 2 { r - modulus } else { r }
}

// Absolute value reduced modulo the group order, plus whether the result
// must be negated afterwards.
pub(crate) fn split_scalar(k: &BigInt, order: &BigUint) -> (BigUint, bool) {
    (k.magnitude() % order, k.is_negative())
}
