use log::debug;
use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, Rng, RngCore};

use crate::error::{FeError, Result, malformed};

const MR_ROUNDS: usize = 32;
const SIEVE_LIMIT: usize = 2048;

lazy_static::lazy_static! {
    static ref SMALL_PRIMES: Vec<u32> = {
        let mut composite = vec![false; SIEVE_LIMIT];
        let mut primes = Vec::new();
        for i in 2..SIEVE_LIMIT {
            if !composite[i] {
                primes.push(i as u32);
                for j in (i * i..SIEVE_LIMIT).step_by(i) {
                    composite[j] = true;
                }
            }
        }
        primes
    };
}

fn attempt_budget(bits: u64) -> u64 {
    64 * bits * bits
}

// Some(true) if n is one of the sieve primes, Some(false) if a sieve prime
// divides it, None if the sieve is inconclusive.
fn sieve(n: &BigUint) -> Option<bool> {
    for &p in SMALL_PRIMES.iter() {
        if (n % p).is_zero() {
            return Some(*n == BigUint::from(p));
        }
    }
    None
}

fn miller_rabin<R: Rng + ?Sized>(n: &BigUint, rounds: usize, rng: &mut R) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u8);
    let n_minus_one = n - &one;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Probabilistic primality test: trial division by small primes followed by
/// Miller-Rabin with random bases.
pub fn is_probable_prime(n: &BigUint) -> bool {
    if *n < BigUint::from(2u8) {
        return false;
    }
    match sieve(n) {
        Some(res) => res,
        None => miller_rabin(n, MR_ROUNDS, &mut rand::thread_rng()),
    }
}

fn random_odd_with_bits<R: RngCore + CryptoRng + ?Sized>(rng: &mut R, bits: u64) -> BigUint {
    let mut x = rng.gen_biguint(bits);
    x.set_bit(bits - 1, true);
    x.set_bit(0, true);
    x
}

/// Random prime of exactly `bits` bits.
pub fn random_prime<R: RngCore + CryptoRng + ?Sized>(rng: &mut R, bits: u64) -> Result<BigUint> {
    if bits < 2 {
        return Err(malformed!("a prime needs at least 2 bits, got {}", bits));
    }

    for attempt in 1..=attempt_budget(bits) {
        let candidate = random_odd_with_bits(rng, bits);
        if is_probable_prime(&candidate) {
            debug!("found {}-bit prime after {} attempts", bits, attempt);
            return Ok(candidate);
        }
    }
    Err(FeError::ParameterGeneration(format!("no {}-bit prime found", bits)))
}

/// Random safe prime `p = 2q + 1` of exactly `bits` bits, with `q` prime.
pub fn random_safe_prime<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    bits: u64,
) -> Result<BigUint> {
    if bits < 3 {
        return Err(malformed!("a safe prime needs at least 3 bits, got {}", bits));
    }

    let one = BigUint::one();
    for attempt in 1..=attempt_budget(bits) {
        let q = random_odd_with_bits(rng, bits - 1);
        let p: BigUint = (&q << 1usize) + &one;

        // cheap rejection of both q and p before any exponentiation
        let divisible = SMALL_PRIMES.iter().any(|&s| {
            let small = BigUint::from(s);
            (q != small && (&q % s).is_zero()) || (p != small && (&p % s).is_zero())
        });
        if divisible {
            continue;
        }

        if is_probable_prime(&q) && is_probable_prime(&p) {
            debug!("found {}-bit safe prime after {} attempts", bits, attempt);
            return Ok(p);
        }
    }
    Err(FeError::ParameterGeneration(format!("no {}-bit safe prime found", bits)))
}

/// Random prime `q` of exactly `bits` bits with `q ≡ 1 (mod modulus)`.
pub fn random_prime_congruent_one<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    bits: u64,
    modulus: &BigUint,
) -> Result<BigUint> {
    if modulus.is_zero() || modulus.bits() >= bits {
        return Err(malformed!(
            "modulus {} leaves no room for a {}-bit prime",
            modulus,
            bits
        ));
    }

    let one = BigUint::one();
    for attempt in 1..=attempt_budget(bits) {
        let x = rng.gen_biguint(bits);
        let candidate = &x - x.mod_floor(modulus) + &one;
        if candidate.bits() != bits {
            continue;
        }
        if is_probable_prime(&candidate) {
            debug!(
                "found {}-bit prime congruent to 1 mod {} after {} attempts",
                bits, modulus, attempt
            );
            return Ok(candidate);
        }
    }
    Err(FeError::ParameterGeneration(format!(
        "no {}-bit prime congruent to 1 mod {} found",
        bits, modulus
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_known_primes_and_composites() {
        let primes = [2u64, 3, 5, 2017, 65537, 2147483647, 18446744073709551557];
        for p in primes {
            assert!(is_probable_prime(&BigUint::from(p)), "{} is prime", p);
        }

        // 561 and 41041 are Carmichael numbers
        let composites = [0u64, 1, 4, 561, 41041, 2147483649, 18446744073709551615];
        for c in composites {
            assert!(!is_probable_prime(&BigUint::from(c)), "{} is composite", c);
        }
    }

    #[test]
    fn test_random_prime_size() {
        let p = random_prime(&mut OsRng, 96).unwrap();
        assert_eq!(p.bits(), 96);
        assert!(is_probable_prime(&p));
    }

    #[test]
    fn test_random_safe_prime() {
        let p = random_safe_prime(&mut OsRng, 64).unwrap();
        assert_eq!(p.bits(), 64);
        assert!(is_probable_prime(&p));
        assert!(is_probable_prime(&(&p >> 1)));
    }

    #[test]
    fn test_random_prime_congruent_one() {
        let m = BigUint::from(1024u32);
        let q = random_prime_congruent_one(&mut OsRng, 40, &m).unwrap();
        assert_eq!(q.bits(), 40);
        assert!(is_probable_prime(&q));
        assert_eq!(&q % &m, BigUint::one());
    }

    #[test]
    fn test_rejects_degenerate_sizes() {
        assert!(random_prime(&mut OsRng, 1).is_err());
        assert!(random_safe_prime(&mut OsRng, 2).is_err());
        assert!(random_prime_congruent_one(&mut OsRng, 10, &BigUint::from(1024u32)).is_err());
    }
}
