use num_bigint::{BigInt, RandBigInt};
use num_traits::{Signed, Zero};
use rand::rngs::SmallRng;
use rand::{CryptoRng, RngCore, SeedableRng};

use crate::error::{Result, malformed};
use crate::traits::{PublicSampler, Sampler};

/// Uniform values in the half-open interval `[min, max)`.
///
/// Draws go through rejection sampling, so the output carries no modulo
/// bias.
#[derive(Debug, Clone)]
pub struct UniformRange {
    min: BigInt,
    max: BigInt,
}

impl UniformRange {
    pub fn new(min: &BigInt, max: &BigInt) -> Result<Self> {
        if min >= max {
            return Err(malformed!("empty sampling interval [{}, {})", min, max));
        }
        Ok(UniformRange {
            min: min.clone(),
            max: max.clone(),
        })
    }
}

impl Sampler for UniformRange {
    fn sample<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> BigInt {
        rng.gen_bigint_range(&self.min, &self.max)
    }
}

/// Uniform values in `[0, max)`.
#[derive(Debug, Clone)]
pub struct Uniform {
    max: BigInt,
}

impl Uniform {
    pub fn new(max: &BigInt) -> Result<Self> {
        if !max.is_positive() {
            return Err(malformed!("upper bound must be positive, got {}", max));
        }
        Ok(Uniform { max: max.clone() })
    }
}

impl Sampler for Uniform {
    fn sample<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> BigInt {
        rng.gen_bigint_range(&BigInt::zero(), &self.max)
    }
}

/// A single uniform bit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bit;

impl Sampler for Bit {
    fn sample<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> BigInt {
        BigInt::from(rng.next_u32() & 1)
    }
}

/// Uniform values in `[0, max)` drawn from a fast, seeded, non-cryptographic
/// generator.
///
/// Only for public material such as the random matrix of an LWE public key.
/// It owns its generator, so sharing one instance between threads needs
/// external synchronisation.
#[derive(Debug, Clone)]
pub struct PseudoUniform {
    max: BigInt,
    rng: SmallRng,
}

impl PseudoUniform {
    /// Seeds the generator from the operating system.
    pub fn new(max: &BigInt) -> Result<Self> {
        Self::with_rng(max, SmallRng::from_entropy())
    }

    /// Deterministic stream, e.g. to let both parties expand the same matrix.
    pub fn from_seed(max: &BigInt, seed: u64) -> Result<Self> {
        Self::with_rng(max, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(max: &BigInt, rng: SmallRng) -> Result<Self> {
        if !max.is_positive() {
            return Err(malformed!("upper bound must be positive, got {}", max));
        }
        Ok(PseudoUniform {
            max: max.clone(),
            rng,
        })
    }
}

impl PublicSampler for PseudoUniform {
    fn sample(&mut self) -> BigInt {
        self.rng.gen_bigint_range(&BigInt::zero(), &self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_uniform_range_has_no_bias() {
        let mut rng = ChaCha20Rng::seed_from_u64(0x5eed);
        let sampler = UniformRange::new(&BigInt::from(-9), &BigInt::from(10)).unwrap();

        const DRAWS: usize = 1_000_000;
        let mut counts = [0usize; 19];
        for _ in 0..DRAWS {
            let x = sampler.sample(&mut rng);
            assert!(x >= BigInt::from(-9) && x < BigInt::from(10));
            let idx: i64 = (x + 9i32).try_into().unwrap();
            counts[idx as usize] += 1;
        }

        let expected = DRAWS as f64 / 19.0;
        let chi2: f64 = counts
            .iter()
            .map(|&c| (c as f64 - expected).powi(2) / expected)
            .sum();
        // 18 degrees of freedom, the 0.99999 quantile is about 50
        assert!(chi2 < 55.0, "chi-square statistic {} too large", chi2);
    }

    #[test]
    fn test_empty_interval_rejected() {
        assert!(UniformRange::new(&BigInt::from(3), &BigInt::from(3)).is_err());
        assert!(Uniform::new(&BigInt::from(0)).is_err());
        assert!(PseudoUniform::new(&BigInt::from(-4)).is_err());
    }

    #[test]
    fn test_bit() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let ones = (0..10_000)
            .map(|_| Bit.sample(&mut rng))
            .filter(|b| *b == BigInt::from(1))
            .count();
        assert!((4_700..5_300).contains(&ones));
    }

    #[test]
    fn test_pseudo_uniform_seeded_stream() {
        let max = BigInt::from(1_000_003);
        let mut a = PseudoUniform::from_seed(&max, 42).unwrap();
        let mut b = PseudoUniform::from_seed(&max, 42).unwrap();

        for _ in 0..100 {
            let x = a.sample();
            assert_eq!(x, b.sample());
            assert!(!x.is_negative() && x < max);
        }
    }
}
