use std::f64::consts::LN_2;

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_traits::{ToPrimitive, Zero};
use rand::{CryptoRng, RngCore};

use super::{MAX_REJECTIONS, NormalCdt, SIGMA_CDT, bernoulli_exp, ceil_mul, ratio};
use crate::error::{Result, malformed};
use crate::traits::Sampler;

/// Discrete Gaussian with deviation `k·SIGMA_CDT` for an integer `k`.
///
/// Same two-stage scheme as [`super::NormalDouble`], with the constant
/// table of [`NormalCdt`] as first stage. Since `2σ² = k²/ln 2`, the
/// acceptance exponent is `y·(2kx + y)·ln 2 / k²`.
#[derive(Debug, Clone)]
pub struct NormalDoubleConstant {
    k: BigUint,
    k_sq: BigUint,
    cut: BigUint,
}

impl NormalDoubleConstant {
    pub fn new(k: &BigUint, tail_cut: f64) -> Result<Self> {
        if k.is_zero() {
            return Err(malformed!("k must be positive"));
        }
        if !(tail_cut.is_finite() && tail_cut > 0.0) {
            return Err(malformed!("invalid tail cut {}", tail_cut));
        }

        Ok(NormalDoubleConstant {
            k: k.clone(),
            k_sq: k * k,
            cut: ceil_mul(k, SIGMA_CDT * tail_cut),
        })
    }

    /// Deviation of the output distribution.
    pub fn sigma(&self) -> f64 {
        self.k.to_f64().unwrap_or(f64::INFINITY) * SIGMA_CDT
    }
}

impl Sampler for NormalDoubleConstant {
    fn sample<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> BigInt {
        for _ in 0..MAX_REJECTIONS {
            let x = BigUint::from(NormalCdt.sample_u64(rng));
            let y = rng.gen_biguint_below(&self.k);
            let negative = rng.next_u32() & 1 == 1;

            let kx = &self.k * &x;
            let check = &y * ((&kx << 1u32) + &y);
            let accept = match ratio(&check, &self.k_sq) {
                Some(t) => bernoulli_exp(rng, t * LN_2),
                None => false,
            };
            if !accept {
                continue;
            }

            let z = kx + y;
            if (z.is_zero() && negative) || z > self.cut {
                continue;
            }

            let z = BigInt::from(z);
            return if negative { -z } else { z };
        }

        panic!("gaussian rejection loop exceeded {} iterations", MAX_REJECTIONS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::stats::{assert_close_to_gaussian, moments};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_sigma_about_50() {
        let mut rng = ChaCha20Rng::seed_from_u64(31);
        // 59 · 0.8493 ≈ 50.1
        let sampler = NormalDoubleConstant::new(&BigUint::from(59u32), 6.0).unwrap();
        let sigma = sampler.sigma();

        let samples: Vec<BigInt> = (0..100_000).map(|_| sampler.sample(&mut rng)).collect();
        let (mean, std, max_abs) = moments(&samples);

        assert!(mean.abs() < 1.0, "mean {}", mean);
        assert!((std - sigma).abs() < 0.03 * sigma, "std {} vs {}", std, sigma);
        assert!(max_abs as f64 <= (sigma * 6.0).ceil());
    }

    #[test]
    fn test_statistical_distance() {
        let mut rng = ChaCha20Rng::seed_from_u64(32);
        let sampler = NormalDoubleConstant::new(&BigUint::from(5u32), 10.0).unwrap();

        let samples: Vec<BigInt> = (0..200_000).map(|_| sampler.sample(&mut rng)).collect();
        assert_close_to_gaussian(&samples, sampler.sigma());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(NormalDoubleConstant::new(&BigUint::from(0u32), 6.0).is_err());
        assert!(NormalDoubleConstant::new(&BigUint::from(3u32), 0.0).is_err());
    }
}
