//! Samplers for secret and noise material.
//!
//! Every type here implements [`Sampler`] and draws from a caller supplied
//! cryptographic RNG, except [`PseudoUniform`] which owns a fast seeded
//! generator and only implements [`crate::traits::PublicSampler`].
//!
//! Discrete Gaussians come in two flavours:
//! * table based: [`NormalCdt`] (fixed deviation) and [`NormalCumulative`];
//! * two-stage rejection: [`NormalDouble`] and [`NormalDoubleConstant`],
//!   for large deviations computed at setup time.

mod normal_cdt;
mod normal_cumulative;
mod normal_double;
mod normal_double_constant;
mod uniform;

pub use normal_cdt::{NormalCdt, SIGMA_CDT};
pub use normal_cumulative::NormalCumulative;
pub use normal_double::NormalDouble;
pub use normal_double_constant::NormalDoubleConstant;
pub use uniform::{Bit, PseudoUniform, Uniform, UniformRange};

use std::f64::consts::LN_2;

use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;
use rand::{CryptoRng, RngCore};

use crate::traits::Sampler;

// Acceptance rates of the rejection samplers are above 1/2, so reaching
// this means a broken parameter set.
pub(crate) const MAX_REJECTIONS: usize = 1 << 20;

const FRAC_BITS: u32 = 20;

/// Bernoulli trial with success probability `exp(-t)`, `t >= 0`.
///
/// Writes `t = a·ln 2 + r` with `r < ln 2`: the trial succeeds when `a`
/// fresh random bits are all zero and a uniform `u` falls below `exp(-r)`.
pub fn bernoulli_exp<R: RngCore + ?Sized>(rng: &mut R, t: f64) -> bool {
    if t.is_nan() {
        return false;
    }
    if t <= 0.0 {
        return true;
    }

    let a = (t / LN_2).floor();
    // exp(-t) < 2^-1024
    if a > 1024.0 {
        return false;
    }
    let r = t - a * LN_2;

    let mut remaining = a as u32;
    while remaining >= 64 {
        if rng.next_u64() != 0 {
            return false;
        }
        remaining -= 64;
    }
    if remaining > 0 && rng.next_u64() & ((1u64 << remaining) - 1) != 0 {
        return false;
    }

    let u = (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
    u < (-r).exp()
}

// num/den as a float, or None when it exceeds 2^11 and exp(-num/den)
// vanishes in double precision anyway.
pub(crate) fn ratio(num: &BigUint, den: &BigUint) -> Option<f64> {
    let fixed = (num << 64u32) / den;
    if fixed.bits() > 64 + 11 {
        return None;
    }
    fixed.to_f64().map(|f| f / 2f64.powi(64))
}

// Upper bound on ⌈a·f⌉ for a non-negative float f.
pub(crate) fn ceil_mul(a: &BigUint, f: f64) -> BigUint {
    let f_fixed = BigUint::from((f * (1u64 << FRAC_BITS) as f64).ceil() as u64);
    let round = BigUint::from((1u64 << FRAC_BITS) - 1);
    (a * f_fixed + round) >> FRAC_BITS
}

/// Wraps a sampler to draw around `center` instead of zero.
#[derive(Debug, Clone)]
pub struct Shifted<S> {
    sampler: S,
    center: BigInt,
}

impl<S: Sampler> Shifted<S> {
    pub fn new(sampler: S, center: BigInt) -> Self {
        Shifted { sampler, center }
    }
}

impl<S: Sampler> Sampler for Shifted<S> {
    fn sample<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> BigInt {
        self.sampler.sample(rng) + &self.center
    }
}

#[cfg(test)]
pub(crate) mod stats {
    use std::collections::HashMap;

    use num_bigint::BigInt;
    use num_traits::{Signed, ToPrimitive};

    /// Mean, standard deviation and largest absolute value.
    pub fn moments(samples: &[BigInt]) -> (f64, f64, u64) {
        let n = samples.len() as f64;
        let values: Vec<f64> = samples.iter().map(|x| x.to_f64().unwrap()).collect();
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let max_abs = samples.iter().map(|x| x.abs().to_u64().unwrap()).max().unwrap_or(0);
        (mean, var.sqrt(), max_abs)
    }

    /// Total variation distance between the empirical distribution and the
    /// centered discrete Gaussian of deviation `sigma`.
    pub fn assert_close_to_gaussian(samples: &[BigInt], sigma: f64) {
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for x in samples {
            *counts.entry(x.to_i64().unwrap()).or_default() += 1;
        }

        let radius = (sigma * 12.0).ceil() as i64;
        let rho = |x: i64| (-((x * x) as f64) / (2.0 * sigma * sigma)).exp();
        let total: f64 = (-radius..=radius).map(rho).sum();

        let n = samples.len() as f64;
        let mut distance = 0.0;
        for x in -radius..=radius {
            let observed = *counts.get(&x).unwrap_or(&0) as f64 / n;
            distance += (observed - rho(x) / total).abs();
        }
        let outside: usize = counts
            .iter()
            .filter(|(x, _)| x.abs() > radius)
            .map(|(_, c)| c)
            .sum();
        distance += outside as f64 / n;

        assert!(distance / 2.0 < 0.02, "statistical distance {}", distance / 2.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn frequency(t: f64, trials: usize, rng: &mut ChaCha20Rng) -> f64 {
        (0..trials).filter(|_| bernoulli_exp(rng, t)).count() as f64 / trials as f64
    }

    #[test]
    fn test_bernoulli_exp() {
        let mut rng = ChaCha20Rng::seed_from_u64(41);
        for t in [0.1, 1.0, 3.5] {
            let f = frequency(t, 100_000, &mut rng);
            assert!((f - (-t).exp()).abs() < 0.01, "t={} freq={}", t, f);
        }
        assert_eq!(frequency(0.0, 1000, &mut rng), 1.0);
        assert_eq!(frequency(5000.0, 1000, &mut rng), 0.0);
    }

    #[test]
    fn test_ratio_and_ceil_mul() {
        let r = ratio(&BigUint::from(3u8), &BigUint::from(4u8)).unwrap();
        assert!((r - 0.75).abs() < 1e-12);
        assert!(ratio(&(BigUint::from(1u8) << 20u32), &BigUint::from(1u8)).is_none());

        assert_eq!(ceil_mul(&BigUint::from(50u8), 6.0), BigUint::from(300u32));
        assert_eq!(ceil_mul(&BigUint::from(10u8), 0.25), BigUint::from(3u32));
    }

    #[test]
    fn test_shifted() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let sampler = Shifted::new(NormalCumulative::new(2.0, 4.0, true).unwrap(), BigInt::from(1000));
        for _ in 0..1000 {
            let x = sampler.sample(&mut rng);
            assert!(x >= BigInt::from(992) && x <= BigInt::from(1008));
        }
    }
}
