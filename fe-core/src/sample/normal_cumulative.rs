use num_bigint::BigInt;
use rand::{CryptoRng, RngCore};

use crate::error::{Result, malformed};
use crate::traits::Sampler;

// Larger tables belong to the two-stage samplers.
const MAX_TABLE_LEN: usize = 1 << 22;

/// Discrete Gaussian through a precomputed cumulative table.
///
/// Fits small, arbitrary `sigma`. The table covers `[0, ⌈sigma·tail_cut⌉]`,
/// so values beyond the tail are never produced. With `two_sided` the
/// output is symmetric around zero, otherwise only the non-negative half is
/// sampled.
#[derive(Debug, Clone)]
pub struct NormalCumulative {
    sigma: f64,
    two_sided: bool,
    // thresholds[i] = 2^64 · P(|X| <= i)
    thresholds: Vec<u64>,
}

impl NormalCumulative {
    pub fn new(sigma: f64, tail_cut: f64, two_sided: bool) -> Result<Self> {
        if !(sigma.is_finite() && sigma > 0.0) || !(tail_cut.is_finite() && tail_cut > 0.0) {
            return Err(malformed!(
                "invalid gaussian parameters sigma={} tail_cut={}",
                sigma,
                tail_cut
            ));
        }

        let cut = (sigma * tail_cut).ceil();
        if cut >= MAX_TABLE_LEN as f64 {
            return Err(malformed!("sigma {} too large for a cumulative table", sigma));
        }
        let cut = cut as usize;

        let two_sigma_sq = 2.0 * sigma * sigma;
        let mut weights: Vec<f64> = (0..=cut)
            .map(|x| (-((x * x) as f64) / two_sigma_sq).exp())
            .collect();
        if two_sided {
            // zero is reached through both signs
            weights[0] /= 2.0;
        }

        let total: f64 = weights.iter().sum();
        let scale = u64::MAX as f64;
        let mut acc = 0.0;
        let mut thresholds: Vec<u64> = weights
            .iter()
            .map(|w| {
                acc += w;
                (acc / total * scale) as u64
            })
            .collect();
        if let Some(last) = thresholds.last_mut() {
            *last = u64::MAX;
        }

        Ok(NormalCumulative {
            sigma,
            two_sided,
            thresholds,
        })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Largest absolute value the sampler can output.
    pub fn cut(&self) -> usize {
        self.thresholds.len() - 1
    }

    pub(crate) fn sample_u64<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> u64 {
        let u = rng.next_u64();
        let idx = self.thresholds.partition_point(|&t| t <= u);
        idx.min(self.cut()) as u64
    }
}

impl Sampler for NormalCumulative {
    fn sample<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> BigInt {
        let x = BigInt::from(self.sample_u64(rng));
        if self.two_sided && rng.next_u32() & 1 == 1 {
            -x
        } else {
            x
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::stats::{assert_close_to_gaussian, moments};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_sigma_50() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let sampler = NormalCumulative::new(50.0, 6.0, true).unwrap();

        let samples: Vec<BigInt> = (0..100_000).map(|_| sampler.sample(&mut rng)).collect();
        let (mean, std, max_abs) = moments(&samples);

        assert!(mean.abs() < 1.0, "mean {}", mean);
        assert!((std - 50.0).abs() < 1.5, "std {}", std);
        assert!(max_abs <= 300);
    }

    #[test]
    fn test_statistical_distance() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let sampler = NormalCumulative::new(4.0, 8.0, true).unwrap();

        let samples: Vec<BigInt> = (0..200_000).map(|_| sampler.sample(&mut rng)).collect();
        assert_close_to_gaussian(&samples, 4.0);
    }

    #[test]
    fn test_one_sided_is_non_negative() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let sampler = NormalCumulative::new(2.5, 4.0, false).unwrap();
        assert_eq!(sampler.cut(), 10);

        for _ in 0..10_000 {
            let x = sampler.sample(&mut rng);
            assert!(x >= BigInt::from(0) && x <= BigInt::from(10));
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(NormalCumulative::new(0.0, 6.0, true).is_err());
        assert!(NormalCumulative::new(1.0, -1.0, true).is_err());
        assert!(NormalCumulative::new(f64::NAN, 6.0, true).is_err());
        assert!(NormalCumulative::new(1e9, 6.0, true).is_err());
    }
}
