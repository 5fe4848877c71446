use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;
use rand::{CryptoRng, RngCore};

use crate::traits::Sampler;

/// `sqrt(1 / (2 ln 2))`, for which the Gaussian weight of `x` is `2^(-x²)`.
pub const SIGMA_CDT: f64 = 0.849_321_800_288_019_1;

// 2^(-x²) is below 2^-64 from x = 9 on
const CDT_LEN: u32 = 10;

lazy_static::lazy_static! {
    // Fixed point with 128 fractional bits keeps every weight exact.
    static ref CDT: Vec<u64> = {
        let weights: Vec<BigUint> = (0..CDT_LEN).map(|x| BigUint::from(1u8) << (128 - x * x)).collect();
        let total: BigUint = weights.iter().sum();

        let mut acc = BigUint::from(0u8);
        weights
            .iter()
            .map(|w| {
                acc += w;
                ((&acc << 64u32) / &total).to_u64().unwrap_or(u64::MAX)
            })
            .collect()
    };
}

/// Half-Gaussian over the non-negative integers with the fixed deviation
/// [`SIGMA_CDT`], by inversion of a constant cumulative table.
///
/// Used as the first stage of [`super::NormalDoubleConstant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalCdt;

impl NormalCdt {
    pub(crate) fn sample_u64<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> u64 {
        let u = rng.next_u64();
        let idx = CDT.partition_point(|&t| t <= u);
        idx.min(CDT.len() - 1) as u64
    }
}

impl Sampler for NormalCdt {
    fn sample<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> BigInt {
        BigInt::from(self.sample_u64(rng))
    }
}
