use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::Zero;
use rand::{CryptoRng, RngCore};

use super::{MAX_REJECTIONS, NormalCumulative, bernoulli_exp, ceil_mul, ratio};
use crate::error::{Result, malformed};
use crate::traits::Sampler;

/// Discrete Gaussian for a large integer `sigma`, set at scheme setup.
///
/// Two stages: a coarse candidate `k·x` with `x` drawn from a small
/// half-Gaussian of deviation `first_sigma = sigma / k`, refined by a
/// uniform `y ∈ [0, k)`. The candidate `k·x + y` is then kept with
/// probability `exp(-(y·(2kx + y)) / (2·sigma²))`, which corrects the
/// proposal to the target distribution exactly. Candidates beyond
/// `⌈sigma·tail_cut⌉` are resampled.
#[derive(Debug, Clone)]
pub struct NormalDouble {
    sigma: BigUint,
    k: BigUint,
    first: NormalCumulative,
    two_sigma_sq: BigUint,
    cut: BigUint,
}

impl NormalDouble {
    pub fn new(sigma: &BigUint, first_sigma: u64, tail_cut: f64) -> Result<Self> {
        if first_sigma == 0 {
            return Err(malformed!("first sigma must be positive"));
        }
        let (k, rem) = sigma.div_rem(&BigUint::from(first_sigma));
        if k.is_zero() || !rem.is_zero() {
            return Err(malformed!(
                "sigma {} is not a positive multiple of {}",
                sigma,
                first_sigma
            ));
        }

        let first = NormalCumulative::new(first_sigma as f64, tail_cut, false)?;
        let two_sigma_sq = sigma * sigma * 2u32;
        let cut = ceil_mul(sigma, tail_cut);

        Ok(NormalDouble {
            sigma: sigma.clone(),
            k,
            first,
            two_sigma_sq,
            cut,
        })
    }

    pub fn sigma(&self) -> &BigUint {
        &self.sigma
    }
}

impl Sampler for NormalDouble {
    fn sample<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> BigInt {
        let two_k = &self.k << 1u32;

        for _ in 0..MAX_REJECTIONS {
            let x = BigUint::from(self.first.sample_u64(rng));

            // low bit is the sign, the rest is uniform in [0, k)
            let y = rng.gen_biguint_below(&two_k);
            let negative = y.bit(0);
            let y = y >> 1u32;

            let kx = &self.k * &x;
            let check = &y * ((&kx << 1u32) + &y);
            let accept = match ratio(&check, &self.two_sigma_sq) {
                Some(t) => bernoulli_exp(rng, t),
                None => false,
            };
            if !accept {
                continue;
            }

            let z = kx + y;
            // zero is reachable with both signs
            if z.is_zero() && negative {
                continue;
            }
            if z > self.cut {
                continue;
            }

            let z = BigInt::from(z);
            return if negative { -z } else { z };
        }

        panic!("gaussian rejection loop exceeded {} iterations", MAX_REJECTIONS);
    }
}
