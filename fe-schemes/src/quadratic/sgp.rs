//! Private-key quadratic functional encryption of Sans, Gay and
//! Pointcheval over the BLS12-381 pairing.
//!
//! The master key is a pair of vectors `(s, t)`. Encrypting `(x, y)`
//! hides each pair `(xᵢ, γ·sᵢ)` in G1 and `(yⱼ, -tⱼ)` in G2 behind a
//! random invertible 2×2 matrix `W`, so that pairing them gives
//! `xᵢ·yⱼ - γ·sᵢ·tⱼ`. The key for `F` is `sᵀ·F·t` in the exponent of G2,
//! which cancels the `γ` terms and leaves `xᵀ·F·y` in GT.

use fe_core::data::{Matrix, Vector};
use fe_core::dlog::{BabyStepGiantStep, DlogConfig};
use fe_core::group::{G1, G2, Gt, pair_sum};
use fe_core::sample::Uniform;
use fe_core::traits::{CyclicGroup, Sampler};
use fe_core::{FeError, Result};
use log::debug;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SgpParams {
    /// Length of x and y.
    pub n: usize,
    /// Strict bound on the coordinates of x, y and F.
    pub bound: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SgpSecretKey {
    pub s: Vector,
    pub t: Vector,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SgpCiphertext {
    pub g1_gamma: G1,
    pub a: Vec<[G1; 2]>,
    pub b: Vec<[G2; 2]>,
}

#[derive(Debug, Clone)]
pub struct Sgp {
    params: SgpParams,
    dlog: BabyStepGiantStep<Gt>,
}

fn order() -> BigInt {
    BigInt::from(G1::order())
}

// W·v mod p for a 2×2 matrix W.
fn mul2(w: &Matrix, v: [&BigInt; 2], p: &BigInt) -> Result<[BigInt; 2]> {
    let r = w.mul_vec(&Vector::new(vec![v[0].clone(), v[1].clone()]))?.modulo(p);
    Ok([r[0].clone(), r[1].clone()])
}

impl Sgp {
    pub fn new(n: usize, bound: &BigInt) -> Result<Self> {
        Self::from_params(SgpParams {
            n,
            bound: bound.clone(),
        })
    }

    pub fn from_params(params: SgpParams) -> Result<Self> {
        if params.n == 0 || !params.bound.is_positive() {
            return Err(FeError::MalformedInput(format!(
                "need a positive length and bound, got {} and {}",
                params.n, params.bound
            )));
        }

        // |xᵀ·F·y| < n²·bound³
        let n = BigInt::from(params.n);
        let max = &n * &n * &params.bound * &params.bound * &params.bound;
        if &max * 2 >= order() {
            return Err(FeError::ParameterGeneration(format!(
                "n²·bound³ = {} too large for the group order",
                max
            )));
        }
        let config = DlogConfig::in_pairing(max).with_neg();
        if !config.is_tractable() {
            return Err(FeError::ParameterGeneration(format!(
                "n²·bound³ = {} too large to decrypt by discrete log",
                config.bound
            )));
        }
        debug!("sgp set up for n = {}, bound = {}", params.n, params.bound);

        let dlog = BabyStepGiantStep::new(config)?;
        Ok(Sgp { params, dlog })
    }

    pub fn params(&self) -> &SgpParams {
        &self.params
    }

    /// Builds the discrete-log table in GT once for all decryptions.
    pub fn precompute(&mut self) -> Result<()> {
        self.dlog.precompute(&Gt::base())
    }

    fn check_vec(&self, v: &Vector) -> Result<()> {
        if v.len() != self.params.n {
            return Err(FeError::MalformedInput(format!(
                "expected a vector of length {}, got {}",
                self.params.n,
                v.len()
            )));
        }
        v.check_bound(&self.params.bound)
    }

    fn check_f(&self, f: &Matrix) -> Result<()> {
        if !f.check_dims(self.params.n, self.params.n) {
            return Err(FeError::MalformedInput(format!(
                "expected a {0}x{0} matrix",
                self.params.n
            )));
        }
        f.check_bound(&self.params.bound)
    }

    fn check_key(&self, msk: &SgpSecretKey) -> Result<()> {
        if msk.s.len() != self.params.n || msk.t.len() != self.params.n {
            return Err(FeError::MalformedSecKey);
        }
        Ok(())
    }

    pub fn generate_master_key<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<SgpSecretKey> {
        let sampler = Uniform::new(&order())?;
        Ok(SgpSecretKey {
            s: Vector::random(self.params.n, &sampler, rng),
            t: Vector::random(self.params.n, &sampler, rng),
        })
    }

    pub fn encrypt<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        x: &Vector,
        y: &Vector,
        msk: &SgpSecretKey,
    ) -> Result<SgpCiphertext> {
        self.check_vec(x)?;
        self.check_vec(y)?;
        self.check_key(msk)?;

        let p = order();
        let sampler = Uniform::new(&p)?;
        let gamma = sampler.sample(rng);

        // random invertible W
        let w = loop {
            let w = Matrix::random(2, 2, &sampler, rng);
            if !w.det2()?.mod_floor(&p).is_zero() {
                break w;
            }
        };
        let w_inv_t = w.inverse_mod(&p)?.transpose();

        let mut a = Vec::with_capacity(self.params.n);
        for (x_i, s_i) in x.iter().zip(msk.s.iter()) {
            let gamma_s = &gamma * s_i;
            let [a0, a1] = mul2(&w_inv_t, [x_i, &gamma_s], &p)?;
            a.push([G1::scalar_base_mult(&a0), G1::scalar_base_mult(&a1)]);
        }

        let mut b = Vec::with_capacity(self.params.n);
        for (y_j, t_j) in y.iter().zip(msk.t.iter()) {
            let [b0, b1] = mul2(&w, [y_j, &-t_j], &p)?;
            b.push([G2::scalar_base_mult(&b0), G2::scalar_base_mult(&b1)]);
        }

        Ok(SgpCiphertext {
            g1_gamma: G1::scalar_base_mult(&gamma),
            a,
            b,
        })
    }

    /// Key for the quadratic form `F`: `(sᵀ·F·t)·g2`.
    pub fn derive_key(&self, msk: &SgpSecretKey, f: &Matrix) -> Result<G2> {
        self.check_f(f)?;
        self.check_key(msk)?;
        let exp = f.mul_x_mat_y(&msk.s, &msk.t)?;
        Ok(G2::scalar_base_mult(&exp))
    }

    pub fn decrypt(&self, ct: &SgpCiphertext, key: &G2, f: &Matrix) -> Result<BigInt> {
        self.check_f(f)?;
        if ct.a.len() != self.params.n || ct.b.len() != self.params.n {
            return Err(FeError::MalformedCipher);
        }

        // e(g1^γ, key) + Σᵢ e(aᵢ, Σⱼ Fᵢⱼ·bⱼ)
        let mut pairs = Vec::with_capacity(2 * self.params.n + 1);
        pairs.push((ct.g1_gamma, *key));
        for (i, a_i) in ct.a.iter().enumerate() {
            let row = f.row(i)?;
            for k in 0..2 {
                let combined = ct
                    .b
                    .iter()
                    .zip(row.iter())
                    .filter(|(_, f_ij)| !f_ij.is_zero())
                    .fold(G2::unit(), |acc, (b_j, f_ij)| acc.add(&b_j[k].scalar_mult(f_ij)));
                pairs.push((a_i[k], combined));
            }
        }
        let target = pair_sum(&pairs);

        self.dlog.solve(&target, &Gt::base())
    }
}
