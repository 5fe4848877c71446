//! Inner-product encryption from Ring-LWE.
//!
//! Works in `R_q = Z_q[x]/(x^N + 1)` for a power of two `N` and a prime
//! `q ≡ 1 (mod 2N)`. One ciphertext carries `N` vectors of length `l` at
//! once, as the columns of an `l×N` matrix `X`, and a key for `y` decrypts
//! all `N` inner products `Xᵀ·y`.

use fe_core::data::{Matrix, Vector};
use fe_core::group::{centered, random_prime_congruent_one};
use fe_core::sample::{NormalCumulative, NormalDouble, Uniform};
use fe_core::{FeError, Result};
use log::{debug, trace};
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::Signed;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use super::lwe::{ln_big, resists_primal_attack};

const MIN_LOG_DIM: u32 = 6;
const MAX_LOG_DIM: u32 = 19;
const MAX_Q_BITS: u64 = 1023;

const FRAC_BITS: u32 = 32;

// floor(a·f) for a non-negative float f.
fn mul_by_float(a: &BigUint, f: f64) -> BigUint {
    let f_fixed = BigUint::from((f * (1u64 << FRAC_BITS) as f64).floor() as u64);
    (a * f_fixed) >> FRAC_BITS
}

/// Public parameters of a [`RingLwe`] instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingLweParams {
    pub l: usize,
    /// Ring dimension, a power of two.
    pub n: usize,
    pub bound: BigInt,
    /// Modulus of the inner products, `2·l·bound² + 1`.
    pub p: BigInt,
    /// Modulus of keys and ciphertexts, `q ≡ 1 (mod 2n)`.
    pub q: BigInt,
    /// Base deviation the other three are derived from.
    pub sigma: f64,
    /// Secret key deviation.
    pub sigma1: BigUint,
    /// Deviation of the encryption randomness.
    pub sigma2: f64,
    /// Deviation of the ciphertext noise.
    pub sigma3: BigUint,
    /// Public ring element.
    pub a: Vector,
}

#[derive(Debug, Clone)]
pub struct RingLwe {
    params: RingLweParams,
    sampler1: NormalDouble,
    sampler2: NormalCumulative,
    sampler3: NormalDouble,
}

impl RingLwe {
    /// Searches the smallest ring dimension and modulus that decrypt
    /// correctly and resist the primal attack at `sec` bits of security.
    pub fn new<R: RngCore + CryptoRng + ?Sized>(
        rng: &mut R,
        l: usize,
        sec: usize,
        bound: &BigInt,
    ) -> Result<Self> {
        if l == 0 || sec == 0 || !bound.is_positive() {
            return Err(FeError::MalformedInput(
                "length, security and bound must be positive".into(),
            ));
        }

        let p: BigInt = BigInt::from(2 * l) * bound * bound + 1u32;
        let ln_p = ln_big(p.magnitude());
        let ln_bound = ln_big(bound.magnitude());

        // ln of the deviation that keeps decryption correct for modulus q
        let ln_sigma = |ln_q: f64, n: usize| {
            let spread = ((4 * sec * l + 1) as f64).sqrt() + 2.0 * ((2 * sec) as f64).sqrt();
            let spread = spread * 2.0 * l as f64 * ((n * sec * 2 * l) as f64).sqrt();
            0.5 * (ln_q - ln_p) - ln_bound - 0.5 * spread.ln()
        };

        let mut found = None;
        for log_n in MIN_LOG_DIM..=MAX_LOG_DIM {
            let n = 1usize << log_n;
            let min_bits = (2 * p.bits()).max(log_n as u64 + 2);

            // smallest size whose every value gives sigma >= 1
            let Some(bits) = (min_bits..=MAX_Q_BITS)
                .find(|&bits| ln_sigma((bits - 1) as f64 * std::f64::consts::LN_2, n) >= 0.0)
            else {
                continue;
            };

            // a larger q only helps the attack, so check the largest value
            let ln_q_max = bits as f64 * std::f64::consts::LN_2;
            if resists_primal_attack(ln_sigma(ln_q_max, n), ln_q_max, n, n, 2 * n + 1, sec) {
                found = Some((n, bits));
                break;
            }
            trace!("ring dimension {} is too small", n);
        }
        let (n, bits) = found.ok_or_else(|| {
            FeError::ParameterGeneration("no ring dimension resists the primal attack".into())
        })?;

        let q = random_prime_congruent_one(rng, bits, &BigUint::from(2 * n))?;
        let sigma = ln_sigma(ln_big(&q), n).exp();

        let sigma1 = mul_by_float(bound.magnitude(), sigma * ((2 * l) as f64).sqrt());
        let sigma2 = sigma * std::f64::consts::SQRT_2;
        let sigma3 = mul_by_float(
            &sigma1,
            (sigma2 * sigma2 * (2 * n * l * sec) as f64 + 1.0).sqrt(),
        );
        debug!(
            "ring lwe set up with n = {}, a {}-bit modulus and sigma = {:.3}",
            n, bits, sigma
        );

        let q = BigInt::from(q);
        let a = Vector::random(n, &Uniform::new(&q)?, rng);

        Self::from_params(RingLweParams {
            l,
            n,
            bound: bound.clone(),
            p,
            q,
            sigma,
            sigma1,
            sigma2,
            sigma3,
            a,
        })
    }

    /// Rebuilds a scheme from parameters shared by another party.
    pub fn from_params(params: RingLweParams) -> Result<Self> {
        if !params.n.is_power_of_two() {
            return Err(FeError::MalformedInput(format!(
                "ring dimension {} is not a power of two",
                params.n
            )));
        }
        if params.a.len() != params.n {
            return Err(FeError::MalformedInput("public element has the wrong degree".into()));
        }

        let tail_cut = (params.n as f64).sqrt();
        let sampler1 = NormalDouble::new(&params.sigma1, 1, tail_cut)?;
        let sampler2 = NormalCumulative::new(params.sigma2, tail_cut, true)?;
        let sampler3 = NormalDouble::new(&params.sigma3, 1, tail_cut)?;
        Ok(RingLwe {
            params,
            sampler1,
            sampler2,
            sampler3,
        })
    }

    pub fn params(&self) -> &RingLweParams {
        &self.params
    }

    pub fn generate_secret_key<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> Matrix {
        Matrix::random(self.params.l, self.params.n, &self.sampler1, rng)
    }

    /// Row by row `PKᵢ = SKᵢ·a + Eᵢ` in `R_q`.
    pub fn generate_public_key<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        sk: &Matrix,
    ) -> Result<Matrix> {
        if !sk.check_dims(self.params.l, self.params.n) {
            return Err(FeError::MalformedSecKey);
        }
        let e = Matrix::random(self.params.l, self.params.n, &self.sampler1, rng);
        let pk = sk.mul_rows_as_poly_in_ring(&self.params.a)?.add(&e)?;
        Ok(pk.modulo(&self.params.q))
    }

    /// `SKᵀ·y mod q`, a single ring element.
    pub fn derive_key(&self, y: &Vector, sk: &Matrix) -> Result<Vector> {
        self.check_y(y)?;
        if !sk.check_dims(self.params.l, self.params.n) {
            return Err(FeError::MalformedSecKey);
        }
        Ok(sk.transpose().mul_vec(y)?.modulo(&self.params.q))
    }

    // x·q/p mod q, rounding down.
    fn center(&self, x: &Matrix) -> Matrix {
        x.apply(|x_ij| (x_ij * &self.params.q).div_floor(&self.params.p))
            .modulo(&self.params.q)
    }

    fn check_y(&self, y: &Vector) -> Result<()> {
        if y.len() != self.params.l {
            return Err(FeError::MalformedInput(format!(
                "expected a vector of length {}, got {}",
                self.params.l,
                y.len()
            )));
        }
        y.check_bound(&self.params.bound)
    }

    /// Encrypts the `l×n` matrix `x`. The ciphertext has `l + 1` rows: the
    /// masked rows of `x`, then `a·r + e`.
    pub fn encrypt<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        x: &Matrix,
        pk: &Matrix,
    ) -> Result<Matrix> {
        if !x.check_dims(self.params.l, self.params.n) {
            return Err(FeError::MalformedInput(format!(
                "expected a {}x{} matrix",
                self.params.l, self.params.n
            )));
        }
        x.check_bound(&self.params.bound)?;
        if !pk.check_dims(self.params.l, self.params.n) {
            return Err(FeError::MalformedPubKey);
        }

        let q = &self.params.q;
        let r = Vector::random(self.params.n, &self.sampler2, rng);
        let e_mat = Matrix::random(self.params.l, self.params.n, &self.sampler3, rng);
        let ct0 = pk
            .mul_rows_as_poly_in_ring(&r)?
            .add(&e_mat)?
            .add(&self.center(x))?
            .modulo(q);

        let e = Vector::random(self.params.n, &self.sampler2, rng);
        let ct1 = self.params.a.mul_as_poly_in_ring(&r)?.add(&e)?.modulo(q);

        let mut rows = ct0.into_rows();
        rows.push(ct1);
        Matrix::new(rows)
    }

    /// Returns the `n` inner products of the columns of the encrypted
    /// matrix with `y`.
    pub fn decrypt(&self, ct: &Matrix, key: &Vector, y: &Vector) -> Result<Vector> {
        self.check_y(y)?;
        if key.len() != self.params.n {
            return Err(FeError::MalformedDecKey);
        }
        if !ct.check_dims(self.params.l + 1, self.params.n) {
            return Err(FeError::MalformedCipher);
        }

        let q = &self.params.q;
        let p = &self.params.p;
        let mut rows = ct.iter_rows().cloned().collect::<Vec<_>>();
        let ct1 = rows.pop().ok_or(FeError::MalformedCipher)?;
        let ct0 = Matrix::new(rows)?;

        let masked = ct0.transpose().mul_vec(y)?;
        let mask = ct1.mul_as_poly_in_ring(key)?;
        let d = masked.sub(&mask)?;

        // round(d·p/q) on the centered representative
        Ok(d.apply(|d_j| (centered(d_j, q) * p + (q >> 1u32)).div_floor(q)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fe_core::sample::UniformRange;
    use rand::rngs::OsRng;
    use std::sync::OnceLock;

    const L: usize = 3;
    const SEC: usize = 16;

    fn bound() -> BigInt {
        BigInt::from(4)
    }

    fn scheme() -> &'static RingLwe {
        static SCHEME: OnceLock<RingLwe> = OnceLock::new();
        SCHEME.get_or_init(|| RingLwe::new(&mut OsRng, L, SEC, &bound()).unwrap())
    }

    fn sampler() -> UniformRange {
        let b = bound();
        UniformRange::new(&(-&b + 1), &b).unwrap()
    }

    #[test]
    fn test_params() {
        let params = scheme().params();
        let q = params.q.magnitude();
        assert!(params.n.is_power_of_two());
        assert_eq!(q % (2 * params.n), BigUint::from(1u32));
        assert_eq!(params.p, BigInt::from(2 * L * 16 + 1));
        assert!(params.sigma >= 1.0);
        assert!(params.sigma3 > params.sigma1);
    }

    #[test]
    fn test_correctness() {
        let _ = env_logger::builder().is_test(true).try_init();
        let scheme = scheme();
        let n = scheme.params().n;

        let sk = scheme.generate_secret_key(&mut OsRng);
        let pk = scheme.generate_public_key(&mut OsRng, &sk).unwrap();

        let x = Matrix::random(L, n, &sampler(), &mut OsRng);
        let y = Vector::random(L, &sampler(), &mut OsRng);
        let key = scheme.derive_key(&y, &sk).unwrap();
        let ct = scheme.encrypt(&mut OsRng, &x, &pk).unwrap();
        assert!(ct.check_dims(L + 1, n));

        let expected = x.transpose().mul_vec(&y).unwrap();
        assert_eq!(scheme.decrypt(&ct, &key, &y).unwrap(), expected);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let scheme = scheme();
        let n = scheme.params().n;
        let sk = scheme.generate_secret_key(&mut OsRng);
        let pk = scheme.generate_public_key(&mut OsRng, &sk).unwrap();
        let empty = Matrix::zeros(0, 0);
        let y = Vector::random(L, &sampler(), &mut OsRng);
        let x = Matrix::random(L, n, &sampler(), &mut OsRng);

        assert_eq!(scheme.generate_public_key(&mut OsRng, &empty), Err(FeError::MalformedSecKey));
        assert!(scheme.derive_key(&Vector::zeros(0), &sk).is_err());
        assert_eq!(scheme.derive_key(&y, &empty), Err(FeError::MalformedSecKey));
        assert_eq!(
            scheme.derive_key(&Vector::constant(L, &bound()), &sk),
            Err(FeError::BoundViolation)
        );

        assert!(scheme.encrypt(&mut OsRng, &empty, &pk).is_err());
        assert_eq!(scheme.encrypt(&mut OsRng, &x, &empty), Err(FeError::MalformedPubKey));
        assert_eq!(
            scheme.encrypt(&mut OsRng, &Matrix::constant(L, n, &bound()), &pk),
            Err(FeError::BoundViolation)
        );

        let key = scheme.derive_key(&y, &sk).unwrap();
        let ct = scheme.encrypt(&mut OsRng, &x, &pk).unwrap();
        assert_eq!(scheme.decrypt(&ct, &Vector::zeros(1), &y), Err(FeError::MalformedDecKey));
        assert_eq!(scheme.decrypt(&empty, &key, &y), Err(FeError::MalformedCipher));
    }

    #[test]
    fn test_from_params_rejects_bad_dimension() {
        let mut params = scheme().params().clone();
        params.n = 100;
        assert!(RingLwe::from_params(params).is_err());
    }
}
