//! Inner-product encryption from the learning with errors problem, after
//! Abdalla, Bourse, De Caro and Pointcheval (selective security).
//!
//! The public matrix `A ∈ Z_q^{m×n}` is shared by everyone. A master
//! secret key is a uniform `SK ∈ Z_q^{n×l}` and its public key is
//! `PK = A·SK + E` with Gaussian noise `E`. A message `x` is scaled by
//! `q/p` into the top of `Z_q` before being masked with `PKᵀ·r` for a
//! binary `r`.

use fe_core::data::{Matrix, Vector};
use fe_core::group::{centered, random_prime};
use fe_core::sample::{Bit, NormalDouble, PseudoUniform, Uniform};
use fe_core::{FeError, Result};
use log::{debug, trace};
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::traits::InnerProductScheme;

// Smallest and largest bit length tried for the modulus q.
const MIN_Q_BITS: u64 = 60;
const MAX_Q_BITS: u64 = 1023;

// Fixed point precision used to divide big integers by float factors.
const FRAC_BITS: u32 = 32;

/// Root Hermite factor `δ` reachable by BKZ with block size `b`.
pub(crate) fn root_hermite_factor(b: f64) -> f64 {
    use std::f64::consts::{E, PI};
    let base = (PI * b).powf(1.0 / b) * b / (2.0 * PI * E);
    base.powf(1.0 / (2.0 * b - 2.0))
}

/// Primal attack estimate: the instance resists when a vector of norm
/// `sigma·sqrt(b)` is never shorter than the length `δ^{2b-d-1}·q^{k/d}`
/// reached on the embedding lattice of dimension `d = n + k`, for every
/// number of samples `k` in `[k_min, k_max)`.
///
/// Evaluated on logarithms, so huge moduli do not overflow.
pub(crate) fn resists_primal_attack(
    ln_sigma: f64,
    ln_q: f64,
    n: usize,
    k_min: usize,
    k_max: usize,
    sec: usize,
) -> bool {
    let b = sec as f64 / 0.265;
    let ln_delta = root_hermite_factor(b).ln();
    let ln_left = ln_sigma + 0.5 * b.ln();

    (k_min..k_max).all(|k| {
        let d = (n + k) as f64;
        let ln_right = (2.0 * b - d - 1.0) * ln_delta + (k as f64 / d) * ln_q;
        ln_left >= ln_right
    })
}

// floor(a / f) for a positive float f.
fn div_by_float(a: &BigUint, f: f64) -> BigUint {
    let f_fixed = BigUint::from((f * (1u64 << FRAC_BITS) as f64).ceil() as u64);
    (a << FRAC_BITS) / f_fixed
}

/// Public parameters of an [`Lwe`] instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LweParams {
    pub l: usize,
    /// Main security parameter, the width of `A`.
    pub n: usize,
    /// Number of LWE samples, the height of `A`.
    pub m: usize,
    pub bound_x: BigInt,
    pub bound_y: BigInt,
    /// Modulus of the inner product, `2·l·bound_x·bound_y + 1`.
    pub p: BigInt,
    /// Modulus of keys and ciphertexts.
    pub q: BigInt,
    /// Deviation of the public key noise.
    pub sigma_q: BigUint,
    pub a: Matrix,
}

#[derive(Debug, Clone)]
pub struct Lwe {
    params: LweParams,
    noise: NormalDouble,
}

impl Lwe {
    /// Searches the smallest modulus for which the instance resists the
    /// primal attack at `sec` bits of security, then samples `A`.
    ///
    /// Fails with [`FeError::ParameterGeneration`] when no modulus below
    /// 2^1023 is large enough.
    pub fn new<R: RngCore + CryptoRng + ?Sized>(
        rng: &mut R,
        l: usize,
        bound_x: &BigInt,
        bound_y: &BigInt,
        n: usize,
        sec: usize,
    ) -> Result<Self> {
        if l == 0 || n == 0 || sec == 0 || !bound_x.is_positive() || !bound_y.is_positive() {
            return Err(FeError::MalformedInput(
                "dimensions, security and bounds must be positive".into(),
            ));
        }

        let p: BigInt = BigInt::from(2 * l) * bound_x * bound_y + 1u32;
        let ln_p = ln_big(p.magnitude());
        let (ln_bx, ln_by) = (ln_big(bound_x.magnitude()), ln_big(bound_y.magnitude()));
        let l_f = l as f64;

        // The attack check gets harder to pass as q shrinks, so checking
        // against the smallest i-bit value covers every i-bit prime.
        let mut found = None;
        for bits in MIN_Q_BITS..=MAX_Q_BITS {
            let m = (n + l + 1) * bits as usize + 2 * sec;
            let ln_q = (bits - 1) as f64 * std::f64::consts::LN_2;
            let spread = 4.0 * (l_f * (m * sec) as f64).sqrt();
            let ln_sigma_q = ln_q - ln_p - ln_by - spread.ln();
            let ln_sigma_prime = ln_sigma_q - 0.5 * l_f.ln() - ln_bx;

            if resists_primal_attack(ln_sigma_prime, ln_q, n, n, m, sec) {
                found = Some((bits, m));
                break;
            }
            trace!("{}-bit modulus is too small", bits);
        }
        let (bits, m) = found.ok_or_else(|| {
            FeError::ParameterGeneration("no modulus resists the primal attack".into())
        })?;
        let q = BigInt::from(random_prime(rng, bits)?);

        // sigma_q = floor(q / (p·bound_y·4·sqrt(l·m·sec))) + 1
        let spread = 4.0 * (l_f * (m * sec) as f64).sqrt();
        let coarse = q.magnitude() / (&p * bound_y).magnitude();
        let sigma_q = div_by_float(&coarse, spread) + 1u32;
        debug!(
            "lwe set up with a {}-bit modulus, m = {}, {}-bit noise deviation",
            bits,
            m,
            sigma_q.bits()
        );

        let mut uniform = PseudoUniform::new(&q)?;
        let a = Matrix::random_public(m, n, &mut uniform);

        Self::from_params(LweParams {
            l,
            n,
            m,
            bound_x: bound_x.clone(),
            bound_y: bound_y.clone(),
            p,
            q,
            sigma_q,
            a,
        })
    }

    /// Rebuilds a scheme from parameters shared by another party.
    pub fn from_params(params: LweParams) -> Result<Self> {
        if !params.a.check_dims(params.m, params.n) {
            return Err(FeError::MalformedInput(format!(
                "public matrix is not {}x{}",
                params.m, params.n
            )));
        }
        let noise = NormalDouble::new(&params.sigma_q, 1, (params.n as f64).sqrt())?;
        Ok(Lwe { params, noise })
    }

    pub fn params(&self) -> &LweParams {
        &self.params
    }

    pub fn generate_secret_key<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> Result<Matrix> {
        let uniform = Uniform::new(&self.params.q)?;
        Ok(Matrix::random(self.params.n, self.params.l, &uniform, rng))
    }

    /// `PK = A·SK + E mod q`.
    pub fn generate_public_key<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        sk: &Matrix,
    ) -> Result<Matrix> {
        if !sk.check_dims(self.params.n, self.params.l) {
            return Err(FeError::MalformedSecKey);
        }
        let e = Matrix::random(self.params.m, self.params.l, &self.noise, rng);
        let pk = self.params.a.mul(sk)?.add(&e)?;
        Ok(pk.modulo(&self.params.q))
    }

    // x·q/p mod q, rounding down.
    fn center(&self, x: &Vector) -> Vector {
        x.apply(|x_i| (x_i * &self.params.q).div_floor(&self.params.p))
            .modulo(&self.params.q)
    }

    fn check_input(&self, v: &Vector, bound: &BigInt) -> Result<()> {
        if v.len() != self.params.l {
            return Err(FeError::MalformedInput(format!(
                "expected a vector of length {}, got {}",
                self.params.l,
                v.len()
            )));
        }
        v.check_bound(bound)
    }
}

impl InnerProductScheme for Lwe {
    type SecretKey = Matrix;
    type PublicKey = Matrix;
    type DerivedKey = Vector;
    type Ciphertext = Vector;

    fn generate_keys<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> Result<(Matrix, Matrix)> {
        let sk = self.generate_secret_key(rng)?;
        let pk = self.generate_public_key(rng, &sk)?;
        Ok((sk, pk))
    }

    /// `SK·y mod q`.
    fn derive_key(&self, y: &Vector, sk: &Matrix) -> Result<Vector> {
        self.check_input(y, &self.params.bound_y)?;
        if !sk.check_dims(self.params.n, self.params.l) {
            return Err(FeError::MalformedSecKey);
        }
        Ok(sk.mul_vec(y)?.modulo(&self.params.q))
    }

    /// Returns `Aᵀ·r ‖ PKᵀ·r + center(x)`, of length `n + l`.
    fn encrypt<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        x: &Vector,
        pk: &Matrix,
    ) -> Result<Vector> {
        self.check_input(x, &self.params.bound_x)?;
        if !pk.check_dims(self.params.m, self.params.l) {
            return Err(FeError::MalformedPubKey);
        }

        let r = Vector::random(self.params.m, &Bit, rng);
        let ct0 = self.params.a.transpose().mul_vec(&r)?.modulo(&self.params.q);
        let ct_last = pk
            .transpose()
            .mul_vec(&r)?
            .add(&self.center(x))?
            .modulo(&self.params.q);

        Ok(ct0.concat(&ct_last))
    }

    fn decrypt(&self, ct: &Vector, key: &Vector, y: &Vector) -> Result<BigInt> {
        self.check_input(y, &self.params.bound_y)?;
        if key.len() != self.params.n {
            return Err(FeError::MalformedDecKey);
        }
        if ct.len() != self.params.n + self.params.l {
            return Err(FeError::MalformedCipher);
        }

        let q = &self.params.q;
        let (ct0, ct_last): (Vector, Vector) = (
            ct.coords()[..self.params.n].to_vec().into(),
            ct.coords()[self.params.n..].to_vec().into(),
        );

        // <y, ct_last> - <ct0, key>, reduced before its sign is read
        let d = centered(&(y.dot(&ct_last)? - ct0.dot(key)?), q);

        // round(d·p/q)
        Ok((d * &self.params.p + (q >> 1u32)).div_floor(q))
    }
}

// Natural logarithm of a positive integer of any size.
pub(crate) fn ln_big(x: &BigUint) -> f64 {
    let shift = x.bits().saturating_sub(64);
    let top = (x >> shift).to_f64().unwrap_or(f64::INFINITY);
    top.ln() + shift as f64 * std::f64::consts::LN_2
}

#[cfg(test)]
mod tests {
    use super::*;
    use fe_core::sample::UniformRange;
    use rand::rngs::OsRng;
    use std::sync::OnceLock;

    const L: usize = 4;
    const N: usize = 64;
    const SEC: usize = 16;

    fn bound() -> BigInt {
        BigInt::from(8)
    }

    // the public matrix has thousands of rows, so the instance is shared
    fn scheme() -> &'static Lwe {
        static SCHEME: OnceLock<Lwe> = OnceLock::new();
        SCHEME.get_or_init(|| Lwe::new(&mut OsRng, L, &bound(), &bound(), N, SEC).unwrap())
    }

    fn random_vec() -> Vector {
        let b = bound();
        let sampler = UniformRange::new(&(-&b + 1), &b).unwrap();
        Vector::random(L, &sampler, &mut OsRng)
    }

    #[test]
    fn test_root_hermite_factor() {
        // block size 302 for 80 bits of security
        let delta = root_hermite_factor(80.0 / 0.265);
        assert!((delta - 1.0045).abs() < 1e-3, "delta = {}", delta);
    }

    #[test]
    fn test_primal_attack_check_monotone_in_noise() {
        let ln_q = 100.0 * std::f64::consts::LN_2;
        assert!(!resists_primal_attack(0.0, ln_q, 64, 64, 2000, 16));
        assert!(resists_primal_attack(ln_q - 1.0, ln_q, 64, 64, 2000, 16));
    }

    #[test]
    fn test_params() {
        let params = scheme().params();
        assert!(params.q.bits() >= MIN_Q_BITS);
        assert_eq!(params.p, BigInt::from(2 * L * 64 + 1));
        assert_eq!(params.m, (N + L + 1) * params.q.bits() as usize + 2 * SEC);
        assert!(params.a.check_dims(params.m, N));
    }

    #[test]
    fn test_correctness() {
        let _ = env_logger::builder().is_test(true).try_init();
        let scheme = scheme();
        let (sk, pk) = scheme.generate_keys(&mut OsRng).unwrap();

        for _ in 0..4 {
            let x = random_vec();
            let y = random_vec();
            let key = scheme.derive_key(&y, &sk).unwrap();
            let ct = scheme.encrypt(&mut OsRng, &x, &pk).unwrap();
            assert_eq!(scheme.decrypt(&ct, &key, &y).unwrap(), x.dot(&y).unwrap());
        }

        // largest inner products in both directions
        let top = Vector::constant(L, &(bound() - 1));
        let key = scheme.derive_key(&top, &sk).unwrap();
        let ct = scheme.encrypt(&mut OsRng, &top.neg(), &pk).unwrap();
        assert_eq!(scheme.decrypt(&ct, &key, &top).unwrap(), BigInt::from(-(L as i64) * 49));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let scheme = scheme();
        let (sk, pk) = scheme.generate_keys(&mut OsRng).unwrap();
        let y = random_vec();
        let empty = Matrix::zeros(0, 0);

        assert_eq!(scheme.generate_public_key(&mut OsRng, &empty), Err(FeError::MalformedSecKey));
        assert_eq!(scheme.derive_key(&y, &empty), Err(FeError::MalformedSecKey));
        assert_eq!(
            scheme.derive_key(&Vector::constant(L, &bound()), &sk),
            Err(FeError::BoundViolation)
        );
        assert!(scheme.derive_key(&Vector::zeros(0), &sk).is_err());

        assert_eq!(scheme.encrypt(&mut OsRng, &y, &empty), Err(FeError::MalformedPubKey));
        assert_eq!(
            scheme.encrypt(&mut OsRng, &Vector::constant(L, &bound()), &pk),
            Err(FeError::BoundViolation)
        );

        let key = scheme.derive_key(&y, &sk).unwrap();
        let ct = scheme.encrypt(&mut OsRng, &y, &pk).unwrap();
        assert_eq!(scheme.decrypt(&ct, &Vector::zeros(1), &y), Err(FeError::MalformedDecKey));
        assert_eq!(scheme.decrypt(&Vector::zeros(1), &key, &y), Err(FeError::MalformedCipher));
    }

    #[test]
    fn test_bounds_too_large() {
        let huge = BigInt::from(1) << 2000;
        assert!(matches!(
            Lwe::new(&mut OsRng, 2, &huge, &huge, 8, 16),
            Err(FeError::ParameterGeneration(_))
        ));
    }
}
