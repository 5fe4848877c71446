//! Inner-product encryption from the decisional composite residuosity
//! assumption, after Agrawal, Libert and Stehlé.
//!
//! Works in `Z*_{n²}` for an RSA modulus `n` made of two safe primes. The
//! master secret key has Gaussian coordinates; the public key is
//! `pkᵢ = g^{sᵢ}` for a generator `g` of the 2n-th residues. A ciphertext
//! is `(g^r, [(1 + xᵢ·n)·pkᵢ^r])` and decryption strips the mask with the
//! key `⟨s, y⟩`, which leaves `1 + ⟨x, y⟩·n`.

use fe_core::data::Vector;
use fe_core::group::{mod_exp, mod_inverse, random_safe_prime};
use fe_core::sample::{NormalDouble, Uniform};
use fe_core::traits::Sampler;
use fe_core::{FeError, Result};
use log::debug;
use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Signed};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::traits::InnerProductScheme;

/// Public parameters of a [`Paillier`] instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaillierParams {
    pub l: usize,
    /// Security parameter, also the tail cut factor of the key sampler
    /// (as its square root).
    pub lambda: usize,
    pub n: BigInt,
    pub n_sq: BigInt,
    pub g: BigInt,
    /// Deviation of the master secret key coordinates.
    pub sigma: BigUint,
    pub bound_x: BigInt,
    pub bound_y: BigInt,
}

#[derive(Debug, Clone)]
pub struct Paillier {
    params: PaillierParams,
    key_sampler: NormalDouble,
}

impl Paillier {
    /// Sets up a scheme for vectors of length `l`, with `n` the product of
    /// two safe primes of `bit_len` bits each.
    ///
    /// Fails with [`FeError::ParameterGeneration`] if `n` is too small for
    /// the bounds: both `l·bound_x²` and `l·bound_y²` must stay below `n`,
    /// and `2·l·bound_x·bound_y` too, for the decoded inner product to be
    /// unambiguous.
    pub fn new<R: RngCore + CryptoRng + ?Sized>(
        rng: &mut R,
        l: usize,
        lambda: usize,
        bit_len: u64,
        bound_x: &BigInt,
        bound_y: &BigInt,
    ) -> Result<Self> {
        if l == 0 || lambda == 0 || !bound_x.is_positive() || !bound_y.is_positive() {
            return Err(FeError::MalformedInput(
                "length, security parameter and bounds must be positive".into(),
            ));
        }

        let p = random_safe_prime(rng, bit_len)?;
        let q = loop {
            let q = random_safe_prime(rng, bit_len)?;
            if q != p {
                break q;
            }
        };
        let n = BigInt::from(p * q);
        let n_sq = &n * &n;

        let l_big = BigInt::from(l);
        let limits = [
            &l_big * bound_x * bound_x,
            &l_big * bound_y * bound_y,
            &l_big * bound_x * bound_y * 2,
        ];
        if limits.iter().any(|limit| *limit >= n) {
            return Err(FeError::ParameterGeneration(format!(
                "bounds and l = {} too large for {}-bit primes",
                l, bit_len
            )));
        }

        // generator of the 2n-th residues
        let g_prime = BigInt::from(rng.gen_biguint_below(n_sq.magnitude()));
        let g = g_prime.modpow(&(&n << 1u32), &n_sq);
        if mod_inverse(&g, &n_sq).is_err() {
            return Err(FeError::ParameterGeneration(
                "generator is not invertible".into(),
            ));
        }

        // sigma = floor(sqrt(lambda * n^5)) + 2
        let n_5 = n.magnitude().pow(5u32);
        let sigma = (n_5 * BigUint::from(lambda)).sqrt() + BigUint::from(2u8);
        debug!(
            "paillier set up with a {}-bit modulus and {}-bit sigma",
            n.bits(),
            sigma.bits()
        );

        Self::from_params(PaillierParams {
            l,
            lambda,
            n,
            n_sq,
            g,
            sigma,
            bound_x: bound_x.clone(),
            bound_y: bound_y.clone(),
        })
    }

    /// Rebuilds a scheme from parameters shared by another party.
    pub fn from_params(params: PaillierParams) -> Result<Self> {
        if params.n_sq != &params.n * &params.n {
            return Err(FeError::MalformedInput("n_sq is not n²".into()));
        }
        let key_sampler = NormalDouble::new(&params.sigma, 1, (params.lambda as f64).sqrt())?;
        Ok(Paillier {
            params,
            key_sampler,
        })
    }

    pub fn params(&self) -> &PaillierParams {
        &self.params
    }

    fn check_len(&self, v: &Vector) -> Result<()> {
        if v.len() != self.params.l {
            return Err(FeError::MalformedInput(format!(
                "expected a vector of length {}, got {}",
                self.params.l,
                v.len()
            )));
        }
        Ok(())
    }
}

impl InnerProductScheme for Paillier {
    type SecretKey = Vector;
    type PublicKey = Vector;
    type DerivedKey = BigInt;
    type Ciphertext = Vector;

    fn generate_keys<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> Result<(Vector, Vector)> {
        let sk = Vector::random(self.params.l, &self.key_sampler, rng);
        let pk = sk
            .iter()
            .map(|s| mod_exp(&self.params.g, s, &self.params.n_sq))
            .collect::<Result<Vector>>()?;
        Ok((sk, pk))
    }

    fn derive_key(&self, y: &Vector, sk: &Vector) -> Result<BigInt> {
        self.check_len(y)?;
        y.check_bound(&self.params.bound_y)?;
        if sk.len() != self.params.l {
            return Err(FeError::MalformedSecKey);
        }
        sk.dot(y)
    }

    fn encrypt<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        x: &Vector,
        pk: &Vector,
    ) -> Result<Vector> {
        self.check_len(x)?;
        x.check_bound(&self.params.bound_x)?;
        if pk.len() != self.params.l {
            return Err(FeError::MalformedPubKey);
        }

        let n = &self.params.n;
        let n_sq = &self.params.n_sq;
        let r = Uniform::new(&(n >> 2u32))?.sample(rng);

        let mut ct = Vec::with_capacity(self.params.l + 1);
        ct.push(self.params.g.modpow(&r, n_sq));
        for (x_i, pk_i) in x.iter().zip(pk.iter()) {
            // (1 + x_i * n) * pk_i^r mod n^2
            let msg = (BigInt::one() + x_i * n).mod_floor(n_sq);
            let mask = pk_i.mod_floor(n_sq).modpow(&r, n_sq);
            ct.push((msg * mask) % n_sq);
        }
        Ok(Vector::new(ct))
    }

    fn decrypt(&self, ct: &Vector, key: &BigInt, y: &Vector) -> Result<BigInt> {
        self.check_len(y)?;
        y.check_bound(&self.params.bound_y)?;
        if ct.len() != self.params.l + 1 {
            return Err(FeError::MalformedCipher);
        }

        let n = &self.params.n;
        let n_sq = &self.params.n_sq;

        // c_0^(-key) * prod(c_i^(y_i))
        let mut c_x = mod_exp(&ct[0], &-key, n_sq)?;
        for (c_i, y_i) in ct.iter().skip(1).zip(y.iter()) {
            c_x = (c_x * mod_exp(c_i, y_i, n_sq)?) % n_sq;
        }

        // (c_x - 1 mod n^2) / n, centered around zero
        let ret: BigInt = (c_x - BigInt::one()).mod_floor(n_sq) / n;
        if ret > n / 2 { Ok(ret - n) } else { Ok(ret) }
    }
}
