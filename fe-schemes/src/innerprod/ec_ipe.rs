//! DDH based inner-product encryption on the Ristretto group, in the
//! variant of Agrawal, Libert and Stehlé that is secure against adaptive
//! key queries.
//!
//! Public parameters are the generator `G` and a random second generator
//! `H`. The master secret key is a pair of vectors `(s, t)` and the public
//! key is `mpkᵢ = sᵢ·G + tᵢ·H`. A ciphertext of `x` is
//! `(r·G, r·H, [xᵢ·G + r·mpkᵢ])`, and the key for `y` is
//! `(⟨s, y⟩, ⟨t, y⟩)`. Decryption recovers `⟨x, y⟩·G` and solves the
//! bounded discrete logarithm.

use fe_core::data::{Vector, VectorEc};
use fe_core::dlog::{BabyStepGiantStep, DlogConfig};
use fe_core::group::{Ec, reduce};
use fe_core::sample::UniformRange;
use fe_core::traits::{CyclicGroup, Sampler};
use fe_core::{FeError, Result};
use log::debug;
use num_bigint::BigInt;
use num_traits::Signed;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::traits::InnerProductScheme;

/// Public parameters of an [`EcIpe`] instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcIpeParams {
    /// Length of the vectors.
    pub l: usize,
    /// Strict bound on the absolute value of the coordinates of x and y.
    pub bound: BigInt,
    /// Second generator.
    pub h: Ec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcIpeSecretKey {
    pub s: Vector,
    pub t: Vector,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcIpePublicKey(pub VectorEc);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcIpeDerivedKey {
    pub k1: BigInt,
    pub k2: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcIpeCiphertext {
    pub c0: Ec,
    pub c1: Ec,
    pub ct: VectorEc,
}

#[derive(Debug, Clone)]
pub struct EcIpe {
    params: EcIpeParams,
    dlog: BabyStepGiantStep<Ec>,
}

impl EcIpe {
    /// Sets up a scheme for vectors of length `l` with coordinates bounded
    /// by `bound` in absolute value.
    ///
    /// Fails when `2·l·bound²` reaches the group order, as inner products
    /// could then wrap around.
    pub fn new<R: RngCore + CryptoRng + ?Sized>(
        rng: &mut R,
        l: usize,
        bound: &BigInt,
    ) -> Result<Self> {
        let h = Ec::random(rng);
        Self::from_params(EcIpeParams {
            l,
            bound: bound.clone(),
            h,
        })
    }

    /// Rebuilds a scheme from parameters shared by another party.
    pub fn from_params(params: EcIpeParams) -> Result<Self> {
        if params.l == 0 || !params.bound.is_positive() {
            return Err(FeError::MalformedInput(format!(
                "need a positive length and bound, got {} and {}",
                params.l, params.bound
            )));
        }

        let max_inner = BigInt::from(params.l) * &params.bound * &params.bound;
        if &max_inner * 2 >= BigInt::from(Ec::order()) {
            return Err(FeError::ParameterGeneration(format!(
                "l·bound² = {} too large for the group order",
                max_inner
            )));
        }
        let config = DlogConfig::in_ec(max_inner).with_neg();
        if !config.is_tractable() {
            return Err(FeError::ParameterGeneration(format!(
                "l·bound² = {} too large to decrypt by discrete log",
                config.bound
            )));
        }
        debug!("ec ipe set up for l = {}, bound = {}", params.l, params.bound);

        let dlog = BabyStepGiantStep::new(config)?;
        Ok(EcIpe { params, dlog })
    }

    pub fn params(&self) -> &EcIpeParams {
        &self.params
    }

    /// Builds the discrete-log table once, so that later decryptions do not
    /// rebuild it.
    pub fn precompute(&mut self) -> Result<()> {
        self.dlog.precompute(&Ec::base())
    }

    fn check_input(&self, v: &Vector) -> Result<()> {
        if v.len() != self.params.l {
            return Err(FeError::MalformedInput(format!(
                "expected a vector of length {}, got {}",
                self.params.l,
                v.len()
            )));
        }
        v.check_bound(&self.params.bound)
    }
}

impl InnerProductScheme for EcIpe {
    type SecretKey = EcIpeSecretKey;
    type PublicKey = EcIpePublicKey;
    type DerivedKey = EcIpeDerivedKey;
    type Ciphertext = EcIpeCiphertext;

    fn generate_keys<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(EcIpeSecretKey, EcIpePublicKey)> {
        let sampler = UniformRange::new(&BigInt::from(2), &BigInt::from(Ec::order()))?;
        let s = Vector::random(self.params.l, &sampler, rng);
        let t = Vector::random(self.params.l, &sampler, rng);

        let g = Ec::base();
        let mpk = s
            .iter()
            .zip(t.iter())
            .map(|(si, ti)| g.scalar_mult(si).add(&self.params.h.scalar_mult(ti)))
            .collect();

        Ok((EcIpeSecretKey { s, t }, EcIpePublicKey(mpk)))
    }

    fn derive_key(&self, y: &Vector, sk: &EcIpeSecretKey) -> Result<EcIpeDerivedKey> {
        self.check_input(y)?;
        if sk.s.len() != self.params.l || sk.t.len() != self.params.l {
            return Err(FeError::MalformedSecKey);
        }

        let order = BigInt::from(Ec::order());
        Ok(EcIpeDerivedKey {
            k1: reduce(&sk.s.dot(y)?, &order),
            k2: reduce(&sk.t.dot(y)?, &order),
        })
    }

    fn encrypt<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        x: &Vector,
        pk: &EcIpePublicKey,
    ) -> Result<EcIpeCiphertext> {
        self.check_input(x)?;
        if pk.0.len() != self.params.l {
            return Err(FeError::MalformedPubKey);
        }

        let r = UniformRange::new(&BigInt::from(1), &BigInt::from(Ec::order()))?.sample(rng);
        let g = Ec::base();

        let c0 = g.scalar_mult(&r);
        let c1 = self.params.h.scalar_mult(&r);
        let ct = pk
            .0
            .iter()
            .zip(x.iter())
            .map(|(mpk_i, x_i)| g.scalar_mult(x_i).add(&mpk_i.scalar_mult(&r)))
            .collect();

        Ok(EcIpeCiphertext { c0, c1, ct })
    }

    fn decrypt(&self, ct: &EcIpeCiphertext, key: &EcIpeDerivedKey, y: &Vector) -> Result<BigInt> {
        self.check_input(y)?;
        if ct.ct.len() != self.params.l {
            return Err(FeError::MalformedCipher);
        }

        // sum(y_i * ct_i) - (k1 * c0 + k2 * c1) = <x, y> * G
        let num = ct.ct.mul_scalar_vector(y)?;
        let mask = ct.c0.scalar_mult(&key.k1).add(&ct.c1.scalar_mult(&key.k2));
        let target = num.sub(&mask);

        self.dlog.solve(&target, &Ec::base())
    }
}
