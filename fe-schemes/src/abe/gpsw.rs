//! Key-policy attribute-based encryption of Goyal, Pandey, Sahai and
//! Waters, small universe variant, over the BLS12-381 pairing.
//!
//! Attributes are the integers `0..l`. A ciphertext is bound to a set of
//! attributes, a key to a policy compiled into a monotone span program
//! whose rows are labelled with attributes. Decryption works iff the
//! attributes of the ciphertext satisfy the policy of the key.

use fe_core::data::{Vector, VectorG2};
use fe_core::group::{G1, G2, Gt, mod_inverse, pair_sum};
use fe_core::policy::Msp;
use fe_core::sample::{Uniform, UniformRange};
use fe_core::traits::{CyclicGroup, Sampler};
use fe_core::{FeError, Result};
use log::debug;
use num_bigint::BigInt;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpswParams {
    /// Size of the attribute universe.
    pub l: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpswSecretKey {
    pub t: Vector,
    pub y: BigInt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpswPublicKey {
    /// `tᵢ·g2` for every attribute.
    pub t: VectorG2,
    /// `y·gt`.
    pub y: Gt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpswCiphertext {
    pub gamma: Vec<usize>,
    /// `msg + s·Y`.
    pub e0: Gt,
    /// `s·Tᵢ` for each attribute `i` of `gamma`, in the same order.
    pub e: Vec<G2>,
}

/// Decryption key for a policy: one G1 element per row of the span
/// program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpswPolicyKey {
    pub msp: Msp,
    pub d: Vec<G1>,
}

#[derive(Debug, Clone)]
pub struct Gpsw {
    params: GpswParams,
}

fn order() -> BigInt {
    BigInt::from(G1::order())
}

impl Gpsw {
    pub fn new(l: usize) -> Result<Self> {
        Self::from_params(GpswParams { l })
    }

    pub fn from_params(params: GpswParams) -> Result<Self> {
        if params.l == 0 {
            return Err(FeError::MalformedInput("empty attribute universe".into()));
        }
        Ok(Gpsw { params })
    }

    pub fn params(&self) -> &GpswParams {
        &self.params
    }

    pub fn generate_master_keys<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(GpswSecretKey, GpswPublicKey)> {
        let p = order();
        // t must be invertible
        let t = Vector::random(self.params.l, &UniformRange::new(&BigInt::from(1), &p)?, rng);
        let y = Uniform::new(&p)?.sample(rng);

        let pk = GpswPublicKey {
            t: VectorG2::from_scalars(&t, &G2::base()),
            y: Gt::scalar_base_mult(&y),
        };
        Ok((GpswSecretKey { t, y }, pk))
    }

    /// Encrypts `msg` under the attribute set `gamma`.
    pub fn encrypt<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        msg: &Gt,
        gamma: &[usize],
        pk: &GpswPublicKey,
    ) -> Result<GpswCiphertext> {
        if pk.t.len() != self.params.l {
            return Err(FeError::MalformedPubKey);
        }
        if let Some(a) = gamma.iter().find(|&&a| a >= self.params.l) {
            return Err(FeError::MalformedInput(format!(
                "attribute {} outside the universe of size {}",
                a, self.params.l
            )));
        }

        let s = Uniform::new(&order())?.sample(rng);
        let e0 = msg.add(&pk.y.scalar_mult(&s));
        let e = gamma.iter().map(|&i| pk.t[i].scalar_mult(&s)).collect();

        Ok(GpswCiphertext {
            gamma: gamma.to_vec(),
            e0,
            e,
        })
    }

    /// Key for the policy `msp`, whose rows must be labelled with
    /// attributes of the universe.
    ///
    /// Shares `y` as `⟨Mᵢ, u⟩` for a random `u` summing to `y`, so that
    /// rows spanning the all-ones vector recombine it.
    pub fn key_gen<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        msp: &Msp,
        sk: &GpswSecretKey,
    ) -> Result<GpswPolicyKey> {
        if msp.mat.rows() == 0 || msp.mat.cols() == 0 {
            return Err(FeError::MalformedInput("empty span program".into()));
        }
        if sk.t.len() != self.params.l {
            return Err(FeError::MalformedSecKey);
        }
        let attribs = msp.attribute_indices()?;
        if let Some(a) = attribs.iter().find(|&&a| a >= self.params.l) {
            return Err(FeError::MalformedInput(format!(
                "policy attribute {} outside the universe of size {}",
                a, self.params.l
            )));
        }

        let p = order();
        let cols = msp.mat.cols();
        let mut u = Vector::random(cols - 1, &Uniform::new(&p)?, rng).into_coords();
        let rest: BigInt = u.iter().sum();
        u.push(&sk.y - rest);
        let u = Vector::new(u);

        let d = msp
            .mat
            .iter_rows()
            .zip(&attribs)
            .map(|(row, &a)| -> Result<G1> {
                let t_inv = mod_inverse(&sk.t[a], &p)?;
                Ok(G1::scalar_base_mult(&(row.dot(&u)? * t_inv)))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!("generated a key over {} policy rows", d.len());

        Ok(GpswPolicyKey {
            msp: msp.clone(),
            d,
        })
    }

    /// Restricts `key` to the rows labelled by `owned` attributes.
    pub fn delegate_keys(&self, key: &GpswPolicyKey, owned: &[usize]) -> Result<GpswPolicyKey> {
        if key.d.len() != key.msp.mat.rows() {
            return Err(FeError::MalformedDecKey);
        }
        let owned: Vec<String> = owned.iter().map(usize::to_string).collect();
        let rows = key.msp.rows_for(&owned);

        let msp = Msp {
            mat: key.msp.mat.select_rows(&rows)?,
            row_to_attrib: rows.iter().map(|&i| key.msp.row_to_attrib[i].clone()).collect(),
        };
        let d = rows.iter().map(|&i| key.d[i]).collect();
        Ok(GpswPolicyKey { msp, d })
    }

    /// Recovers the message, or fails with
    /// [`FeError::InsufficientAttributes`] when the attributes of the
    /// ciphertext do not satisfy the policy of the key.
    pub fn decrypt(&self, ct: &GpswCiphertext, key: &GpswPolicyKey) -> Result<Gt> {
        if ct.gamma.len() != ct.e.len() {
            return Err(FeError::MalformedCipher);
        }
        if key.d.len() != key.msp.mat.rows() {
            return Err(FeError::MalformedDecKey);
        }

        let gamma: Vec<String> = ct.gamma.iter().map(usize::to_string).collect();
        let (rows, coeffs) = key.msp.reconstruction_coefficients(&gamma, &order())?;

        // Σ cᵢ·e(Dᵢ, E_ρ(i)) = s·y·gt
        let pairs = rows
            .iter()
            .zip(coeffs.iter())
            .map(|(&i, c)| -> Result<(G1, G2)> {
                let attrib = &key.msp.row_to_attrib[i];
                let pos = gamma
                    .iter()
                    .position(|a| a == attrib)
                    .ok_or(FeError::MalformedCipher)?;
                Ok((key.d[i].scalar_mult(c), ct.e[pos]))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ct.e0.sub(&pair_sum(&pairs)))
    }
}
