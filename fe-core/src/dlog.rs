//! Bounded discrete logarithms.
//!
//! Decryption in the group based schemes ends with an element `k·g` where
//! `k` is known to be small. [`BabyStepGiantStep`] recovers `k` in
//! `O(sqrt(bound))` time and memory, in any [`CyclicGroup`].

use std::borrow::Cow;
use std::collections::HashMap;

use log::debug;
use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{FeError, Result, malformed};
use crate::traits::{CyclicGroup, GroupKind};

// Largest baby-step table a solver agrees to build.
pub const MAX_TABLE_LEN: u64 = 1 << 26;

/// Search range and group selection of a discrete-log solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlogConfig {
    /// Largest absolute value of the exponent searched for.
    pub bound: BigInt,
    /// Search `[-bound, bound]` instead of `[0, bound]`.
    pub allow_negative: bool,
    pub group: GroupKind,
}

impl DlogConfig {
    pub fn in_ec(bound: BigInt) -> Self {
        DlogConfig {
            bound,
            allow_negative: false,
            group: GroupKind::Ec,
        }
    }

    pub fn in_pairing(bound: BigInt) -> Self {
        DlogConfig {
            bound,
            allow_negative: false,
            group: GroupKind::Pairing,
        }
    }

    pub fn with_neg(mut self) -> Self {
        self.allow_negative = true;
        self
    }

    // Largest shifted exponent, i.e. the search covers [0, span_max].
    fn span_max(&self) -> BigInt {
        if self.allow_negative {
            &self.bound << 1u32
        } else {
            self.bound.clone()
        }
    }

    // m = ceil(sqrt(span_max + 1)), if the table stays within MAX_TABLE_LEN
    fn table_len(&self) -> Option<u64> {
        let size: BigInt = self.span_max() + 1u32;
        let mut m = size.sqrt();
        if &m * &m < size {
            m += 1;
        }
        m.to_u64().filter(|m| *m <= MAX_TABLE_LEN)
    }

    /// Whether a solver can be built for this range, i.e. whether its
    /// baby-step table stays within [`MAX_TABLE_LEN`] entries.
    pub fn is_tractable(&self) -> bool {
        !self.bound.is_negative() && self.table_len().is_some()
    }
}

/// Baby-step giant-step solver for `target = k·g` with `k` in the configured
/// range.
///
/// The baby-step table depends on the generator only. [`Self::precompute`]
/// caches it so that later calls to [`Self::solve`] with that generator skip
/// the setup; solving with any other generator builds a temporary table.
/// Once built, the solver is read-only and may be shared between threads.
#[derive(Debug, Clone)]
pub struct BabyStepGiantStep<G: CyclicGroup> {
    config: DlogConfig,
    m: u64,
    cached: Option<(G, HashMap<G::Key, u64>)>,
}

impl<G: CyclicGroup> BabyStepGiantStep<G> {
    pub fn new(config: DlogConfig) -> Result<Self> {
        if config.group != G::KIND {
            return Err(malformed!(
                "solver configured for {:?} used with a {:?} group",
                config.group,
                G::KIND
            ));
        }
        if config.bound.is_negative() {
            return Err(malformed!("negative discrete log bound {}", config.bound));
        }

        let m = config
            .table_len()
            .ok_or_else(|| malformed!("discrete log bound {} too large", config.bound))?;

        Ok(BabyStepGiantStep {
            config,
            m,
            cached: None,
        })
    }

    pub fn config(&self) -> &DlogConfig {
        &self.config
    }

    fn baby_steps(&self, g: &G) -> Result<HashMap<G::Key, u64>> {
        let mut table = HashMap::with_capacity(self.m as usize);
        let mut cur = G::identity();
        for j in 0..self.m {
            table.entry(cur.table_key()?).or_insert(j);
            cur = cur.add(g);
        }
        Ok(table)
    }

    /// Builds and caches the baby-step table for `g`. Calling it again with
    /// the same generator does nothing.
    pub fn precompute(&mut self, g: &G) -> Result<()> {
        if matches!(&self.cached, Some((cached, _)) if cached == g) {
            return Ok(());
        }
        debug!("precomputing {} baby steps", self.m);
        let table = self.baby_steps(g)?;
        self.cached = Some((g.clone(), table));
        Ok(())
    }

    /// Finds `k` with `target = k·g`, or [`FeError::NotFound`] when no such
    /// `k` lies in the configured range.
    pub fn solve(&self, target: &G, g: &G) -> Result<BigInt> {
        let table = match &self.cached {
            Some((cached, table)) if cached == g => Cow::Borrowed(table),
            _ => Cow::Owned(self.baby_steps(g)?),
        };

        let offset = if self.config.allow_negative {
            self.config.bound.clone()
        } else {
            BigInt::zero()
        };
        let span_max = self.config.span_max();
        let m = BigInt::from(self.m);

        // search k + offset in [0, span_max]
        let mut cur = target.add(&g.scalar_mult(&offset));
        let giant = g.scalar_mult(&m).neg();
        for i in 0..self.m {
            if let Some(&j) = table.get(&cur.table_key()?) {
                let k = BigInt::from(i) * &m + j;
                if k <= span_max {
                    return Ok(k - offset);
                }
            }
            cur = cur.add(&giant);
        }

        Err(FeError::NotFound)
    }
}

/// Linear search for `k` in `[-bound, bound]` with `target = k·g`.
///
/// Only sensible for tiny bounds.
pub fn brute_force<G: CyclicGroup>(target: &G, g: &G, bound: &BigInt) -> Result<BigInt> {
    let mut k = BigInt::zero();
    let mut p = G::identity();
    while k <= *bound {
        if p == *target {
            return Ok(k);
        }
        if p.neg() == *target {
            return Ok(-k);
        }
        k += BigInt::one();
        p = p.add(g);
    }
    Err(FeError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{Ec, G1, Gt};
    use rand::rngs::OsRng;

    #[test]
    fn test_ec_full_signed_range() {
        let _ = env_logger::builder().is_test(true).try_init();
        let bound = BigInt::from(100);
        let mut bsgs = BabyStepGiantStep::<Ec>::new(DlogConfig::in_ec(bound.clone()).with_neg()).unwrap();
        let g = Ec::base();
        bsgs.precompute(&g).unwrap();

        for k in -100..=100 {
            let k = BigInt::from(k);
            assert_eq!(bsgs.solve(&g.scalar_mult(&k), &g).unwrap(), k);
        }
        for k in [101, -101, 1000, -5000] {
            let target = g.scalar_mult(&BigInt::from(k));
            assert_eq!(bsgs.solve(&target, &g), Err(FeError::NotFound));
        }
    }

    #[test]
    fn test_unsigned_range() {
        let bsgs = BabyStepGiantStep::<Ec>::new(DlogConfig::in_ec(BigInt::from(50))).unwrap();
        let g = Ec::base();

        assert_eq!(bsgs.solve(&g.scalar_mult(&BigInt::from(50)), &g).unwrap(), BigInt::from(50));
        assert_eq!(bsgs.solve(&Ec::unit(), &g).unwrap(), BigInt::from(0));
        assert_eq!(bsgs.solve(&g.neg(), &g), Err(FeError::NotFound));
        assert_eq!(bsgs.solve(&g.scalar_mult(&BigInt::from(51)), &g), Err(FeError::NotFound));
    }

    #[test]
    fn test_other_generator_after_precompute() {
        let mut bsgs = BabyStepGiantStep::<Ec>::new(DlogConfig::in_ec(BigInt::from(1000)).with_neg()).unwrap();
        bsgs.precompute(&Ec::base()).unwrap();

        let h = Ec::random(&mut OsRng);
        let k = BigInt::from(-777);
        assert_eq!(bsgs.solve(&h.scalar_mult(&k), &h).unwrap(), k);

        // cached table is still the one of the base point
        bsgs.precompute(&Ec::base()).unwrap();
        assert_eq!(bsgs.solve(&Ec::base().scalar_mult(&k), &Ec::base()).unwrap(), k);
    }

    #[test]
    fn test_pairing_groups() {
        let bound = BigInt::from(20);
        let mut bsgs = BabyStepGiantStep::<Gt>::new(DlogConfig::in_pairing(bound).with_neg()).unwrap();
        let g = Gt::base();
        bsgs.precompute(&g).unwrap();

        for k in [-20, -7, 0, 1, 13, 20] {
            let k = BigInt::from(k);
            assert_eq!(bsgs.solve(&g.scalar_mult(&k), &g).unwrap(), k);
        }
        assert_eq!(bsgs.solve(&g.scalar_mult(&BigInt::from(21)), &g), Err(FeError::NotFound));

        let g1 = BabyStepGiantStep::<G1>::new(DlogConfig::in_pairing(BigInt::from(10))).unwrap();
        let target = G1::base().scalar_mult(&BigInt::from(9));
        assert_eq!(g1.solve(&target, &G1::base()).unwrap(), BigInt::from(9));
    }

    #[test]
    fn test_group_kind_must_match() {
        assert!(BabyStepGiantStep::<Ec>::new(DlogConfig::in_pairing(BigInt::from(10))).is_err());
        assert!(BabyStepGiantStep::<Gt>::new(DlogConfig::in_ec(BigInt::from(10))).is_err());
        assert!(BabyStepGiantStep::<Ec>::new(DlogConfig::in_ec(BigInt::from(-1))).is_err());
        assert!(BabyStepGiantStep::<Ec>::new(DlogConfig::in_ec(BigInt::from(1) << 80)).is_err());
    }

    #[test]
    fn test_table_size_limit() {
        // span 2^52 needs m = 2^26 + 1 baby steps
        let at_limit: BigInt = BigInt::from(1) << 51;
        assert!(BabyStepGiantStep::<Ec>::new(DlogConfig::in_ec(at_limit.clone() - 1u32).with_neg()).is_ok());
        assert!(matches!(
            BabyStepGiantStep::<Ec>::new(DlogConfig::in_ec(at_limit).with_neg()),
            Err(FeError::MalformedInput(_))
        ));
        assert!(BabyStepGiantStep::<Gt>::new(DlogConfig::in_pairing(BigInt::from(1) << 62)).is_err());
        assert!(DlogConfig::in_ec(BigInt::from(1) << 51).is_tractable());
        assert!(!DlogConfig::in_ec(BigInt::from(1) << 51).with_neg().is_tractable());
        assert!(!DlogConfig::in_ec(BigInt::from(-1)).is_tractable());
    }

    #[test]
    fn test_brute_force() {
        let g = Ec::base();
        let bound = BigInt::from(30);
        for k in [-30, -1, 0, 17, 30] {
            let k = BigInt::from(k);
            assert_eq!(brute_force(&g.scalar_mult(&k), &g, &bound).unwrap(), k);
        }
        assert_eq!(
            brute_force(&g.scalar_mult(&BigInt::from(31)), &g, &bound),
            Err(FeError::NotFound)
        );
    }
}
