//! Functional encryption schemes built on the `fe-core` engines.
//!
//! * [`innerprod`]: inner-product schemes over an elliptic curve, Paillier
//!   moduli, LWE and Ring-LWE.
//! * [`quadratic`]: quadratic functions `xᵀ·F·y` over a pairing.
//! * [`abe`]: key-policy attribute-based encryption.

pub mod abe;
pub mod innerprod;
pub mod quadratic;
pub mod traits;

pub use fe_core::{FeError, Result};
