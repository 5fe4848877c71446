//! Arithmetic engines shared by the functional encryption schemes.
//!
//! * [`group`]: modular arithmetic, the Ristretto group and the BLS12-381
//!   pairing groups.
//! * [`sample`]: uniform and discrete Gaussian samplers.
//! * [`data`]: vectors and matrices over integers and groups, Gaussian
//!   elimination modulo a prime.
//! * [`dlog`]: bounded discrete logarithms.
//! * [`policy`]: boolean policies compiled into monotone span programs.

pub mod data;
pub mod dlog;
mod error;
pub mod group;
pub mod policy;
pub mod sample;
pub mod traits;

pub use error::{FeError, Result};
