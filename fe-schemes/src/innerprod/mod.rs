//! Schemes for the inner product `⟨x, y⟩` of bounded integer vectors.

pub mod ec_ipe;
pub mod lwe;
pub mod paillier;
pub mod ring_lwe;

pub use ec_ipe::EcIpe;
pub use lwe::Lwe;
pub use paillier::Paillier;
pub use ring_lwe::RingLwe;
