//! Functional encryption for quadratic functions `xᵀ·F·y`.

pub mod sgp;

pub use sgp::Sgp;
