//! Attribute-based encryption.

pub mod gpsw;

pub use gpsw::Gpsw;
