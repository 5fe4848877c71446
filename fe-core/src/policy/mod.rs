//! Boolean access policies and their monotone span programs.
//!
//! A policy string such as `"(1 OR 4) AND (2 OR (0 AND 1))"` is parsed into a
//! [`BoolExpr`] and compiled into an [`Msp`] with the Lewko-Waters
//! construction, normalised so that qualified row sets span the all-ones
//! vector.

mod msp;
mod parser;

pub use msp::{Msp, boolean_to_msp, expr_to_msp};
pub use parser::{BoolExpr, parse};
