//! Parameter and mode types shared across the crate.

pub mod params;

pub use params::{CircuitParams, ProofMode};
