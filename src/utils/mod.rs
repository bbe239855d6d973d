//! Utility modules for packing, parsing, armor and circuit statistics.

pub mod armor;
pub mod bit_packing;
pub mod circuit_stats;
pub mod parsing;
