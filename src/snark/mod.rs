//! Circuit-side building blocks: field helpers, limb arithmetic and gadgets.

pub mod field;
pub mod gadgets;
pub mod limbs;
