pub mod group_signature;
pub mod public_inputs;
