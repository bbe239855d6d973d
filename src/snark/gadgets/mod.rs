//! Circuit gadgets for RSA group signatures.

pub mod bigint;
pub mod generators;
pub mod membership;
pub mod modexp;
pub mod nullifier;

pub use bigint::{BigIntTarget, CircuitBuilderBigInt, WitnessBigInt};
pub use membership::add_membership_constraints;
pub use modexp::pow_mod_fixed_exponent;
pub use nullifier::{add_nullifier_constraints, compute_nullifier, Nonce, Nullifier, NULLIFIER_DOMAIN};

/// Whether proving fails, either with an error or with a witness-generation panic.
#[cfg(test)]
pub(crate) fn proving_fails<C: plonky2::plonk::config::GenericConfig<D>, const D: usize>(
    data: &plonky2::plonk::circuit_data::CircuitData<C::F, C, D>,
    pw: plonky2::iop::witness::PartialWitness<C::F>,
) -> bool {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| data.prove(pw)));
    !matches!(result, Ok(Ok(_)))
}
