//! One-of-N membership: the private candidate equals one of the public slots.

use plonky2::field::extension::Extendable;
use plonky2::hash::hash_types::RichField;
use plonky2::iop::target::BoolTarget;
use plonky2::plonk::circuit_builder::CircuitBuilder;

use crate::snark::gadgets::bigint::{BigIntTarget, CircuitBuilderBigInt};

/// Constrain `candidate` to equal the slot picked by a one-hot selector.
///
/// Returns the selector bits; the prover sets exactly one of them. With no
/// slots or no matching slot the constraints are unsatisfiable.
pub fn add_membership_constraints<F: RichField + Extendable<D>, const D: usize>(
    builder: &mut CircuitBuilder<F, D>,
    candidate: &BigIntTarget,
    slots: &[BigIntTarget],
) -> Vec<BoolTarget> {
    let one = builder.one();
    if slots.is_empty() {
        let zero = builder.zero();
        builder.connect(zero, one);
        return Vec::new();
    }

    let selectors: Vec<BoolTarget> = (0..slots.len())
        .map(|_| builder.add_virtual_bool_target_safe())
        .collect();

    let mut selected = builder.zero();
    let mut matched = builder.zero();
    for (slot, s) in slots.iter().zip(&selectors) {
        let eq = builder.is_equal_bigint(candidate, slot);
        selected = builder.add(selected, s.target);
        matched = builder.mul_add(s.target, eq.target, matched);
    }
    builder.connect(selected, one);
    builder.connect(matched, one);

    selectors
}
