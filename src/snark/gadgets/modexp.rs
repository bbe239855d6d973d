//! Modular exponentiation by a public, compile-time exponent.

use num_bigint::BigUint;
use plonky2::field::extension::Extendable;
use plonky2::hash::hash_types::RichField;
use plonky2::plonk::circuit_builder::CircuitBuilder;

use crate::snark::gadgets::bigint::{BigIntTarget, CircuitBuilderBigInt};

/// `base^exponent mod n` by left-to-right square-and-multiply.
///
/// The multiplication schedule depends only on `exponent`, so the circuit shape
/// is the same for every witness. For 65537 this is 16 squarings and one
/// multiplication. `base < n` is enforced.
pub fn pow_mod_fixed_exponent<F: RichField + Extendable<D>, const D: usize>(
    builder: &mut CircuitBuilder<F, D>,
    base: &BigIntTarget,
    exponent: &BigUint,
    n: &BigIntTarget,
) -> BigIntTarget {
    assert!(exponent.bits() > 0, "exponent must be positive");
    builder.assert_bigint_lt(base, n);

    let mut acc = base.clone();
    for i in (0..exponent.bits() - 1).rev() {
        acc = builder.mul_mod_bigint(&acc, &acc, n);
        if exponent.bit(i) {
            acc = builder.mul_mod_bigint(&acc, base, n);
        }
    }
    acc
}

/// Number of modular multiplications [`pow_mod_fixed_exponent`] emits.
pub fn multiplication_count(exponent: &BigUint) -> usize {
    let bits = exponent.bits() as usize;
    let ones = exponent.count_ones() as usize;
    bits.saturating_sub(1) + ones.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snark::gadgets::bigint::WitnessBigInt;
    use crate::snark::gadgets::proving_fails;
    use crate::snark::limbs::{LimbLayout, LimbVector};
    use anyhow::Result;
    use num_bigint::RandBigInt;
    use plonky2::iop::witness::PartialWitness;
    use plonky2::plonk::circuit_data::CircuitConfig;
    use plonky2::plonk::config::{GenericConfig, PoseidonGoldilocksConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const D: usize = 2;
    type Cfg = PoseidonGoldilocksConfig;
    type F = <Cfg as GenericConfig<D>>::F;

    #[test]
    fn test_multiplication_count() {
        assert_eq!(multiplication_count(&BigUint::from(65537u32)), 17);
        assert_eq!(multiplication_count(&BigUint::from(3u32)), 2);
        assert_eq!(multiplication_count(&BigUint::from(1u32)), 0);
    }

    #[test]
    fn test_pow_mod_matches_modpow() -> Result<()> {
        let layout = LimbLayout::for_key_bits(256)?;
        let e = BigUint::from(65537u32);
        let mut builder = CircuitBuilder::<F, D>::new(CircuitConfig::standard_recursion_config());
        let base = builder.add_virtual_bigint_target(layout);
        let n = builder.add_virtual_bigint_target(layout);
        let out = pow_mod_fixed_exponent(&mut builder, &base, &e, &n);
        builder.register_bigint_public_input(&out);
        let data = builder.build::<Cfg>();

        let mut rng = StdRng::seed_from_u64(3);
        let nv = rng.gen_biguint(256) | (BigUint::from(1u8) << 255u32) | BigUint::from(1u8);
        let bv = rng.gen_biguint_below(&nv);
        let mut pw = PartialWitness::new();
        pw.set_bigint_target(&base, &bv)?;
        pw.set_bigint_target(&n, &nv)?;
        let proof = data.prove(pw)?;
        data.verify(proof.clone())?;

        let result = LimbVector::from_limbs(proof.public_inputs, layout)?.recompose();
        assert_eq!(result, bv.modpow(&e, &nv));
        Ok(())
    }

    #[test]
    fn test_pow_mod_rejects_unreduced_base() -> Result<()> {
        let layout = LimbLayout::for_key_bits(64)?;
        let e = BigUint::from(3u32);
        let mut builder = CircuitBuilder::<F, D>::new(CircuitConfig::standard_recursion_config());
        let base = builder.add_virtual_bigint_target(layout);
        let n = builder.add_virtual_bigint_target(layout);
        pow_mod_fixed_exponent(&mut builder, &base, &e, &n);
        let data = builder.build::<Cfg>();

        let nv = BigUint::from(0xFFFF_FFFF_FFFF_FFC5u64);
        let mut pw = PartialWitness::new();
        pw.set_bigint_target(&base, &(&nv + 5u32))?;
        pw.set_bigint_target(&n, &nv)?;
        assert!(proving_fails(&data, pw));
        Ok(())
    }
}
