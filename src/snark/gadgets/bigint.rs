//! Big-integer gadgets over limb-decomposed targets.
//!
//! All operands share one [`LimbLayout`]. Every limb produced by these gadgets
//! is range-checked; callers range-check the limbs they introduce themselves
//! (see [`CircuitBuilderBigInt::add_virtual_bigint_target`]).

use num_bigint::BigUint;
use plonky2::field::extension::Extendable;
use plonky2::field::types::Field;
use plonky2::hash::hash_types::RichField;
use plonky2::iop::target::{BoolTarget, Target};
use plonky2::iop::witness::WitnessWrite;
use plonky2::plonk::circuit_builder::CircuitBuilder;

use crate::snark::gadgets::generators::{CarryGenerator, DivRemGenerator, LessThanGenerator};
use crate::snark::limbs::{LimbLayout, LimbVector};

/// Limb targets of a non-negative integer, least-significant first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BigIntTarget {
    pub limbs: Vec<Target>,
    pub layout: LimbLayout,
}

impl BigIntTarget {
    pub fn num_limbs(&self) -> usize {
        self.limbs.len()
    }
}

pub trait CircuitBuilderBigInt<F: RichField + Extendable<D>, const D: usize> {
    /// Fresh limbs, each range-checked to `layout.limb_bits`.
    fn add_virtual_bigint_target(&mut self, layout: LimbLayout) -> BigIntTarget;

    fn register_bigint_public_input(&mut self, x: &BigIntTarget);

    fn constant_bigint(&mut self, value: &LimbVector<F>) -> BigIntTarget;

    fn range_check_bigint(&mut self, x: &BigIntTarget);

    /// Constrain `x` to have exactly `bits` significant bits.
    fn assert_bigint_bit_length(&mut self, x: &BigIntTarget, bits: usize);

    fn connect_bigint(&mut self, a: &BigIntTarget, b: &BigIntTarget);

    fn is_equal_bigint(&mut self, a: &BigIntTarget, b: &BigIntTarget) -> BoolTarget;

    /// Constrain `a < b`.
    fn assert_bigint_lt(&mut self, a: &BigIntTarget, b: &BigIntTarget);

    /// `a · b mod n`, for `a, b < n`.
    fn mul_mod_bigint(
        &mut self,
        a: &BigIntTarget,
        b: &BigIntTarget,
        n: &BigIntTarget,
    ) -> BigIntTarget;

    /// Constrain `Σ columns[j] · 2^(limb_bits · j) = 0`, where every column is
    /// an integer of magnitude below `2^column_bits`.
    fn assert_limb_sum_zero(&mut self, columns: &[Target], limb_bits: usize, column_bits: usize);
}

impl<F: RichField + Extendable<D>, const D: usize> CircuitBuilderBigInt<F, D>
    for CircuitBuilder<F, D>
{
    fn add_virtual_bigint_target(&mut self, layout: LimbLayout) -> BigIntTarget {
        let x = BigIntTarget {
            limbs: self.add_virtual_targets(layout.num_limbs),
            layout,
        };
        self.range_check_bigint(&x);
        x
    }

    fn register_bigint_public_input(&mut self, x: &BigIntTarget) {
        self.register_public_inputs(&x.limbs);
    }

    fn constant_bigint(&mut self, value: &LimbVector<F>) -> BigIntTarget {
        BigIntTarget {
            limbs: value.limbs().iter().map(|&l| self.constant(l)).collect(),
            layout: value.layout(),
        }
    }

    fn range_check_bigint(&mut self, x: &BigIntTarget) {
        for &limb in &x.limbs {
            self.range_check(limb, x.layout.limb_bits);
        }
    }

    fn assert_bigint_bit_length(&mut self, x: &BigIntTarget, bits: usize) {
        assert!(
            bits >= 1 && bits <= x.layout.total_bits(),
            "bit length {bits} outside the {}-bit layout",
            x.layout.total_bits()
        );
        let top = (bits - 1) / x.layout.limb_bits;
        let pos = (bits - 1) % x.layout.limb_bits;
        for &limb in &x.limbs[top + 1..] {
            self.assert_zero(limb);
        }
        // The top limb lies in [2^pos, 2^(pos + 1)).
        let shifted = self.add_const(x.limbs[top], -F::from_canonical_u64(1u64 << pos));
        if pos == 0 {
            self.assert_zero(shifted);
        } else {
            self.range_check(shifted, pos);
        }
    }

    fn connect_bigint(&mut self, a: &BigIntTarget, b: &BigIntTarget) {
        assert_eq!(a.layout, b.layout);
        for (&x, &y) in a.limbs.iter().zip(&b.limbs) {
            self.connect(x, y);
        }
    }

    fn is_equal_bigint(&mut self, a: &BigIntTarget, b: &BigIntTarget) -> BoolTarget {
        assert_eq!(a.layout, b.layout);
        let mut all_equal = self._true();
        for (&x, &y) in a.limbs.iter().zip(&b.limbs) {
            let eq = self.is_equal(x, y);
            all_equal = self.and(all_equal, eq);
        }
        all_equal
    }

    fn assert_bigint_lt(&mut self, a: &BigIntTarget, b: &BigIntTarget) {
        assert_eq!(a.layout, b.layout);
        let layout = a.layout;
        let diff = self.add_virtual_bigint_target(layout);
        self.add_simple_generator(LessThanGenerator {
            a: a.clone(),
            b: b.clone(),
            diff: diff.clone(),
        });

        // a + diff + 1 − b = 0
        let columns: Vec<Target> = (0..layout.num_limbs)
            .map(|j| {
                let sum = self.add(a.limbs[j], diff.limbs[j]);
                let sum = if j == 0 { self.add_const(sum, F::ONE) } else { sum };
                self.sub(sum, b.limbs[j])
            })
            .collect();
        self.assert_limb_sum_zero(&columns, layout.limb_bits, layout.limb_bits + 2);
    }

    fn mul_mod_bigint(
        &mut self,
        a: &BigIntTarget,
        b: &BigIntTarget,
        n: &BigIntTarget,
    ) -> BigIntTarget {
        assert_eq!(a.layout, n.layout);
        assert_eq!(b.layout, n.layout);
        let layout = n.layout;
        let k = layout.num_limbs;

        let quotient = self.add_virtual_bigint_target(layout);
        let remainder = self.add_virtual_bigint_target(layout);
        self.add_simple_generator(DivRemGenerator {
            a: a.clone(),
            b: b.clone(),
            n: n.clone(),
            quotient: quotient.clone(),
            remainder: remainder.clone(),
        });

        // D_j = Σ a_i b_{j−i} − Σ q_i n_{j−i} − r_j
        let columns: Vec<Target> = (0..2 * k - 1)
            .map(|j| {
                let mut acc = if j < k {
                    self.neg(remainder.limbs[j])
                } else {
                    self.zero()
                };
                for i in j.saturating_sub(k - 1)..=j.min(k - 1) {
                    acc = self.mul_add(a.limbs[i], b.limbs[j - i], acc);
                    acc = self.arithmetic(
                        F::NEG_ONE,
                        F::ONE,
                        quotient.limbs[i],
                        n.limbs[j - i],
                        acc,
                    );
                }
                acc
            })
            .collect();
        self.assert_limb_sum_zero(&columns, layout.limb_bits, layout.product_column_bits());
        self.assert_bigint_lt(&remainder, n);

        remainder
    }

    fn assert_limb_sum_zero(&mut self, columns: &[Target], limb_bits: usize, column_bits: usize) {
        let Some((&last, rest)) = columns.split_last() else {
            return;
        };
        if rest.is_empty() {
            self.assert_zero(last);
            return;
        }
        assert!(column_bits >= limb_bits);
        assert!(column_bits + 2 <= 63, "carry equations would wrap the field");

        // Signed carries c_j are shifted into [0, 2^(offset_bits + 1)).
        let offset_bits = column_bits - limb_bits + 1;
        let offset = F::from_canonical_u64(1u64 << offset_bits);
        let base = F::from_canonical_u64(1u64 << limb_bits);

        let carries = self.add_virtual_targets(rest.len());
        for &t in &carries {
            self.range_check(t, offset_bits + 1);
        }
        self.add_simple_generator(CarryGenerator {
            columns: columns.to_vec(),
            carries: carries.clone(),
            limb_bits,
            offset_bits,
        });

        // column_j + c_{j−1} = c_j · 2^w, written with t_j = c_j + offset.
        for (j, &column) in rest.iter().enumerate() {
            let lhs = if j == 0 {
                self.add_const(column, offset * base)
            } else {
                let sum = self.add(column, carries[j - 1]);
                self.add_const(sum, offset * base - offset)
            };
            let rhs = self.mul_const(base, carries[j]);
            self.connect(lhs, rhs);
        }
        let top = self.add(last, carries[rest.len() - 1]);
        let expected = self.constant(offset);
        self.connect(top, expected);
    }
}

/// Witness assignment for [`BigIntTarget`]s.
pub trait WitnessBigInt<F: RichField>: WitnessWrite<F> {
    fn set_bigint_target(&mut self, target: &BigIntTarget, value: &BigUint) -> anyhow::Result<()>;
}

impl<F: RichField, W: WitnessWrite<F>> WitnessBigInt<F> for W {
    fn set_bigint_target(&mut self, target: &BigIntTarget, value: &BigUint) -> anyhow::Result<()> {
        let limbs = LimbVector::<F>::decompose(value, target.layout)?;
        for (&t, &v) in target.limbs.iter().zip(limbs.limbs()) {
            self.set_target(t, v)?;
        }
        Ok(())
    }
}
