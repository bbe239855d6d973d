//! Witness generators for the big-integer gadgets.
//!
//! Each generator recomputes hint values off-circuit and fails with an error
//! when its inputs cannot satisfy the constraints it feeds.

use anyhow::{anyhow, ensure, Result};
use num_bigint::BigUint;
use num_traits::Zero;
use plonky2::field::extension::Extendable;
use plonky2::hash::hash_types::RichField;
use plonky2::iop::generator::{GeneratedValues, SimpleGenerator};
use plonky2::iop::target::Target;
use plonky2::iop::witness::{PartitionWitness, Witness, WitnessWrite};
use plonky2::plonk::circuit_data::CommonCircuitData;
use plonky2::util::serialization::{Buffer, IoResult, Read, Write};

use crate::snark::field::{from_signed, to_signed};
use crate::snark::gadgets::bigint::BigIntTarget;
use crate::snark::limbs::{propagate_signed_carries, LimbLayout, LimbVector};

pub(crate) fn read_bigint<F: RichField>(witness: &PartitionWitness<F>, x: &BigIntTarget) -> BigUint {
    x.limbs.iter().rev().fold(BigUint::zero(), |acc, &t| {
        (acc << x.layout.limb_bits) + witness.get_target(t).to_canonical_u64()
    })
}

fn write_bigint<F: RichField>(
    out_buffer: &mut GeneratedValues<F>,
    target: &BigIntTarget,
    value: &BigUint,
) -> Result<()> {
    let limbs = LimbVector::<F>::decompose(value, target.layout)?;
    for (&t, &v) in target.limbs.iter().zip(limbs.limbs()) {
        out_buffer.set_target(t, v)?;
    }
    Ok(())
}

fn serialize_bigint(dst: &mut Vec<u8>, x: &BigIntTarget) -> IoResult<()> {
    dst.write_usize(x.layout.limb_bits)?;
    dst.write_target_vec(&x.limbs)
}

fn deserialize_bigint(src: &mut Buffer) -> IoResult<BigIntTarget> {
    let limb_bits = src.read_usize()?;
    let limbs = src.read_target_vec()?;
    let layout = LimbLayout {
        limb_bits,
        num_limbs: limbs.len(),
    };
    Ok(BigIntTarget { limbs, layout })
}

/// Produces `q = a·b / n` and `r = a·b mod n`.
#[derive(Debug, Clone)]
pub struct DivRemGenerator {
    pub a: BigIntTarget,
    pub b: BigIntTarget,
    pub n: BigIntTarget,
    pub quotient: BigIntTarget,
    pub remainder: BigIntTarget,
}

impl<F: RichField + Extendable<D>, const D: usize> SimpleGenerator<F, D> for DivRemGenerator {
    fn id(&self) -> String {
        "DivRemGenerator".to_string()
    }

    fn dependencies(&self) -> Vec<Target> {
        self.a
            .limbs
            .iter()
            .chain(&self.b.limbs)
            .chain(&self.n.limbs)
            .copied()
            .collect()
    }

    fn run_once(
        &self,
        witness: &PartitionWitness<F>,
        out_buffer: &mut GeneratedValues<F>,
    ) -> Result<()> {
        let a = read_bigint(witness, &self.a);
        let b = read_bigint(witness, &self.b);
        let n = read_bigint(witness, &self.n);
        ensure!(!n.is_zero(), "modular product with a zero modulus");

        let product = a * b;
        let q = &product / &n;
        let r = &product % &n;
        write_bigint(out_buffer, &self.quotient, &q)
            .map_err(|e| anyhow!("quotient does not fit its limbs: {e}"))?;
        write_bigint(out_buffer, &self.remainder, &r)
    }

    fn serialize(&self, dst: &mut Vec<u8>, _common_data: &CommonCircuitData<F, D>) -> IoResult<()> {
        for x in [&self.a, &self.b, &self.n, &self.quotient, &self.remainder] {
            serialize_bigint(dst, x)?;
        }
        Ok(())
    }

    fn deserialize(src: &mut Buffer, _common_data: &CommonCircuitData<F, D>) -> IoResult<Self> {
        Ok(Self {
            a: deserialize_bigint(src)?,
            b: deserialize_bigint(src)?,
            n: deserialize_bigint(src)?,
            quotient: deserialize_bigint(src)?,
            remainder: deserialize_bigint(src)?,
        })
    }
}

/// Produces `d = b − a − 1`, which exists in range only when `a < b`.
#[derive(Debug, Clone)]
pub struct LessThanGenerator {
    pub a: BigIntTarget,
    pub b: BigIntTarget,
    pub diff: BigIntTarget,
}

impl<F: RichField + Extendable<D>, const D: usize> SimpleGenerator<F, D> for LessThanGenerator {
    fn id(&self) -> String {
        "LessThanGenerator".to_string()
    }

    fn dependencies(&self) -> Vec<Target> {
        self.a.limbs.iter().chain(&self.b.limbs).copied().collect()
    }

    fn run_once(
        &self,
        witness: &PartitionWitness<F>,
        out_buffer: &mut GeneratedValues<F>,
    ) -> Result<()> {
        let a = read_bigint(witness, &self.a);
        let b = read_bigint(witness, &self.b);
        ensure!(a < b, "left operand is not below the bound");
        write_bigint(out_buffer, &self.diff, &(b - a - 1u32))
    }

    fn serialize(&self, dst: &mut Vec<u8>, _common_data: &CommonCircuitData<F, D>) -> IoResult<()> {
        serialize_bigint(dst, &self.a)?;
        serialize_bigint(dst, &self.b)?;
        serialize_bigint(dst, &self.diff)
    }

    fn deserialize(src: &mut Buffer, _common_data: &CommonCircuitData<F, D>) -> IoResult<Self> {
        Ok(Self {
            a: deserialize_bigint(src)?,
            b: deserialize_bigint(src)?,
            diff: deserialize_bigint(src)?,
        })
    }
}

/// Produces shifted carries `t_j = c_j + 2^offset_bits` for columns that
/// should encode zero in base `2^limb_bits`.
#[derive(Debug, Clone)]
pub struct CarryGenerator {
    pub columns: Vec<Target>,
    pub carries: Vec<Target>,
    pub limb_bits: usize,
    pub offset_bits: usize,
}

impl<F: RichField + Extendable<D>, const D: usize> SimpleGenerator<F, D> for CarryGenerator {
    fn id(&self) -> String {
        "CarryGenerator".to_string()
    }

    fn dependencies(&self) -> Vec<Target> {
        self.columns.clone()
    }

    fn run_once(
        &self,
        witness: &PartitionWitness<F>,
        out_buffer: &mut GeneratedValues<F>,
    ) -> Result<()> {
        let columns: Vec<i128> = self
            .columns
            .iter()
            .map(|&t| to_signed(witness.get_target(t)))
            .collect();
        let carries = propagate_signed_carries(&columns, self.limb_bits)?;
        ensure!(
            carries.len() == self.carries.len(),
            "expected {} carries, computed {}",
            self.carries.len(),
            carries.len()
        );
        let offset = 1i128 << self.offset_bits;
        for (&t, &carry) in self.carries.iter().zip(&carries) {
            let shifted = carry + offset;
            ensure!(
                (0..2 * offset).contains(&shifted),
                "carry {carry} exceeds {} bits",
                self.offset_bits
            );
            out_buffer.set_target(t, from_signed(shifted))?;
        }
        Ok(())
    }

    fn serialize(&self, dst: &mut Vec<u8>, _common_data: &CommonCircuitData<F, D>) -> IoResult<()> {
        dst.write_target_vec(&self.columns)?;
        dst.write_target_vec(&self.carries)?;
        dst.write_usize(self.limb_bits)?;
        dst.write_usize(self.offset_bits)
    }

    fn deserialize(src: &mut Buffer, _common_data: &CommonCircuitData<F, D>) -> IoResult<Self> {
        Ok(Self {
            columns: src.read_target_vec()?,
            carries: src.read_target_vec()?,
            limb_bits: src.read_usize()?,
            offset_bits: src.read_usize()?,
        })
    }
}
