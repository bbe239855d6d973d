//! Limb decomposition of big integers into field-sized chunks.
//!
//! Limbs are stored least-significant first: the value of a [`LimbVector`] is
//! `Σ limb[i] · 2^(limb_bits · i)`.

use anyhow::ensure;
use num_bigint::BigUint;
use num_traits::Zero;
use plonky2::field::goldilocks_field::GoldilocksField;
use plonky2::field::types::PrimeField64;
use serde::{Deserialize, Serialize};

use crate::error::{GroupSigError, Result};

/// Widest limb a Goldilocks element can hold without reduction.
pub const MAX_LIMB_BITS: usize = 63;

/// Widest limb used for RSA-sized integers inside circuits.
pub const MAX_CIRCUIT_LIMB_BITS: usize = 32;

/// Shape of a limb-decomposed integer: `num_limbs` chunks of `limb_bits` bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LimbLayout {
    pub limb_bits: usize,
    pub num_limbs: usize,
}

impl LimbLayout {
    pub fn new(limb_bits: usize, num_limbs: usize) -> Result<Self> {
        if limb_bits == 0 || limb_bits > MAX_LIMB_BITS {
            return Err(GroupSigError::CircuitShape(format!(
                "limb width must be between 1 and {MAX_LIMB_BITS} bits, got {limb_bits}"
            )));
        }
        if num_limbs == 0 {
            return Err(GroupSigError::CircuitShape(
                "a limb vector needs at least one limb".to_string(),
            ));
        }
        Ok(Self {
            limb_bits,
            num_limbs,
        })
    }

    /// Widest layout covering `bits` whose limb products can be summed without
    /// wrapping the field.
    pub fn for_key_bits(bits: usize) -> Result<Self> {
        if bits == 0 {
            return Err(GroupSigError::CircuitShape(
                "key width must be positive".to_string(),
            ));
        }
        (1..=MAX_CIRCUIT_LIMB_BITS)
            .rev()
            .map(|limb_bits| Self {
                limb_bits,
                num_limbs: bits.div_ceil(limb_bits),
            })
            .find(|layout| layout.is_mul_safe())
            .ok_or_else(|| {
                GroupSigError::CircuitShape(format!("no safe limb layout for {bits}-bit integers"))
            })
    }

    pub fn total_bits(&self) -> usize {
        self.limb_bits * self.num_limbs
    }

    /// 2^limb_bits
    pub fn base(&self) -> u64 {
        1u64 << self.limb_bits
    }

    pub fn ceil_log2_limbs(&self) -> usize {
        ceil_log2(self.num_limbs)
    }

    /// Bit bound on the magnitude of one column of a schoolbook product
    /// `a·b − q·n − r` of two vectors in this layout.
    pub fn product_column_bits(&self) -> usize {
        2 * self.limb_bits + self.ceil_log2_limbs() + 1
    }

    /// Whether the carry equations of a product column stay strictly inside
    /// (-p/2, p/2): column, carry and shifted carry together need two more bits.
    pub fn is_mul_safe(&self) -> bool {
        self.limb_bits <= MAX_CIRCUIT_LIMB_BITS && self.product_column_bits() + 2 <= MAX_LIMB_BITS
    }

    pub fn ensure_mul_safe(&self) -> Result<()> {
        if self.is_mul_safe() {
            Ok(())
        } else {
            Err(GroupSigError::CircuitShape(format!(
                "{} limbs of {} bits: column sums of {} bits would wrap the field",
                self.num_limbs,
                self.limb_bits,
                self.product_column_bits()
            )))
        }
    }
}

pub fn ceil_log2(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

/// A big integer split into field elements according to a [`LimbLayout`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LimbVector<F = GoldilocksField> {
    layout: LimbLayout,
    limbs: Vec<F>,
}

impl<F: PrimeField64> LimbVector<F> {
    /// Split `value` into `layout.num_limbs` limbs, zero-padding the high end.
    ///
    /// Values wider than the layout are rejected, never truncated.
    pub fn decompose(value: &BigUint, layout: LimbLayout) -> Result<Self> {
        let bits = value.bits();
        if bits > layout.total_bits() as u64 {
            return Err(GroupSigError::LimbOverflow {
                bits,
                max_bits: layout.total_bits(),
            });
        }
        let mask = BigUint::from(layout.base() - 1);
        let limbs = (0..layout.num_limbs)
            .map(|i| {
                let limb = (value >> (i * layout.limb_bits)) & &mask;
                F::from_canonical_u64(limb.iter_u64_digits().next().unwrap_or(0))
            })
            .collect();
        Ok(Self { layout, limbs })
    }

    /// Wrap existing limbs, checking count and per-limb range.
    pub fn from_limbs(limbs: Vec<F>, layout: LimbLayout) -> Result<Self> {
        if limbs.len() != layout.num_limbs {
            return Err(GroupSigError::LimbOverflow {
                bits: (limbs.len() * layout.limb_bits) as u64,
                max_bits: layout.total_bits(),
            });
        }
        if let Some(limb) = limbs
            .iter()
            .map(|l| l.to_canonical_u64())
            .find(|&l| l >= layout.base())
        {
            return Err(GroupSigError::LimbOverflow {
                bits: (64 - limb.leading_zeros()) as u64,
                max_bits: layout.limb_bits,
            });
        }
        Ok(Self { layout, limbs })
    }

    pub fn zero(layout: LimbLayout) -> Self {
        Self {
            layout,
            limbs: vec![F::ZERO; layout.num_limbs],
        }
    }

    /// Exact inverse of [`LimbVector::decompose`].
    pub fn recompose(&self) -> BigUint {
        self.limbs.iter().rev().fold(BigUint::zero(), |acc, limb| {
            (acc << self.layout.limb_bits) + limb.to_canonical_u64()
        })
    }

    pub fn layout(&self) -> LimbLayout {
        self.layout
    }

    pub fn limbs(&self) -> &[F] {
        &self.limbs
    }

    pub fn to_u64_limbs(&self) -> Vec<u64> {
        self.limbs.iter().map(|l| l.to_canonical_u64()).collect()
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|l| l.to_canonical_u64() == 0)
    }
}

/// Column sums of the schoolbook product `a · b`, without carries.
pub fn column_products(a: &[u64], b: &[u64]) -> Vec<i128> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut columns = vec![0i128; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            columns[i + j] += x as i128 * y as i128;
        }
    }
    columns
}

/// Carries `c_j` with `columns[j] + c_{j-1} = c_j · 2^limb_bits` and a zero final carry.
///
/// Succeeds exactly when `Σ columns[j] · 2^(limb_bits · j) = 0`; the returned
/// vector has one carry per column except the last.
pub fn propagate_signed_carries(columns: &[i128], limb_bits: usize) -> anyhow::Result<Vec<i128>> {
    let base = 1i128 << limb_bits;
    let mut carries = Vec::with_capacity(columns.len().saturating_sub(1));
    let mut carry = 0i128;
    for (j, column) in columns.iter().enumerate() {
        let total = column + carry;
        if j + 1 == columns.len() {
            ensure!(total == 0, "limb columns leave a non-zero top carry of {total}");
            break;
        }
        ensure!(
            total.rem_euclid(base) == 0,
            "limb column {j} is not divisible by 2^{limb_bits}"
        );
        carry = total / base;
        carries.push(carry);
    }
    Ok(carries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::RandBigInt;
    use plonky2::field::types::Field;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    type F = GoldilocksField;

    #[test]
    fn test_round_trip_decomposition() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        for key_bits in [64usize, 1024, 2048, 4096] {
            let layout = LimbLayout::for_key_bits(key_bits)?;
            for _ in 0..32 {
                let x = rng.gen_biguint(key_bits as u64);
                let limbs = LimbVector::<F>::decompose(&x, layout)?;
                assert_eq!(limbs.limbs().len(), layout.num_limbs);
                assert_eq!(limbs.recompose(), x);
            }
        }
        Ok(())
    }

    #[test]
    fn test_decompose_is_least_significant_first_and_padded() -> Result<()> {
        let layout = LimbLayout::new(32, 4)?;
        let x = BigUint::from(0x0000_0002_0000_0001u64);
        let limbs = LimbVector::<F>::decompose(&x, layout)?;
        assert_eq!(limbs.to_u64_limbs(), vec![1, 2, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_decompose_rejects_oversized_values() -> Result<()> {
        let layout = LimbLayout::new(32, 2)?;
        let x = BigUint::from(1u8) << 64;
        match LimbVector::<F>::decompose(&x, layout) {
            Err(GroupSigError::LimbOverflow { bits, max_bits }) => {
                assert_eq!(bits, 65);
                assert_eq!(max_bits, 64);
            }
            other => panic!("expected LimbOverflow, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_from_limbs_checks_range() -> Result<()> {
        let layout = LimbLayout::new(8, 2)?;
        assert!(LimbVector::from_limbs(vec![F::from_canonical_u64(255), F::ONE], layout).is_ok());
        assert!(matches!(
            LimbVector::from_limbs(vec![F::from_canonical_u64(256), F::ONE], layout),
            Err(GroupSigError::LimbOverflow { .. })
        ));
        assert!(LimbVector::from_limbs(vec![F::ONE], layout).is_err());
        Ok(())
    }

    #[test]
    fn test_layouts_for_rsa_widths() -> Result<()> {
        let l1024 = LimbLayout::for_key_bits(1024)?;
        assert_eq!((l1024.limb_bits, l1024.num_limbs), (27, 38));
        let l2048 = LimbLayout::for_key_bits(2048)?;
        assert_eq!((l2048.limb_bits, l2048.num_limbs), (26, 79));
        let l4096 = LimbLayout::for_key_bits(4096)?;
        assert_eq!((l4096.limb_bits, l4096.num_limbs), (26, 158));
        for layout in [l1024, l2048, l4096] {
            assert!(layout.is_mul_safe());
            assert!(layout.total_bits() >= 1024);
        }
        Ok(())
    }

    #[test]
    fn test_unsafe_layout_is_reported() -> Result<()> {
        let layout = LimbLayout::new(32, 128)?;
        assert!(!layout.is_mul_safe());
        assert!(matches!(
            layout.ensure_mul_safe(),
            Err(GroupSigError::CircuitShape(_))
        ));
        Ok(())
    }

    #[test]
    fn test_signed_carries_match_bigint_identity() -> anyhow::Result<()> {
        let layout = LimbLayout::new(16, 4)?;
        let mut rng = StdRng::seed_from_u64(11);
        let n = rng.gen_biguint(64) | BigUint::from(1u8);
        let a = rng.gen_biguint_below(&n);
        let b = rng.gen_biguint_below(&n);
        let (q, r) = ((&a * &b) / &n, (&a * &b) % &n);
        let limbs = |x: &BigUint| -> anyhow::Result<Vec<u64>> {
            Ok(LimbVector::<F>::decompose(x, layout)?.to_u64_limbs())
        };
        let ab = column_products(&limbs(&a)?, &limbs(&b)?);
        let qn = column_products(&limbs(&q)?, &limbs(&n)?);
        let r_limbs = limbs(&r)?;
        let columns: Vec<i128> = ab
            .iter()
            .zip(qn.iter())
            .enumerate()
            .map(|(j, (x, y))| x - y - r_limbs.get(j).copied().unwrap_or(0) as i128)
            .collect();
        let carries = propagate_signed_carries(&columns, layout.limb_bits)?;
        assert_eq!(carries.len(), columns.len() - 1);

        let mut broken = columns.clone();
        broken[0] += 1;
        assert!(propagate_signed_carries(&broken, layout.limb_bits).is_err());
        Ok(())
    }

    #[test]
    fn test_ceil_log2() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(38), 6);
        assert_eq!(ceil_log2(158), 8);
    }
}
