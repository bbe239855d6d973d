//! Goldilocks field helpers shared by the witness generators and the off-circuit code.

use plonky2::field::goldilocks_field::GoldilocksField;
use plonky2::field::types::{Field, Field64, PrimeField64};

pub type F = GoldilocksField;

/// p = 2^64 - 2^32 + 1
pub const ORDER: u64 = GoldilocksField::ORDER;

pub fn add(a: F, b: F) -> F {
    a + b
}

pub fn mul(a: F, b: F) -> F {
    a * b
}

/// Reduce an arbitrary 128-bit integer into the field.
pub fn reduce(x: u128) -> F {
    F::from_noncanonical_u128(x)
}

/// Centered lift of a field element to a signed integer in (-p/2, p/2].
///
/// Carry columns in the big-integer gadgets may be negative; this recovers the
/// integer they encode as long as its magnitude stays below p/2.
pub fn to_signed<T: PrimeField64>(x: T) -> i128 {
    let v = x.to_canonical_u64();
    if v > T::ORDER / 2 {
        v as i128 - T::ORDER as i128
    } else {
        v as i128
    }
}

/// Inverse of [`to_signed`] for magnitudes below p.
pub fn from_signed<T: Field64>(x: i128) -> T {
    if x < 0 {
        T::from_canonical_u64((x + T::ORDER as i128) as u64)
    } else {
        T::from_canonical_u64(x as u64)
    }
}
