//! Packing utilities between byte strings and 32-bit word targets.

use plonky2::field::extension::Extendable;
use plonky2::field::types::{Field, PrimeField64};
use plonky2::hash::hash_types::RichField;
use plonky2::iop::target::Target;
use plonky2::plonk::circuit_builder::CircuitBuilder;

/// Split bytes into little-endian u32 words. The length must be a multiple of 4.
pub fn bytes_to_le_words(bytes: &[u8]) -> Vec<u32> {
    debug_assert_eq!(bytes.len() % 4, 0);
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

pub fn le_words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

pub fn words_to_field_elements<F: Field>(words: &[u32]) -> Vec<F> {
    words
        .iter()
        .map(|&w| F::from_canonical_u32(w))
        .collect()
}

/// Recover u32 words from field elements, rejecting anything wider than 32 bits.
pub fn field_elements_to_words<F: PrimeField64>(elements: &[F]) -> Option<Vec<u32>> {
    elements
        .iter()
        .map(|e| u32::try_from(e.to_canonical_u64()).ok())
        .collect()
}

/// Add `count` word targets, each range-checked to 32 bits.
pub fn add_virtual_word_targets<F: RichField + Extendable<D>, const D: usize>(
    builder: &mut CircuitBuilder<F, D>,
    count: usize,
) -> Vec<Target> {
    let words = builder.add_virtual_targets(count);
    for &w in &words {
        builder.range_check(w, 32);
    }
    words
}
