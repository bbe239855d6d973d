//! Public input layout of the group signature circuit.
//!
//! Order: message digest (8 words), key slots (`max_group_size` × limbs), and in
//! nullifier mode the nonce (8 words) followed by the nullifier (4 elements).

use std::ops::Range;

use num_bigint::BigUint;
use plonky2::field::types::PrimeField64;
use sha2::{Digest, Sha256};

use crate::error::{GroupSigError, Result};
use crate::snark::gadgets::nullifier::{Nonce, Nullifier, NONCE_WORDS, NULLIFIER_ELEMENTS};
use crate::snark::limbs::{LimbLayout, LimbVector};
use crate::ssh::key::{PublicKeySet, RsaPublicKey};
use crate::types::{CircuitParams, ProofMode};
use crate::utils::bit_packing::{bytes_to_le_words, field_elements_to_words};

pub const MESSAGE_DIGEST_WORDS: usize = 8;

/// SHA-256 of the message as eight little-endian u32 words.
pub fn message_digest_words(message: &[u8]) -> Vec<u32> {
    bytes_to_le_words(&Sha256::digest(message))
}

/// Public inputs of a verified proof, decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPublicInputs {
    pub message_digest: Vec<u32>,
    pub public_keys: PublicKeySet,
    pub nonce: Option<Nonce>,
    pub nullifier: Option<Nullifier>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicInputLayout {
    pub mode: ProofMode,
    pub max_group_size: usize,
    pub limbs: LimbLayout,
}

impl PublicInputLayout {
    pub fn new(params: &CircuitParams, mode: ProofMode) -> Result<Self> {
        Ok(Self {
            mode,
            max_group_size: params.max_group_size,
            limbs: params.validate()?,
        })
    }

    pub fn message_range(&self) -> Range<usize> {
        0..MESSAGE_DIGEST_WORDS
    }

    pub fn keys_range(&self) -> Range<usize> {
        let start = MESSAGE_DIGEST_WORDS;
        start..start + self.max_group_size * self.limbs.num_limbs
    }

    pub fn key_slot_range(&self, slot: usize) -> Range<usize> {
        let start = self.keys_range().start + slot * self.limbs.num_limbs;
        start..start + self.limbs.num_limbs
    }

    pub fn nonce_range(&self) -> Option<Range<usize>> {
        let start = self.keys_range().end;
        self.mode
            .has_nullifier()
            .then_some(start..start + NONCE_WORDS)
    }

    pub fn nullifier_range(&self) -> Option<Range<usize>> {
        self.nonce_range()
            .map(|nonce| nonce.end..nonce.end + NULLIFIER_ELEMENTS)
    }

    pub fn len(&self) -> usize {
        self.nullifier_range()
            .map_or(self.keys_range().end, |r| r.end)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The message digest words, without checking anything else.
    pub fn message_digest<F: PrimeField64>(&self, public_inputs: &[F]) -> Result<Vec<u32>> {
        self.check_len(public_inputs)?;
        field_elements_to_words(&public_inputs[self.message_range()]).ok_or_else(|| {
            GroupSigError::ProofDeserialization("message digest word exceeds 32 bits".to_string())
        })
    }

    /// Decode every public input. Key slots must hold canonical limbs, and
    /// zero slots may only pad the end of the group.
    pub fn decode<F: PrimeField64>(
        &self,
        public_inputs: &[F],
        public_exponent: &BigUint,
    ) -> Result<DecodedPublicInputs> {
        let message_digest = self.message_digest(public_inputs)?;

        let mut keys = Vec::new();
        let mut padding_started = false;
        for slot in 0..self.max_group_size {
            let limbs = LimbVector::from_limbs(
                public_inputs[self.key_slot_range(slot)].to_vec(),
                self.limbs,
            )
            .map_err(|e| {
                GroupSigError::ProofDeserialization(format!("key slot {slot} is not canonical: {e}"))
            })?;
            if limbs.is_zero() {
                padding_started = true;
            } else if padding_started {
                return Err(GroupSigError::ProofDeserialization(format!(
                    "key slot {slot} follows an empty slot"
                )));
            } else {
                keys.push(RsaPublicKey::new(public_exponent.clone(), limbs.recompose()));
            }
        }

        let nonce = self
            .nonce_range()
            .map(|range| {
                let words = field_elements_to_words(&public_inputs[range]).ok_or_else(|| {
                    GroupSigError::ProofDeserialization("nonce word exceeds 32 bits".to_string())
                })?;
                Nonce::from_words(&words)
            })
            .transpose()?;
        let nullifier = self
            .nullifier_range()
            .map(|range| Nullifier::from_field_elements(&public_inputs[range]))
            .transpose()?;

        Ok(DecodedPublicInputs {
            message_digest,
            public_keys: PublicKeySet::new(keys),
            nonce,
            nullifier,
        })
    }

    fn check_len<F>(&self, public_inputs: &[F]) -> Result<()> {
        if public_inputs.len() != self.len() {
            return Err(GroupSigError::ProofDeserialization(format!(
                "expected {} public inputs for a {} proof, got {}",
                self.len(),
                self.mode,
                public_inputs.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plonky2::field::goldilocks_field::GoldilocksField;
    use plonky2::field::types::Field;

    type F = GoldilocksField;

    fn layout(mode: ProofMode) -> Result<PublicInputLayout> {
        let params = CircuitParams {
            key_bits: 1024,
            max_group_size: 3,
            ..CircuitParams::default()
        };
        PublicInputLayout::new(&params, mode)
    }

    fn encode(
        layout: &PublicInputLayout,
        digest: &[u32],
        keys: &[BigUint],
        nonce: Option<&Nonce>,
    ) -> Result<Vec<F>> {
        let mut pis: Vec<F> = digest.iter().map(|&w| F::from_canonical_u32(w)).collect();
        for slot in 0..layout.max_group_size {
            let value = keys.get(slot).cloned().unwrap_or_default();
            pis.extend_from_slice(LimbVector::<F>::decompose(&value, layout.limbs)?.limbs());
        }
        if let Some(nonce) = nonce {
            pis.extend(nonce.to_field_elements::<F>());
            pis.extend([F::ONE, F::TWO, F::ZERO, F::NEG_ONE]);
        }
        Ok(pis)
    }

    #[test]
    fn test_ranges_are_contiguous() -> Result<()> {
        let plain = layout(ProofMode::Plain)?;
        assert_eq!(plain.limbs.num_limbs, 38);
        assert_eq!(plain.keys_range(), 8..8 + 3 * 38);
        assert_eq!(plain.key_slot_range(1), 46..84);
        assert_eq!(plain.nonce_range(), None);
        assert_eq!(plain.len(), 122);

        let with_nullifier = layout(ProofMode::Nullifier)?;
        assert_eq!(with_nullifier.nonce_range(), Some(122..130));
        assert_eq!(with_nullifier.nullifier_range(), Some(130..134));
        assert_eq!(with_nullifier.len(), 134);
        Ok(())
    }

    #[test]
    fn test_decode_recovers_keys_in_order() -> Result<()> {
        let layout = layout(ProofMode::Nullifier)?;
        let digest = message_digest_words(b"hello");
        let keys = vec![BigUint::from(77u32) << 1000u32, BigUint::from(5u32) << 1000u32];
        let nonce = Nonce::new([9; 32]);
        let pis = encode(&layout, &digest, &keys, Some(&nonce))?;

        let decoded = layout.decode(&pis, &BigUint::from(65537u32))?;
        assert_eq!(decoded.message_digest, digest);
        let moduli: Vec<_> = decoded.public_keys.iter().map(|k| k.n.clone()).collect();
        assert_eq!(moduli, keys);
        assert_eq!(decoded.nonce, Some(nonce));
        let nullifier = decoded.nullifier.expect("nullifier mode");
        assert_eq!(&nullifier.as_bytes()[..8], &1u64.to_le_bytes());
        Ok(())
    }

    #[test]
    fn test_decode_rejects_interior_gaps_and_bad_lengths() -> Result<()> {
        let layout = layout(ProofMode::Plain)?;
        let digest = message_digest_words(b"x");
        let keys = vec![
            BigUint::from(1u8) << 1000u32,
            BigUint::from(0u8),
            BigUint::from(3u8) << 1000u32,
        ];
        let pis = encode(&layout, &digest, &keys, None)?;
        assert!(matches!(
            layout.decode(&pis, &BigUint::from(3u8)),
            Err(GroupSigError::ProofDeserialization(_))
        ));
        assert!(matches!(
            layout.decode(&pis[1..], &BigUint::from(3u8)),
            Err(GroupSigError::ProofDeserialization(_))
        ));
        Ok(())
    }

    #[test]
    fn test_digest_words_are_sha256() {
        let words = message_digest_words(b"abc");
        assert_eq!(words.len(), MESSAGE_DIGEST_WORDS);
        assert_eq!(words[0], u32::from_le_bytes([0xba, 0x78, 0x16, 0xbf]));
    }
}
