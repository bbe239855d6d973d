//! Per-context nullifiers: Poseidon over the membership signature and a public nonce.
//!
//! The same member and nonce always yield the same nullifier; different
//! members or different nonces yield unrelated ones. The signature never
//! leaves the circuit.

use std::fmt;

use plonky2::field::extension::Extendable;
use plonky2::field::types::{Field, PrimeField64};
use plonky2::hash::hash_types::{HashOut, HashOutTarget, RichField};
use plonky2::hash::poseidon::PoseidonHash;
use plonky2::iop::target::Target;
use plonky2::plonk::circuit_builder::CircuitBuilder;
use plonky2::plonk::config::Hasher;
use serde::{Deserialize, Serialize};

use crate::error::{GroupSigError, Result};
use crate::snark::gadgets::bigint::BigIntTarget;
use crate::snark::limbs::LimbVector;
use crate::utils::bit_packing::{bytes_to_le_words, le_words_to_bytes, words_to_field_elements};

/// Domain separator prepended to every nullifier preimage.
pub const NULLIFIER_DOMAIN: u64 = 0x4E55_4C4C;

pub const NONCE_BYTES: usize = 32;
pub const NONCE_WORDS: usize = NONCE_BYTES / 4;
pub const NULLIFIER_ELEMENTS: usize = 4;

/// Caller-chosen 32-byte context, e.g. a hash of the item being voted on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Nonce([u8; NONCE_BYTES]);

impl Nonce {
    pub fn new(bytes: [u8; NONCE_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|_| GroupSigError::InvalidNonce(s.len() / 2))?;
        Self::try_from(bytes.as_slice())
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_BYTES] {
        &self.0
    }

    pub fn to_words(&self) -> Vec<u32> {
        bytes_to_le_words(&self.0)
    }

    pub fn from_words(words: &[u32]) -> Result<Self> {
        Self::try_from(le_words_to_bytes(words).as_slice())
    }

    pub fn to_field_elements<F: Field>(&self) -> Vec<F> {
        words_to_field_elements(&self.to_words())
    }
}

impl TryFrom<&[u8]> for Nonce {
    type Error = GroupSigError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let array: [u8; NONCE_BYTES] = bytes
            .try_into()
            .map_err(|_| GroupSigError::InvalidNonce(bytes.len()))?;
        Ok(Self(array))
    }
}

impl TryFrom<String> for Nonce {
    type Error = GroupSigError;

    fn try_from(s: String) -> Result<Self> {
        Self::from_hex(&s)
    }
}

impl From<Nonce> for String {
    fn from(nonce: Nonce) -> Self {
        hex::encode(nonce.0)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({self})")
    }
}

/// 32-byte nullifier: four canonical Goldilocks elements, little-endian.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Nullifier([u8; 32]);

impl Nullifier {
    pub fn from_field_elements<F: PrimeField64>(elements: &[F]) -> Result<Self> {
        if elements.len() != NULLIFIER_ELEMENTS {
            return Err(GroupSigError::ProofDeserialization(format!(
                "nullifier needs {NULLIFIER_ELEMENTS} field elements, got {}",
                elements.len()
            )));
        }
        let mut bytes = [0u8; 32];
        for (chunk, e) in bytes.chunks_exact_mut(8).zip(elements) {
            chunk.copy_from_slice(&e.to_canonical_u64().to_le_bytes());
        }
        Ok(Self(bytes))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| {
            GroupSigError::ProofDeserialization(format!("nullifier is not hex: {e}"))
        })?;
        let array: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            GroupSigError::ProofDeserialization(format!(
                "nullifier must be 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl TryFrom<String> for Nullifier {
    type Error = GroupSigError;

    fn try_from(s: String) -> Result<Self> {
        Self::from_hex(&s)
    }
}

impl From<Nullifier> for String {
    fn from(nullifier: Nullifier) -> Self {
        nullifier.to_hex()
    }
}

impl fmt::Display for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nullifier({self})")
    }
}

fn preimage<T: Copy>(domain: T, signature: &[T], nonce: &[T]) -> Vec<T> {
    let mut inputs = Vec::with_capacity(1 + signature.len() + nonce.len());
    inputs.push(domain);
    inputs.extend_from_slice(signature);
    inputs.extend_from_slice(nonce);
    inputs
}

/// Poseidon(NULLIFIER_DOMAIN ‖ signature limbs ‖ nonce words).
pub fn add_nullifier_constraints<F: RichField + Extendable<D>, const D: usize>(
    builder: &mut CircuitBuilder<F, D>,
    signature: &BigIntTarget,
    nonce_words: &[Target],
) -> HashOutTarget {
    assert_eq!(nonce_words.len(), NONCE_WORDS);
    let domain = builder.constant(F::from_canonical_u64(NULLIFIER_DOMAIN));
    builder.hash_n_to_hash_no_pad::<PoseidonHash>(preimage(domain, &signature.limbs, nonce_words))
}

/// Off-circuit twin of [`add_nullifier_constraints`].
pub fn compute_nullifier<F: RichField>(signature: &LimbVector<F>, nonce: &Nonce) -> Result<Nullifier> {
    let hash: HashOut<F> = PoseidonHash::hash_no_pad(&preimage(
        F::from_canonical_u64(NULLIFIER_DOMAIN),
        signature.limbs(),
        &nonce.to_field_elements::<F>(),
    ));
    Nullifier::from_field_elements(&hash.elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snark::gadgets::bigint::{CircuitBuilderBigInt, WitnessBigInt};
    use crate::snark::limbs::LimbLayout;
    use crate::utils::bit_packing::add_virtual_word_targets;
    use anyhow::Result;
    use num_bigint::BigUint;
    use plonky2::iop::witness::{PartialWitness, WitnessWrite};
    use plonky2::plonk::circuit_data::CircuitConfig;
    use plonky2::plonk::config::{GenericConfig, PoseidonGoldilocksConfig};

    const D: usize = 2;
    type Cfg = PoseidonGoldilocksConfig;
    type F = <Cfg as GenericConfig<D>>::F;

    #[test]
    fn test_nonce_length_is_enforced() {
        assert!(Nonce::try_from([0u8; 32].as_slice()).is_ok());
        for len in [0usize, 31, 33] {
            match Nonce::try_from(vec![0u8; len].as_slice()) {
                Err(GroupSigError::InvalidNonce(n)) => assert_eq!(n, len),
                other => panic!("expected InvalidNonce, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_nonce_hex_round_trip() -> Result<()> {
        let nonce = Nonce::new([0xAB; 32]);
        let parsed = Nonce::from_hex(&nonce.to_string())?;
        assert_eq!(parsed, nonce);
        assert_eq!(Nonce::from_words(&nonce.to_words())?, nonce);
        let json = serde_json::to_string(&nonce)?;
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        Ok(())
    }

    #[test]
    fn test_nullifier_is_deterministic_and_separates_inputs() -> Result<()> {
        let layout = LimbLayout::for_key_bits(256)?;
        let sig_a = LimbVector::<F>::decompose(&BigUint::from(123456789u64), layout)?;
        let sig_b = LimbVector::<F>::decompose(&BigUint::from(987654321u64), layout)?;
        let n1 = Nonce::new([1; 32]);
        let n2 = Nonce::new([2; 32]);

        assert_eq!(compute_nullifier(&sig_a, &n1)?, compute_nullifier(&sig_a, &n1)?);
        assert_ne!(compute_nullifier(&sig_a, &n1)?, compute_nullifier(&sig_a, &n2)?);
        assert_ne!(compute_nullifier(&sig_a, &n1)?, compute_nullifier(&sig_b, &n1)?);
        Ok(())
    }

    #[test]
    fn test_circuit_matches_off_circuit_nullifier() -> Result<()> {
        let layout = LimbLayout::for_key_bits(256)?;
        let mut builder = CircuitBuilder::<F, D>::new(CircuitConfig::standard_recursion_config());
        let signature = builder.add_virtual_bigint_target(layout);
        let nonce = add_virtual_word_targets(&mut builder, NONCE_WORDS);
        let hash = add_nullifier_constraints(&mut builder, &signature, &nonce);
        builder.register_public_inputs(&hash.elements);
        let data = builder.build::<Cfg>();

        let sig = BigUint::parse_bytes(b"c0ffee00112233445566778899aabbccddeeff", 16)
            .expect("valid hex");
        let nonce_value = Nonce::new(*b"item-42 item-42 item-42 item-42 ");
        let mut pw = PartialWitness::new();
        pw.set_bigint_target(&signature, &sig)?;
        for (&t, v) in nonce.iter().zip(nonce_value.to_field_elements::<F>()) {
            pw.set_target(t, v)?;
        }
        let proof = data.prove(pw)?;
        data.verify(proof.clone())?;

        let expected = compute_nullifier(&LimbVector::<F>::decompose(&sig, layout)?, &nonce_value)?;
        assert_eq!(Nullifier::from_field_elements(&proof.public_inputs)?, expected);
        Ok(())
    }
}
