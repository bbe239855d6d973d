//! Serialized group signatures: the proof envelope and its armored text form.

use bincode::Options;
use plonky2::plonk::proof::ProofWithPublicInputs;
use serde::{Deserialize, Serialize};

use crate::circuits::group_signature::{Cfg, D, F};
use crate::error::{GroupSigError, Result};
use crate::types::ProofMode;
use crate::utils::armor::{armor, dearmor};

pub const ENVELOPE_VERSION: u32 = 1;
pub const ARMOR_LABEL: &str = "GROUP SIGNATURE";

/// Upper bound on an encoded envelope; real proofs are a few hundred KiB.
pub const MAX_ENVELOPE_BYTES: u64 = 16 * 1024 * 1024;

fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_ENVELOPE_BYTES)
        .reject_trailing_bytes()
}

/// A proof plus the metadata needed to pick the right verifier key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupSignature {
    pub version: u32,
    pub mode: ProofMode,
    pub proof: ProofWithPublicInputs<F, Cfg, D>,
}

impl GroupSignature {
    pub fn new(mode: ProofMode, proof: ProofWithPublicInputs<F, Cfg, D>) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            mode,
            proof,
        }
    }

    pub fn has_nullifier(&self) -> bool {
        self.mode.has_nullifier()
    }

    pub fn public_inputs(&self) -> &[F] {
        &self.proof.public_inputs
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode_options()
            .serialize(self)
            .map_err(|e| GroupSigError::Proving(format!("encoding proof: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let signature: Self = bincode_options()
            .deserialize(bytes)
            .map_err(|e| GroupSigError::ProofDeserialization(e.to_string()))?;
        if signature.version != ENVELOPE_VERSION {
            return Err(GroupSigError::ProofDeserialization(format!(
                "unsupported envelope version {}",
                signature.version
            )));
        }
        Ok(signature)
    }

    pub fn to_armored(&self) -> Result<String> {
        Ok(armor(ARMOR_LABEL, &self.to_bytes()?))
    }

    pub fn from_armored(text: &str) -> Result<Self> {
        let bytes = dearmor(ARMOR_LABEL, text)
            .map_err(|e| GroupSigError::ProofDeserialization(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plonky2::field::types::Field;
    use plonky2::iop::witness::{PartialWitness, WitnessWrite};
    use plonky2::plonk::circuit_builder::CircuitBuilder;
    use plonky2::plonk::circuit_data::CircuitConfig;

    fn tiny_proof() -> anyhow::Result<ProofWithPublicInputs<F, Cfg, D>> {
        let mut builder = CircuitBuilder::<F, D>::new(CircuitConfig::standard_recursion_config());
        let x = builder.add_virtual_target();
        let y = builder.square(x);
        builder.register_public_input(y);
        let data = builder.build::<Cfg>();
        let mut pw = PartialWitness::new();
        pw.set_target(x, F::from_canonical_u64(12))?;
        data.prove(pw)
    }

    #[test]
    fn test_envelope_round_trip() -> anyhow::Result<()> {
        let signature = GroupSignature::new(ProofMode::Plain, tiny_proof()?);
        let bytes = signature.to_bytes()?;
        let decoded = GroupSignature::from_bytes(&bytes)?;
        assert_eq!(decoded.mode, ProofMode::Plain);
        assert_eq!(decoded.public_inputs(), &[F::from_canonical_u64(144)]);
        assert_eq!(decoded.to_bytes()?, bytes);

        let armored = signature.to_armored()?;
        assert!(armored.starts_with("-----BEGIN GROUP SIGNATURE-----"));
        assert_eq!(GroupSignature::from_armored(&armored)?.to_bytes()?, bytes);
        Ok(())
    }

    #[test]
    fn test_malformed_envelopes() -> anyhow::Result<()> {
        let bytes = GroupSignature::new(ProofMode::Nullifier, tiny_proof()?).to_bytes()?;

        let mut trailing = bytes.clone();
        trailing.push(0);
        let mut wrong_version = bytes.clone();
        wrong_version[0] = 9;
        for bad in [&bytes[..bytes.len() - 1], &trailing[..], &wrong_version[..], &[][..]] {
            assert!(matches!(
                GroupSignature::from_bytes(bad),
                Err(GroupSigError::ProofDeserialization(_))
            ));
        }
        assert!(matches!(
            GroupSignature::from_armored("not armored"),
            Err(GroupSigError::ProofDeserialization(_))
        ));
        Ok(())
    }
}
