//! Process-wide handle owning the compiled circuits.
//!
//! Each mode's circuit is compiled on first use and then shared read-only, so
//! one handle can serve concurrent prove and verify calls from many threads.

use std::sync::OnceLock;
use std::time::Instant;

use log::info;

use crate::circuits::group_signature::{build_circuit, ProverKey, VerifierKey};
use crate::error::{GroupSigError, Result};
use crate::keys::{validate_keys, KeyCheckResponse};
use crate::proof::GroupSignature;
use crate::prover::{prove_group_signature, ProveRequest};
use crate::types::{CircuitParams, ProofMode};
use crate::verifier::{verify_with_key, VerifiedSignature};

struct CompiledCircuit {
    prover: ProverKey,
    verifier: VerifierKey,
}

type Slot = OnceLock<std::result::Result<CompiledCircuit, String>>;

pub struct EngineHandle {
    params: CircuitParams,
    plain: Slot,
    nullifier: Slot,
}

impl EngineHandle {
    /// Validate the circuit shape. Nothing is compiled yet.
    pub fn new(params: CircuitParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            plain: OnceLock::new(),
            nullifier: OnceLock::new(),
        })
    }

    pub fn params(&self) -> &CircuitParams {
        &self.params
    }

    /// Compile both modes now instead of on first use.
    pub fn warm_up(&self) -> Result<()> {
        for mode in ProofMode::ALL {
            self.compiled(mode)?;
        }
        Ok(())
    }

    fn compiled(&self, mode: ProofMode) -> Result<&CompiledCircuit> {
        let slot = match mode {
            ProofMode::Plain => &self.plain,
            ProofMode::Nullifier => &self.nullifier,
        };
        slot.get_or_init(|| {
            let start = Instant::now();
            let compiled = build_circuit(&self.params, mode)
                .map(|(prover, verifier)| CompiledCircuit { prover, verifier })
                .map_err(|e| e.to_string());
            info!("{mode} circuit ready in {:?}", start.elapsed());
            compiled
        })
        .as_ref()
        .map_err(|e| GroupSigError::CircuitShape(e.clone()))
    }

    pub fn prover_key(&self, mode: ProofMode) -> Result<&ProverKey> {
        Ok(&self.compiled(mode)?.prover)
    }

    pub fn verifier_key(&self, mode: ProofMode) -> Result<&VerifierKey> {
        Ok(&self.compiled(mode)?.verifier)
    }

    pub fn prove(&self, request: &ProveRequest) -> Result<GroupSignature> {
        prove_group_signature(self.prover_key(request.mode())?, request)
    }

    pub fn verify(&self, message: &[u8], signature: &GroupSignature) -> Result<VerifiedSignature> {
        verify_with_key(self.verifier_key(signature.mode)?, message, signature)
    }

    pub fn verify_bytes(&self, message: &[u8], proof_bytes: &[u8]) -> Result<VerifiedSignature> {
        self.verify(message, &GroupSignature::from_bytes(proof_bytes)?)
    }

    pub fn validate_keys(&self, public_keys: &str, membership_key: &str) -> KeyCheckResponse {
        validate_keys(public_keys, membership_key, &self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_engine_is_shareable() {
        assert_send_sync::<EngineHandle>();
    }

    #[test]
    fn test_new_rejects_bad_shape_without_compiling() {
        let params = CircuitParams {
            key_bits: 100,
            ..CircuitParams::default()
        };
        assert!(matches!(
            EngineHandle::new(params),
            Err(GroupSigError::CircuitShape(_))
        ));
    }

    #[test]
    fn test_circuits_compile_once() -> Result<()> {
        let engine = EngineHandle::new(CircuitParams {
            key_bits: 1024,
            max_group_size: 1,
            ..CircuitParams::default()
        })?;
        let first = engine.verifier_key(ProofMode::Plain)? as *const VerifierKey;
        let second = engine.verifier_key(ProofMode::Plain)? as *const VerifierKey;
        assert_eq!(first, second);
        assert_eq!(engine.verifier_key(ProofMode::Nullifier)?.mode(), ProofMode::Nullifier);
        Ok(())
    }
}
