//! Verification: message + group signature → recovered key set and nullifier.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::circuits::group_signature::VerifierKey;
use crate::circuits::public_inputs::message_digest_words;
use crate::error::{GroupSigError, Result};
use crate::proof::GroupSignature;
use crate::snark::gadgets::nullifier::{Nonce, Nullifier};
use crate::ssh::key::PublicKeySet;

/// What a valid proof establishes: some member of `public_keys` signed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedSignature {
    pub public_keys: PublicKeySet,
    pub nonce: Option<Nonce>,
    pub nullifier: Option<Nullifier>,
}

impl VerifiedSignature {
    pub fn has_nullifier(&self) -> bool {
        self.nullifier.is_some()
    }
}

/// `{valid, reason}` rendering of a verification outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// OpenSSH lines, in group order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub public_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Nonce>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullifier: Option<Nullifier>,
}

impl From<&Result<VerifiedSignature>> for VerificationReport {
    fn from(result: &Result<VerifiedSignature>) -> Self {
        match result {
            Ok(verified) => Self {
                valid: true,
                reason: None,
                error_kind: None,
                public_keys: verified.public_keys.iter().map(|k| k.to_openssh()).collect(),
                nonce: verified.nonce,
                nullifier: verified.nullifier,
            },
            Err(e) => Self {
                valid: false,
                reason: Some(e.to_string()),
                error_kind: Some(e.kind().to_string()),
                public_keys: Vec::new(),
                nonce: None,
                nullifier: None,
            },
        }
    }
}

/// Verify a decoded group signature against `message`.
///
/// Checks run in order: envelope shape, message binding, the proof itself,
/// then decoding of the committed key set, nonce and nullifier.
pub fn verify_with_key(
    key: &VerifierKey,
    message: &[u8],
    signature: &GroupSignature,
) -> Result<VerifiedSignature> {
    if signature.mode != key.mode() {
        return Err(GroupSigError::ProofDeserialization(format!(
            "{} proof given to a {} verifier key",
            signature.mode,
            key.mode()
        )));
    }
    let public_inputs = signature.public_inputs();
    if key.layout.message_digest(public_inputs)? != message_digest_words(message) {
        return Err(GroupSigError::MessageMismatch);
    }

    key.data
        .verify(signature.proof.clone())
        .map_err(|e| GroupSigError::CryptographicVerificationFailure(e.to_string()))?;

    let decoded = key.layout.decode(public_inputs, &key.params.exponent())?;
    debug!(
        "verified {} group signature over {} keys",
        signature.mode,
        decoded.public_keys.len()
    );
    Ok(VerifiedSignature {
        public_keys: decoded.public_keys,
        nonce: decoded.nonce,
        nullifier: decoded.nullifier,
    })
}

/// Verify serialized proof bytes against a single verifier key.
pub fn verify_bytes_with_key(
    key: &VerifierKey,
    message: &[u8],
    proof_bytes: &[u8],
) -> Result<VerifiedSignature> {
    verify_with_key(key, message, &GroupSignature::from_bytes(proof_bytes)?)
}
