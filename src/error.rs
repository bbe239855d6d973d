//! Error taxonomy for key decoding, proving and verification.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GroupSigError>;

/// Every failure the engine reports to its callers.
///
/// All variants are recoverable for the process; only [`GroupSigError::CircuitShape`]
/// indicates a misconfiguration that must be fixed before any proof can be made.
#[derive(Debug, Error)]
pub enum GroupSigError {
    /// Non-RSA key, unsupported signature algorithm or malformed SSH wire encoding.
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// An integer does not fit the compiled-in limb budget.
    #[error("limb overflow: {bits}-bit value exceeds the {max_bits}-bit limb budget")]
    LimbOverflow { bits: u64, max_bits: usize },

    #[error("not a member: the signing key is not part of the public key set")]
    NotAMember,

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("group of {size} keys exceeds the circuit maximum of {max}")]
    GroupTooLarge { size: usize, max: usize },

    #[error("nonce must be exactly 32 bytes, got {0}")]
    InvalidNonce(usize),

    #[error("malformed proof: {0}")]
    ProofDeserialization(String),

    #[error("message mismatch: the proof was generated for a different message")]
    MessageMismatch,

    #[error("cryptographic verification failed: {0}")]
    CryptographicVerificationFailure(String),

    /// The requested circuit shape cannot be built without field wrap-around.
    #[error("invalid circuit shape: {0}")]
    CircuitShape(String),

    #[error("proving failed: {0}")]
    Proving(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GroupSigError {
    /// Short stable identifier, used in verification reports.
    pub fn kind(&self) -> &'static str {
        match self {
            GroupSigError::UnsupportedKeyType(_) => "UnsupportedKeyType",
            GroupSigError::LimbOverflow { .. } => "LimbOverflow",
            GroupSigError::NotAMember => "NotAMember",
            GroupSigError::InvalidSignature(_) => "InvalidSignature",
            GroupSigError::GroupTooLarge { .. } => "GroupTooLarge",
            GroupSigError::InvalidNonce(_) => "InvalidNonce",
            GroupSigError::ProofDeserialization(_) => "ProofDeserializationError",
            GroupSigError::MessageMismatch => "MessageMismatch",
            GroupSigError::CryptographicVerificationFailure(_) => {
                "CryptographicVerificationFailure"
            }
            GroupSigError::CircuitShape(_) => "CircuitShape",
            GroupSigError::Proving(_) => "Proving",
            GroupSigError::Io(_) => "Io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GroupSigError::LimbOverflow {
            bits: 4100,
            max_bits: 4096,
        };
        assert_eq!(
            err.to_string(),
            "limb overflow: 4100-bit value exceeds the 4096-bit limb budget"
        );

        let err = GroupSigError::UnsupportedKeyType("Only ssh-rsa supported".to_string());
        assert_eq!(err.to_string(), "unsupported key type: Only ssh-rsa supported");
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        let errors = [
            GroupSigError::NotAMember,
            GroupSigError::MessageMismatch,
            GroupSigError::ProofDeserialization("bad".into()),
            GroupSigError::CryptographicVerificationFailure("bad".into()),
            GroupSigError::InvalidSignature("bad".into()),
        ];
        let mut kinds: Vec<_> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }
}
