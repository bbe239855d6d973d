//! Anonymous RSA group signatures over plonky2.
//!
//! A member holding an `SSHSIG` membership key for one of a list of RSA
//! public keys proves "some key in this list signed the group statement"
//! without revealing which. Proofs bind an arbitrary message and, with a
//! nonce, expose a per-context nullifier that links repeat signers.

pub mod circuits;
pub mod commands;
pub mod engine;
pub mod error;
pub mod keys;
pub mod proof;
pub mod prover;
pub mod rsa;
pub mod snark;
pub mod ssh;
pub mod types;
pub mod utils;
pub mod verifier;

pub use circuits::group_signature::{
    build_circuit, build_group_signature_circuit, GroupSignatureCircuit, GroupSignatureTargets,
    ProverKey, VerifierKey,
};
pub use engine::EngineHandle;
pub use error::{GroupSigError, Result};
pub use keys::{validate_keys, KeyCheckResponse};
pub use proof::GroupSignature;
pub use prover::{prove_group_signature, GroupProver, ProveRequest, ProverStage};
pub use snark::gadgets::nullifier::{Nonce, Nullifier};
pub use ssh::{MembershipKey, PublicKeySet, RsaPublicKey};
pub use types::{CircuitParams, ProofMode};
pub use verifier::{verify_bytes_with_key, verify_with_key, VerificationReport, VerifiedSignature};
