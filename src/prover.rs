//! Proving: membership key + key set + message → group signature.
//!
//! All checks that can fail for a given input run before the circuit is
//! touched, so an unsatisfiable witness never reaches the backend prover.

use std::time::Instant;

use log::{debug, info, Level};
use num_bigint::BigUint;
use plonky2::field::types::Field;
use plonky2::iop::witness::{PartialWitness, WitnessWrite};
use plonky2::plonk::prover::prove;
use plonky2::util::timing::TimingTree;

use crate::circuits::group_signature::{ProverKey, F};
use crate::circuits::public_inputs::message_digest_words;
use crate::error::{GroupSigError, Result};
use crate::proof::GroupSignature;
use crate::rsa::verify_encoded;
use crate::snark::gadgets::bigint::WitnessBigInt;
use crate::snark::gadgets::nullifier::{compute_nullifier, Nonce, Nullifier};
use crate::snark::limbs::LimbVector;
use crate::ssh::key::PublicKeySet;
use crate::ssh::sshsig::MembershipKey;
use crate::types::{CircuitParams, ProofMode};

/// Inputs of one proof.
#[derive(Clone, Debug)]
pub struct ProveRequest {
    pub message: Vec<u8>,
    pub public_keys: PublicKeySet,
    /// Armored `SSHSIG` over the group's base message.
    pub membership_key: String,
    pub nonce: Option<Nonce>,
}

impl ProveRequest {
    pub fn new(
        message: impl Into<Vec<u8>>,
        public_keys: PublicKeySet,
        membership_key: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            public_keys,
            membership_key: membership_key.into(),
            nonce: None,
        }
    }

    pub fn with_nonce(mut self, nonce: Nonce) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn mode(&self) -> ProofMode {
        if self.nonce.is_some() {
            ProofMode::Nullifier
        } else {
            ProofMode::Plain
        }
    }
}

/// Private and public values for one proof, already range-checked off-circuit.
pub struct GroupWitness {
    pub mode: ProofMode,
    pub message_digest: Vec<u32>,
    pub key_slots: Vec<BigUint>,
    pub modulus: BigUint,
    pub signature: BigUint,
    pub signer_index: usize,
    pub nonce: Option<Nonce>,
    pub nullifier: Option<Nullifier>,
}

impl std::fmt::Debug for GroupWitness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupWitness")
            .field("mode", &self.mode)
            .field("group_size", &self.key_slots.len())
            .field("nonce", &self.nonce)
            .finish_non_exhaustive()
    }
}

impl GroupWitness {
    /// Validate a request and derive the witness.
    ///
    /// Checks run in order: group size, member keys, membership key decoding,
    /// membership, then the RSA signature itself.
    pub fn compute(params: &CircuitParams, request: &ProveRequest) -> Result<Self> {
        let keys = &request.public_keys;
        params.check_key_set(keys)?;

        let membership_key = MembershipKey::parse(&request.membership_key)?;
        params.check_public_key(membership_key.public_key())?;
        let signer_index = keys
            .position(membership_key.public_key())
            .ok_or(GroupSigError::NotAMember)?;

        if membership_key.namespace() != params.namespace {
            return Err(GroupSigError::InvalidSignature(format!(
                "membership key was signed for namespace {:?}, expected {:?}",
                membership_key.namespace(),
                params.namespace
            )));
        }
        verify_encoded(
            membership_key.public_key(),
            membership_key.signature(),
            &params.expected_encoded_message()?,
        )?;

        let layout = params.layout()?;
        let nullifier = request
            .nonce
            .as_ref()
            .map(|nonce| {
                let limbs = LimbVector::<F>::decompose(membership_key.signature(), layout)?;
                compute_nullifier(&limbs, nonce)
            })
            .transpose()?;

        let mut key_slots: Vec<BigUint> = keys.iter().map(|k| k.n.clone()).collect();
        key_slots.resize(params.max_group_size, BigUint::default());

        Ok(Self {
            mode: request.mode(),
            message_digest: message_digest_words(&request.message),
            key_slots,
            modulus: membership_key.public_key().n.clone(),
            signature: membership_key.signature().clone(),
            signer_index,
            nonce: request.nonce,
            nullifier,
        })
    }

    pub fn fill(&self, key: &ProverKey) -> Result<PartialWitness<F>> {
        let targets = &key.targets;
        let mut pw = PartialWitness::new();
        let set = |e: anyhow::Error| GroupSigError::Proving(format!("assigning witness: {e}"));

        for (&t, &w) in targets.message_digest.iter().zip(&self.message_digest) {
            pw.set_target(t, F::from_canonical_u32(w)).map_err(set)?;
        }
        for (t, value) in targets.key_slots.iter().zip(&self.key_slots) {
            pw.set_bigint_target(t, value).map_err(set)?;
        }
        pw.set_bigint_target(&targets.modulus, &self.modulus)
            .map_err(set)?;
        pw.set_bigint_target(&targets.signature, &self.signature)
            .map_err(set)?;
        for (i, &s) in targets.selectors.iter().enumerate() {
            pw.set_bool_target(s, i == self.signer_index).map_err(set)?;
        }
        match (&targets.nonce, &self.nonce) {
            (Some(words), Some(nonce)) => {
                for (&t, v) in words.iter().zip(nonce.to_field_elements::<F>()) {
                    pw.set_target(t, v).map_err(set)?;
                }
            }
            (None, None) => {}
            _ => {
                return Err(GroupSigError::Proving(format!(
                    "a {} proving key cannot prove a {} request",
                    key.layout.mode, self.mode
                )))
            }
        }
        Ok(pw)
    }
}

/// Where a [`GroupProver`] is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProverStage {
    Idle,
    WitnessComputed,
    Proving,
    Done,
    Failed,
}

/// Single-use prover: `Idle → WitnessComputed → Proving → Done | Failed`.
pub struct GroupProver<'a> {
    key: &'a ProverKey,
    stage: ProverStage,
    witness: Option<GroupWitness>,
}

impl<'a> GroupProver<'a> {
    pub fn new(key: &'a ProverKey) -> Self {
        Self {
            key,
            stage: ProverStage::Idle,
            witness: None,
        }
    }

    pub fn stage(&self) -> ProverStage {
        self.stage
    }

    pub fn witness(&self) -> Option<&GroupWitness> {
        self.witness.as_ref()
    }

    fn transition(&mut self, next: ProverStage) {
        debug!("prover stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    fn fail<T>(&mut self, err: GroupSigError) -> Result<T> {
        self.transition(ProverStage::Failed);
        Err(err)
    }

    pub fn compute_witness(&mut self, request: &ProveRequest) -> Result<&GroupWitness> {
        if self.stage != ProverStage::Idle {
            return Err(GroupSigError::Proving(format!(
                "cannot compute a witness in stage {:?}",
                self.stage
            )));
        }
        if request.mode() != self.key.layout.mode {
            return self.fail(GroupSigError::Proving(format!(
                "{} request given to a {} proving key",
                request.mode(),
                self.key.layout.mode
            )));
        }
        match GroupWitness::compute(&self.key.params, request) {
            Ok(witness) => {
                debug!(
                    "witness computed: {} of {} slots used",
                    request.public_keys.len(),
                    witness.key_slots.len()
                );
                self.transition(ProverStage::WitnessComputed);
                Ok(self.witness.insert(witness))
            }
            Err(e) => self.fail(e),
        }
    }

    pub fn prove(&mut self) -> Result<GroupSignature> {
        if self.stage != ProverStage::WitnessComputed {
            return Err(GroupSigError::Proving(format!(
                "cannot prove in stage {:?}",
                self.stage
            )));
        }
        let Some(witness) = self.witness.take() else {
            return self.fail(GroupSigError::Proving("witness missing".to_string()));
        };
        self.transition(ProverStage::Proving);

        let pw = match witness.fill(self.key) {
            Ok(pw) => pw,
            Err(e) => return self.fail(e),
        };
        let start = Instant::now();
        let mut timing = TimingTree::new("group_signature_proof", Level::Debug);
        let proof = match prove(&self.key.data.prover_only, &self.key.data.common, pw, &mut timing) {
            Ok(proof) => proof,
            Err(e) => return self.fail(GroupSigError::Proving(e.to_string())),
        };
        timing.print();
        info!(
            "{} group signature proved in {:?}",
            witness.mode,
            start.elapsed()
        );

        self.transition(ProverStage::Done);
        Ok(GroupSignature::new(witness.mode, proof))
    }
}

/// Convenience: run a fresh [`GroupProver`] to completion.
pub fn prove_group_signature(key: &ProverKey, request: &ProveRequest) -> Result<GroupSignature> {
    let mut prover = GroupProver::new(key);
    prover.compute_witness(request)?;
    prover.prove()
}
