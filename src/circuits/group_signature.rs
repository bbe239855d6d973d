//! Group signature circuit: "one of these RSA keys signed the membership statement".
//!
//! The circuit proves, for private `(n, s, selectors)` and public key slots:
//! - `s^e mod n` equals the PKCS#1 encoding of the fixed membership statement
//! - `n` has exactly `key_bits` bits and equals the slot picked by the selectors
//! - in nullifier mode, `nullifier = Poseidon(domain ‖ s ‖ nonce)`
//!
//! The message digest is a public input only; the proof transcript binds it.

use log::info;
use plonky2::hash::hash_types::HashOutTarget;
use plonky2::iop::target::{BoolTarget, Target};
use plonky2::plonk::circuit_builder::CircuitBuilder;
use plonky2::plonk::circuit_data::{
    CircuitConfig, CircuitData, ProverCircuitData, VerifierCircuitData,
};
use plonky2::plonk::config::{GenericConfig, PoseidonGoldilocksConfig};
use plonky2::util::serialization::DefaultGateSerializer;
use serde::{Deserialize, Serialize};

use crate::circuits::public_inputs::{PublicInputLayout, MESSAGE_DIGEST_WORDS};
use crate::error::{GroupSigError, Result};
use crate::snark::gadgets::bigint::{BigIntTarget, CircuitBuilderBigInt};
use crate::snark::gadgets::membership::add_membership_constraints;
use crate::snark::gadgets::modexp::{multiplication_count, pow_mod_fixed_exponent};
use crate::snark::gadgets::nullifier::{add_nullifier_constraints, NONCE_WORDS};
use crate::snark::limbs::LimbVector;
use crate::types::{CircuitParams, ProofMode};
use crate::utils::bit_packing::add_virtual_word_targets;

pub const D: usize = 2;
pub type Cfg = PoseidonGoldilocksConfig;
pub type F = <Cfg as GenericConfig<D>>::F;

/// Targets the prover fills in.
#[derive(Clone, Debug)]
pub struct GroupSignatureTargets {
    // public
    pub message_digest: Vec<Target>,
    pub key_slots: Vec<BigIntTarget>,
    pub nonce: Option<Vec<Target>>,
    pub nullifier: Option<HashOutTarget>,

    // private
    pub modulus: BigIntTarget,
    pub signature: BigIntTarget,
    pub selectors: Vec<BoolTarget>,
}

pub struct GroupSignatureCircuit {
    pub data: CircuitData<F, Cfg, D>,
    pub targets: GroupSignatureTargets,
    pub params: CircuitParams,
    pub layout: PublicInputLayout,
}

/// Build the circuit for `params` in the given mode.
///
/// Fails only on an unbuildable shape (`CircuitShape`).
pub fn build_group_signature_circuit(
    params: &CircuitParams,
    mode: ProofMode,
) -> Result<GroupSignatureCircuit> {
    let limb_layout = params.validate()?;
    let layout = PublicInputLayout::new(params, mode)?;
    let statement = LimbVector::<F>::decompose(&params.expected_encoded_message()?, limb_layout)?;

    let config = CircuitConfig::standard_recursion_zk_config();
    let mut builder = CircuitBuilder::<F, D>::new(config);

    let message_digest = add_virtual_word_targets(&mut builder, MESSAGE_DIGEST_WORDS);
    builder.register_public_inputs(&message_digest);

    let key_slots: Vec<BigIntTarget> = (0..params.max_group_size)
        .map(|_| {
            let slot = builder.add_virtual_bigint_target(limb_layout);
            builder.register_bigint_public_input(&slot);
            slot
        })
        .collect();

    let nonce = mode.has_nullifier().then(|| {
        let words = add_virtual_word_targets(&mut builder, NONCE_WORDS);
        builder.register_public_inputs(&words);
        words
    });

    let modulus = builder.add_virtual_bigint_target(limb_layout);
    builder.assert_bigint_bit_length(&modulus, params.key_bits);
    let signature = builder.add_virtual_bigint_target(limb_layout);

    let recovered = pow_mod_fixed_exponent(&mut builder, &signature, &params.exponent(), &modulus);
    let expected = builder.constant_bigint(&statement);
    builder.connect_bigint(&recovered, &expected);

    let selectors = add_membership_constraints(&mut builder, &modulus, &key_slots);

    let nullifier = nonce.as_ref().map(|words| {
        let hash = add_nullifier_constraints(&mut builder, &signature, words);
        builder.register_public_inputs(&hash.elements);
        hash
    });

    info!(
        "building {mode} group signature circuit: {} slots of {}-bit keys ({} limbs of {} bits, {} modular multiplications)",
        params.max_group_size,
        params.key_bits,
        limb_layout.num_limbs,
        limb_layout.limb_bits,
        multiplication_count(&params.exponent())
    );
    let data = builder.build::<Cfg>();
    if data.common.num_public_inputs != layout.len() {
        return Err(GroupSigError::CircuitShape(format!(
            "circuit exposes {} public inputs, layout expects {}",
            data.common.num_public_inputs,
            layout.len()
        )));
    }

    Ok(GroupSignatureCircuit {
        data,
        targets: GroupSignatureTargets {
            message_digest,
            key_slots,
            nonce,
            nullifier,
            modulus,
            signature,
            selectors,
        },
        params: params.clone(),
        layout,
    })
}

/// Compile both halves in one go.
pub fn build_circuit(params: &CircuitParams, mode: ProofMode) -> Result<(ProverKey, VerifierKey)> {
    Ok(build_group_signature_circuit(params, mode)?.into_keys())
}

impl GroupSignatureCircuit {
    pub fn mode(&self) -> ProofMode {
        self.layout.mode
    }

    pub fn into_keys(self) -> (ProverKey, VerifierKey) {
        let verifier = VerifierKey {
            data: self.data.verifier_data(),
            params: self.params.clone(),
            layout: self.layout,
        };
        let prover = ProverKey {
            data: self.data.prover_data(),
            targets: self.targets,
            params: self.params,
            layout: self.layout,
        };
        (prover, verifier)
    }
}

/// Everything needed to prove; never leaves the prover's process.
pub struct ProverKey {
    pub data: ProverCircuitData<F, Cfg, D>,
    pub targets: GroupSignatureTargets,
    pub params: CircuitParams,
    pub layout: PublicInputLayout,
}

/// Everything needed to verify; small enough to ship to verifiers.
pub struct VerifierKey {
    pub data: VerifierCircuitData<F, Cfg, D>,
    pub params: CircuitParams,
    pub layout: PublicInputLayout,
}

#[derive(Serialize, Deserialize)]
struct VerifierKeyFile {
    params: CircuitParams,
    mode: ProofMode,
    circuit: Vec<u8>,
}

impl VerifierKey {
    pub fn mode(&self) -> ProofMode {
        self.layout.mode
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let circuit = self
            .data
            .to_bytes(&DefaultGateSerializer)
            .map_err(|e| GroupSigError::CircuitShape(format!("serializing verifier key: {e:?}")))?;
        let file = VerifierKeyFile {
            params: self.params.clone(),
            mode: self.mode(),
            circuit,
        };
        bincode::serialize(&file)
            .map_err(|e| GroupSigError::CircuitShape(format!("serializing verifier key: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let file: VerifierKeyFile = bincode::deserialize(bytes).map_err(|e| {
            GroupSigError::ProofDeserialization(format!("malformed verifier key: {e}"))
        })?;
        file.params.validate().map_err(|e| {
            GroupSigError::ProofDeserialization(format!("verifier key parameters: {e}"))
        })?;
        let layout = PublicInputLayout::new(&file.params, file.mode)?;
        let data = VerifierCircuitData::from_bytes(file.circuit, &DefaultGateSerializer)
            .map_err(|e| {
                GroupSigError::ProofDeserialization(format!("malformed verifier circuit: {e:?}"))
            })?;
        if data.common.num_public_inputs != layout.len() {
            return Err(GroupSigError::ProofDeserialization(format!(
                "verifier circuit has {} public inputs, parameters imply {}",
                data.common.num_public_inputs,
                layout.len()
            )));
        }
        Ok(Self {
            data,
            params: file.params,
            layout,
        })
    }
}
