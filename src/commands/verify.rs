//! Group signature verification command.

use anyhow::Result;
use std::{fs, time::Instant};

use crate::circuits::group_signature::VerifierKey;
use crate::engine::EngineHandle;
use crate::error::GroupSigError;
use crate::proof::GroupSignature;
use crate::types::CircuitParams;
use crate::verifier::{verify_with_key, VerificationReport};

/// Print a JSON [`VerificationReport`]; returns whether the signature is valid.
///
/// With `verifier_key_file` the exported key is used as is and `params` only
/// serves as a fallback; otherwise the circuit is compiled from `params`.
pub fn run_verify(
    params: CircuitParams,
    message: &[u8],
    proof_file: &str,
    verifier_key_file: Option<&str>,
) -> Result<bool> {
    let start = Instant::now();
    let armored = fs::read_to_string(proof_file)?;

    let result = GroupSignature::from_armored(&armored).and_then(|signature| {
        match verifier_key_file {
            Some(path) => {
                let bytes = fs::read(path)?;
                let key = VerifierKey::from_bytes(&bytes)?;
                verify_with_key(&key, message, &signature)
            }
            None => EngineHandle::new(params)?.verify(message, &signature),
        }
    });
    if let Err(GroupSigError::Io(e)) = &result {
        anyhow::bail!("reading verifier key: {e}");
    }

    let report = VerificationReport::from(&result);
    println!("{}", serde_json::to_string_pretty(&report)?);
    log::info!("verification finished in {:?}", start.elapsed());
    Ok(report.valid)
}
