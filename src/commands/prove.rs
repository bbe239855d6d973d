//! Group signature proof generation command.

use anyhow::Result;
use std::{fs, path::Path, time::Instant};

use crate::engine::EngineHandle;
use crate::prover::ProveRequest;
use crate::snark::gadgets::nullifier::Nonce;
use crate::ssh::key::PublicKeySet;
use crate::types::CircuitParams;

pub struct ProveArgs<'a> {
    pub public_keys_file: &'a str,
    pub membership_key_file: &'a str,
    pub message: Vec<u8>,
    pub nonce: Option<Nonce>,
    pub output: &'a Path,
}

/// Prove, self-verify and write the armored group signature.
pub fn generate_group_signature(params: CircuitParams, args: ProveArgs<'_>) -> Result<()> {
    println!("Loading public keys from: {}", args.public_keys_file);
    let public_keys = PublicKeySet::parse(&fs::read_to_string(args.public_keys_file)?)?;
    let membership_key = fs::read_to_string(args.membership_key_file)?;
    println!("Group size: {}", public_keys.len());

    let mut request = ProveRequest::new(args.message, public_keys, membership_key);
    if let Some(nonce) = args.nonce {
        println!("Nonce: {nonce}");
        request = request.with_nonce(nonce);
    }

    let engine = EngineHandle::new(params)?;
    let build_start = Instant::now();
    engine.prover_key(request.mode())?;
    println!("{} circuit build time: {:?}", request.mode(), build_start.elapsed());

    println!("Generating group signature...");
    let prove_start = Instant::now();
    let signature = engine.prove(&request)?;
    println!("Proving time: {:?}", prove_start.elapsed());

    println!("Verifying group signature...");
    let verify_start = Instant::now();
    let verified = engine.verify(&request.message, &signature)?;
    println!("Verification time: {:?}", verify_start.elapsed());
    if let Some(nullifier) = verified.nullifier {
        println!("Nullifier: {nullifier}");
    }

    let bytes = signature.to_bytes()?;
    fs::write(args.output, signature.to_armored()?)?;
    println!("Group signature saved: {} ({} bytes)", args.output.display(), bytes.len());
    Ok(())
}
