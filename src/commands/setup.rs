//! Circuit compilation and verifier key export.

use anyhow::Result;
use std::{fs, path::Path, time::Instant};

use crate::engine::EngineHandle;
use crate::types::{CircuitParams, ProofMode};
use crate::utils::circuit_stats::{print_circuit_stats, CircuitStats};

pub fn verifier_key_file_name(mode: ProofMode) -> String {
    format!("verifier_key_{mode}.bin")
}

/// Compile the requested modes and write their verifier keys to `build_dir`.
pub fn run_setup(params: CircuitParams, modes: &[ProofMode], build_dir: &Path) -> Result<()> {
    let engine = EngineHandle::new(params)?;
    let params = engine.params();
    println!(
        "Circuit parameters: {} keys of {} bits, namespace {:?}",
        params.max_group_size, params.key_bits, params.namespace
    );
    fs::write(
        build_dir.join("params.json"),
        serde_json::to_string_pretty(params)?,
    )?;

    let mut all_stats = Vec::new();
    for &mode in modes {
        println!("\nBuilding {mode} circuit...");
        let start = Instant::now();
        let verifier = engine.verifier_key(mode)?;
        println!("{mode} circuit build time: {:?}", start.elapsed());
        print_circuit_stats(&format!("Group signature ({mode})"), &verifier.data.common);
        all_stats.push((mode, CircuitStats::from_common(&verifier.data.common)));

        let bytes = verifier.to_bytes()?;
        let path = build_dir.join(verifier_key_file_name(mode));
        fs::write(&path, &bytes)?;
        println!("Verifier key saved: {} ({} bytes)", path.display(), bytes.len());
    }

    let mut stats = serde_json::Map::new();
    for (mode, mode_stats) in all_stats {
        stats.insert(mode.to_string(), serde_json::to_value(mode_stats)?);
    }
    fs::write(
        build_dir.join("circuit_stats.json"),
        serde_json::to_string_pretty(&stats)?,
    )?;
    Ok(())
}
