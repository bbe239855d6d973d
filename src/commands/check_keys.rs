//! Key list and membership key pre-flight check.

use anyhow::Result;
use std::fs;

use crate::keys::{validate_keys, KeyCheckResponse};
use crate::types::CircuitParams;

/// Print a JSON [`KeyCheckResponse`]; returns whether proving would succeed.
pub fn run_check_keys(
    params: &CircuitParams,
    public_keys_file: &str,
    membership_key_file: &str,
) -> Result<bool> {
    let public_keys = fs::read_to_string(public_keys_file)?;
    let membership_key = fs::read_to_string(membership_key_file)?;

    let response: KeyCheckResponse = validate_keys(&public_keys, &membership_key, params);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.ready_to_prove(params))
}
