//! Command implementations for the `zk-groupsig` binary.

pub mod check_keys;
pub mod prove;
pub mod setup;
pub mod verify;

use anyhow::{bail, Result};
use std::fs;

use crate::types::CircuitParams;

/// Circuit parameters from an optional JSON file, with flag overrides on top.
pub fn load_params(
    params_file: Option<&str>,
    key_bits: Option<usize>,
    max_group_size: Option<usize>,
) -> Result<CircuitParams> {
    let mut params = match params_file {
        Some(path) => {
            log::info!("loading circuit parameters from {path}");
            CircuitParams::from_json(&fs::read_to_string(path)?)?
        }
        None => CircuitParams::default(),
    };
    if let Some(bits) = key_bits {
        params.key_bits = bits;
    }
    if let Some(size) = max_group_size {
        params.max_group_size = size;
    }
    params.validate()?;
    Ok(params)
}

/// Message bytes from either `--message` or `--message-file`.
pub fn read_message(message: Option<&str>, message_file: Option<&str>) -> Result<Vec<u8>> {
    match (message, message_file) {
        (Some(text), None) => Ok(text.as_bytes().to_vec()),
        (None, Some(path)) => Ok(fs::read(path)?),
        (Some(_), Some(_)) => bail!("pass either --message or --message-file, not both"),
        (None, None) => bail!("a message is required: --message or --message-file"),
    }
}
