//! Parsing helpers for command-line inputs.

use anyhow::{bail, Result};
use sha2::{Digest, Sha256};

use crate::snark::gadgets::nullifier::Nonce;

/// Nonce for a free-form context string, e.g. `item-42`: its SHA-256.
pub fn nonce_from_context(context: &str) -> Nonce {
    Nonce::new(Sha256::digest(context.as_bytes()).into())
}

/// Resolve the mutually exclusive `--nonce-hex` / `--nonce-context` flags.
pub fn parse_nonce(hex: Option<&str>, context: Option<&str>) -> Result<Option<Nonce>> {
    match (hex, context) {
        (Some(_), Some(_)) => bail!("pass either a hex nonce or a nonce context, not both"),
        (Some(hex), None) => Ok(Some(Nonce::from_hex(hex)?)),
        (None, Some(context)) => Ok(Some(nonce_from_context(context))),
        (None, None) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_sources() -> Result<()> {
        let from_context = parse_nonce(None, Some("item-42"))?.expect("nonce");
        let hex = hex::encode(Sha256::digest(b"item-42"));
        assert_eq!(parse_nonce(Some(&hex), None)?, Some(from_context));
        assert_eq!(parse_nonce(None, None)?, None);
        assert!(parse_nonce(Some(&hex), Some("item-42")).is_err());
        assert!(parse_nonce(Some("abcd"), None).is_err());
        Ok(())
    }
}
