//! Circuit parameters shared by prover and verifier.

use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::{GroupSigError, Result};
use crate::rsa::encoded_message;
use crate::snark::limbs::LimbLayout;
use crate::ssh::key::{PublicKeySet, RsaPublicKey};

pub const DEFAULT_MAX_GROUP_SIZE: usize = 16;
pub const DEFAULT_KEY_BITS: usize = 4096;
pub const DEFAULT_PUBLIC_EXPONENT: u64 = 65537;
pub const DEFAULT_NAMESPACE: &str = "parcit.group";
pub const DEFAULT_BASE_MESSAGE: &str = "E PLURIBUS UNUM; DO NOT SHARE\n";

/// Compile-time shape of the group signature circuit.
///
/// A proof only verifies against a circuit built from identical parameters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitParams {
    /// Number of public key slots; smaller groups are zero-padded.
    pub max_group_size: usize,
    /// Exact modulus width of every member key.
    pub key_bits: usize,
    pub public_exponent: u64,
    /// `ssh-keygen -Y sign -n` namespace of membership keys.
    pub namespace: String,
    /// Message every member signs once to obtain their membership key.
    pub base_message: String,
}

impl Default for CircuitParams {
    fn default() -> Self {
        Self {
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            key_bits: DEFAULT_KEY_BITS,
            public_exponent: DEFAULT_PUBLIC_EXPONENT,
            namespace: DEFAULT_NAMESPACE.to_string(),
            base_message: DEFAULT_BASE_MESSAGE.to_string(),
        }
    }
}

impl CircuitParams {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GroupSigError::CircuitShape(format!("invalid circuit parameters: {e}")))
    }

    /// Check that a circuit can be built, returning its limb layout.
    pub fn validate(&self) -> Result<LimbLayout> {
        if self.max_group_size == 0 {
            return Err(GroupSigError::CircuitShape(
                "max_group_size must be at least 1".to_string(),
            ));
        }
        if self.public_exponent < 3 || self.public_exponent % 2 == 0 {
            return Err(GroupSigError::CircuitShape(format!(
                "public exponent {} must be odd and at least 3",
                self.public_exponent
            )));
        }
        let layout = LimbLayout::for_key_bits(self.key_bits)?;
        layout.ensure_mul_safe()?;
        let key_limbs = layout
            .num_limbs
            .checked_mul(self.max_group_size)
            .filter(|&n| n <= u32::MAX as usize);
        if key_limbs.is_none() {
            return Err(GroupSigError::CircuitShape(format!(
                "{} key slots of {} limbs do not fit the public inputs",
                self.max_group_size, layout.num_limbs
            )));
        }
        self.expected_encoded_message().map_err(|e| {
            GroupSigError::CircuitShape(format!("{}-bit keys: {e}", self.key_bits))
        })?;
        Ok(layout)
    }

    pub fn layout(&self) -> Result<LimbLayout> {
        LimbLayout::for_key_bits(self.key_bits)
    }

    pub fn exponent(&self) -> BigUint {
        BigUint::from(self.public_exponent)
    }

    /// PKCS#1 v1.5 encoding of the membership statement, `s^e mod n` for every member.
    pub fn expected_encoded_message(&self) -> Result<BigUint> {
        encoded_message(&self.namespace, self.base_message.as_bytes(), self.key_bits)
    }

    pub fn check_public_key(&self, key: &RsaPublicKey) -> Result<()> {
        if key.e != self.exponent() {
            return Err(GroupSigError::UnsupportedKeyType(format!(
                "public exponent {} is not {}",
                key.e, self.public_exponent
            )));
        }
        let bits = key.bits();
        if bits > self.key_bits as u64 {
            return Err(GroupSigError::LimbOverflow {
                bits,
                max_bits: self.key_bits,
            });
        }
        if bits < self.key_bits as u64 {
            return Err(GroupSigError::UnsupportedKeyType(format!(
                "{bits}-bit key, expected {} bits",
                self.key_bits
            )));
        }
        Ok(())
    }

    pub fn check_key_set(&self, keys: &PublicKeySet) -> Result<()> {
        if keys.len() > self.max_group_size {
            return Err(GroupSigError::GroupTooLarge {
                size: keys.len(),
                max: self.max_group_size,
            });
        }
        keys.iter().try_for_each(|k| self.check_public_key(k))
    }
}

/// Whether a proof carries a nonce and nullifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofMode {
    Plain,
    Nullifier,
}

impl ProofMode {
    pub const ALL: [ProofMode; 2] = [ProofMode::Plain, ProofMode::Nullifier];

    pub fn has_nullifier(self) -> bool {
        matches!(self, ProofMode::Nullifier)
    }
}

impl fmt::Display for ProofMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofMode::Plain => f.write_str("plain"),
            ProofMode::Nullifier => f.write_str("nullifier"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSA1024_1: &str = include_str!("../../tests/fixtures/rsa1024_1.pub");
    const RSA4096_1: &str = include_str!("../../tests/fixtures/rsa4096_1.pub");

    fn params_1024() -> CircuitParams {
        CircuitParams {
            key_bits: 1024,
            max_group_size: 2,
            ..CircuitParams::default()
        }
    }

    #[test]
    fn test_defaults_validate() -> Result<()> {
        let params = CircuitParams::default();
        let layout = params.validate()?;
        assert_eq!(layout.limb_bits, 26);
        assert_eq!(layout.num_limbs, 158);
        assert_eq!(params.expected_encoded_message()?.bits(), 4096 - 15);
        Ok(())
    }

    #[test]
    fn test_json_overrides_fill_defaults() -> Result<()> {
        let params = CircuitParams::from_json(r#"{"key_bits": 1024}"#)?;
        assert_eq!(params.key_bits, 1024);
        assert_eq!(params.max_group_size, DEFAULT_MAX_GROUP_SIZE);
        assert_eq!(params.namespace, DEFAULT_NAMESPACE);
        assert!(CircuitParams::from_json("{").is_err());
        Ok(())
    }

    #[test]
    fn test_invalid_shapes() {
        let zero_group = CircuitParams {
            max_group_size: 0,
            ..CircuitParams::default()
        };
        assert!(matches!(zero_group.validate(), Err(GroupSigError::CircuitShape(_))));
        let tiny_keys = CircuitParams {
            key_bits: 512,
            ..CircuitParams::default()
        };
        assert!(matches!(tiny_keys.validate(), Err(GroupSigError::CircuitShape(_))));
        let even_exponent = CircuitParams {
            public_exponent: 4,
            ..CircuitParams::default()
        };
        assert!(even_exponent.validate().is_err());
        let huge_group = CircuitParams {
            max_group_size: usize::MAX / 3,
            ..CircuitParams::default()
        };
        assert!(matches!(huge_group.validate(), Err(GroupSigError::CircuitShape(_))));
    }

    #[test]
    fn test_key_checks() -> Result<()> {
        let params = params_1024();
        let small = RsaPublicKey::parse_openssh(RSA1024_1)?;
        let large = RsaPublicKey::parse_openssh(RSA4096_1)?;
        params.check_public_key(&small)?;
        assert!(matches!(
            params.check_public_key(&large),
            Err(GroupSigError::LimbOverflow { bits: 4096, max_bits: 1024 })
        ));
        assert!(matches!(
            CircuitParams::default().check_public_key(&small),
            Err(GroupSigError::UnsupportedKeyType(_))
        ));
        let odd_e = RsaPublicKey::new(BigUint::from(3u8), small.n.clone());
        assert!(matches!(
            params.check_public_key(&odd_e),
            Err(GroupSigError::UnsupportedKeyType(_))
        ));
        Ok(())
    }

    #[test]
    fn test_group_size_limit() -> Result<()> {
        let params = params_1024();
        let key = RsaPublicKey::parse_openssh(RSA1024_1)?;
        let keys: PublicKeySet = std::iter::repeat(key).take(3).collect();
        assert!(matches!(
            params.check_key_set(&keys),
            Err(GroupSigError::GroupTooLarge { size: 3, max: 2 })
        ));
        Ok(())
    }
}
