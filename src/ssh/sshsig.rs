//! OpenSSH `SSHSIG` signatures, used as membership keys.
//!
//! Blob layout (PROTOCOL.sshsig): `"SSHSIG" || uint32 version || string publickey ||
//! string namespace || string reserved || string hash_algorithm || string signature`,
//! where `signature = string algorithm || string raw_signature`.

use num_bigint::BigUint;
use sha2::{Digest, Sha512};

use crate::error::{GroupSigError, Result};
use crate::ssh::key::RsaPublicKey;
use crate::ssh::wire::{SshReader, SshWriter, WireError};
use crate::utils::armor::{armor, dearmor};

pub const SSHSIG_MAGIC: &[u8; 6] = b"SSHSIG";
pub const SSHSIG_VERSION: u32 = 1;
pub const ARMOR_LABEL: &str = "SSH SIGNATURE";
pub const HASH_ALGORITHM: &str = "sha512";
pub const SIGNATURE_ALGORITHM: &str = "rsa-sha2-512";

fn malformed(e: WireError) -> GroupSigError {
    GroupSigError::UnsupportedKeyType(format!("malformed SSH signature: {e}"))
}

/// The data RSA actually signs: the message is pre-hashed with SHA-512.
pub fn signed_data(namespace: &str, message: &[u8]) -> Vec<u8> {
    let mut w = SshWriter::new();
    w.write_raw(SSHSIG_MAGIC)
        .write_string(namespace.as_bytes())
        .write_string(&[])
        .write_string(HASH_ALGORITHM.as_bytes())
        .write_string(&Sha512::digest(message));
    w.into_bytes()
}

/// A member's secret: their RSA signature over the group's base message.
#[derive(Clone, PartialEq, Eq)]
pub struct MembershipKey {
    public_key: RsaPublicKey,
    namespace: String,
    signature: BigUint,
}

impl MembershipKey {
    /// Parse the armored output of `ssh-keygen -Y sign`.
    pub fn parse(text: &str) -> Result<Self> {
        let blob = dearmor(ARMOR_LABEL, text)
            .map_err(|e| GroupSigError::UnsupportedKeyType(format!("membership key: {e}")))?;
        Self::from_blob(&blob)
    }

    pub fn from_blob(blob: &[u8]) -> Result<Self> {
        let mut r = SshReader::new(blob);
        if r.read_raw(SSHSIG_MAGIC.len()).map_err(malformed)? != SSHSIG_MAGIC {
            return Err(GroupSigError::UnsupportedKeyType(
                "missing SSHSIG preamble".to_string(),
            ));
        }
        let version = r.read_u32().map_err(malformed)?;
        if version != SSHSIG_VERSION {
            return Err(GroupSigError::UnsupportedKeyType(format!(
                "unsupported SSHSIG version {version}"
            )));
        }
        let public_key = RsaPublicKey::from_wire(r.read_string().map_err(malformed)?)?;
        let namespace = r.read_str().map_err(malformed)?.to_string();
        let _reserved = r.read_string().map_err(malformed)?;
        let hash_algorithm = r.read_str().map_err(malformed)?;
        if hash_algorithm != HASH_ALGORITHM {
            return Err(GroupSigError::UnsupportedKeyType(format!(
                "hash algorithm {hash_algorithm}, expected {HASH_ALGORITHM}"
            )));
        }

        let mut sig = SshReader::new(r.read_string().map_err(malformed)?);
        r.finish().map_err(malformed)?;
        let algorithm = sig.read_str().map_err(malformed)?;
        if algorithm != SIGNATURE_ALGORITHM {
            return Err(GroupSigError::UnsupportedKeyType(format!(
                "signature algorithm {algorithm}, expected {SIGNATURE_ALGORITHM}"
            )));
        }
        let raw = sig.read_string().map_err(malformed)?;
        sig.finish().map_err(malformed)?;
        if raw.len() != public_key.modulus_len() {
            return Err(GroupSigError::InvalidSignature(format!(
                "signature is {} bytes, modulus is {}",
                raw.len(),
                public_key.modulus_len()
            )));
        }

        Ok(Self {
            public_key,
            namespace,
            signature: BigUint::from_bytes_be(raw),
        })
    }

    pub fn to_blob(&self) -> Vec<u8> {
        let mut raw = self.signature.to_bytes_be();
        let len = self.public_key.modulus_len();
        if raw.len() < len {
            raw.splice(0..0, std::iter::repeat(0).take(len - raw.len()));
        }
        let mut sig = SshWriter::new();
        sig.write_string(SIGNATURE_ALGORITHM.as_bytes())
            .write_string(&raw);
        let mut w = SshWriter::new();
        w.write_raw(SSHSIG_MAGIC)
            .write_u32(SSHSIG_VERSION)
            .write_string(&self.public_key.to_wire())
            .write_string(self.namespace.as_bytes())
            .write_string(&[])
            .write_string(HASH_ALGORITHM.as_bytes())
            .write_string(&sig.into_bytes());
        w.into_bytes()
    }

    pub fn to_armored(&self) -> String {
        armor(ARMOR_LABEL, &self.to_blob())
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn signature(&self) -> &BigUint {
        &self.signature
    }
}

impl std::fmt::Debug for MembershipKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipKey")
            .field("public_key", &self.public_key)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIG_1024: &str = include_str!("../../tests/fixtures/rsa1024_1.sig");
    const PUB_1024: &str = include_str!("../../tests/fixtures/rsa1024_1.pub");
    const SIG_NS: &str = include_str!("../../tests/fixtures/rsa1024_ns.sig");
    const SIG_ED25519: &str = include_str!("../../tests/fixtures/ed25519_1.sig");

    #[test]
    fn test_parse_membership_key() -> Result<()> {
        let key = MembershipKey::parse(SIG_1024)?;
        assert_eq!(key.namespace(), "parcit.group");
        assert_eq!(key.public_key(), &RsaPublicKey::parse_openssh(PUB_1024)?);
        assert!(key.signature() < &key.public_key().n);
        Ok(())
    }

    #[test]
    fn test_blob_round_trip() -> Result<()> {
        let key = MembershipKey::parse(SIG_NS)?;
        assert_eq!(key.namespace(), "other.namespace");
        assert_eq!(MembershipKey::parse(&key.to_armored())?, key);
        Ok(())
    }

    #[test]
    fn test_debug_hides_signature() -> Result<()> {
        let key = MembershipKey::parse(SIG_1024)?;
        let shown = format!("{key:?}");
        assert!(!shown.contains(&key.signature().to_string()));
        Ok(())
    }

    #[test]
    fn test_ed25519_signature_is_unsupported() {
        assert!(matches!(
            MembershipKey::parse(SIG_ED25519),
            Err(GroupSigError::UnsupportedKeyType(_))
        ));
    }

    #[test]
    fn test_malformed_encoding_is_unsupported() -> Result<()> {
        let blob = MembershipKey::parse(SIG_1024)?.to_blob();
        let bad_blobs = [
            b"SSHSIG\x00\x00\x00\x02".to_vec(),
            b"NOTSIG\x00\x00\x00\x01".to_vec(),
            blob[..blob.len() - 10].to_vec(),
            blob[..9].to_vec(),
        ];
        for bad in &bad_blobs {
            assert!(matches!(
                MembershipKey::from_blob(bad),
                Err(GroupSigError::UnsupportedKeyType(_))
            ));
        }
        assert!(matches!(
            MembershipKey::parse("hello"),
            Err(GroupSigError::UnsupportedKeyType(_))
        ));
        Ok(())
    }

    #[test]
    fn test_wrong_length_signature_is_invalid() -> Result<()> {
        let key = MembershipKey::parse(SIG_1024)?;
        let raw = vec![1u8; key.public_key().modulus_len() - 2];
        let mut sig = SshWriter::new();
        sig.write_string(SIGNATURE_ALGORITHM.as_bytes())
            .write_string(&raw);
        let mut w = SshWriter::new();
        w.write_raw(SSHSIG_MAGIC)
            .write_u32(SSHSIG_VERSION)
            .write_string(&key.public_key().to_wire())
            .write_string(key.namespace().as_bytes())
            .write_string(&[])
            .write_string(HASH_ALGORITHM.as_bytes())
            .write_string(&sig.into_bytes());
        assert!(matches!(
            MembershipKey::from_blob(&w.into_bytes()),
            Err(GroupSigError::InvalidSignature(_))
        ));
        Ok(())
    }

    #[test]
    fn test_signed_data_layout() {
        let data = signed_data("parcit.group", b"hi");
        assert!(data.starts_with(b"SSHSIG\x00\x00\x00\x0cparcit.group\x00\x00\x00\x00\x00\x00\x00\x06sha512\x00\x00\x00\x40"));
        assert_eq!(data.len(), 6 + 4 + 12 + 4 + 4 + 6 + 4 + 64);
    }
}
