//! OpenSSH RSA public keys and ordered public key sets.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::error::{GroupSigError, Result};
use crate::ssh::wire::{SshReader, SshWriter, WireError};

pub const SSH_RSA: &str = "ssh-rsa";

fn malformed(e: WireError) -> GroupSigError {
    GroupSigError::UnsupportedKeyType(format!("malformed ssh-rsa key: {e}"))
}

pub(crate) fn only_rsa(key_type: &str) -> GroupSigError {
    GroupSigError::UnsupportedKeyType(format!("Only {SSH_RSA} supported, got {key_type}"))
}

/// RSA public key `(e, n)`. Equality ignores comments.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RsaPublicKey {
    pub e: BigUint,
    pub n: BigUint,
}

impl RsaPublicKey {
    pub fn new(e: BigUint, n: BigUint) -> Self {
        Self { e, n }
    }

    /// Decode an SSH wire blob: `string "ssh-rsa" || mpint e || mpint n`.
    pub fn from_wire(blob: &[u8]) -> Result<Self> {
        let mut r = SshReader::new(blob);
        let key_type = r.read_str().map_err(malformed)?;
        if key_type != SSH_RSA {
            return Err(only_rsa(key_type));
        }
        let e = r.read_mpint().map_err(malformed)?;
        let n = r.read_mpint().map_err(malformed)?;
        r.finish().map_err(malformed)?;
        Ok(Self { e, n })
    }

    pub fn to_wire(&self) -> Vec<u8> {
        let mut w = SshWriter::new();
        w.write_string(SSH_RSA.as_bytes())
            .write_mpint(&self.e)
            .write_mpint(&self.n);
        w.into_bytes()
    }

    /// Parse an `authorized_keys`-style line: `ssh-rsa <base64> [comment]`.
    pub fn parse_openssh(line: &str) -> Result<Self> {
        let mut fields = line.split_whitespace();
        let key_type = fields
            .next()
            .ok_or_else(|| GroupSigError::UnsupportedKeyType("empty key line".to_string()))?;
        if key_type != SSH_RSA {
            return Err(only_rsa(key_type));
        }
        let blob = fields
            .next()
            .ok_or_else(|| GroupSigError::UnsupportedKeyType("missing key data".to_string()))?;
        let blob = STANDARD
            .decode(blob)
            .map_err(|e| GroupSigError::UnsupportedKeyType(format!("key data is not base64: {e}")))?;
        Self::from_wire(&blob)
    }

    /// Canonical one-line form, without comment.
    pub fn to_openssh(&self) -> String {
        format!("{SSH_RSA} {}", STANDARD.encode(self.to_wire()))
    }

    pub fn bits(&self) -> u64 {
        self.n.bits()
    }

    /// Modulus length in bytes, which is also the signature length.
    pub fn modulus_len(&self) -> usize {
        self.bits().div_ceil(8) as usize
    }

    /// `SHA256:<base64>` as printed by `ssh-keygen -l`.
    pub fn fingerprint(&self) -> String {
        format!(
            "SHA256:{}",
            STANDARD_NO_PAD.encode(Sha256::digest(self.to_wire()))
        )
    }
}

impl FromStr for RsaPublicKey {
    type Err = GroupSigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_openssh(s)
    }
}

impl fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RsaPublicKey({} bits, {})", self.bits(), self.fingerprint())
    }
}

impl fmt::Display for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_openssh())
    }
}

/// The group: an ordered list of member keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublicKeySet {
    keys: Vec<RsaPublicKey>,
}

impl PublicKeySet {
    pub fn new(keys: Vec<RsaPublicKey>) -> Self {
        Self { keys }
    }

    /// One key per line; blank lines are skipped and order is kept.
    pub fn parse(text: &str) -> Result<Self> {
        let keys = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(RsaPublicKey::parse_openssh)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keys })
    }

    /// Parse each line independently, keeping failures in place.
    pub fn parse_lenient(text: &str) -> Vec<Result<RsaPublicKey>> {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(RsaPublicKey::parse_openssh)
            .collect()
    }

    pub fn keys(&self) -> &[RsaPublicKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn position(&self, key: &RsaPublicKey) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RsaPublicKey> {
        self.keys.iter()
    }

    pub fn to_openssh(&self) -> String {
        self.keys
            .iter()
            .map(|k| k.to_openssh() + "\n")
            .collect()
    }
}

impl FromIterator<RsaPublicKey> for PublicKeySet {
    fn from_iter<I: IntoIterator<Item = RsaPublicKey>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
