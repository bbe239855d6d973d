//! RSA PKCS#1 v1.5 with SHA-512, off-circuit.
//!
//! The prover uses this to reject bad membership keys before any circuit work,
//! and the circuit reuses [`encoded_message`] as a constant.

use num_bigint::BigUint;
use sha2::{Digest, Sha512};

use crate::error::{GroupSigError, Result};
use crate::ssh::key::RsaPublicKey;
use crate::ssh::sshsig::signed_data;

/// DER `DigestInfo` prefix for SHA-512 (RFC 8017 §9.2, note 1).
pub const SHA512_DIGEST_INFO: [u8; 19] = [
    0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03, 0x05,
    0x00, 0x04, 0x40,
];

/// EMSA-PKCS1-v1_5 encoding of a SHA-512 digest into `em_len` bytes.
pub fn pkcs1v15_sha512(digest: &[u8; 64], em_len: usize) -> Result<Vec<u8>> {
    let t_len = SHA512_DIGEST_INFO.len() + digest.len();
    if em_len < t_len + 11 {
        return Err(GroupSigError::InvalidSignature(format!(
            "{em_len}-byte modulus is too short for a SHA-512 PKCS#1 signature"
        )));
    }
    let mut em = Vec::with_capacity(em_len);
    em.extend_from_slice(&[0x00, 0x01]);
    em.resize(em_len - t_len - 1, 0xff);
    em.push(0x00);
    em.extend_from_slice(&SHA512_DIGEST_INFO);
    em.extend_from_slice(digest);
    Ok(em)
}

/// The integer every member's RSA signature maps to under `s^e mod n`.
pub fn encoded_message(namespace: &str, base_message: &[u8], key_bits: usize) -> Result<BigUint> {
    let mut digest = [0u8; 64];
    digest.copy_from_slice(&Sha512::digest(signed_data(namespace, base_message)));
    let em = pkcs1v15_sha512(&digest, key_bits.div_ceil(8))?;
    Ok(BigUint::from_bytes_be(&em))
}

/// Plain RSA verification against a precomputed encoded message.
pub fn verify_encoded(key: &RsaPublicKey, signature: &BigUint, encoded: &BigUint) -> Result<()> {
    if signature >= &key.n {
        return Err(GroupSigError::InvalidSignature(
            "signature is not reduced modulo n".to_string(),
        ));
    }
    if &signature.modpow(&key.e, &key.n) != encoded {
        return Err(GroupSigError::InvalidSignature(
            "signature does not verify under the member key".to_string(),
        ));
    }
    Ok(())
}
