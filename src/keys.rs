//! Pre-flight check of a key list and membership key, for front ends.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::GroupSigError;
use crate::rsa::verify_encoded;
use crate::ssh::key::{PublicKeySet, RsaPublicKey};
use crate::ssh::sshsig::MembershipKey;
use crate::types::CircuitParams;

/// Per-item validity; never an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCheckResponse {
    /// One entry per non-empty line of the key list.
    pub public_keys_valid: Vec<bool>,
    pub membership_key_valid: bool,
    /// Index of the membership key's public key among the listed keys.
    pub user_public_key_index: Option<usize>,
}

impl KeyCheckResponse {
    /// Whether a proof could be generated from these inputs.
    pub fn ready_to_prove(&self, params: &CircuitParams) -> bool {
        self.membership_key_valid
            && self.user_public_key_index.is_some()
            && self.public_keys_valid.iter().all(|&v| v)
            && self.public_keys_valid.len() <= params.max_group_size
    }
}

pub fn validate_keys(
    public_keys_text: &str,
    membership_key_text: &str,
    params: &CircuitParams,
) -> KeyCheckResponse {
    let parsed: Vec<Option<RsaPublicKey>> = PublicKeySet::parse_lenient(public_keys_text)
        .into_iter()
        .map(|key| {
            key.and_then(|k| params.check_public_key(&k).map(|_| k))
                .map_err(|e| debug!("rejected public key: {e}"))
                .ok()
        })
        .collect();

    let membership_key = MembershipKey::parse(membership_key_text).and_then(|key| {
        params.check_public_key(key.public_key())?;
        if key.namespace() != params.namespace {
            return Err(GroupSigError::InvalidSignature(format!(
                "namespace {:?}",
                key.namespace()
            )));
        }
        verify_encoded(
            key.public_key(),
            key.signature(),
            &params.expected_encoded_message()?,
        )?;
        Ok(key)
    });
    if let Err(e) = &membership_key {
        debug!("rejected membership key: {e}");
    }

    let user_public_key_index = membership_key.as_ref().ok().and_then(|key| {
        parsed
            .iter()
            .position(|k| k.as_ref() == Some(key.public_key()))
    });

    KeyCheckResponse {
        public_keys_valid: parsed.iter().map(Option::is_some).collect(),
        membership_key_valid: membership_key.is_ok(),
        user_public_key_index,
    }
}
