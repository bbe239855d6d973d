//! The production shape: 4096-bit keys, one vote per member per item.
//!
//! Slow in debug builds; run with `cargo test --release -- --ignored`.

use sha2::{Digest, Sha256};

use zk_groupsig::{CircuitParams, EngineHandle, Nonce, ProveRequest, PublicKeySet};

const PUB_1: &str = include_str!("fixtures/rsa4096_1.pub");
const PUB_2: &str = include_str!("fixtures/rsa4096_2.pub");
const PUB_3: &str = include_str!("fixtures/rsa4096_3.pub");
const SIG_1: &str = include_str!("fixtures/rsa4096_1.sig");
const SIG_2: &str = include_str!("fixtures/rsa4096_2.sig");

#[test]
#[ignore]
fn test_vote_on_item_with_4096_bit_keys() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = EngineHandle::new(CircuitParams::default())?;
    let keys = PublicKeySet::parse(&[PUB_1, PUB_2, PUB_3].concat())?;
    let message = "🎉 add a ping-pong table".as_bytes();
    let nonce = Nonce::new(Sha256::digest(b"item-42").into());

    let plain = engine.prove(&ProveRequest::new(message, keys.clone(), SIG_2))?;
    let verified = engine.verify_bytes(message, &plain.to_bytes()?)?;
    assert_eq!(verified.public_keys, keys);
    assert!(verified.nonce.is_none());
    assert!(verified.nullifier.is_none());

    let vote = |membership_key: &str| {
        let request = ProveRequest::new(message, keys.clone(), membership_key).with_nonce(nonce);
        let signature = engine.prove(&request)?;
        engine.verify_bytes(message, &signature.to_bytes()?)
    };

    let first = vote(SIG_2)?;
    assert_eq!(first.public_keys, keys);
    assert_eq!(first.nonce, Some(nonce));

    let second = vote(SIG_2)?;
    assert_eq!(first.nullifier, second.nullifier);

    let other_member = vote(SIG_1)?;
    assert_ne!(first.nullifier, other_member.nullifier);
    Ok(())
}
