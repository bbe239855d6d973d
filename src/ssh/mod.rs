//! OpenSSH formats: wire primitives, `ssh-rsa` public keys and `SSHSIG` signatures.

pub mod key;
pub mod sshsig;
pub mod wire;

pub use key::{PublicKeySet, RsaPublicKey};
pub use sshsig::MembershipKey;
