//! # Cryptographic Primitives
//!
//! Everything a preconfirmation signer or verifier needs, and nothing more:
//!
//! - **Keccak-256** for digests and address derivation.
//! - **secp256k1 ECDSA** with recovery ids, so a verifier can go from
//!   `(digest, signature)` straight to a signer address.
//!
//! Both are thin wrappers over audited crates (`sha3`, `secp256k1`). The
//! only thing this module adds is the EVM-compatible byte layout.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{keccak256, keccak256_parts};
pub use keys::{address_from_pubkey, write_key_file, KeyError, PreconfirmKey};
pub use signatures::{recover_signer, sign_digest, verify_digest, Signature, SignatureError};
