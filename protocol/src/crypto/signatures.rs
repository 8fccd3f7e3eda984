//! # Recoverable Signatures
//!
//! ECDSA over secp256k1 with a recovery id, serialized the way
//! `go-ethereum`'s `crypto.Sign` does: 65 bytes, `r ‖ s ‖ v` with `v` in
//! `{0, 1}`. Verifiers that learned their habits from `ecrecover` send
//! `v` in `{27, 28}` instead, so recovery accepts both.
//!
//! Signing happens over a raw 32-byte digest. No extra hashing, no
//! `"\x19Ethereum Signed Message"` wrapper: the digest is already
//! domain-separated by its own prefix.

use std::fmt;

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, SECP256K1};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::SIGNATURE_LENGTH;
use crate::crypto::keys::{address_from_pubkey, PreconfirmKey};
use crate::types::{strip_hex_prefix, Address, Digest};

/// Errors from signature parsing or recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("invalid signature length: {0} (expected 65)")]
    InvalidLength(usize),

    #[error("invalid signature recovery byte: {0}")]
    InvalidRecoveryId(u8),

    #[error("signature does not recover to a public key")]
    RecoveryFailed,

    #[error("invalid signature hex")]
    InvalidHex,
}

/// Raw signature bytes as carried on the wire.
///
/// Kept as a `Vec<u8>` because receipts coming from elsewhere may carry
/// malformed signatures; those must parse and then simply fail to verify.
/// Signatures produced by this crate are always exactly 65 bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl Signature {
    /// Wraps arbitrary bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-length signature.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.bytes))
    }

    /// Parses hex with or without the `0x` prefix. Any length is accepted.
    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        hex::decode(strip_hex_prefix(s.trim()))
            .map(Self::from_bytes)
            .map_err(|_| SignatureError::InvalidHex)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Signs a 32-byte digest, producing `r ‖ s ‖ v` with `v` in `{0, 1}`.
pub fn sign_digest(key: &PreconfirmKey, digest: &Digest) -> Signature {
    let msg = Message::from_digest(digest.0);
    let rec = SECP256K1.sign_ecdsa_recoverable(&msg, key.secret());
    let (rec_id, compact) = rec.serialize_compact();

    let mut out = Vec::with_capacity(SIGNATURE_LENGTH);
    out.extend_from_slice(&compact);
    // Recovery ids are 0..=3; only 0 and 1 occur for canonical low-s signatures.
    out.push(rec_id.to_i32() as u8);
    Signature::from_bytes(out)
}

/// Recovers the signer address from a digest and a 65-byte signature.
pub fn recover_signer(digest: &Digest, signature: &Signature) -> Result<Address, SignatureError> {
    let bytes = signature.as_bytes();
    if bytes.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidLength(bytes.len()));
    }

    let v = bytes[64];
    let normalized = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        other => return Err(SignatureError::InvalidRecoveryId(other)),
    };
    let rec_id = RecoveryId::from_i32(i32::from(normalized))
        .map_err(|_| SignatureError::InvalidRecoveryId(v))?;
    let rec = RecoverableSignature::from_compact(&bytes[..64], rec_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    let msg = Message::from_digest(digest.0);
    let public = SECP256K1
        .recover_ecdsa(&msg, &rec)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(address_from_pubkey(&public))
}

/// Returns `true` if `signature` over `digest` recovers to `expected`.
pub fn verify_digest(digest: &Digest, signature: &Signature, expected: &Address) -> bool {
    matches!(recover_signer(digest, signature), Ok(addr) if addr == *expected)
}
