//! # Confirmation Digest
//!
//! The 32-byte value every signer signs. Its layout is frozen: third-party
//! verifiers rebuild it byte for byte from the receipt fields.
//!
//! ```text
//! "YNX_TXCONFIRM_V0"            16 bytes, ASCII
//! mode                           1 byte   (1 = included, 0 = pending)
//! len(chainId)                   2 bytes  big-endian
//! chainId                        len bytes, UTF-8
//! evmChainId                     8 bytes  big-endian
//! txHash                        32 bytes
//! targetBlock                    8 bytes  big-endian
//! issuedAt                       8 bytes  big-endian
//! ```
//!
//! `digest = keccak256(preimage)`. No signer identity goes in, so the same
//! digest verifies against any subset of the signer set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{MAX_CHAIN_ID_BYTES, TX_CONFIRM_DIGEST_PREFIX, UNKNOWN_CHAIN_ID};
use crate::crypto::keccak256;
use crate::types::{Digest, TxHash};

/// Where the transaction was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationStatus {
    /// Seen in the pending pool, not yet indexed.
    Pending,
    /// Indexed as part of a finalized block.
    Included,
}

impl AttestationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Included => "included",
        }
    }

    /// The mode byte committed to by the digest.
    pub fn mode_byte(&self) -> u8 {
        match self {
            Self::Included => 1,
            Self::Pending => 0,
        }
    }
}

impl fmt::Display for AttestationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttestationStatus {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("included") {
            Ok(Self::Included)
        } else if s.eq_ignore_ascii_case("pending") {
            Ok(Self::Pending)
        } else {
            Err(format!("unknown preconfirm status: {s:?}"))
        }
    }
}

/// Everything the digest commits to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationPayload {
    pub chain_id: String,
    pub evm_chain_id: u64,
    pub tx_hash: TxHash,
    pub status: AttestationStatus,
    pub target_block: u64,
    /// Unix seconds, supplied by the caller.
    pub issued_at: u64,
}

impl AttestationPayload {
    /// Shorthand for [`build_digest`].
    pub fn digest(&self) -> Digest {
        build_digest(self)
    }
}

/// Normalizes the chain id the way the digest sees it: trimmed, `unknown`
/// when empty, cut to 65535 bytes.
///
/// The cut happens on bytes, not characters, and can split a multi-byte
/// UTF-8 sequence. Existing verifiers do the same, so it stays.
fn chain_id_bytes(chain_id: &str) -> &[u8] {
    let trimmed = chain_id.trim();
    let id = if trimmed.is_empty() {
        UNKNOWN_CHAIN_ID
    } else {
        trimmed
    };
    let bytes = id.as_bytes();
    &bytes[..bytes.len().min(MAX_CHAIN_ID_BYTES)]
}

/// Builds the exact preimage that gets hashed.
pub fn encode_preimage(payload: &AttestationPayload) -> Vec<u8> {
    let chain_id = chain_id_bytes(&payload.chain_id);

    let mut buf =
        Vec::with_capacity(TX_CONFIRM_DIGEST_PREFIX.len() + 1 + 2 + chain_id.len() + 8 + 32 + 8 + 8);
    buf.extend_from_slice(TX_CONFIRM_DIGEST_PREFIX.as_bytes());
    buf.push(payload.status.mode_byte());
    // Fits: chain_id_bytes caps the length at u16::MAX.
    buf.extend_from_slice(&(chain_id.len() as u16).to_be_bytes());
    buf.extend_from_slice(chain_id);
    buf.extend_from_slice(&payload.evm_chain_id.to_be_bytes());
    buf.extend_from_slice(payload.tx_hash.as_bytes());
    buf.extend_from_slice(&payload.target_block.to_be_bytes());
    buf.extend_from_slice(&payload.issued_at.to_be_bytes());
    buf
}

/// keccak256 over [`encode_preimage`].
pub fn build_digest(payload: &AttestationPayload) -> Digest {
    Digest::new(keccak256(&encode_preimage(payload)))
}
