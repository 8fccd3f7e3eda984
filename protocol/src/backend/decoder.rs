//! Raw transaction decoding.
//!
//! The canonical hash of an EVM transaction is keccak256 over its signed
//! envelope bytes. [`KeccakTxDecoder`] applies exactly that rule to whatever
//! the pool hands back; chains wrapping EVM payloads in another envelope
//! supply their own [`TxDecoder`](super::TxDecoder).

use thiserror::Error;

use super::TxDecoder;
use crate::crypto::keccak256;
use crate::types::TxHash;

/// A raw pool entry could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty transaction bytes")]
    Empty,

    #[error("malformed transaction: {0}")]
    Malformed(String),
}

/// A decoded pool entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTx {
    /// Canonical transaction hash.
    pub hash: TxHash,
    /// Size of the raw encoding in bytes.
    pub size: usize,
}

/// Hashes the raw envelope with keccak256.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeccakTxDecoder;

impl TxDecoder for KeccakTxDecoder {
    fn decode(&self, raw: &[u8]) -> Result<DecodedTx, DecodeError> {
        if raw.is_empty() {
            return Err(DecodeError::Empty);
        }
        Ok(DecodedTx {
            hash: TxHash::new(keccak256(raw)),
            size: raw.len(),
        })
    }
}
