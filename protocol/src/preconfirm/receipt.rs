//! # Preconfirmation Receipt
//!
//! The signed artifact handed to clients, and its JSON shape:
//!
//! ```json
//! {
//!   "status": "pending",
//!   "chainId": "ynx_devnet-1",
//!   "evmChainId": "0x2329",
//!   "txHash": "0xaaaa…",
//!   "targetBlock": "0x65",
//!   "issuedAt": "0x6553f100",
//!   "signer": "0x…",
//!   "digest": "0x…",
//!   "signature": "0x…",
//!   "signers": ["0x…", "0x…"],
//!   "signatures": ["0x…", "0x…"],
//!   "threshold": 2
//! }
//! ```
//!
//! `signer`/`signature` duplicate the first entry of the arrays so that
//! clients written for single-signer receipts keep working. Receipts from
//! those older producers carry no arrays at all; parsing treats the primary
//! pair as the only entry.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::crypto::Signature;
use crate::types::{quantity, Address, Digest, TxHash};

use super::digest::{AttestationPayload, AttestationStatus};

/// Structural problems in a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiptFormatError {
    #[error("receipt carries no signatures")]
    NoSignatures,

    #[error("signers/signatures length mismatch: {signers} signers, {signatures} signatures")]
    LengthMismatch { signers: usize, signatures: usize },

    #[error("primary signer/signature does not match the first entry")]
    PrimaryMismatch,
}

/// One signer's contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEntry {
    pub signer: Address,
    pub signature: Signature,
}

/// A signed attestation.
///
/// Always holds at least one entry; [`primary`](Self::primary) is entry 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireReceipt", into = "WireReceipt")]
pub struct Receipt {
    pub payload: AttestationPayload,
    pub digest: Digest,
    /// Required valid signatures. Zero means "not stated"; verifiers then
    /// demand every entry.
    pub threshold: u32,
    entries: Vec<SignatureEntry>,
}

impl Receipt {
    pub fn new(
        payload: AttestationPayload,
        digest: Digest,
        entries: Vec<SignatureEntry>,
        threshold: u32,
    ) -> Result<Self, ReceiptFormatError> {
        if entries.is_empty() {
            return Err(ReceiptFormatError::NoSignatures);
        }
        Ok(Self {
            payload,
            digest,
            threshold,
            entries,
        })
    }

    /// Entries in signer-set order.
    pub fn entries(&self) -> &[SignatureEntry] {
        &self.entries
    }

    /// The first entry.
    pub fn primary(&self) -> &SignatureEntry {
        &self.entries[0]
    }

    pub fn signers(&self) -> Vec<Address> {
        self.entries.iter().map(|e| e.signer).collect()
    }

    pub fn status(&self) -> AttestationStatus {
        self.payload.status
    }

    pub fn tx_hash(&self) -> TxHash {
        self.payload.tx_hash
    }

    pub fn target_block(&self) -> u64 {
        self.payload.target_block
    }
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// Other producers capitalize or pad the status; accept what `FromStr` does.
fn lenient_status<'de, D>(deserializer: D) -> Result<AttestationStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReceipt {
    #[serde(deserialize_with = "lenient_status")]
    status: AttestationStatus,
    chain_id: String,
    #[serde(with = "quantity")]
    evm_chain_id: u64,
    tx_hash: TxHash,
    #[serde(with = "quantity")]
    target_block: u64,
    #[serde(with = "quantity")]
    issued_at: u64,
    signer: Address,
    digest: Digest,
    signature: Signature,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    signers: Vec<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    signatures: Vec<Signature>,
    #[serde(default, skip_serializing_if = "is_zero")]
    threshold: u32,
}

impl From<Receipt> for WireReceipt {
    fn from(r: Receipt) -> Self {
        let primary = r.primary().clone();
        let (signers, signatures) = r
            .entries
            .into_iter()
            .map(|e| (e.signer, e.signature))
            .unzip();
        Self {
            status: r.payload.status,
            chain_id: r.payload.chain_id,
            evm_chain_id: r.payload.evm_chain_id,
            tx_hash: r.payload.tx_hash,
            target_block: r.payload.target_block,
            issued_at: r.payload.issued_at,
            signer: primary.signer,
            digest: r.digest,
            signature: primary.signature,
            signers,
            signatures,
            threshold: r.threshold,
        }
    }
}

impl TryFrom<WireReceipt> for Receipt {
    type Error = ReceiptFormatError;

    fn try_from(w: WireReceipt) -> Result<Self, Self::Error> {
        if w.signers.len() != w.signatures.len() {
            return Err(ReceiptFormatError::LengthMismatch {
                signers: w.signers.len(),
                signatures: w.signatures.len(),
            });
        }

        let entries: Vec<SignatureEntry> = if w.signers.is_empty() {
            vec![SignatureEntry {
                signer: w.signer,
                signature: w.signature,
            }]
        } else {
            let entries: Vec<SignatureEntry> = w
                .signers
                .into_iter()
                .zip(w.signatures)
                .map(|(signer, signature)| SignatureEntry { signer, signature })
                .collect();
            let first = &entries[0];
            if first.signer != w.signer || first.signature != w.signature {
                return Err(ReceiptFormatError::PrimaryMismatch);
            }
            entries
        };

        let payload = AttestationPayload {
            chain_id: w.chain_id,
            evm_chain_id: w.evm_chain_id,
            tx_hash: w.tx_hash,
            status: w.status,
            target_block: w.target_block,
            issued_at: w.issued_at,
        };
        Receipt::new(payload, w.digest, entries, w.threshold)
    }
}
