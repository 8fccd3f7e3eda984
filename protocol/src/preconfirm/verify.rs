//! Client-side receipt verification.
//!
//! Rebuilds the digest from the receipt's own fields, then counts distinct
//! signers whose signatures recover correctly. A receipt whose `digest`
//! field disagrees with its fields is rejected outright, before any
//! signature is looked at.

use std::collections::HashSet;

use thiserror::Error;
use tracing::trace;

use crate::crypto::recover_signer;
use crate::types::{Address, Digest};

use super::receipt::Receipt;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("digest mismatch: receipt carries {claimed}, fields hash to {computed}")]
    DigestMismatch { claimed: Digest, computed: Digest },

    #[error("threshold {threshold} exceeds signer count {signers}")]
    ThresholdExceedsSigners { threshold: u32, signers: usize },

    #[error("insufficient valid signatures: {valid} < threshold {threshold}")]
    InsufficientSignatures { valid: usize, threshold: u32 },
}

/// Caller policy.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Only signatures from these addresses count. Empty = accept any signer.
    pub allowlist: Vec<Address>,
}

impl VerifyOptions {
    pub fn with_allowlist(allowlist: impl IntoIterator<Item = Address>) -> Self {
        Self {
            allowlist: allowlist.into_iter().collect(),
        }
    }
}

/// What a successful verification established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedReceipt {
    pub digest: Digest,
    pub threshold: u32,
    /// Distinct signers with a valid signature, in receipt order.
    pub valid_signers: Vec<Address>,
}

pub fn verify_receipt(
    receipt: &Receipt,
    opts: &VerifyOptions,
) -> Result<VerifiedReceipt, VerifyError> {
    let computed = receipt.payload.digest();
    if computed != receipt.digest {
        return Err(VerifyError::DigestMismatch {
            claimed: receipt.digest,
            computed,
        });
    }

    let entries = receipt.entries();
    let threshold = match receipt.threshold {
        0 => u32::try_from(entries.len()).unwrap_or(u32::MAX),
        t => t,
    };
    if threshold as usize > entries.len() {
        return Err(VerifyError::ThresholdExceedsSigners {
            threshold,
            signers: entries.len(),
        });
    }

    let allow: HashSet<Address> = opts.allowlist.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut valid_signers = Vec::new();

    for entry in entries {
        if !allow.is_empty() && !allow.contains(&entry.signer) {
            trace!(signer = %entry.signer, "signer not in allowlist");
            continue;
        }
        match recover_signer(&computed, &entry.signature) {
            Ok(addr) if addr == entry.signer => {
                if seen.insert(addr) {
                    valid_signers.push(addr);
                }
            }
            Ok(addr) => trace!(claimed = %entry.signer, recovered = %addr, "signer mismatch"),
            Err(err) => trace!(signer = %entry.signer, error = %err, "bad signature"),
        }
    }

    if valid_signers.len() < threshold as usize {
        return Err(VerifyError::InsufficientSignatures {
            valid: valid_signers.len(),
            threshold,
        });
    }

    Ok(VerifiedReceipt {
        digest: computed,
        threshold,
        valid_signers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{sign_digest, PreconfirmKey, Signature};
    use crate::preconfirm::digest::{AttestationPayload, AttestationStatus};
    use crate::preconfirm::receipt::SignatureEntry;
    use crate::types::TxHash;

    fn payload() -> AttestationPayload {
        AttestationPayload {
            chain_id: "ynx_test-1".into(),
            evm_chain_id: 9001,
            tx_hash: TxHash::new([0xaa; 32]),
            status: AttestationStatus::Included,
            target_block: 42,
            issued_at: 1_700_000_000,
        }
    }

    fn entries(keys: &[PreconfirmKey], digest: &Digest) -> Vec<SignatureEntry> {
        keys.iter()
            .map(|k| SignatureEntry {
                signer: k.address(),
                signature: sign_digest(k, digest),
            })
            .collect()
    }

    fn receipt(keys: &[PreconfirmKey], threshold: u32) -> Receipt {
        let p = payload();
        let d = p.digest();
        Receipt::new(p, d, entries(keys, &d), threshold).unwrap()
    }

    fn keys(n: usize) -> Vec<PreconfirmKey> {
        (0..n).map(|_| PreconfirmKey::generate()).collect()
    }

    #[test]
    fn valid_receipt_verifies() {
        let ks = keys(3);
        let v = verify_receipt(&receipt(&ks, 2), &VerifyOptions::default()).unwrap();
        assert_eq!(v.threshold, 2);
        assert_eq!(v.valid_signers.len(), 3);
    }

    #[test]
    fn unstated_threshold_means_all() {
        let ks = keys(2);
        let v = verify_receipt(&receipt(&ks, 0), &VerifyOptions::default()).unwrap();
        assert_eq!(v.threshold, 2);
    }

    #[test]
    fn tampered_field_is_a_digest_mismatch() {
        let mut r = receipt(&keys(1), 1);
        r.payload.target_block += 1;
        assert!(matches!(
            verify_receipt(&r, &VerifyOptions::default()),
            Err(VerifyError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn threshold_above_entries_is_rejected() {
        let r = receipt(&keys(2), 3);
        assert_eq!(
            verify_receipt(&r, &VerifyOptions::default()),
            Err(VerifyError::ThresholdExceedsSigners {
                threshold: 3,
                signers: 2
            })
        );
    }

    #[test]
    fn bad_signatures_do_not_count() {
        let ks = keys(3);
        let p = payload();
        let d = p.digest();
        let mut es = entries(&ks, &d);
        es[1].signature = Signature::from_bytes(vec![0u8; 10]);
        // Valid signature, wrong claimed signer.
        es[2].signer = PreconfirmKey::generate().address();

        let r = Receipt::new(p.clone(), d, es.clone(), 1).unwrap();
        let v = verify_receipt(&r, &VerifyOptions::default()).unwrap();
        assert_eq!(v.valid_signers, vec![ks[0].address()]);

        let r = Receipt::new(p, d, es, 2).unwrap();
        assert_eq!(
            verify_receipt(&r, &VerifyOptions::default()),
            Err(VerifyError::InsufficientSignatures {
                valid: 1,
                threshold: 2
            })
        );
    }

    #[test]
    fn duplicate_entries_count_once() {
        let k = PreconfirmKey::generate();
        let p = payload();
        let d = p.digest();
        let one = entries(std::slice::from_ref(&k), &d).remove(0);
        let r = Receipt::new(p, d, vec![one.clone(), one], 2).unwrap();
        assert_eq!(
            verify_receipt(&r, &VerifyOptions::default()),
            Err(VerifyError::InsufficientSignatures {
                valid: 1,
                threshold: 2
            })
        );
    }

    #[test]
    fn allowlist_filters_signers() {
        let ks = keys(3);
        let r = receipt(&ks, 2);

        let opts = VerifyOptions::with_allowlist([ks[0].address(), ks[2].address()]);
        let v = verify_receipt(&r, &opts).unwrap();
        assert_eq!(v.valid_signers, vec![ks[0].address(), ks[2].address()]);

        let opts = VerifyOptions::with_allowlist([ks[1].address()]);
        assert!(matches!(
            verify_receipt(&r, &opts),
            Err(VerifyError::InsufficientSignatures { valid: 1, .. })
        ));
    }

    #[test]
    fn legacy_v_is_accepted() {
        let ks = keys(1);
        let p = payload();
        let d = p.digest();
        let mut es = entries(&ks, &d);
        let mut bytes = es[0].signature.as_bytes().to_vec();
        bytes[64] += 27;
        es[0].signature = Signature::from_bytes(bytes);
        let r = Receipt::new(p, d, es, 1).unwrap();
        assert!(verify_receipt(&r, &VerifyOptions::default()).is_ok());
    }
}
