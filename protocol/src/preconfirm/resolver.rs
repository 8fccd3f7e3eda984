//! # Status Resolver
//!
//! Decides what a receipt may claim about a transaction hash.
//!
//! 1. **Indexer first.** A finalized record means `Included` at the indexed
//!    height, no matter what the pending pool says. Pool snapshots lag and
//!    may still list a transaction that has since been included.
//! 2. **Bounded pending scan.** Otherwise read at most `scan_limit`
//!    unconfirmed transactions, decode each, and compare canonical hashes.
//!    A match means `Pending`, targeting `head + 1`.
//! 3. **Index re-check.** A pool miss asks the indexer once more before
//!    giving up. Backends index a transaction before pruning it from the
//!    pool, so one that moved between steps 1 and 2 is caught here.
//! 4. Neither: [`PreconfirmError::TxNotFound`].
//!
//! The scan answers "does it exist?", never "where in the queue is it?". A
//! transaction sitting beyond the cap resolves to not-found; that is the
//! price of bounded work per request.

use tracing::{debug, trace};

use crate::backend::Backend;
use crate::config::DEFAULT_MEMPOOL_SCAN_LIMIT;
use crate::types::TxHash;

use super::cancel::CancelSignal;
use super::digest::AttestationStatus;
use super::error::PreconfirmError;

/// Outcome of a successful resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub status: AttestationStatus,
    pub target_block: u64,
}

/// Classifies transaction hashes against a [`Backend`].
#[derive(Debug, Clone, Copy)]
pub struct StatusResolver {
    scan_limit: usize,
}

impl Default for StatusResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MEMPOOL_SCAN_LIMIT)
    }
}

impl StatusResolver {
    /// `scan_limit` of zero is bumped to one; a resolver that may not look
    /// at the pool at all is not useful.
    pub fn new(scan_limit: usize) -> Self {
        Self {
            scan_limit: scan_limit.max(1),
        }
    }

    pub fn scan_limit(&self) -> usize {
        self.scan_limit
    }

    pub async fn resolve(
        &self,
        backend: &Backend,
        tx_hash: &TxHash,
        cancel: &CancelSignal,
    ) -> Result<Resolution, PreconfirmError> {
        if let Some(included) = self.lookup_included(backend, tx_hash, cancel).await? {
            return Ok(included);
        }

        let raw_txs = cancel
            .guard(backend.pool.list_unconfirmed(self.scan_limit))
            .await??;

        let mut undecodable = 0usize;
        let mut found = false;
        // The pool is asked for `scan_limit` entries, but never trusted to obey.
        for raw in raw_txs.iter().take(self.scan_limit) {
            match backend.decoder.decode(raw) {
                Ok(decoded) if decoded.hash == *tx_hash => {
                    found = true;
                    break;
                }
                Ok(_) => {}
                Err(err) => {
                    undecodable += 1;
                    trace!(error = %err, "skipping undecodable pending tx");
                }
            }
        }

        if !found {
            if let Some(included) = self.lookup_included(backend, tx_hash, cancel).await? {
                return Ok(included);
            }
            debug!(
                tx = %tx_hash,
                scanned = raw_txs.len().min(self.scan_limit),
                undecodable,
                "tx not found in index or pending scan"
            );
            return Err(PreconfirmError::TxNotFound(*tx_hash));
        }

        let head = cancel.guard(backend.head.current_head()).await??;
        let target_block = head.saturating_add(1);
        debug!(tx = %tx_hash, head, target_block, "tx resolved as pending");
        Ok(Resolution {
            status: AttestationStatus::Pending,
            target_block,
        })
    }

    async fn lookup_included(
        &self,
        backend: &Backend,
        tx_hash: &TxHash,
        cancel: &CancelSignal,
    ) -> Result<Option<Resolution>, PreconfirmError> {
        let record = cancel.guard(backend.indexer.lookup(tx_hash)).await??;
        Ok(record.map(|record| {
            debug!(tx = %tx_hash, height = record.height, "tx resolved as included");
            Resolution {
                status: AttestationStatus::Included,
                target_block: record.height,
            }
        }))
    }
}
