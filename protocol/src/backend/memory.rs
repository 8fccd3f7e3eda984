//! In-memory collaborators.
//!
//! Backing store for the dev node and the test suite. `DashMap` serves the
//! indexer's point lookups; the pending pool keeps arrival order behind a
//! `parking_lot::RwLock` because the resolver scans it front to back.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::{BackendError, HeadSource, IndexedTx, PendingPool, TxIndexer};
use crate::types::TxHash;

// ---------------------------------------------------------------------------
// Indexer
// ---------------------------------------------------------------------------

/// Hash → inclusion height.
#[derive(Debug, Default)]
pub struct MemoryIndexer {
    records: DashMap<TxHash, IndexedTx>,
}

impl MemoryIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `tx_hash` as included at `height`, replacing any earlier record.
    pub fn record(&self, tx_hash: TxHash, height: u64) {
        self.records.insert(tx_hash, IndexedTx { height });
    }

    pub fn remove(&self, tx_hash: &TxHash) -> Option<IndexedTx> {
        self.records.remove(tx_hash).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl TxIndexer for MemoryIndexer {
    async fn lookup(&self, tx_hash: &TxHash) -> Result<Option<IndexedTx>, BackendError> {
        Ok(self.records.get(tx_hash).map(|r| *r.value()))
    }
}

// ---------------------------------------------------------------------------
// Head
// ---------------------------------------------------------------------------

/// A chain head counter.
#[derive(Debug, Default)]
pub struct AtomicHead {
    height: AtomicU64,
}

impl AtomicHead {
    pub fn new(height: u64) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    pub fn get(&self) -> u64 {
        self.height.load(Ordering::Acquire)
    }

    pub fn set(&self, height: u64) {
        self.height.store(height, Ordering::Release);
    }

    /// Bumps the head by one and returns the new height.
    pub fn advance(&self) -> u64 {
        self.height.fetch_add(1, Ordering::AcqRel) + 1
    }
}

#[async_trait]
impl HeadSource for AtomicHead {
    async fn current_head(&self) -> Result<u64, BackendError> {
        Ok(self.get())
    }
}

// ---------------------------------------------------------------------------
// Pending pool
// ---------------------------------------------------------------------------

/// Unconfirmed raw transactions in arrival order.
#[derive(Debug, Default)]
pub struct MemoryPendingPool {
    txs: RwLock<Vec<Vec<u8>>>,
}

impl MemoryPendingPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, raw: Vec<u8>) {
        self.txs.write().push(raw);
    }

    /// Copies every pending entry, oldest first, leaving the pool intact.
    pub fn snapshot(&self) -> Vec<Vec<u8>> {
        self.txs.read().clone()
    }

    /// Drops the `n` oldest entries and returns how many were removed.
    ///
    /// Pushes only append, so after a [`snapshot`](Self::snapshot) of
    /// length `n` this removes exactly the snapshotted entries.
    pub fn remove_front(&self, n: usize) -> usize {
        let mut txs = self.txs.write();
        let n = n.min(txs.len());
        txs.drain(..n);
        n
    }

    pub fn len(&self) -> usize {
        self.txs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.read().is_empty()
    }
}

#[async_trait]
impl PendingPool for MemoryPendingPool {
    async fn list_unconfirmed(&self, limit: usize) -> Result<Vec<Vec<u8>>, BackendError> {
        Ok(self.txs.read().iter().take(limit).cloned().collect())
    }
}
