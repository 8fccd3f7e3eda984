//! # Backend Collaborators
//!
//! The receipt issuer does not own a ledger. It asks three external services
//! what they know about a transaction and decodes raw pool entries with a
//! fourth:
//!
//! | Trait          | Question                                   |
//! |----------------|--------------------------------------------|
//! | [`TxIndexer`]  | Was this hash finalized? At what height?   |
//! | [`HeadSource`] | What is the current chain head?            |
//! | [`PendingPool`]| Which raw transactions are unconfirmed?    |
//! | [`TxDecoder`]  | What is the canonical hash of these bytes? |
//!
//! Production nodes plug in RPC clients; tests and the dev node use the
//! in-memory implementations from [`memory`] and [`decoder`].

pub mod decoder;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::TxHash;

pub use decoder::{DecodeError, DecodedTx, KeccakTxDecoder};
pub use memory::{AtomicHead, MemoryIndexer, MemoryPendingPool};

/// A collaborator could not answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("indexer unavailable: {0}")]
    Indexer(String),

    #[error("head source unavailable: {0}")]
    Head(String),

    #[error("pending pool unavailable: {0}")]
    PendingPool(String),
}

/// What the indexer knows about a finalized transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedTx {
    /// Block height the transaction was included at.
    pub height: u64,
}

/// Authoritative finalized-transaction index.
#[async_trait]
pub trait TxIndexer: Send + Sync {
    /// `Ok(None)` means "not indexed", which is not an error.
    async fn lookup(&self, tx_hash: &TxHash) -> Result<Option<IndexedTx>, BackendError>;
}

/// Source of the current chain head height.
#[async_trait]
pub trait HeadSource: Send + Sync {
    async fn current_head(&self) -> Result<u64, BackendError>;
}

/// The node's set of unconfirmed transactions.
#[async_trait]
pub trait PendingPool: Send + Sync {
    /// Returns at most `limit` raw transactions.
    async fn list_unconfirmed(&self, limit: usize) -> Result<Vec<Vec<u8>>, BackendError>;
}

/// Turns raw pool bytes into a transaction with a canonical hash.
pub trait TxDecoder: Send + Sync {
    fn decode(&self, raw: &[u8]) -> Result<DecodedTx, DecodeError>;
}

/// Chain identity stamped into every digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainContext {
    /// Cosmos-style chain id, e.g. `ynx_test-1`.
    pub chain_id: String,
    /// EVM chain id. Zero when the chain has none.
    pub evm_chain_id: u64,
}

/// Handle bundling every collaborator the issuer talks to.
///
/// Cheap to clone; everything is behind `Arc`.
#[derive(Clone)]
pub struct Backend {
    pub chain: ChainContext,
    pub indexer: Arc<dyn TxIndexer>,
    pub head: Arc<dyn HeadSource>,
    pub pool: Arc<dyn PendingPool>,
    pub decoder: Arc<dyn TxDecoder>,
}

impl Backend {
    pub fn new(
        chain: ChainContext,
        indexer: Arc<dyn TxIndexer>,
        head: Arc<dyn HeadSource>,
        pool: Arc<dyn PendingPool>,
        decoder: Arc<dyn TxDecoder>,
    ) -> Self {
        Self {
            chain,
            indexer,
            head,
            pool,
            decoder,
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}
