//! # Dev Chain
//!
//! A stand-in for the consensus engine so the node can serve receipts on its
//! own. Each tick:
//!
//! ```text
//! 1. SNAPSHOT copy the pending pool, oldest first
//! 2. ADVANCE  bump the head by one
//! 3. INDEX    record each decodable transaction at the new height
//! 4. PRUNE    remove exactly the snapshotted entries from the pool
//! ```
//!
//! A transaction is indexed before it leaves the pool, so a concurrent
//! lookup always finds it in one place or the other. Undecodable entries are
//! pruned along with the rest. They could never be indexed, and they were
//! already invisible to receipt lookups.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use ynx_preconfirm::backend::{
    AtomicHead, Backend, ChainContext, KeccakTxDecoder, MemoryIndexer, MemoryPendingPool,
    TxDecoder,
};
use ynx_preconfirm::TxHash;

use crate::metrics::SharedMetrics;

/// In-memory chain state shared by the block loop and the API.
#[derive(Clone)]
pub struct DevChain {
    pub indexer: Arc<MemoryIndexer>,
    pub head: Arc<AtomicHead>,
    pub pool: Arc<MemoryPendingPool>,
    pub decoder: Arc<dyn TxDecoder>,
}

/// What one tick produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSummary {
    pub height: u64,
    pub included: Vec<TxHash>,
    pub dropped: usize,
}

impl Default for DevChain {
    fn default() -> Self {
        Self::new()
    }
}

impl DevChain {
    /// Empty chain at height 0 with keccak hashing.
    pub fn new() -> Self {
        Self {
            indexer: Arc::new(MemoryIndexer::new()),
            head: Arc::new(AtomicHead::new(0)),
            pool: Arc::new(MemoryPendingPool::new()),
            decoder: Arc::new(KeccakTxDecoder),
        }
    }

    /// Bundles the collaborators for the issuer.
    pub fn backend(&self, chain: ChainContext) -> Backend {
        Backend::new(
            chain,
            self.indexer.clone(),
            self.head.clone(),
            self.pool.clone(),
            self.decoder.clone(),
        )
    }

    /// Runs one block.
    pub fn produce_block(&self) -> BlockSummary {
        let txs = self.pool.snapshot();
        let height = self.head.advance();

        let mut included = Vec::with_capacity(txs.len());
        let mut dropped = 0;
        for raw in &txs {
            match self.decoder.decode(raw) {
                Ok(tx) => {
                    self.indexer.record(tx.hash, height);
                    included.push(tx.hash);
                }
                Err(err) => {
                    dropped += 1;
                    warn!(height, error = %err, "dropping undecodable pending tx");
                }
            }
        }

        self.pool.remove_front(txs.len());

        BlockSummary {
            height,
            included,
            dropped,
        }
    }
}

/// Produces a block every `block_time` until the task is aborted.
pub async fn run_block_loop(chain: DevChain, block_time: Duration, metrics: SharedMetrics) {
    let mut interval = tokio::time::interval(block_time);
    // The first tick fires immediately; skip it so height 1 lands one
    // interval after startup.
    interval.tick().await;
    loop {
        interval.tick().await;
        let block = chain.produce_block();
        metrics.chain_head.set(block.height as i64);
        metrics.pending_pool_size.set(chain.pool.len() as i64);
        debug!(
            height = block.height,
            txs = block.included.len(),
            dropped = block.dropped,
            "block produced"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ynx_preconfirm::crypto::keccak256;

    #[test]
    fn block_indexes_pool_at_new_height() {
        let chain = DevChain::new();
        chain.pool.push(b"tx-a".to_vec());
        chain.pool.push(b"tx-b".to_vec());
        chain.pool.push(Vec::new());

        let block = chain.produce_block();
        assert_eq!(block.height, 1);
        assert_eq!(block.included.len(), 2);
        assert_eq!(block.dropped, 1);
        assert!(chain.pool.is_empty());
        assert_eq!(chain.indexer.len(), 2);

        let empty = chain.produce_block();
        assert_eq!(empty.height, 2);
        assert!(empty.included.is_empty());
    }

    #[tokio::test]
    async fn produced_tx_resolves_as_included() {
        use ynx_preconfirm::backend::TxIndexer;

        let chain = DevChain::new();
        chain.pool.push(b"tx-a".to_vec());
        chain.produce_block();

        let hash = TxHash::new(keccak256(b"tx-a"));
        let record = chain.indexer.lookup(&hash).await.unwrap().unwrap();
        assert_eq!(record.height, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tx_stays_visible_while_block_is_produced() {
        use ynx_preconfirm::backend::ChainContext;
        use ynx_preconfirm::preconfirm::{AttestationStatus, CancelSignal, StatusResolver};

        let chain = DevChain::new();
        let n = 20_000;
        for i in 0..n {
            chain.pool.push(format!("tx-{i}").into_bytes());
        }
        let last = TxHash::new(keccak256(format!("tx-{}", n - 1).as_bytes()));
        let backend = chain.backend(ChainContext {
            chain_id: "ynx_test-1".into(),
            evm_chain_id: 9001,
        });
        let resolver = StatusResolver::new(n + 10);

        let producer = {
            let chain = chain.clone();
            tokio::task::spawn_blocking(move || chain.produce_block())
        };
        while !producer.is_finished() {
            let res = resolver
                .resolve(&backend, &last, &CancelSignal::never())
                .await;
            assert!(res.is_ok(), "accepted tx vanished mid-block: {res:?}");
        }

        let block = producer.await.unwrap();
        assert_eq!(block.included.len(), n);
        assert!(chain.pool.is_empty());
        let res = resolver
            .resolve(&backend, &last, &CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(res.status, AttestationStatus::Included);
        assert_eq!(res.target_block, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn block_loop_advances_head() {
        let chain = DevChain::new();
        let metrics = Arc::new(crate::metrics::NodeMetrics::new().unwrap());
        let task = tokio::spawn(run_block_loop(
            chain.clone(),
            Duration::from_millis(100),
            metrics.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(350)).await;
        task.abort();
        assert_eq!(chain.head.get(), 3);
        assert_eq!(metrics.chain_head.get(), 3);
    }
}
