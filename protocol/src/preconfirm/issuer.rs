//! # Receipt Issuer
//!
//! Ties the pipeline together for a single request:
//!
//! ```text
//! Start ─► Resolve ─► BuildDigest ─► SignAll ─► Assemble ─► Done
//!   │         │                        │
//!   └─────────┴──── any failure ───────┴──► error, nothing returned
//! ```
//!
//! The signer set lives behind a `RwLock<Option<Arc<SignerSet>>>`. A request
//! clones the `Arc` once up front and signs with that snapshot, so a reload
//! mid-request can never produce a receipt that mixes two sets. The lock is
//! held only long enough to clone or replace the pointer.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::types::TxHash;

use super::cancel::CancelSignal;
use super::digest::AttestationPayload;
use super::error::{ConfigError, PreconfirmError};
use super::loader::{load_signer_set, KeySource};
use super::receipt::{Receipt, SignatureEntry};
use super::resolver::StatusResolver;
use super::signer_set::SignerSet;

pub struct ReceiptIssuer {
    signers: RwLock<Option<Arc<SignerSet>>>,
    backend: Option<Arc<Backend>>,
    resolver: StatusResolver,
}

impl ReceiptIssuer {
    /// Creates a disabled issuer. Install signers to enable it.
    pub fn new(backend: Option<Arc<Backend>>) -> Self {
        Self {
            signers: RwLock::new(None),
            backend,
            resolver: StatusResolver::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: StatusResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_signers(self, set: SignerSet) -> Self {
        self.install_signers(set);
        self
    }

    /// Atomically replaces the active signer set.
    pub fn install_signers(&self, set: SignerSet) {
        let signers = set.len();
        let threshold = set.threshold();
        let previous = self.signers.write().replace(Arc::new(set));
        info!(
            signers,
            threshold,
            replaced = previous.is_some(),
            "preconfirm signer set installed"
        );
    }

    /// Loads and validates `source`, then swaps it in. On error the current
    /// set stays active.
    pub fn install_from(
        &self,
        source: &KeySource,
        threshold: Option<u32>,
    ) -> Result<(), ConfigError> {
        let set = load_signer_set(source, threshold)?;
        self.install_signers(set);
        Ok(())
    }

    /// Drops the active set. Subsequent requests fail with `Disabled`.
    pub fn disable(&self) {
        if self.signers.write().take().is_some() {
            warn!("preconfirm signer set removed; issuance disabled");
        }
    }

    /// Snapshot of the active set.
    pub fn signers(&self) -> Option<Arc<SignerSet>> {
        self.signers.read().clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.signers.read().is_some()
    }

    pub fn backend(&self) -> Option<&Arc<Backend>> {
        self.backend.as_ref()
    }

    pub fn resolver(&self) -> &StatusResolver {
        &self.resolver
    }

    /// Issues a receipt stamped with the current wall-clock time.
    pub async fn issue(
        &self,
        tx_hash: TxHash,
        cancel: &CancelSignal,
    ) -> Result<Receipt, PreconfirmError> {
        let issued_at = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        self.issue_at(tx_hash, issued_at, cancel).await
    }

    /// Issues a receipt with an explicit `issued_at` (Unix seconds).
    pub async fn issue_at(
        &self,
        tx_hash: TxHash,
        issued_at: u64,
        cancel: &CancelSignal,
    ) -> Result<Receipt, PreconfirmError> {
        let set = self.signers().ok_or(PreconfirmError::Disabled)?;
        let backend = self
            .backend
            .as_ref()
            .ok_or(PreconfirmError::BackendMissing)?;

        let resolution = self.resolver.resolve(backend, &tx_hash, cancel).await?;
        cancel.check()?;

        let payload = AttestationPayload {
            chain_id: backend.chain.chain_id.clone(),
            evm_chain_id: backend.chain.evm_chain_id,
            tx_hash,
            status: resolution.status,
            target_block: resolution.target_block,
            issued_at,
        };
        let digest = payload.digest();

        let mut entries = Vec::with_capacity(set.len());
        for signer in set.signers() {
            cancel.check()?;
            let signature = signer.sign_digest(&digest)?;
            entries.push(SignatureEntry {
                signer: signer.address(),
                signature,
            });
        }
        cancel.check()?;

        debug!(
            tx = %tx_hash,
            status = %payload.status,
            target_block = payload.target_block,
            signers = entries.len(),
            %digest,
            "preconfirm receipt issued"
        );

        // SignerSet is never empty, so this only fails on a broken invariant.
        Receipt::new(payload, digest, entries, set.threshold())
            .map_err(|_| PreconfirmError::Config(ConfigError::EmptySignerSet))
    }
}

impl std::fmt::Debug for ReceiptIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiptIssuer")
            .field("signers", &self.signers())
            .field("backend", &self.backend.is_some())
            .field("resolver", &self.resolver)
            .finish()
    }
}
