//! Error types for receipt issuance.
//!
//! Every failure path of the preconfirmation pipeline maps to exactly one
//! variant of [`PreconfirmError`], so callers can tell "misconfigured node"
//! from "backend down" from "we simply haven't seen that transaction".

use thiserror::Error;

use crate::backend::BackendError;
use crate::crypto::KeyError;
use crate::types::{Address, TxHash};

/// Problems with signer key material or the threshold policy.
///
/// Raised at setup time (or during an explicit signer reload). Never
/// downgraded to a warning.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("signer key #{index}: {source}")]
    Key {
        /// Zero-based position of the offending entry in its list.
        index: usize,
        #[source]
        source: KeyError,
    },

    #[error("missing preconfirm key material: set exactly one of the inline-secret or key-path sources")]
    MissingKeyMaterial,

    #[error("conflicting preconfirm key sources: inline secrets and key paths are mutually exclusive")]
    ConflictingKeySources,

    #[error("no preconfirm signers configured")]
    EmptySignerSet,

    #[error("duplicate preconfirm signer {0}")]
    DuplicateSigner(Address),

    #[error("invalid preconfirm threshold: {0:?}")]
    InvalidThreshold(String),

    #[error("preconfirm threshold={threshold} exceeds signer count={signers}")]
    ThresholdExceedsSigners { threshold: u32, signers: usize },
}

/// A signer could not produce a signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("signer {address} failed: {reason}")]
    Failed { address: Address, reason: String },
}

/// Everything that can go wrong while issuing a receipt.
#[derive(Debug, Error)]
pub enum PreconfirmError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No signer set is installed.
    #[error("preconfirm is disabled")]
    Disabled,

    /// The issuer was built without a backend handle.
    #[error("backend is not available")]
    BackendMissing,

    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[from] BackendError),

    /// Neither indexed nor found within the bounded pending scan.
    #[error("tx not found (not pending, not included): {0}")]
    TxNotFound(TxHash),

    #[error("signing failed: {0}")]
    Signing(#[from] SignerError),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

impl PreconfirmError {
    /// Short stable label, handy for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Disabled => "disabled",
            Self::BackendMissing => "backend_missing",
            Self::BackendUnavailable(_) => "backend_unavailable",
            Self::TxNotFound(_) => "tx_not_found",
            Self::Signing(_) => "signing",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}
