// Copyright (c) 2026 YNX Core Developers. MIT License.
// See LICENSE for details.

//! # YNX Preconfirm: Core Library
//!
//! Signed soft-confirmation receipts for YNX transactions. A wallet submits
//! a transaction, asks for a receipt, and gets back a statement signed by
//! every key in the node's signer set: either "pending, targeting block
//! N + 1" or "included at height N". Anyone holding the receipt can check
//! it offline against the signer addresses they trust.
//!
//! ## Architecture
//!
//! - **config**: Digest prefix, byte lengths, env variable names, defaults.
//! - **types**: Fixed-size hashes/addresses and the hex quantity codec.
//! - **crypto**: Keccak-256 and recoverable secp256k1 signatures.
//! - **backend**: Traits for the chain collaborators (indexer, head, pending
//!   pool, decoder) plus in-memory versions for dev nodes and tests.
//! - **preconfirm**: Digest layout, signer set, key loading, status
//!   resolution, the issuer, the receipt wire format, and verification.
//!
//! ## Ground rules
//!
//! 1. The digest layout is frozen. Changing a byte breaks every verifier.
//! 2. A receipt is all-or-nothing: every signer signs or nothing is returned.
//! 3. Secret key bytes never reach a log line or a `Debug` impl.

pub mod backend;
pub mod config;
pub mod crypto;
pub mod preconfirm;
pub mod types;

pub use preconfirm::{
    verify_receipt, AttestationStatus, CancelSignal, PreconfirmError, Receipt, ReceiptIssuer,
    SignerSet,
};
pub use types::{Address, Digest, TxHash};
