//! Soft-confirmation receipts.
//!
//! A receipt is a threshold multi-signature over a fixed-layout digest that
//! states "this transaction is pending and targets block N" or "this
//! transaction was included at height N". See [`ReceiptIssuer`] for the
//! server side and [`verify_receipt`] for clients.

pub mod cancel;
pub mod digest;
pub mod error;
pub mod issuer;
pub mod loader;
pub mod receipt;
pub mod resolver;
pub mod signer_set;
pub mod verify;

pub use cancel::CancelSignal;
pub use digest::{build_digest, encode_preimage, AttestationPayload, AttestationStatus};
pub use error::{ConfigError, PreconfirmError, SignerError};
pub use issuer::ReceiptIssuer;
pub use loader::{
    load_signer_set, load_signer_set_from_env, parse_threshold, split_comma_list, KeySource,
};
pub use receipt::{Receipt, ReceiptFormatError, SignatureEntry};
pub use resolver::{Resolution, StatusResolver};
pub use signer_set::{DigestSigner, SignerSet};
pub use verify::{verify_receipt, VerifiedReceipt, VerifyError, VerifyOptions};
