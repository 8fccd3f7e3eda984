//! # Signer Registry
//!
//! A [`SignerSet`] is an ordered list of distinct signers plus the number
//! of valid signatures a relying party should demand. Sets are immutable
//! once built; changing signers means building a new set and swapping it in
//! (see [`ReceiptIssuer::install_signers`](super::ReceiptIssuer::install_signers)).

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::crypto::{sign_digest, PreconfirmKey, Signature};
use crate::types::{Address, Digest};

use super::error::{ConfigError, SignerError};

/// Anything that can sign a preconfirmation digest.
///
/// The in-process [`PreconfirmKey`] is the default implementation. Remote
/// signers (KMS, HSM) implement this trait and must return the same
/// 65-byte `r ‖ s ‖ v` layout.
pub trait DigestSigner: Send + Sync {
    /// The address recovered from this signer's signatures.
    fn address(&self) -> Address;

    /// Signs the raw 32-byte digest.
    fn sign_digest(&self, digest: &Digest) -> Result<Signature, SignerError>;
}

impl DigestSigner for PreconfirmKey {
    fn address(&self) -> Address {
        PreconfirmKey::address(self)
    }

    fn sign_digest(&self, digest: &Digest) -> Result<Signature, SignerError> {
        Ok(sign_digest(self, digest))
    }
}

/// Ordered, duplicate-free signers with a threshold in `1..=len`.
#[derive(Clone)]
pub struct SignerSet {
    signers: Vec<Arc<dyn DigestSigner>>,
    threshold: u32,
}

impl SignerSet {
    /// Validates and builds a set.
    ///
    /// `threshold = None` means every signer is required.
    pub fn new(
        signers: Vec<Arc<dyn DigestSigner>>,
        threshold: Option<u32>,
    ) -> Result<Self, ConfigError> {
        if signers.is_empty() {
            return Err(ConfigError::EmptySignerSet);
        }

        let mut seen = HashSet::with_capacity(signers.len());
        for signer in &signers {
            let address = signer.address();
            if !seen.insert(address) {
                return Err(ConfigError::DuplicateSigner(address));
            }
        }

        let threshold = match threshold {
            None => u32::try_from(signers.len()).map_err(|_| {
                ConfigError::InvalidThreshold(format!("{} signers", signers.len()))
            })?,
            Some(0) => return Err(ConfigError::InvalidThreshold("0".into())),
            Some(t) if t as usize > signers.len() => {
                return Err(ConfigError::ThresholdExceedsSigners {
                    threshold: t,
                    signers: signers.len(),
                })
            }
            Some(t) => t,
        };

        Ok(Self { signers, threshold })
    }

    /// Convenience constructor for in-process keys.
    pub fn from_keys(keys: Vec<PreconfirmKey>, threshold: Option<u32>) -> Result<Self, ConfigError> {
        let signers = keys
            .into_iter()
            .map(|k| Arc::new(k) as Arc<dyn DigestSigner>)
            .collect();
        Self::new(signers, threshold)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    /// Always false for a constructed set; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Signers in configuration order.
    pub fn signers(&self) -> &[Arc<dyn DigestSigner>] {
        &self.signers
    }

    /// Signer addresses in configuration order.
    pub fn addresses(&self) -> Vec<Address> {
        self.signers.iter().map(|s| s.address()).collect()
    }

    /// The first signer's address. Legacy single-signer consumers use it.
    pub fn primary(&self) -> Address {
        self.signers[0].address()
    }
}

impl fmt::Debug for SignerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerSet")
            .field("signers", &self.addresses())
            .field("threshold", &self.threshold)
            .finish()
    }
}
