//! # Protocol Configuration & Constants
//!
//! Every constant that a third-party verifier has to agree with lives here.
//! The digest prefix in particular is part of the signed preimage: change it
//! and every receipt ever issued stops verifying.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Digest Domain
// ---------------------------------------------------------------------------

/// Domain-separation prefix for transaction-confirmation digests.
///
/// Prepended verbatim (ASCII) to every digest preimage so a signature over a
/// preconfirmation can never be replayed as a signature over some other
/// 32-byte message the same key might sign.
pub const TX_CONFIRM_DIGEST_PREFIX: &str = "YNX_TXCONFIRM_V0";

/// Substituted for an empty (or all-whitespace) chain identifier.
pub const UNKNOWN_CHAIN_ID: &str = "unknown";

/// Maximum number of chain-id bytes that fit behind the 2-byte length prefix.
/// Longer identifiers are truncated to this many bytes.
pub const MAX_CHAIN_ID_BYTES: usize = u16::MAX as usize;

/// Keccak-256 output length.
pub const HASH_LENGTH: usize = 32;

/// Ethereum-style address length.
pub const ADDRESS_LENGTH: usize = 20;

/// secp256k1 secret key length.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Recoverable signature length: `r (32) ‖ s (32) ‖ v (1)`.
pub const SIGNATURE_LENGTH: usize = 65;

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// How many unconfirmed transactions the resolver inspects before giving up.
pub const DEFAULT_MEMPOOL_SCAN_LIMIT: usize = 2000;

// ---------------------------------------------------------------------------
// Environment Variables
// ---------------------------------------------------------------------------

/// Comma-separated inline hex secrets, one per signer.
pub const ENV_PRIVKEY_HEXES: &str = "YNX_PRECONFIRM_PRIVKEY_HEXES";

/// Comma-separated key file paths, one per signer.
pub const ENV_KEY_PATHS: &str = "YNX_PRECONFIRM_KEY_PATHS";

/// Legacy single inline secret.
pub const ENV_PRIVKEY_HEX: &str = "YNX_PRECONFIRM_PRIVKEY_HEX";

/// Legacy single key file path.
pub const ENV_KEY_PATH: &str = "YNX_PRECONFIRM_KEY_PATH";

/// Optional threshold override.
pub const ENV_THRESHOLD: &str = "YNX_PRECONFIRM_THRESHOLD";

/// Optional pending-pool scan cap override.
pub const ENV_MEMPOOL_SCAN_LIMIT: &str = "YNX_PRECONFIRM_MEMPOOL_SCAN_LIMIT";

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default Cosmos-style chain identifier for a local devnet.
pub const DEFAULT_CHAIN_ID: &str = "ynx_devnet-1";

/// Default EVM chain id.
pub const DEFAULT_EVM_CHAIN_ID: u64 = 9001;

/// Default JSON-RPC / REST port.
pub const DEFAULT_RPC_PORT: u16 = 8545;

/// Default Prometheus port.
pub const DEFAULT_METRICS_PORT: u16 = 9464;

/// Default per-request deadline for receipt issuance.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default key file location relative to a node home directory.
pub const DEFAULT_KEY_FILE: &str = "config/ynx_preconfirm.key";

/// Protocol version string reported by the node.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Parses a scan-limit override the way operators expect: blank or invalid
/// values fall back to [`DEFAULT_MEMPOOL_SCAN_LIMIT`], positive integers win.
pub fn scan_limit_from_str(raw: Option<&str>) -> usize {
    match raw.map(str::trim) {
        Some(v) if !v.is_empty() => match v.parse::<usize>() {
            Ok(parsed) if parsed > 0 => parsed,
            _ => {
                tracing::warn!(value = %v, "ignoring invalid mempool scan limit override");
                DEFAULT_MEMPOOL_SCAN_LIMIT
            }
        },
        _ => DEFAULT_MEMPOOL_SCAN_LIMIT,
    }
}
