//! # CLI Interface
//!
//! Defines the command-line argument structure for `ynx-node` using
//! `clap` derive. Three subcommands: `run`, `keygen`, and `version`.
//!
//! Signer settings are plain strings on purpose: they go through the same
//! parsing path ([`KeySource::resolve_with_legacy`], [`parse_threshold`])
//! whether they arrive as flags or environment variables, and a SIGHUP
//! reload re-runs that path with the values captured at startup.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;
use ynx_preconfirm::config::{
    scan_limit_from_str, DEFAULT_CHAIN_ID, DEFAULT_EVM_CHAIN_ID, DEFAULT_METRICS_PORT,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_RPC_PORT, ENV_KEY_PATH, ENV_KEY_PATHS, ENV_MEMPOOL_SCAN_LIMIT,
    ENV_PRIVKEY_HEX, ENV_PRIVKEY_HEXES, ENV_THRESHOLD,
};
use ynx_preconfirm::preconfirm::{
    load_signer_set, parse_threshold, ConfigError, KeySource, SignerSet,
};

/// YNX preconfirmation node.
///
/// Accepts transactions into a pending pool, produces dev blocks, and hands
/// out threshold-signed soft-confirmation receipts over JSON-RPC.
#[derive(Parser, Debug)]
#[command(
    name = "ynx-node",
    about = "YNX preconfirmation node",
    version,
    propagate_version = true
)]
pub struct YnxNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the YNX node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node.
    Run(RunArgs),
    /// Generate a preconfirm signer key file.
    Keygen(KeygenArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Cosmos-style chain identifier committed to by every receipt.
    #[arg(long, env = "YNX_CHAIN_ID", default_value = DEFAULT_CHAIN_ID)]
    pub chain_id: String,

    /// EVM chain id committed to by every receipt.
    #[arg(long, env = "YNX_EVM_CHAIN_ID", default_value_t = DEFAULT_EVM_CHAIN_ID)]
    pub evm_chain_id: u64,

    /// Port for the JSON-RPC and REST API.
    #[arg(long, env = "YNX_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "YNX_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format.
    #[arg(long, env = "YNX_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Comma-separated hex secrets, one per signer.
    ///
    /// **Never pass this flag in production.** Use key files instead.
    #[arg(long, env = ENV_PRIVKEY_HEXES, hide_env_values = true)]
    pub privkey_hexes: Option<String>,

    /// Comma-separated key file paths, one per signer.
    #[arg(long, env = ENV_KEY_PATHS)]
    pub key_paths: Option<String>,

    /// Single hex secret (older deployments).
    #[arg(long, env = ENV_PRIVKEY_HEX, hide_env_values = true)]
    pub privkey_hex: Option<String>,

    /// Single key file path (older deployments).
    #[arg(long, env = ENV_KEY_PATH)]
    pub key_path: Option<String>,

    /// Signatures a client should require. Defaults to the signer count.
    #[arg(long, env = ENV_THRESHOLD)]
    pub threshold: Option<String>,

    /// Max pending transactions inspected per receipt request.
    #[arg(long, env = ENV_MEMPOOL_SCAN_LIMIT)]
    pub mempool_scan_limit: Option<String>,

    /// Dev block interval in milliseconds.
    #[arg(long, env = "YNX_BLOCK_TIME_MS", default_value_t = 1_000)]
    pub block_time_ms: u64,

    /// Per-request deadline for receipt issuance in milliseconds.
    #[arg(
        long,
        env = "YNX_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT.as_millis() as u64
    )]
    pub request_timeout_ms: u64,
}

impl RunArgs {
    /// Which key material the operator configured.
    pub fn key_source(&self) -> Result<KeySource, ConfigError> {
        KeySource::resolve_with_legacy(
            self.privkey_hexes.as_deref(),
            self.key_paths.as_deref(),
            self.privkey_hex.as_deref(),
            self.key_path.as_deref(),
        )
    }

    /// Loads and validates the full signer set.
    pub fn load_signers(&self) -> Result<SignerSet, ConfigError> {
        let source = self.key_source()?;
        let threshold = parse_threshold(self.threshold.as_deref())?;
        load_signer_set(&source, threshold)
    }

    pub fn scan_limit(&self) -> usize {
        scan_limit_from_str(self.mempool_scan_limit.as_deref())
    }
}

/// Arguments for the `keygen` subcommand.
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Node home directory. The key lands in `<home>/config/ynx_preconfirm.key`.
    #[arg(long, env = "YNX_HOME", default_value = ".")]
    pub home: PathBuf,

    /// Explicit output path, overriding the home-relative default.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Overwrite an existing key file.
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        YnxNodeCli::command().debug_assert();
    }

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["ynx-node", "run"];
        argv.extend_from_slice(extra);
        match YnxNodeCli::try_parse_from(argv).unwrap().command {
            Commands::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn run_defaults() {
        let args = run_args(&[]);
        assert_eq!(args.rpc_port, DEFAULT_RPC_PORT);
        assert_eq!(args.evm_chain_id, DEFAULT_EVM_CHAIN_ID);
        assert_eq!(args.block_time_ms, 1_000);
        assert_eq!(args.log_format, LogFormat::Pretty);
    }

    #[test]
    fn log_format_is_validated() {
        assert_eq!(run_args(&["--log-format", "json"]).log_format, LogFormat::Json);
        assert!(YnxNodeCli::try_parse_from(["ynx-node", "run", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn signer_flags_reach_the_loader() {
        let a = ynx_preconfirm::crypto::PreconfirmKey::generate().secret_hex();
        let b = ynx_preconfirm::crypto::PreconfirmKey::generate().secret_hex();
        let joined = format!("{a},{b}");
        let args = run_args(&["--privkey-hexes", &joined, "--threshold", "1"]);

        let set = args.load_signers().unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.threshold(), 1);
    }

    #[test]
    fn conflicting_sources_are_rejected() {
        let args = run_args(&["--privkey-hexes", "aa", "--key-paths", "/k"]);
        assert!(matches!(
            args.load_signers(),
            Err(ConfigError::ConflictingKeySources)
        ));
    }

    #[test]
    fn bad_scan_limit_falls_back() {
        let args = run_args(&["--mempool-scan-limit", "lots"]);
        assert_eq!(
            args.scan_limit(),
            ynx_preconfirm::config::DEFAULT_MEMPOOL_SCAN_LIMIT
        );
    }
}
