// Copyright (c) 2026 YNX Core Developers. MIT License.
// See LICENSE for details.

//! # YNX Preconfirm Node
//!
//! Entry point for the `ynx-node` binary. Parses CLI arguments, initializes
//! logging and metrics, starts the dev block loop, and serves the receipt API.
//!
//! The binary supports three subcommands:
//!
//! - `run`: start the node
//! - `keygen`: write a fresh signer key file
//! - `version`: print build version information
//!
//! On Unix a running node reloads its signer set on SIGHUP.

mod api;
mod chain;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;

use ynx_preconfirm::backend::ChainContext;
use ynx_preconfirm::config::{DEFAULT_KEY_FILE, PROTOCOL_VERSION};
use ynx_preconfirm::crypto::{write_key_file, PreconfirmKey};
use ynx_preconfirm::preconfirm::{CancelSignal, ConfigError, ReceiptIssuer, StatusResolver};
use ynx_preconfirm::Address;

use chain::DevChain;
use cli::{Commands, YnxNodeCli};
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = YnxNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Keygen(args) => {
            let (address, path) = keygen(&args)?;
            println!("Preconfirm key generated.");
            println!("  Address  : {}", address);
            println!("  Key file : {}", path.display());
            Ok(())
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the node: API server, metrics endpoint, and dev block loop.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(args.log_format)?;

    let chain_info = ChainContext {
        chain_id: args.chain_id.clone(),
        evm_chain_id: args.evm_chain_id,
    };
    tracing::info!(
        chain_id = %chain_info.chain_id,
        evm_chain_id = chain_info.evm_chain_id,
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        "starting ynx-node"
    );

    // --- Metrics ---
    let node_metrics =
        Arc::new(NodeMetrics::new().context("failed to register prometheus metrics")?);

    // --- Chain + issuer ---
    let dev_chain = DevChain::new();
    let resolver = StatusResolver::new(args.scan_limit());
    tracing::info!(scan_limit = resolver.scan_limit(), "status resolver configured");
    let issuer = Arc::new(
        ReceiptIssuer::new(Some(Arc::new(dev_chain.backend(chain_info.clone()))))
            .with_resolver(resolver),
    );

    match args.load_signers() {
        Ok(set) => issuer.install_signers(set),
        Err(ConfigError::MissingKeyMaterial) => {
            tracing::warn!("no preconfirm key material configured, receipts disabled");
        }
        Err(e) => return Err(e).context("invalid preconfirm signer configuration"),
    }
    node_metrics.record_signers(issuer.signers().as_deref());

    // --- Shutdown plumbing ---
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // --- Application state ---
    let app_state = api::AppState {
        version: format!("{} (protocol {})", env!("CARGO_PKG_VERSION"), PROTOCOL_VERSION),
        chain_info,
        issuer: Arc::clone(&issuer),
        chain: dev_chain.clone(),
        metrics: Arc::clone(&node_metrics),
        request_timeout: Duration::from_millis(args.request_timeout_ms),
        shutdown: CancelSignal::from_watch(shutdown_rx),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Background tasks ---
    let block_loop = tokio::spawn(chain::run_block_loop(
        dev_chain,
        Duration::from_millis(args.block_time_ms.max(1)),
        Arc::clone(&node_metrics),
    ));
    let reload_loop = tokio::spawn(reload_on_hangup(
        args.clone(),
        Arc::clone(&issuer),
        Arc::clone(&node_metrics),
    ));

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, cancelling in-flight requests");
        }
    }

    let _ = shutdown_tx.send(true);
    block_loop.abort();
    reload_loop.abort();
    tracing::info!("ynx-node stopped");
    Ok(())
}

/// Re-reads signer configuration on every SIGHUP.
///
/// A failed reload leaves the current set in place.
#[cfg(unix)]
async fn reload_on_hangup(
    args: cli::RunArgs,
    issuer: Arc<ReceiptIssuer>,
    metrics: metrics::SharedMetrics,
) {
    let mut hangup = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("failed to install SIGHUP handler: {}", e);
            return;
        }
    };

    while hangup.recv().await.is_some() {
        match args.load_signers() {
            Ok(set) => {
                issuer.install_signers(set);
                metrics.record_signers(issuer.signers().as_deref());
            }
            Err(e) => {
                tracing::error!(error = %e, "signer reload failed, keeping current set");
            }
        }
    }
}

#[cfg(not(unix))]
async fn reload_on_hangup(
    _args: cli::RunArgs,
    _issuer: Arc<ReceiptIssuer>,
    _metrics: metrics::SharedMetrics,
) {
    std::future::pending::<()>().await
}

/// Generates a signer key and writes it to disk with owner-only permissions.
///
/// Only the address is returned for display; the secret stays in the file.
fn keygen(args: &cli::KeygenArgs) -> Result<(Address, PathBuf)> {
    let path = args
        .out
        .clone()
        .unwrap_or_else(|| args.home.join(DEFAULT_KEY_FILE));

    let key = PreconfirmKey::generate();
    write_key_file(&path, &key.secret_hex(), args.force)
        .with_context(|| format!("failed to write key file {}", path.display()))?;
    Ok((key.address(), path))
}

/// Prints version information to stdout.
fn print_version() {
    println!("ynx-node  {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  {}", PROTOCOL_VERSION);
    println!("rustc     {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed the error is logged and that branch never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
