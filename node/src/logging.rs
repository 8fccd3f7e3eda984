//! # Structured Logging
//!
//! One subscriber per process, writing to stderr so `keygen` and `version`
//! keep stdout to themselves.
//!
//! Every receipt request runs inside a `preconfirm` span carrying the tx
//! hash, so library events (`ynx_preconfirm::preconfirm::resolver` and
//! friends) show up attributed to the request that caused them. The default
//! directives keep those at `info`; `RUST_LOG` replaces the whole set, e.g.
//! `RUST_LOG=ynx_node=info,ynx_preconfirm::preconfirm=debug`.

use anyhow::Context;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives applied when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVES: &[&str] = &[
    "warn",
    "ynx_node=info",
    "ynx_preconfirm=info",
    "tower_http=info",
];

/// Output format, selected with `--log-format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines with span context.
    #[default]
    Pretty,
    /// One JSON object per event, current span flattened in.
    Json,
}

/// Builds the filter from `RUST_LOG`, or from `defaults` when it is unset.
pub fn build_filter(rust_log: Option<&str>, defaults: &[&str]) -> Result<EnvFilter, ParseError> {
    match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        Some(spec) => EnvFilter::try_new(spec),
        None => EnvFilter::try_new(defaults.join(",")),
    }
}

/// Installs the global subscriber.
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(rust_log.as_deref(), DEFAULT_DIRECTIVES)
        .with_context(|| format!("invalid {}", EnvFilter::DEFAULT_ENV))?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    installed.context("a global tracing subscriber is already installed")?;

    tracing::debug!(?format, "logging initialized");
    Ok(())
}
