//! # Prometheus Metrics
//!
//! Exposes operational metrics for the preconfirm node. Scraped by
//! Prometheus at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] with
//! the `ynx` prefix so they do not collide with any default global registry
//! consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use ynx_preconfirm::preconfirm::SignerSet;

/// Holds all Prometheus metric handles for the node.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Receipts successfully issued.
    pub receipts_issued_total: IntCounter,
    /// Failed issuance attempts, labelled by error kind.
    pub receipts_failed_total: IntCounterVec,
    /// Requests for hashes that were neither indexed nor pending.
    pub tx_not_found_total: IntCounter,
    /// Wall time from request to signed receipt.
    pub issuance_latency_seconds: Histogram,
    /// Signers in the active set (0 when disabled).
    pub signer_count: IntGauge,
    /// Threshold of the active set (0 when disabled).
    pub signer_threshold: IntGauge,
    /// Latest dev-chain height.
    pub chain_head: IntGauge,
    /// Transactions waiting in the pending pool.
    pub pending_pool_size: IntGauge,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("ynx".into()), None)?;

        let receipts_issued_total = IntCounter::new(
            "receipts_issued_total",
            "Total number of preconfirmation receipts issued",
        )?;
        registry.register(Box::new(receipts_issued_total.clone()))?;

        let receipts_failed_total = IntCounterVec::new(
            Opts::new(
                "receipts_failed_total",
                "Total number of failed receipt requests by error kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(receipts_failed_total.clone()))?;

        let tx_not_found_total = IntCounter::new(
            "tx_not_found_total",
            "Receipt requests for transactions that were neither indexed nor pending",
        )?;
        registry.register(Box::new(tx_not_found_total.clone()))?;

        let issuance_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "issuance_latency_seconds",
                "Receipt issuance latency in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0,
            ]),
        )?;
        registry.register(Box::new(issuance_latency_seconds.clone()))?;

        let signer_count = IntGauge::new("signer_count", "Signers in the active preconfirm set")?;
        registry.register(Box::new(signer_count.clone()))?;

        let signer_threshold =
            IntGauge::new("signer_threshold", "Threshold of the active preconfirm set")?;
        registry.register(Box::new(signer_threshold.clone()))?;

        let chain_head = IntGauge::new("chain_head", "Height of the latest block")?;
        registry.register(Box::new(chain_head.clone()))?;

        let pending_pool_size =
            IntGauge::new("pending_pool_size", "Transactions waiting in the pending pool")?;
        registry.register(Box::new(pending_pool_size.clone()))?;

        Ok(Self {
            registry,
            receipts_issued_total,
            receipts_failed_total,
            tx_not_found_total,
            issuance_latency_seconds,
            signer_count,
            signer_threshold,
            chain_head,
            pending_pool_size,
        })
    }

    /// Mirrors the active signer set into the gauges.
    pub fn record_signers(&self, set: Option<&SignerSet>) {
        let (count, threshold) = set
            .map(|s| (s.len() as i64, i64::from(s.threshold())))
            .unwrap_or((0, 0));
        self.signer_count.set(count);
        self.signer_threshold.set(threshold);
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
