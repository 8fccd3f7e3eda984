//! # REST + JSON-RPC API
//!
//! Builds the axum router that exposes the node's HTTP interface. All
//! endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                  | Description                          |
//! |--------|-----------------------|--------------------------------------|
//! | GET    | `/health`             | Liveness probe                       |
//! | GET    | `/status`             | Node status summary                  |
//! | GET    | `/signers`            | Active preconfirm signer set         |
//! | GET    | `/preconfirm/:hash`   | Receipt for a transaction hash       |
//! | POST   | `/rpc`                | JSON-RPC 2.0 gateway                 |
//!
//! ## JSON-RPC methods
//!
//! | Method                   | Params       | Result                    |
//! |--------------------------|--------------|---------------------------|
//! | `ynx_preconfirmTx`       | `[txHash]`   | receipt object            |
//! | `ynx_sendRawTransaction` | `[rawTxHex]` | tx hash                   |
//! | `ynx_blockNumber`        | none         | head as hex quantity      |
//! | `ynx_signers`            | none         | `{enabled, threshold, signers}` |
//!
//! ## Error codes
//!
//! `-32600` invalid request, `-32601` unknown method, `-32602` bad params,
//! `-32001` tx not found, `-32002` preconfirm disabled, `-32003` backend
//! unavailable, `-32004` timeout or shutdown, `-32603` internal.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::instrument;

use ynx_preconfirm::backend::ChainContext;
use ynx_preconfirm::preconfirm::{CancelSignal, PreconfirmError, Receipt, ReceiptIssuer};
use ynx_preconfirm::types::quantity;
use ynx_preconfirm::{Address, TxHash};

use crate::chain::DevChain;
use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone; everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Chain identity stamped into receipts.
    pub chain_info: ChainContext,
    /// Receipt issuer holding the active signer set.
    pub issuer: Arc<ReceiptIssuer>,
    /// Dev chain: pending pool, head, and indexer.
    pub chain: DevChain,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
    /// Deadline applied to each receipt request.
    pub request_timeout: Duration,
    /// Fires on node shutdown; every request derives its signal from it.
    pub shutdown: CancelSignal,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/signers", get(signers_handler))
        .route("/preconfirm/:hash", get(preconfirm_handler))
        .route("/rpc", post(rpc_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// JSON-RPC Types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version. Must be "2.0".
    pub jsonrpc: String,
    /// The method to invoke.
    pub method: String,
    /// Positional method parameters.
    pub params: Option<serde_json::Value>,
    /// Request identifier. Echoed back in the response.
    pub id: serde_json::Value,
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version. Always "2.0".
    pub jsonrpc: String,
    /// The result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// The error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Request identifier, echoed from the request.
    pub id: serde_json::Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i32,
    /// Short human-readable error description.
    pub message: String,
    /// Optional structured error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(-32602, format!("Invalid params: {}", message.into()))
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(-32603, format!("Internal error: {}", message.into()))
    }
}

impl From<&PreconfirmError> for JsonRpcError {
    fn from(err: &PreconfirmError) -> Self {
        let code = match err {
            PreconfirmError::TxNotFound(_) => -32001,
            PreconfirmError::Disabled => -32002,
            PreconfirmError::BackendMissing | PreconfirmError::BackendUnavailable(_) => -32003,
            PreconfirmError::Cancelled | PreconfirmError::DeadlineExceeded => -32004,
            PreconfirmError::Config(_) | PreconfirmError::Signing(_) => -32603,
        };
        Self {
            code,
            message: err.to_string(),
            data: Some(serde_json::json!({ "kind": err.kind() })),
        }
    }
}

/// HTTP status for REST callers.
fn http_status(err: &PreconfirmError) -> StatusCode {
    match err {
        PreconfirmError::TxNotFound(_) => StatusCode::NOT_FOUND,
        PreconfirmError::Disabled
        | PreconfirmError::BackendMissing
        | PreconfirmError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PreconfirmError::Cancelled | PreconfirmError::DeadlineExceeded => {
            StatusCode::GATEWAY_TIMEOUT
        }
        PreconfirmError::Config(_) | PreconfirmError::Signing(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    pub chain_id: String,
    pub evm_chain_id: u64,
    /// Latest block height.
    pub head: u64,
    /// Transactions waiting in the pending pool.
    pub pending_txs: usize,
    /// Whether receipts can be issued right now.
    pub preconfirm_enabled: bool,
    pub signer_count: usize,
    pub threshold: u32,
    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /signers` and `ynx_signers`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignersResponse {
    pub enabled: bool,
    pub threshold: u32,
    pub signers: Vec<Address>,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn signers_snapshot(state: &AppState) -> SignersResponse {
    match state.issuer.signers() {
        Some(set) => SignersResponse {
            enabled: true,
            threshold: set.threshold(),
            signers: set.addresses(),
        },
        None => SignersResponse {
            enabled: false,
            threshold: 0,
            signers: Vec::new(),
        },
    }
}

// ---------------------------------------------------------------------------
// Issuance
// ---------------------------------------------------------------------------

/// Issues a receipt under the request deadline and records the outcome.
#[instrument(name = "preconfirm", skip(state, tx_hash), fields(tx = %tx_hash))]
async fn issue_receipt(state: &AppState, tx_hash: TxHash) -> Result<Receipt, PreconfirmError> {
    let cancel = state.shutdown.clone().with_timeout(state.request_timeout);
    let timer = state.metrics.issuance_latency_seconds.start_timer();
    let result = state.issuer.issue(tx_hash, &cancel).await;
    timer.observe_duration();

    match &result {
        Ok(receipt) => {
            state.metrics.receipts_issued_total.inc();
            tracing::info!(
                tx = %tx_hash,
                status = %receipt.status(),
                target_block = receipt.target_block(),
                signers = receipt.entries().len(),
                "preconfirm receipt served"
            );
        }
        Err(err) => {
            state
                .metrics
                .receipts_failed_total
                .with_label_values(&[err.kind()])
                .inc();
            if matches!(err, PreconfirmError::TxNotFound(_)) {
                state.metrics.tx_not_found_total.inc();
                tracing::debug!(tx = %tx_hash, "preconfirm requested for unknown tx");
            } else {
                tracing::warn!(tx = %tx_hash, error = %err, "preconfirm request failed");
            }
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` returns 200 if the node is alive.
///
/// This is the liveness probe for orchestrators. It does not check signer
/// or backend health; that belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` returns a node status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let signers = signers_snapshot(&state);
    Json(StatusResponse {
        version: state.version.clone(),
        chain_id: state.chain_info.chain_id.clone(),
        evm_chain_id: state.chain_info.evm_chain_id,
        head: state.chain.head.get(),
        pending_txs: state.chain.pool.len(),
        preconfirm_enabled: signers.enabled,
        signer_count: signers.signers.len(),
        threshold: signers.threshold,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /signers` returns the active signer set.
async fn signers_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(signers_snapshot(&state))
}

/// `GET /preconfirm/:hash` returns a signed receipt.
async fn preconfirm_handler(
    Path(hash): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let tx_hash = match TxHash::from_hex(&hash) {
        Ok(h) => h,
        Err(e) => {
            let err = ErrorResponse {
                error: format!("invalid tx hash: {}", e),
            };
            return (StatusCode::BAD_REQUEST, Json(err)).into_response();
        }
    };

    match issue_receipt(&state, tx_hash).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(e) => {
            let err = ErrorResponse {
                error: e.to_string(),
            };
            (http_status(&e), Json(err)).into_response()
        }
    }
}

/// `POST /rpc` is the JSON-RPC 2.0 gateway.
///
/// Routes method calls to internal handlers. Unknown methods return
/// error code -32601 (Method not found).
async fn rpc_handler(
    State(state): State<AppState>,
    Json(req): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    if req.jsonrpc != "2.0" {
        return Json(JsonRpcResponse {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(JsonRpcError::new(
                -32600,
                "Invalid Request: jsonrpc must be \"2.0\"",
            )),
            id: req.id,
        });
    }

    let outcome = match req.method.as_str() {
        "ynx_preconfirmTx" => rpc_preconfirm_tx(&state, req.params.as_ref()).await,
        "ynx_sendRawTransaction" => rpc_send_raw_transaction(&state, req.params.as_ref()),
        "ynx_blockNumber" => Ok(serde_json::json!(quantity::encode(state.chain.head.get()))),
        "ynx_signers" => serde_json::to_value(signers_snapshot(&state))
            .map_err(|e| JsonRpcError::internal(e.to_string())),
        _ => Err(JsonRpcError::new(
            -32601,
            format!("Method not found: {}", req.method),
        )),
    };

    let (result, error) = match outcome {
        Ok(v) => (Some(v), None),
        Err(e) => (None, Some(e)),
    };
    Json(JsonRpcResponse {
        jsonrpc: "2.0".into(),
        result,
        error,
        id: req.id,
    })
}

/// First positional parameter as a string.
fn first_str_param(params: Option<&serde_json::Value>) -> Option<&str> {
    params
        .and_then(|p| p.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.as_str())
}

async fn rpc_preconfirm_tx(
    state: &AppState,
    params: Option<&serde_json::Value>,
) -> Result<serde_json::Value, JsonRpcError> {
    let raw = first_str_param(params)
        .ok_or_else(|| JsonRpcError::invalid_params("expected [txHash]"))?;
    let tx_hash = TxHash::from_hex(raw)
        .map_err(|e| JsonRpcError::invalid_params(format!("txHash: {}", e)))?;

    let receipt = issue_receipt(state, tx_hash)
        .await
        .map_err(|e| JsonRpcError::from(&e))?;
    serde_json::to_value(&receipt).map_err(|e| JsonRpcError::internal(e.to_string()))
}

fn rpc_send_raw_transaction(
    state: &AppState,
    params: Option<&serde_json::Value>,
) -> Result<serde_json::Value, JsonRpcError> {
    let raw_hex = first_str_param(params)
        .ok_or_else(|| JsonRpcError::invalid_params("expected [rawTx]"))?;
    let raw = hex::decode(raw_hex.strip_prefix("0x").unwrap_or(raw_hex))
        .map_err(|e| JsonRpcError::invalid_params(format!("rawTx: {}", e)))?;
    let tx = state
        .chain
        .decoder
        .decode(&raw)
        .map_err(|e| JsonRpcError::invalid_params(format!("rawTx: {}", e)))?;

    state.chain.pool.push(raw);
    state
        .metrics
        .pending_pool_size
        .set(state.chain.pool.len() as i64);
    tracing::debug!(tx = %tx.hash, size = tx.size, "tx accepted into pending pool");
    Ok(serde_json::json!(tx.hash.to_hex()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
