//! HTTP API: trade ingestion, stats lookup, health check
//!
//! - `POST /trades` - 200 empty body, 400 on bad JSON / validation, 500 on storage
//! - `GET /stats/:account` - 200 `{account, trades, profit}`, zeros if unknown
//! - `GET /healthz` - 200 when SQLite answers, 503 otherwise

use crate::error::IngestError;
use crate::pipeline::ingestion::IngestionGate;
use crate::pipeline::types::TradeRecord;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::net::TcpListener;

/// Shared handler state; cloned per request
#[derive(Clone)]
pub struct AppState {
    gate: IngestionGate,
}

/// Body of `GET /healthz`
///
/// `pending_trades` is `None` when the database could not be reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub pending_trades: Option<i64>,
}

/// Build the API router
///
/// Arguments:
/// - `gate`: validation + enqueue entry point; its queue also serves the
///   stats and health reads
///
/// Routes:
/// - `POST /trades` → `IngestionGate::submit`
/// - `GET /stats/:account` → `account_stats` table, zeros when missing
/// - `GET /healthz` → `SELECT 1` plus pending count from `trades_q`
pub fn router(gate: IngestionGate) -> Router {
    Router::new()
        .route("/trades", post(submit_trade))
        .route("/stats/:account", get(account_stats))
        .route("/healthz", get(health_check))
        .with_state(AppState { gate })
}

/// Serve on an already bound listener until `shutdown` resolves
///
/// In-flight requests finish before this returns.
pub async fn serve<F>(listener: TcpListener, gate: IngestionGate, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        log::info!("🌐 HTTP API listening on {}", addr);
    }

    axum::serve(listener, router(gate))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Status code for a failed submission
///
/// Validation failures are the client's fault (400); storage failures are
/// ours (500).
pub fn status_for(err: &IngestError) -> StatusCode {
    match err {
        IngestError::Validation(_) => StatusCode::BAD_REQUEST,
        IngestError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn submit_trade(
    State(state): State<AppState>,
    payload: Result<Json<TradeRecord>, JsonRejection>,
) -> Response {
    let Json(record) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            log::debug!("Rejected request body: {}", rejection);
            return (StatusCode::BAD_REQUEST, "Invalid JSON").into_response();
        }
    };

    match state.gate.submit(record).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(err @ IngestError::Validation(_)) => (status_for(&err), err.to_string()).into_response(),
        Err(err @ IngestError::Storage(_)) => {
            (status_for(&err), "Failed to enqueue trade").into_response()
        }
    }
}

async fn account_stats(State(state): State<AppState>, Path(account): Path<String>) -> Response {
    if account.is_empty() {
        return (StatusCode::BAD_REQUEST, "Account must not be empty").into_response();
    }

    match state.gate.queue().account_stats(&account).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => {
            log::error!("❌ Failed to get stats for {}: {}", account, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to get stats").into_response()
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Response {
    let queue = state.gate.queue();

    let pending = match queue.ping().await {
        Ok(()) => queue.pending_count().await,
        Err(e) => Err(e),
    };

    match pending {
        Ok(pending) => Json(HealthResponse {
            status: "ok".to_string(),
            pending_trades: Some(pending),
        })
        .into_response(),
        Err(e) => {
            log::warn!("⚠️  Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                    pending_trades: None,
                }),
            )
                .into_response()
        }
    }
}
