//! # routes::signal
//!
//! Axum route handlers for the **Master / Slave interface**.
//!
//! ## Endpoints
//!
//! | Method | Path                               | Caller | Description                      |
//! |--------|------------------------------------|--------|----------------------------------|
//! | POST   | `/signal`                          | Master | Publish a signal                 |
//! | GET    | `/signal/:consumer_id`             | Slave  | Signals not yet executed         |
//! | POST   | `/signal/:consumer_id/executed`    | Slave  | Confirm execution of one signal  |

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    events::RelayEvent,
    models::{signal::non_empty_string, SubmitSignal},
    state::SharedState,
};

// ─── POST /signal ─────────────────────────────────────────────────────────────

/// Master publishes a signal.
///
/// ### Request body (JSON)
/// ```json
/// {
///   "producer_id": "M1",
///   "ticket": 100,
///   "action": "OPEN",
///   "symbol": "EURUSD",
///   "instrument_side": "BUY",
///   "lot_size": 0.1,
///   "open_price": 1.0825,
///   "stop_loss": 1.0800,
///   "take_profit": 1.0900
/// }
/// ```
///
/// ### Response
/// * `200 OK` with `{ "success": true, "signal_id": "..." }`
/// * `400` with `{ "success": false, "error": "..." }`
pub async fn submit_signal(
    State(state): State<SharedState>,
    payload: Result<Json<SubmitSignal>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(raw) = payload?;
    let signal = state.relay.submit(raw).await?;

    state.broadcast(&RelayEvent::SignalSubmitted {
        signal: Box::new((*signal).clone()),
    });

    Ok(Json(json!({
        "success":   true,
        "signal_id": signal.id,
    })))
}

// ─── GET /signal/:consumer_id ─────────────────────────────────────────────────

/// Slave polls for work.  Returns every signal it has not acknowledged, in
/// submission order.  Polling has no side effects.
pub async fn pending_signals(
    State(state): State<SharedState>,
    Path(consumer_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let pending = state.relay.pending_for(&consumer_id).await?;
    let count = pending.len();
    let signals = serde_json::to_value(&pending).context("Failed to encode pending signals")?;

    Ok(Json(json!({
        "success": true,
        "signals": signals,
        "count":   count,
    })))
}

// ─── POST /signal/:consumer_id/executed ───────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExecutedBody {
    #[serde(default)]
    pub signal_id: Option<Value>,
}

/// Slave confirms it executed `signal_id`.
///
/// Re-sending the same confirmation, or confirming an id the log has never
/// seen, both succeed: a Slave retrying after a network blip must not get
/// an error.
pub async fn mark_executed(
    State(state): State<SharedState>,
    Path(consumer_id): Path<String>,
    payload: Result<Json<ExecutedBody>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    let signal_id = non_empty_string(body.signal_id.as_ref()).unwrap_or_default();

    state.relay.acknowledge(&consumer_id, &signal_id).await?;

    state.broadcast(&RelayEvent::SignalExecuted {
        consumer_id,
        signal_id,
    });

    Ok(Json(json!({ "success": true })))
}
