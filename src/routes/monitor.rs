//! # routes::monitor
//!
//! **Monitor Loop** — Endpoints สำหรับ Dashboard ที่อยากเห็นการไหลของ Signal
//!
//! ## Endpoints
//!
//! | Method    | Path                    | Description                              |
//! |-----------|-------------------------|------------------------------------------|
//! | GET (WS)  | `/ws/monitor`           | `SNAPSHOT` frame, then every RelayEvent  |
//! | GET       | `/api/monitor/stats`    | signal / consumer / acknowledgment count |

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    Json,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::{events::RelayEvent, state::SharedState};

// ─── GET /ws/monitor ──────────────────────────────────────────────────────────

pub async fn ws_monitor(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_events(socket, state))
}

/// Pushes a `SNAPSHOT` of the relay counters, then relays broadcast events
/// until either side goes away.
///
/// The subscription is taken before the counters are read, so an event
/// published in between shows up after the snapshot instead of vanishing.
async fn stream_events(socket: WebSocket, state: SharedState) {
    let mut events = state.broadcast_tx.subscribe();
    let (mut sink, mut incoming) = socket.split();

    let snapshot = RelayEvent::Snapshot { stats: state.relay.stats().await };
    if sink.send(Message::Text(snapshot.to_json())).await.is_err() {
        return;
    }
    info!(
        monitors = state.broadcast_tx.receiver_count(),
        "🔌 Monitor client connected"
    );

    // Ping/Pong is answered by the WebSocket layer itself; client frames are
    // only watched for the close.
    let reason = loop {
        let frame = tokio::select! {
            event = events.recv() => match event {
                Ok(json) => json,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Monitor client too slow, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break "relay shutting down",
            },
            msg = incoming.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break "client closed",
                Some(Err(_)) => break "socket error",
                Some(Ok(_)) => continue,
            },
        };

        if sink.send(Message::Text(frame)).await.is_err() {
            break "send failed";
        }
    };

    info!(reason, "🔌 Monitor client disconnected");
}

// ─── GET /api/monitor/stats ───────────────────────────────────────────────────

pub async fn get_stats(State(state): State<SharedState>) -> impl IntoResponse {
    let stats = state.relay.stats().await;

    // Broadcast stats event ไปด้วยทุกครั้งที่มีคน poll
    state.broadcast(&RelayEvent::ServerStats { stats });

    Json(json!({
        "success":              true,
        "signal_count":         stats.signal_count,
        "consumer_count":       stats.consumer_count,
        "acknowledgment_count": stats.acknowledgment_count,
    }))
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use futures_util::{Stream, StreamExt};
    use serde_json::{json, Value};
    use tokio_tungstenite::tungstenite;
    use tower::ServiceExt;

    use crate::{build_router, models::SubmitSignal, state::AppState};

    fn close_signal(ticket: i64) -> SubmitSignal {
        serde_json::from_value(json!({
            "producer_id": "M1", "ticket": ticket, "action": "CLOSE"
        }))
        .unwrap()
    }

    /// Next text frame from a WebSocket client, parsed as JSON.
    async fn next_json<S>(ws: &mut S) -> Value
    where
        S: Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
    {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("no frame within 5s")
                .expect("socket closed")
                .unwrap();
            if msg.is_text() {
                return serde_json::from_str(msg.to_text().unwrap()).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_stats_reflect_relay_and_broadcast() {
        let state = Arc::new(AppState::default());
        let mut rx = state.broadcast_tx.subscribe();

        let signal = state.relay.submit(close_signal(9)).await.unwrap();
        state.relay.acknowledge("slaveA", &signal.id).await.unwrap();

        let resp = build_router(Arc::clone(&state))
            .oneshot(Request::get("/api/monitor/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["signal_count"], 1);
        assert_eq!(body["consumer_count"], 1);
        assert_eq!(body["acknowledgment_count"], 1);

        let event: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(event["event"], "SERVER_STATS");
        assert_eq!(event["signal_count"], 1);
    }

    #[tokio::test]
    async fn test_submit_route_broadcasts() {
        let state = Arc::new(AppState::default());
        let mut rx = state.broadcast_tx.subscribe();

        let req = Request::post("/signal")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "producer_id": "M1", "ticket": 3, "action": "MODIFY", "symbol": "XAUUSD" })
                    .to_string(),
            ))
            .unwrap();
        let resp = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let event: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(event["event"], "SIGNAL_SUBMITTED");
        assert_eq!(event["signal"]["action"], "MODIFY");
        assert_eq!(event["signal"]["ticket"], 3);
    }

    #[tokio::test]
    async fn test_ws_monitor_snapshot_then_events() {
        let state = Arc::new(AppState::default());
        let signal = state.relay.submit(close_signal(1)).await.unwrap();
        state.relay.acknowledge("slaveA", &signal.id).await.unwrap();
        state.relay.acknowledge("slaveB", &signal.id).await.unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(Arc::clone(&state));
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/monitor"))
            .await
            .unwrap();

        let snapshot = next_json(&mut ws).await;
        assert_eq!(snapshot["event"], "SNAPSHOT");
        assert_eq!(snapshot["signal_count"], 1);
        assert_eq!(snapshot["consumer_count"], 2);
        assert_eq!(snapshot["acknowledgment_count"], 2);

        // The snapshot is sent after subscribing, so nothing published from
        // here on can be missed.
        let req = Request::post("/signal")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "producer_id": "M1", "ticket": 4, "action": "OPEN", "symbol": "EURUSD" })
                    .to_string(),
            ))
            .unwrap();
        let resp = build_router(Arc::clone(&state)).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let event = next_json(&mut ws).await;
        assert_eq!(event["event"], "SIGNAL_SUBMITTED");
        assert_eq!(event["signal"]["ticket"], 4);
        assert_eq!(event["signal"]["symbol"], "EURUSD");

        let req = Request::post("/signal/slaveA/executed")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "signal_id": event["signal"]["id"] }).to_string()))
            .unwrap();
        let resp = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let event = next_json(&mut ws).await;
        assert_eq!(event["event"], "SIGNAL_EXECUTED");
        assert_eq!(event["consumer_id"], "slaveA");
    }
}
