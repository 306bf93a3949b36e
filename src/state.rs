//! # state
//!
//! The **shared application state** injected into every Axum handler.
//!
//! * `Arc<AppState>` is cloned cheaply into each handler via
//!   `axum::extract::State`.
//! * The [`Relay`] owns all signal and delivery bookkeeping; it is built
//!   once here and never reached through a global.
//! * `broadcast_tx` fans relay events out to WebSocket monitor clients.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::events::RelayEvent;
use crate::relay::Relay;

// ─── AppState ─────────────────────────────────────────────────────────────────

pub struct AppState {
    /// Signal log + per-Slave delivery tracker.
    pub relay: Relay,

    /// Pre-serialized JSON events for `/ws/monitor`.
    pub broadcast_tx: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.event_buffer);

        Self {
            relay: Relay::new(),
            broadcast_tx,
        }
    }

    /// Broadcast RelayEvent ไปยัง WebSocket clients ทั้งหมด
    /// ไม่ panic ถ้าไม่มี listener (ปลอดภัยสำหรับ headless mode)
    pub fn broadcast(&self, event: &RelayEvent) {
        // Err เกิดขึ้นเมื่อไม่มี receiver — ไม่ใช่ error จริงๆ
        let _ = self.broadcast_tx.send(event.to_json());
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&ServerConfig::default())
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

pub fn build_state(config: &ServerConfig) -> SharedState {
    Arc::new(AppState::new(config))
}
