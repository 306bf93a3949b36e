//! # Signal Relay — Master → Slave Trade Copier Backend
//!
//! ```text
//!  ┌─────────────┐  POST /signal                ┌──────────────────────────────┐
//!  │  Master EA  │ ───────────────────────────▶ │ AppState                     │
//!  └─────────────┘                              │ ├─ relay                     │
//!                                               │ │   ├─ SignalLog  (append)   │
//!  ┌─────────────┐  GET  /signal/:id            │ │   └─ DeliveryTracker       │
//!  │  Slave EA   │ ───────────────────────────▶ │ └─ broadcast_tx ───────────┐ │
//!  │  (× N)      │  POST /signal/:id/executed   └────────────────────────────┘ │
//!  └─────────────┘                                                            │
//!  ┌─────────────┐  ws://host/ws/monitor  ◀──────────────────────────────────┘
//!  │  Dashboard  │  GET  /api/monitor/stats
//!  └─────────────┘  GET  /health
//! ```
//!
//! Each Slave sees every signal until it confirms execution; once confirmed,
//! that signal never reaches that Slave again.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod error;
mod events;
mod models;
mod relay;
mod routes;
mod state;

use config::ServerConfig;
use routes::{
    health::health_check,
    monitor::{get_stats, ws_monitor},
    signal::{mark_executed, pending_signals, submit_signal},
};
use state::{build_state, SharedState};

/// Router with every endpoint and middleware, bound to `state`.
pub(crate) fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Master / Slave ────────────────────────────────────────────────────
        .route("/signal",                        post(submit_signal))
        .route("/signal/:consumer_id",           get(pending_signals))
        .route("/signal/:consumer_id/executed",  post(mark_executed))
        // ── Monitor Loop ──────────────────────────────────────────────────────
        .route("/ws/monitor",                    get(ws_monitor))
        .route("/api/monitor/stats",             get(get_stats))
        .route("/health",                        get(health_check))
        // ── Middleware ────────────────────────────────────────────────────────
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env ──────────────────────────────────────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("signal_relay=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════════════════╗
  ║            SIGNAL RELAY — Trade Copier                ║
  ║        Master → Log → Tracker → Slave (× N)           ║
  ╚═══════════════════════════════════════════════════════╝"#);

    // ── 3. Config & shared state ──────────────────────────────────────────────
    let config = ServerConfig::from_env()?;
    let state = build_state(&config);

    // ── 4. Router ─────────────────────────────────────────────────────────────
    let app = build_router(state);

    // ── 5. Bind & Serve ───────────────────────────────────────────────────────
    let addr = config.bind_addr();
    info!(
        ?addr,
        endpoints = "POST /signal, GET /signal/:consumer_id, POST /signal/:consumer_id/executed, GET /health",
        "🚀 Signal relay starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Signal relay stopped — all signals and acknowledgments discarded");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
