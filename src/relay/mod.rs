//! # relay
//!
//! The Master → Slave relay core: a [`SignalLog`] of everything the Master
//! published and a [`DeliveryTracker`] of what each Slave has executed.
//!
//! ```text
//!  POST /signal ──▶ submit() ──▶ SignalLog (append-only)
//!                                    │
//!  GET  /signal/:id ──▶ pending_for() ── all signals − acked(consumer)
//!                                    │
//!  POST /signal/:id/executed ──▶ acknowledge() ──▶ DeliveryTracker
//! ```
//!
//! A Slave that never acknowledges sees every signal on every poll; the
//! acknowledgment is the only thing that shrinks its pending view.  Nothing
//! is ever pruned and nothing survives a restart.

pub mod log;
pub mod tracker;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, Level};

use crate::models::{Signal, SubmitSignal};

pub use log::{SignalDraft, SignalLog};
pub use tracker::DeliveryTracker;

// ─── RelayError ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// Missing or malformed required input.  Reported to the caller, never
    /// retried.
    #[error("{0}")]
    Validation(String),
}

// ─── Stats ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelayStats {
    pub signal_count: usize,
    pub consumer_count: usize,
    pub acknowledgment_count: usize,
}

// ─── Relay ────────────────────────────────────────────────────────────────────

/// Owned store constructed once at startup and shared through `AppState`.
#[derive(Debug)]
pub struct Relay {
    log: SignalLog,
    tracker: DeliveryTracker,
}

fn require_id<'a>(value: &'a str, field: &str) -> Result<&'a str, RelayError> {
    if value.trim().is_empty() {
        return Err(RelayError::Validation(format!("Missing required field: {field}")));
    }
    Ok(value)
}

impl Relay {
    pub fn new() -> Self {
        Self {
            log: SignalLog::new(),
            tracker: DeliveryTracker::new(),
        }
    }

    /// Validates a Master submission and appends it to the log.
    pub async fn submit(&self, raw: SubmitSignal) -> Result<Arc<Signal>, RelayError> {
        let draft = SignalDraft::try_from(raw)?;
        let signal = self.log.append(draft).await;

        info!(
            signal_id = %signal.id,
            action    = %signal.action,
            symbol    = ?signal.symbol,
            ticket    = signal.ticket,
            "📡 Signal received"
        );

        Ok(signal)
    }

    /// Every signal `consumer_id` has not acknowledged, in submission order.
    pub async fn pending_for(&self, consumer_id: &str) -> Result<Vec<Signal>, RelayError> {
        let consumer_id = require_id(consumer_id, "consumer_id")?;
        let all = self.log.all_signals().await;
        Ok(self.tracker.pending_for(consumer_id, &all).await)
    }

    /// Marks `signal_id` as executed by `consumer_id`.
    ///
    /// Idempotent, and does not check that `signal_id` exists in the log.
    pub async fn acknowledge(&self, consumer_id: &str, signal_id: &str) -> Result<(), RelayError> {
        let consumer_id = require_id(consumer_id, "consumer_id")?;
        let signal_id = require_id(signal_id, "signal_id")?;

        let created = self.tracker.acknowledge(consumer_id, signal_id).await;
        if created {
            info!(consumer_id, signal_id, "✅ Signal executed");
        } else {
            debug!(consumer_id, signal_id, "Duplicate acknowledgment ignored");
        }

        // Linear scan over an unpruned log; only paid when someone will see it.
        if tracing::enabled!(Level::DEBUG) && !self.log.contains(signal_id).await {
            debug!(consumer_id, signal_id, "Acknowledged a signal id absent from the log");
        }

        Ok(())
    }

    pub async fn stats(&self) -> RelayStats {
        RelayStats {
            signal_count: self.log.len().await,
            consumer_count: self.tracker.consumer_count().await,
            acknowledgment_count: self.tracker.acknowledgment_count().await,
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}
