//! # relay::log
//!
//! The **signal log** — append-only, insertion-ordered record of every
//! signal the Master has ever published.
//!
//! ## Guarantees
//!
//! * Records are never mutated, removed or reordered once appended.
//! * Readers clone `Arc<Signal>` handles under the read lock, so a reader
//!   racing an append sees either the log before the push or after it,
//!   never a half-built record.
//! * Id and `created_at` are assigned while the write lock is held, so
//!   `created_at` is non-decreasing along the log.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::signal::{coerce_f64, coerce_i64, non_empty_string, DEFAULT_LOT_SIZE};
use crate::models::{Action, Side, Signal, SubmitSignal};
use crate::relay::RelayError;

// ─── SignalDraft ──────────────────────────────────────────────────────────────

/// A validated submission that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDraft {
    pub producer_id: String,
    pub ticket: i64,
    pub symbol: Option<String>,
    pub action: Action,
    pub instrument_side: Side,
    pub lot_size: f64,
    pub open_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl TryFrom<SubmitSignal> for SignalDraft {
    type Error = RelayError;

    fn try_from(raw: SubmitSignal) -> Result<Self, Self::Error> {
        let producer_id = non_empty_string(raw.producer_id.as_ref());
        let action_raw = non_empty_string(raw.action.as_ref());
        let ticket_present = !matches!(raw.ticket, None | Some(serde_json::Value::Null));

        let (Some(producer_id), Some(action_raw), true) = (producer_id, action_raw, ticket_present)
        else {
            return Err(RelayError::Validation(
                "Missing required fields: producer_id, ticket, action".into(),
            ));
        };

        let ticket = coerce_i64(raw.ticket.as_ref()).ok_or_else(|| {
            RelayError::Validation("Invalid ticket. Must be an integer".into())
        })?;

        let action = Action::parse(&action_raw).ok_or_else(|| {
            RelayError::Validation("Invalid action. Must be OPEN, CLOSE, or MODIFY".into())
        })?;

        let symbol = non_empty_string(raw.symbol.as_ref());
        if action.requires_symbol() && symbol.is_none() {
            return Err(RelayError::Validation(format!(
                "Symbol is required for {action} signals"
            )));
        }

        Ok(Self {
            producer_id,
            ticket,
            symbol,
            action,
            instrument_side: Side::coerce(raw.instrument_side.as_ref()),
            lot_size: coerce_f64(raw.lot_size.as_ref(), DEFAULT_LOT_SIZE),
            open_price: coerce_f64(raw.open_price.as_ref(), 0.0),
            stop_loss: coerce_f64(raw.stop_loss.as_ref(), 0.0),
            take_profit: coerce_f64(raw.take_profit.as_ref(), 0.0),
        })
    }
}

// ─── Id generation ────────────────────────────────────────────────────────────

/// Builds `{producer}_{ticket}_{ACTION}_{millis}_{seq}`.
///
/// The sequence number is process-wide and strictly increasing, so two
/// submissions of the same ticket inside one millisecond still differ.
#[derive(Debug, Default)]
pub struct SignalIdGenerator {
    seq: AtomicU64,
}

impl SignalIdGenerator {
    pub fn next(&self, draft: &SignalDraft, created_at: DateTime<Utc>) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}_{}_{}_{}_{}",
            draft.producer_id,
            draft.ticket,
            draft.action,
            created_at.timestamp_millis(),
            seq
        )
    }
}

// ─── SignalLog ────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SignalLog {
    entries: RwLock<Vec<Arc<Signal>>>,
    ids: SignalIdGenerator,
}

impl SignalLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps `draft` with an id and `created_at`, appends it, and returns
    /// the stored record.
    pub async fn append(&self, draft: SignalDraft) -> Arc<Signal> {
        let mut entries = self.entries.write().await;

        let created_at = Utc::now();
        let id = self.ids.next(&draft, created_at);
        let signal = Arc::new(Signal {
            id,
            producer_id: draft.producer_id,
            ticket: draft.ticket,
            symbol: draft.symbol,
            action: draft.action,
            instrument_side: draft.instrument_side,
            lot_size: draft.lot_size,
            open_price: draft.open_price,
            stop_loss: draft.stop_loss,
            take_profit: draft.take_profit,
            created_at,
        });

        entries.push(Arc::clone(&signal));
        signal
    }

    /// Snapshot of the whole log in insertion order.
    ///
    /// Crate-internal: consumers only ever see their own pending subset.
    pub(crate) async fn all_signals(&self) -> Vec<Arc<Signal>> {
        self.entries.read().await.clone()
    }

    pub async fn contains(&self, signal_id: &str) -> bool {
        self.entries.read().await.iter().any(|s| s.id == signal_id)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
