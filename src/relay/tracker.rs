//! # relay::tracker
//!
//! The **delivery tracker** — which signals each Slave has confirmed as
//! executed.
//!
//! Per `(consumer, signal)` pair there are two states: *pending* (no record)
//! and *acknowledged* (record present).  There is no way back to pending.
//!
//! ## Locking
//!
//! ```text
//!  RwLock<HashMap<consumer_id, ─┐
//!                               └─▶ Arc<RwLock<HashSet<signal_id>>>>
//! ```
//!
//! The outer map is write-locked only the first time a consumer
//! acknowledges anything.  After that every acknowledgment and every
//! pending filter touches just that consumer's own set, so Slaves never
//! contend with each other.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::Signal;

type AckSet = Arc<RwLock<HashSet<String>>>;

#[derive(Debug, Default)]
pub struct DeliveryTracker {
    consumers: RwLock<HashMap<String, AckSet>>,
}

impl DeliveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing set for `consumer_id`, if it has ever acknowledged.
    ///
    /// Reads never create an entry: a Slave that only polls leaves no trace.
    async fn existing(&self, consumer_id: &str) -> Option<AckSet> {
        self.consumers.read().await.get(consumer_id).cloned()
    }

    async fn get_or_create(&self, consumer_id: &str) -> AckSet {
        if let Some(set) = self.existing(consumer_id).await {
            return set;
        }
        let mut consumers = self.consumers.write().await;
        Arc::clone(consumers.entry(consumer_id.to_string()).or_default())
    }

    /// Records that `consumer_id` executed `signal_id`.
    ///
    /// Returns `true` when this call created the record, `false` when it was
    /// already there.  Both outcomes are success for the caller.
    pub async fn acknowledge(&self, consumer_id: &str, signal_id: &str) -> bool {
        let set = self.get_or_create(consumer_id).await;
        let inserted = set.write().await.insert(signal_id.to_string());
        inserted
    }

    /// Filters `signals` down to those `consumer_id` has not acknowledged,
    /// preserving order.
    ///
    /// The read lock on the consumer's set is held for the whole filter so a
    /// concurrent acknowledgment lands either entirely before or after it.
    pub async fn pending_for(&self, consumer_id: &str, signals: &[Arc<Signal>]) -> Vec<Signal> {
        let Some(set) = self.existing(consumer_id).await else {
            return signals.iter().map(|s| Signal::clone(s)).collect();
        };

        let acked = set.read().await;
        signals
            .iter()
            .filter(|s| !acked.contains(&s.id))
            .map(|s| Signal::clone(s))
            .collect()
    }

    pub async fn consumer_count(&self) -> usize {
        self.consumers.read().await.len()
    }

    /// Total acknowledgment records across every consumer.
    pub async fn acknowledgment_count(&self) -> usize {
        let sets: Vec<AckSet> = self.consumers.read().await.values().cloned().collect();
        let mut total = 0;
        for set in sets {
            total += set.read().await.len();
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, Side};
    use chrono::Utc;

    fn signal(id: &str) -> Arc<Signal> {
        Arc::new(Signal {
            id: id.to_string(),
            producer_id: "M1".into(),
            ticket: 1,
            symbol: Some("EURUSD".into()),
            action: Action::Open,
            instrument_side: Side::Buy,
            lot_size: 0.01,
            open_price: 0.0,
            stop_loss: 0.0,
            take_profit: 0.0,
            created_at: Utc::now(),
        })
    }

    fn ids(signals: &[Signal]) -> Vec<&str> {
        signals.iter().map(|s| s.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_unknown_consumer_sees_everything() {
        let tracker = DeliveryTracker::new();
        let log = vec![signal("a"), signal("b")];

        assert_eq!(ids(&tracker.pending_for("slaveA", &log).await), vec!["a", "b"]);
        assert_eq!(tracker.consumer_count().await, 0);
    }

    #[tokio::test]
    async fn test_acknowledge_is_idempotent() {
        let tracker = DeliveryTracker::new();
        let log = vec![signal("a"), signal("b"), signal("c")];

        assert!(tracker.acknowledge("slaveA", "b").await);
        assert!(!tracker.acknowledge("slaveA", "b").await);

        assert_eq!(ids(&tracker.pending_for("slaveA", &log).await), vec!["a", "c"]);
        assert_eq!(tracker.acknowledgment_count().await, 1);
    }

    #[tokio::test]
    async fn test_consumers_are_isolated() {
        let tracker = DeliveryTracker::new();
        let log = vec![signal("a"), signal("b")];

        tracker.acknowledge("slaveA", "a").await;

        assert_eq!(ids(&tracker.pending_for("slaveA", &log).await), vec!["b"]);
        assert_eq!(ids(&tracker.pending_for("slaveB", &log).await), vec!["a", "b"]);
        assert_eq!(tracker.consumer_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_signal_id_accepted() {
        let tracker = DeliveryTracker::new();
        assert!(tracker.acknowledge("slaveA", "does-not-exist").await);
        assert_eq!(tracker.consumer_count().await, 1);
    }

    #[tokio::test]
    async fn test_acknowledgments_commute() {
        let log = vec![signal("a"), signal("b"), signal("c")];

        let first = DeliveryTracker::new();
        first.acknowledge("s", "a").await;
        first.acknowledge("s", "c").await;

        let second = DeliveryTracker::new();
        second.acknowledge("s", "c").await;
        second.acknowledge("s", "a").await;

        assert_eq!(
            first.pending_for("s", &log).await,
            second.pending_for("s", &log).await
        );
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_acks() {
        let tracker = Arc::new(DeliveryTracker::new());
        let mut tasks = tokio::task::JoinSet::new();

        for _ in 0..32 {
            let tracker = Arc::clone(&tracker);
            tasks.spawn(async move { tracker.acknowledge("slaveA", "a").await });
        }

        let mut created = 0;
        while let Some(res) = tasks.join_next().await {
            if res.unwrap() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(tracker.acknowledgment_count().await, 1);
        assert_eq!(tracker.consumer_count().await, 1);
    }
}
