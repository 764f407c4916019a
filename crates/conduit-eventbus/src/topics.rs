// Path: crates/conduit-eventbus/src/topics.rs
//! The EventBus's own state: per-topic monotonic sequence counters and the
//! filter-keyed subscriber fan-out table. Both are owned exclusively by
//! one EventBus instance.

use std::sync::atomic::{AtomicU64, Ordering};

use conduit_proto::eventbus::EventEnvelope;
use conduit_types::wildcard_match;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;

struct Subscriber {
    id: u64,
    topic_filter: String,
    sink: UnboundedSender<EventEnvelope>,
}

/// A handle identifying one registered subscriber, used to remove it on
/// teardown.
pub struct SubscriptionHandle(u64);

/// Sequence counters plus the subscriber fan-out table.
#[derive(Default)]
pub struct TopicRegistry {
    sequences: DashMap<String, AtomicU64>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self { sequences: DashMap::new(), subscribers: Mutex::new(Vec::new()), next_id: AtomicU64::new(0) }
    }

    /// Increments and returns the next sequence number for `topic`.
    /// Sequence counters are created lazily on first publish and strictly
    /// increase; they are per exact topic, never per filter.
    fn next_sequence(&self, topic: &str) -> u64 {
        let counter = self.sequences.entry(topic.to_string()).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Registers `sink` under `topic_filter`.
    pub fn subscribe(&self, topic_filter: &str, sink: UnboundedSender<EventEnvelope>) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push(Subscriber { id, topic_filter: topic_filter.to_string(), sink });
        SubscriptionHandle(id)
    }

    pub fn unsubscribe(&self, handle: &SubscriptionHandle) {
        self.subscribers.lock().retain(|s| s.id != handle.0);
    }

    /// Increments `topic`'s sequence counter, then delivers the resulting
    /// envelope to every subscriber whose filter matches `topic` under the
    /// shared wildcard rule. Delivery is best-effort: a subscriber whose
    /// sink is closed is silently dropped, pruned after the pass.
    pub fn publish(&self, topic: &str, payload: Vec<u8>) -> u64 {
        let sequence_id = self.next_sequence(topic);
        let envelope = EventEnvelope { topic: topic.to_string(), payload, sequence_id };

        let snapshot: Vec<(u64, String, UnboundedSender<EventEnvelope>)> = {
            let guard = self.subscribers.lock();
            guard.iter().map(|s| (s.id, s.topic_filter.clone(), s.sink.clone())).collect()
        };

        let mut dead = Vec::new();
        for (id, topic_filter, sink) in snapshot {
            if !wildcard_match(&topic_filter, topic) {
                continue;
            }
            if sink.send(envelope.clone()).is_err() {
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            self.subscribers.lock().retain(|s| !dead.contains(&s.id));
        }

        sequence_id
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sequence_ids_are_strictly_increasing_per_topic() {
        let registry = TopicRegistry::new();
        assert_eq!(registry.publish("inventory:prod_1:low_stock", vec![]), 1);
        assert_eq!(registry.publish("inventory:prod_1:low_stock", vec![]), 2);
        assert_eq!(registry.publish("inventory:prod_2:low_stock", vec![]), 1);
    }

    #[tokio::test]
    async fn a_segmented_looking_filter_still_matches_as_a_bare_prefix() {
        let registry = TopicRegistry::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        registry.subscribe("inventory:*:low_stock", tx);

        registry.publish("inventory:prod_12345:low_stock", b"9".to_vec());
        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.sequence_id, 1);
        assert_eq!(envelope.topic, "inventory:prod_12345:low_stock");
    }

    #[tokio::test]
    async fn non_matching_filter_receives_nothing() {
        let registry = TopicRegistry::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        registry.subscribe("warehouse:*", tx);

        registry.publish("inventory:prod_1:low_stock", vec![]);
        drop(registry);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn unsubscribe_removes_the_sink_from_fan_out() {
        let registry = TopicRegistry::new();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = registry.subscribe("inventory:*", tx);
        registry.unsubscribe(&handle);
        assert_eq!(registry.subscriber_count(), 0);
    }
}
