// Path: crates/conduit-context/src/telemetry_stream.rs
//! Per-`stream_id` telemetry fan-out. A separate in-process publisher
//! injects frames; every sink registered for a `stream_id` receives every
//! frame published to it, in publication order, at-most-once.

use std::sync::atomic::{AtomicU64, Ordering};

use conduit_proto::context::TelemetryFrame;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;

struct Subscriber {
    id: u64,
    sink: UnboundedSender<TelemetryFrame>,
}

/// The process-wide telemetry fan-out table, owned exclusively by one
/// `ContextTool` instance.
#[derive(Default)]
pub struct TelemetryStreams {
    streams: DashMap<String, Mutex<Vec<Subscriber>>>,
    next_id: AtomicU64,
}

/// A handle identifying one registered sink, used to remove it on
/// teardown without affecting other subscribers of the same stream.
pub struct SubscriptionHandle {
    pub stream_id: String,
    pub id: u64,
}

impl TelemetryStreams {
    pub fn new() -> Self {
        Self { streams: DashMap::new(), next_id: AtomicU64::new(0) }
    }

    /// Registers `sink` under `stream_id`, returning a handle that MUST be
    /// passed to [`Self::unregister`] when the subscriber disconnects.
    pub fn register(&self, stream_id: &str, sink: UnboundedSender<TelemetryFrame>) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.streams
            .entry(stream_id.to_string())
            .or_default()
            .lock()
            .push(Subscriber { id, sink });
        SubscriptionHandle { stream_id: stream_id.to_string(), id }
    }

    /// Removes a sink on cancellation or disconnect. MUST be called
    /// promptly — before the handler returns — so fan-out never targets a
    /// dead stream.
    pub fn unregister(&self, handle: &SubscriptionHandle) {
        if let Some(subscribers) = self.streams.get(&handle.stream_id) {
            subscribers.lock().retain(|subscriber| subscriber.id != handle.id);
        }
    }

    /// Delivers `frame` to every sink registered for `stream_id`, in
    /// registration-independent publication order. A sink whose receiver
    /// has been dropped is pruned after the fan-out pass rather than
    /// blocking it.
    pub fn publish(&self, stream_id: &str, frame: TelemetryFrame) {
        let Some(subscribers) = self.streams.get(stream_id) else {
            return;
        };

        let snapshot: Vec<(u64, UnboundedSender<TelemetryFrame>)> = {
            let guard = subscribers.lock();
            guard.iter().map(|s| (s.id, s.sink.clone())).collect()
        };

        let mut dead = Vec::new();
        for (id, sink) in snapshot {
            if sink.send(frame.clone()).is_err() {
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            subscribers.lock().retain(|s| !dead.contains(&s.id));
        }
    }

    pub fn subscriber_count(&self, stream_id: &str) -> usize {
        self.streams.get(stream_id).map(|s| s.lock().len()).unwrap_or(0)
    }
}
