// Path: crates/conduit-eventbus/src/lib.rs
//! The EventBus: topic-pattern publish/subscribe with per-topic monotonic
//! sequencing, owned exclusively by one EventBus instance.

pub mod service;
pub mod topics;

pub use service::EventBusService;
pub use topics::{SubscriptionHandle, TopicRegistry};
