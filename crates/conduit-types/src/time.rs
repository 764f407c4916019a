// Path: crates/conduit-types/src/time.rs
//! A single place to ask "what time is it" in milliseconds since the Unix
//! epoch, used for token `iat`/`exp`, `EndpointRecord::registered_at`, and
//! telemetry frame timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time, milliseconds since the Unix epoch.
pub fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_millis() as u64
}

/// Current wall-clock time, seconds since the Unix epoch.
pub fn now_unix_secs() -> u64 {
    now_unix_ms() / 1_000
}
