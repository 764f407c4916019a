// Path: crates/conduit-types/src/lib.rs
//! Foundation types shared by every Conduit crate.
//!
//! This crate carries only the cross-cutting concerns that every service
//! (Discovery Registry, ContextTool, EventBus) and every middleware
//! primitive needs: the error taxonomy, a monotonic clock helper, and the
//! single wildcard-match predicate that capability scopes, audiences,
//! subscribe filters, and registry capabilities all share. It has no
//! dependency on any other `conduit-*` crate.

pub mod error;
pub mod matching;
pub mod time;

pub use error::{ConduitError, ErrorCode};
pub use matching::{any_matches, wildcard_match};
pub use time::{now_unix_ms, now_unix_secs};
