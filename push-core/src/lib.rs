//! # push-core
//!
//! Pure logic for the push client (no I/O, instant tests).
//!
//! This crate implements the state machine and algorithms for syncing with
//! the notification service without any network or disk I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (HTTP, SQLite) is performed by `push-client` and
//! `push-store`, which interpret the outputs produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod handshake;
pub mod records;
pub mod since;

pub use cursor::ack_cursor;
pub use handshake::{AuthAction, AuthEvent, AuthState};
pub use records::{from_received, sent_record};
pub use since::{parse_time_filter, parse_time_filter_at, TimeFilterError};
