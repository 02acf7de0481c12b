//! pulse core: in-process metrics registry, typed instruments and the
//! Prometheus text exposition encoder.
//!
//! This crate carries no transport or runtime dependencies so it can be
//! driven from HTTP handlers, background tasks and tests alike.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Wiring bugs surface as `PulseError`/`Result` at the call site.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metrics;

/// Shared result type.
pub use error::{ErrorCode, PulseError, Result};
