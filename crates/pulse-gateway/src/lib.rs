//! pulse service library entry.
//!
//! Wires the metrics core into an HTTP service: config, shared state,
//! request tracking, demo endpoints, `/metrics` and the CPU simulator. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod sim;
