//! Top-level facade crate for pulse.
//!
//! Re-exports the metrics core and the service library so users can depend on a single crate.

pub mod core {
    pub use pulse_core::*;
}

pub mod gateway {
    pub use pulse_gateway::*;
}
