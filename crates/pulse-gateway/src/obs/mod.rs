//! Service instruments and the request-tracking middleware that feeds them.

pub mod metrics;
pub mod track;

pub use metrics::AppMetrics;
