//! In-process metrics: typed instruments, a registry that owns them, and the
//! Prometheus text encoder.
//!
//! Series are keyed by their label-value tuple and stored in `DashMap`s; every
//! numeric field is an atomic so updates from handlers and background tasks
//! never lose increments. Encoding reads the same atomics without locking
//! the whole registry.

mod atomic;
pub mod counter;
pub mod desc;
pub mod encode;
pub mod gauge;
pub mod histogram;
mod labels;
pub mod process;
pub mod registry;
pub mod snapshot;

pub use counter::Counter;
pub use desc::{Desc, Kind};
pub use encode::{encode, format_value, CONTENT_TYPE};
pub use gauge::Gauge;
pub use histogram::Histogram;
pub use process::ProcessMetrics;
pub use registry::{Instrument, Registry};
pub use snapshot::{HistogramSnapshot, MetricFamily, Series, SeriesValue};
