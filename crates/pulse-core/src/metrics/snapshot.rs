//! Point-in-time views of instrument state handed to the encoder.

use crate::metrics::desc::Kind;

/// One instrument's rendered state.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub kind: Kind,
    pub label_names: Vec<String>,
    /// Sorted by label values.
    pub series: Vec<Series>,
}

/// One label-value tuple and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label_values: Vec<String>,
    pub value: SeriesValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValue {
    Scalar(f64),
    Histogram(HistogramSnapshot),
}

/// Cumulative bucket counts for the finite bounds; `+Inf` equals `count`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    pub buckets: Vec<(f64, u64)>,
    pub count: u64,
    pub sum: f64,
}

impl HistogramSnapshot {
    /// Count of observations `<= bound`, or `None` if `bound` is not a bucket.
    pub fn bucket(&self, bound: f64) -> Option<u64> {
        if bound == f64::INFINITY {
            return Some(self.count);
        }
        self.buckets.iter().find(|(b, _)| *b == bound).map(|(_, c)| *c)
    }
}

pub(crate) fn sort_series(series: &mut [Series]) {
    series.sort_by(|a, b| a.label_values.cmp(&b.label_values));
}
