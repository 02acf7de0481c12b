//! Cumulative histogram with fixed bucket bounds.
//!
//! Bounds are immutable after construction and kept strictly ascending; the
//! `+Inf` bucket is implicit and always equals the observation count. Each
//! observation walks the bounds linearly, which is cheap for the usual
//! handful of buckets.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;

use crate::error::{PulseError, Result};
use crate::metrics::atomic::AtomicF64;
use crate::metrics::desc::{Desc, Kind};
use crate::metrics::labels;
use crate::metrics::snapshot::{sort_series, HistogramSnapshot, MetricFamily, Series, SeriesValue};

/// Per-tuple state. `buckets[i]` counts observations `<= bounds[i]`.
#[derive(Debug)]
struct HistogramSeries {
    buckets: Vec<AtomicU64>,
    count: AtomicU64,
    sum: AtomicF64,
}

impl HistogramSeries {
    fn new(n: usize) -> Self {
        Self {
            buckets: (0..n).map(|_| AtomicU64::new(0)).collect(),
            count: AtomicU64::new(0),
            sum: AtomicF64::default(),
        }
    }

    fn observe(&self, bounds: &[f64], value: f64) {
        for (bound, slot) in bounds.iter().zip(&self.buckets) {
            if value <= *bound {
                slot.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.sum.add(value);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, bounds: &[f64]) -> HistogramSnapshot {
        let buckets: Vec<(f64, u64)> = bounds
            .iter()
            .zip(&self.buckets)
            .map(|(b, c)| (*b, c.load(Ordering::Relaxed)))
            .collect();
        // Buckets are bumped before the count; keep +Inf >= every bucket.
        let top = buckets.last().map(|(_, c)| *c).unwrap_or(0);
        HistogramSnapshot {
            buckets,
            count: self.count.load(Ordering::Relaxed).max(top),
            sum: self.sum.get(),
        }
    }
}

#[derive(Debug)]
pub struct Histogram {
    desc: Desc,
    bounds: Vec<f64>,
    series: DashMap<Vec<String>, HistogramSeries>,
}

impl Histogram {
    /// Bounds must be finite and strictly ascending; a single trailing `+Inf`
    /// is dropped since that bucket is always emitted. `le` is reserved as a
    /// label name.
    pub fn new(name: &str, help: &str, label_names: &[&str], buckets: &[f64]) -> Result<Self> {
        if label_names.contains(&"le") {
            return Err(PulseError::InvalidDescriptor(format!(
                "histogram {name} may not declare label \"le\""
            )));
        }
        let desc = Desc::new(name, help, label_names)?;

        let mut bounds = buckets.to_vec();
        if bounds.last() == Some(&f64::INFINITY) {
            bounds.pop();
        }
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(PulseError::InvalidDescriptor(format!(
                "histogram {name} buckets must be finite (only one trailing +Inf is allowed)"
            )));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PulseError::InvalidDescriptor(format!(
                "histogram {name} buckets must be strictly ascending"
            )));
        }

        let series = DashMap::new();
        if label_names.is_empty() {
            series.insert(Vec::new(), HistogramSeries::new(bounds.len()));
        }
        Ok(Self { desc, bounds, series })
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    /// Finite bucket bounds (without the implicit `+Inf`).
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    pub fn observe(&self, labels: &[(&str, &str)], value: f64) -> Result<()> {
        if value.is_nan() {
            return Err(PulseError::InvalidValue {
                name: self.desc.name().to_string(),
                value,
            });
        }
        let key = labels::resolve(&self.desc, labels)?;
        let n = self.bounds.len();
        self.series
            .entry(key)
            .or_insert_with(|| HistogramSeries::new(n))
            .observe(&self.bounds, value);
        Ok(())
    }

    /// Observe an elapsed duration in milliseconds.
    pub fn observe_duration(&self, labels: &[(&str, &str)], elapsed: Duration) -> Result<()> {
        self.observe(labels, elapsed.as_nanos() as f64 / 1_000_000.0)
    }

    /// State of one tuple, `None` if it was never observed.
    pub fn snapshot(&self, labels: &[(&str, &str)]) -> Result<Option<HistogramSnapshot>> {
        let key = labels::resolve(&self.desc, labels)?;
        Ok(self.series.get(&key).map(|s| s.snapshot(&self.bounds)))
    }

    pub(crate) fn collect(&self) -> Result<MetricFamily> {
        if self.bounds.is_empty() {
            return Err(PulseError::StructuralFault {
                name: self.desc.name().to_string(),
                reason: "histogram has no finite buckets".into(),
            });
        }

        let mut series: Vec<Series> = self
            .series
            .iter()
            .map(|r| Series {
                label_values: r.key().clone(),
                value: SeriesValue::Histogram(r.value().snapshot(&self.bounds)),
            })
            .collect();
        sort_series(&mut series);

        Ok(MetricFamily {
            name: self.desc.name().to_string(),
            help: self.desc.help().to_string(),
            kind: Kind::Histogram,
            label_names: self.desc.label_names().to_vec(),
            series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn each_observation_bumps_matching_buckets_once() {
        let h = Histogram::new("h", "h", &[], &[1.0, 2.0, 5.0]).unwrap();
        let mut prev = h.snapshot(&[]).unwrap().unwrap();
        for v in [0.5, 2.0, 3.0, 7.0, 1.0] {
            h.observe(&[], v).unwrap();
            let now = h.snapshot(&[]).unwrap().unwrap();
            for ((b, before), (_, after)) in prev.buckets.iter().zip(&now.buckets) {
                let expect = if v <= *b { before + 1 } else { *before };
                assert_eq!(*after, expect, "bucket {b} after observing {v}");
            }
            assert_eq!(now.count, prev.count + 1);
            assert_eq!(now.sum, prev.sum + v);
            prev = now;
        }
        assert_eq!(prev.bucket(1.0), Some(2));
        assert_eq!(prev.bucket(2.0), Some(3));
        assert_eq!(prev.bucket(5.0), Some(4));
        assert_eq!(prev.bucket(f64::INFINITY), Some(5));
    }

    #[test]
    fn duration_is_recorded_in_millis() {
        let h = Histogram::new("latency_ms", "h", &["route"], &[100.0]).unwrap();
        h.observe_duration(&[("route", "/")], Duration::from_millis(250)).unwrap();
        let s = h.snapshot(&[("route", "/")]).unwrap().unwrap();
        assert_eq!(s.sum, 250.0);
        assert_eq!(s.bucket(100.0), Some(0));
        assert_eq!(s.count, 1);
    }

    #[test]
    fn rejects_bad_layouts() {
        for buckets in [
            vec![1.0, 1.0],
            vec![5.0, 2.0],
            vec![f64::NAN],
            vec![1.0, f64::INFINITY, f64::INFINITY],
            vec![f64::NEG_INFINITY, 1.0],
            vec![f64::INFINITY, 1.0],
        ] {
            let err = Histogram::new("h", "h", &[], &buckets).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidDescriptor);
        }
        assert!(Histogram::new("h", "h", &["le"], &[1.0]).is_err());
    }

    #[test]
    fn trailing_inf_is_implicit() {
        let h = Histogram::new("h", "h", &[], &[1.0, f64::INFINITY]).unwrap();
        assert_eq!(h.bounds(), [1.0]);
    }

    #[test]
    fn empty_layout_faults_at_collect() {
        let h = Histogram::new("h", "h", &[], &[]).unwrap();
        h.observe(&[], 1.0).unwrap();
        assert_eq!(h.collect().unwrap_err().code(), ErrorCode::StructuralFault);
    }
}
