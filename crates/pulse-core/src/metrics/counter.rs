//! Monotonic counter.

use dashmap::DashMap;

use crate::error::{PulseError, Result};
use crate::metrics::atomic::AtomicF64;
use crate::metrics::desc::{Desc, Kind};
use crate::metrics::labels;
use crate::metrics::snapshot::{sort_series, MetricFamily, Series, SeriesValue};

/// Increment-only accumulator per label-value tuple.
#[derive(Debug)]
pub struct Counter {
    desc: Desc,
    series: DashMap<Vec<String>, AtomicF64>,
}

impl Counter {
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        let desc = Desc::new(name, help, label_names)?;
        let series = DashMap::new();
        // A label-free counter always has its single series.
        if label_names.is_empty() {
            series.insert(Vec::new(), AtomicF64::default());
        }
        Ok(Self { desc, series })
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) -> Result<()> {
        self.inc_by(labels, 1.0)
    }

    /// Increment by `delta`, which must be finite and non-negative.
    pub fn inc_by(&self, labels: &[(&str, &str)], delta: f64) -> Result<()> {
        if !delta.is_finite() || delta < 0.0 {
            return Err(PulseError::InvalidValue {
                name: self.desc.name().to_string(),
                value: delta,
            });
        }
        let key = labels::resolve(&self.desc, labels)?;
        self.series.entry(key).or_default().add(delta);
        Ok(())
    }

    /// Current value, 0 for a tuple never incremented.
    pub fn get(&self, labels: &[(&str, &str)]) -> Result<f64> {
        let key = labels::resolve(&self.desc, labels)?;
        Ok(self.series.get(&key).map(|v| v.get()).unwrap_or(0.0))
    }

    pub(crate) fn collect(&self) -> MetricFamily {
        let mut series: Vec<Series> = self
            .series
            .iter()
            .map(|r| Series {
                label_values: r.key().clone(),
                value: SeriesValue::Scalar(r.value().get()),
            })
            .collect();
        sort_series(&mut series);

        MetricFamily {
            name: self.desc.name().to_string(),
            help: self.desc.help().to_string(),
            kind: Kind::Counter,
            label_names: self.desc.label_names().to_vec(),
            series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn sums_deltas_per_tuple() {
        let c = Counter::new("requests_total", "h", &["method"]).unwrap();
        let mut prev = 0.0;
        for d in [1.0, 0.0, 2.5, 4.0] {
            c.inc_by(&[("method", "GET")], d).unwrap();
            let now = c.get(&[("method", "GET")]).unwrap();
            assert!(now >= prev);
            prev = now;
        }
        assert_eq!(prev, 7.5);
        assert_eq!(c.get(&[("method", "POST")]).unwrap(), 0.0);
    }

    #[test]
    fn rejects_negative_and_non_finite_delta() {
        let c = Counter::new("c", "h", &[]).unwrap();
        for d in [-1.0, f64::NAN, f64::INFINITY] {
            assert_eq!(c.inc_by(&[], d).unwrap_err().code(), ErrorCode::InvalidValue);
        }
        assert_eq!(c.get(&[]).unwrap(), 0.0);
    }

    #[test]
    fn untouched_tuples_are_not_reported() {
        let c = Counter::new("c", "h", &["method"]).unwrap();
        assert!(c.collect().series.is_empty());

        let plain = Counter::new("plain", "h", &[]).unwrap();
        let fam = plain.collect();
        assert_eq!(fam.series.len(), 1);
        assert_eq!(fam.series[0].value, SeriesValue::Scalar(0.0));
    }

    #[test]
    fn label_mismatch_is_surfaced() {
        let c = Counter::new("c", "h", &["method"]).unwrap();
        let err = c.inc(&[("verb", "GET")]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::LabelMismatch);
    }
}
