//! Gauge: arbitrary up/down value with absolute `set`.

use dashmap::DashMap;

use crate::error::{PulseError, Result};
use crate::metrics::atomic::AtomicF64;
use crate::metrics::desc::{Desc, Kind};
use crate::metrics::labels;
use crate::metrics::snapshot::{sort_series, MetricFamily, Series, SeriesValue};

#[derive(Debug)]
pub struct Gauge {
    desc: Desc,
    series: DashMap<Vec<String>, AtomicF64>,
}

impl Gauge {
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        let desc = Desc::new(name, help, label_names)?;
        let series = DashMap::new();
        if label_names.is_empty() {
            series.insert(Vec::new(), AtomicF64::default());
        }
        Ok(Self { desc, series })
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    /// Overwrite the current value (last write wins).
    pub fn set(&self, labels: &[(&str, &str)], value: f64) -> Result<()> {
        let key = labels::resolve(&self.desc, labels)?;
        match self.series.get(&key) {
            Some(g) => g.set(value),
            None => self.series.entry(key).or_default().set(value),
        }
        Ok(())
    }

    /// Add a signed delta to the current value (0 if never set).
    pub fn add(&self, labels: &[(&str, &str)], delta: f64) -> Result<()> {
        if delta.is_nan() {
            return Err(PulseError::InvalidValue {
                name: self.desc.name().to_string(),
                value: delta,
            });
        }
        let key = labels::resolve(&self.desc, labels)?;
        self.series.entry(key).or_default().add(delta);
        Ok(())
    }

    pub fn inc(&self, labels: &[(&str, &str)]) -> Result<()> {
        self.add(labels, 1.0)
    }

    pub fn dec(&self, labels: &[(&str, &str)]) -> Result<()> {
        self.add(labels, -1.0)
    }

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
            kind: Kind::Gauge,
            label_names: self.desc.label_names().to_vec(),
            series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_is_last_write_wins() {
        let g = Gauge::new("app_health_status", "h", &[]).unwrap();
        for v in [1.0, 0.0, 85.0, 30.0, -3.5] {
            g.set(&[], v).unwrap();
            assert_eq!(g.get(&[]).unwrap(), v);
        }
    }

    #[test]
    fn relative_updates_start_from_zero() {
        let g = Gauge::new("in_flight", "h", &["route"]).unwrap();
        g.inc(&[("route", "/")]).unwrap();
        g.inc(&[("route", "/")]).unwrap();
        g.dec(&[("route", "/")]).unwrap();
        g.add(&[("route", "/x")], -2.0).unwrap();
        assert_eq!(g.get(&[("route", "/")]).unwrap(), 1.0);
        assert_eq!(g.get(&[("route", "/x")]).unwrap(), -2.0);

        g.set(&[("route", "/")], 10.0).unwrap();
        g.add(&[("route", "/")], 0.5).unwrap();
        assert_eq!(g.get(&[("route", "/")]).unwrap(), 10.5);
    }

    #[test]
    fn collect_sorts_series() {
        let g = Gauge::new("g", "h", &["k"]).unwrap();
        g.set(&[("k", "b")], 2.0).unwrap();
        g.set(&[("k", "a")], 1.0).unwrap();
        let fam = g.collect();
        let keys: Vec<_> = fam.series.iter().map(|s| s.label_values[0].as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
    }
}
