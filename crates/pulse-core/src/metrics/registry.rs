//! Registry: owns instruments by unique name and walks them for export.
//!
//! Constructed explicitly and shared by `Arc`; there is no process-global
//! registry. Instruments are never removed, and iteration follows
//! registration order so the exposition output is stable.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{PulseError, Result};
use crate::metrics::counter::Counter;
use crate::metrics::desc::{Desc, Kind};
use crate::metrics::gauge::Gauge;
use crate::metrics::histogram::Histogram;
use crate::metrics::snapshot::MetricFamily;

/// Type-erased handle to a registered instrument.
#[derive(Debug, Clone)]
pub enum Instrument {
    Counter(Arc<Counter>),
    Gauge(Arc<Gauge>),
    Histogram(Arc<Histogram>),
}

impl Instrument {
    pub fn desc(&self) -> &Desc {
        match self {
            Instrument::Counter(c) => c.desc(),
            Instrument::Gauge(g) => g.desc(),
            Instrument::Histogram(h) => h.desc(),
        }
    }

    pub fn name(&self) -> &str {
        self.desc().name()
    }

    pub fn kind(&self) -> Kind {
        match self {
            Instrument::Counter(_) => Kind::Counter,
            Instrument::Gauge(_) => Kind::Gauge,
            Instrument::Histogram(_) => Kind::Histogram,
        }
    }

    pub fn as_counter(&self) -> Option<&Arc<Counter>> {
        match self {
            Instrument::Counter(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_gauge(&self) -> Option<&Arc<Gauge>> {
        match self {
            Instrument::Gauge(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&Arc<Histogram>> {
        match self {
            Instrument::Histogram(h) => Some(h),
            _ => None,
        }
    }

    /// Snapshot this instrument, or report why it cannot be rendered.
    pub fn collect(&self) -> Result<MetricFamily> {
        match self {
            Instrument::Counter(c) => Ok(c.collect()),
            Instrument::Gauge(g) => Ok(g.collect()),
            Instrument::Histogram(h) => h.collect(),
        }
    }
}

impl From<Arc<Counter>> for Instrument {
    fn from(c: Arc<Counter>) -> Self {
        Instrument::Counter(c)
    }
}

impl From<Arc<Gauge>> for Instrument {
    fn from(g: Arc<Gauge>) -> Self {
        Instrument::Gauge(g)
    }
}

impl From<Arc<Histogram>> for Instrument {
    fn from(h: Arc<Histogram>) -> Self {
        Instrument::Histogram(h)
    }
}

#[derive(Default)]
struct RegistryInner {
    order: Vec<Instrument>,
    index: HashMap<String, usize>,
}

#[derive(Default)]
pub struct Registry {
    inner: RwLock<RegistryInner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instrument and hand back its typed handle.
    ///
    /// Fails with `DuplicateName` if the name is taken; the registered
    /// instrument is left untouched in that case.
    pub fn register<T>(&self, instrument: Arc<T>) -> Result<Arc<T>>
    where
        Arc<T>: Into<Instrument>,
    {
        let handle = Arc::clone(&instrument);
        let instrument: Instrument = instrument.into();
        let name = instrument.name().to_string();

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.index.contains_key(&name) {
            return Err(PulseError::DuplicateName(name));
        }
        let pos = inner.order.len();
        inner.order.push(instrument);
        inner.index.insert(name.clone(), pos);
        drop(inner);

        tracing::debug!(instrument = %name, "instrument registered");
        Ok(handle)
    }

    pub fn lookup(&self, name: &str) -> Option<Instrument> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.index.get(name).map(|&i| inner.order[i].clone())
    }

    pub fn counter(&self, name: &str) -> Result<Arc<Counter>> {
        let i = self.require(name)?;
        i.as_counter().cloned().ok_or_else(|| kind_mismatch(&i, Kind::Counter))
    }

    pub fn gauge(&self, name: &str) -> Result<Arc<Gauge>> {
        let i = self.require(name)?;
        i.as_gauge().cloned().ok_or_else(|| kind_mismatch(&i, Kind::Gauge))
    }

    pub fn histogram(&self, name: &str) -> Result<Arc<Histogram>> {
        let i = self.require(name)?;
        i.as_histogram().cloned().ok_or_else(|| kind_mismatch(&i, Kind::Histogram))
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot every instrument in registration order.
    ///
    /// Only the handle list is copied under the lock; each instrument is
    /// read as the iterator reaches it, so there is no atomicity across
    /// instruments.
    pub fn collect(&self) -> impl Iterator<Item = Result<MetricFamily>> {
        let handles = self.inner.read().unwrap_or_else(PoisonError::into_inner).order.clone();
        handles.into_iter().map(|i| i.collect())
    }

    fn require(&self, name: &str) -> Result<Instrument> {
        self.lookup(name).ok_or_else(|| PulseError::UnknownInstrument(name.to_string()))
    }
}

fn kind_mismatch(i: &Instrument, expected: Kind) -> PulseError {
    PulseError::KindMismatch {
        name: i.name().to_string(),
        expected: expected.as_str(),
        actual: i.kind().as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn duplicate_name_keeps_first_instrument() {
        let r = Registry::new();
        let first = r.register(Arc::new(Counter::new("dup", "first", &[]).unwrap())).unwrap();
        first.inc_by(&[], 5.0).unwrap();

        let err = r.register(Arc::new(Gauge::new("dup", "second", &[]).unwrap())).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateName);

        let found = r.counter("dup").unwrap();
        assert_eq!(found.desc().help(), "first");
        assert_eq!(found.get(&[]).unwrap(), 5.0);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn typed_lookup_reports_unknown_and_kind() {
        let r = Registry::new();
        r.register(Arc::new(Gauge::new("g", "h", &[]).unwrap())).unwrap();
        assert_eq!(r.counter("g").unwrap_err().code(), ErrorCode::KindMismatch);
        assert_eq!(r.gauge("missing").unwrap_err().code(), ErrorCode::UnknownInstrument);
        assert!(r.gauge("g").is_ok());
        assert!(r.lookup("missing").is_none());
    }

    #[test]
    fn lookup_shares_state_with_handle() {
        let r = Registry::new();
        let h = r.register(Arc::new(Counter::new("c", "h", &["m"]).unwrap())).unwrap();
        r.lookup("c").unwrap().as_counter().unwrap().inc(&[("m", "GET")]).unwrap();
        assert_eq!(h.get(&[("m", "GET")]).unwrap(), 1.0);
    }

    #[test]
    fn collect_follows_registration_order() {
        let r = Registry::new();
        r.register(Arc::new(Gauge::new("zeta", "h", &[]).unwrap())).unwrap();
        r.register(Arc::new(Counter::new("alpha", "h", &[]).unwrap())).unwrap();
        r.register(Arc::new(Histogram::new("mid", "h", &[], &[1.0]).unwrap())).unwrap();
        let names: Vec<String> = r.collect().map(|f| f.unwrap().name).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }
}
