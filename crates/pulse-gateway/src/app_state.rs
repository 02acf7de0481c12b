//! Shared application state for the pulse service.
//!
//! Owns the metrics registry explicitly: it is created here, populated once
//! with the process and application instruments, and shared by `Arc` with
//! handlers, middleware and the simulator.

use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pulse_core::error::Result;
use pulse_core::metrics::{ProcessMetrics, Registry};

use crate::config::ServiceConfig;
use crate::obs::AppMetrics;
use crate::sim::{CpuSimulator, StressWindow};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServiceConfig,
    registry: Arc<Registry>,
    metrics: Arc<AppMetrics>,
    process: Option<ProcessMetrics>,
    stress: Arc<StressWindow>,
    health_rng: Mutex<StdRng>,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: ServiceConfig) -> Result<Self> {
        let registry = Arc::new(Registry::new());

        // 1) Default process instruments
        let process = if cfg.metrics.process_metrics {
            Some(ProcessMetrics::register(&registry)?)
        } else {
            None
        };

        // 2) Application instruments
        let metrics = Arc::new(AppMetrics::register(&registry, &cfg.metrics.latency_buckets_ms)?);
        metrics.set_healthy(true)?;
        metrics.set_cpu(cfg.simulator.initial_cpu)?;

        tracing::info!(instruments = registry.len(), "metrics registry initialised");

        let health_rng = match cfg.simulator.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                metrics,
                process,
                stress: Arc::new(StressWindow::new()),
                health_rng: Mutex::new(health_rng),
            }),
        })
    }

    pub fn cfg(&self) -> &ServiceConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn metrics(&self) -> &AppMetrics {
        &self.inner.metrics
    }

    pub fn stress(&self) -> &StressWindow {
        &self.inner.stress
    }

    /// Refresh the default process instruments ahead of a scrape.
    pub fn refresh_process(&self) -> Result<()> {
        match &self.inner.process {
            Some(p) => p.refresh(),
            None => Ok(()),
        }
    }

    /// Roll the simulated health check.
    pub fn roll_healthy(&self) -> bool {
        let roll: f64 = self
            .inner
            .health_rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen();
        roll >= self.inner.cfg.health.unhealthy_probability
    }

    /// Simulator wired to this state's instruments and stress window.
    pub fn simulator(&self) -> CpuSimulator {
        CpuSimulator::new(
            self.inner.cfg.simulator.clone(),
            &self.inner.cfg.stress,
            Arc::clone(&self.inner.metrics),
            Arc::clone(&self.inner.stress),
        )
    }
}
