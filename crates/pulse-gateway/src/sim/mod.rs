//! Background CPU load simulator.
//!
//! Runs as an owned tokio task: started once at boot with a
//! `CancellationToken`, stopped by cancelling it and awaiting the join
//! handle. It mutates the CPU gauge through the same API request handlers
//! use. While a `/stress` window is active the simulator leaves the gauge
//! alone; the first tick after the window expires restores the baseline.

pub mod stress;

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use pulse_core::error::Result;

use crate::config::{SimulatorSection, StressSection};
use crate::obs::AppMetrics;

pub use stress::{StressPoll, StressWindow};

pub struct CpuSimulator {
    cfg: SimulatorSection,
    baseline_cpu: f64,
    metrics: Arc<AppMetrics>,
    stress: Arc<StressWindow>,
    rng: StdRng,
}

impl CpuSimulator {
    pub fn new(
        cfg: SimulatorSection,
        stress_cfg: &StressSection,
        metrics: Arc<AppMetrics>,
        stress: Arc<StressWindow>,
    ) -> Self {
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            cfg,
            baseline_cpu: stress_cfg.baseline_cpu,
            metrics,
            stress,
            rng,
        }
    }

    /// One simulation step. The gauge is written while the stress window
    /// is locked so a concurrent `/stress` cannot be overwritten.
    pub fn tick(&mut self) -> Result<()> {
        let Self { cfg, baseline_cpu, metrics, stress, rng } = self;
        stress.poll_with(Instant::now(), |poll| match poll {
            StressPoll::Active => {
                tracing::debug!("stress window active, skipping cpu update");
                Ok(())
            }
            StressPoll::Expired => {
                tracing::info!(cpu = *baseline_cpu, "stress window over, restoring baseline");
                metrics.set_cpu(*baseline_cpu)
            }
            StressPoll::Idle => {
                let cpu = sample_cpu(cfg, rng);
                tracing::debug!(cpu, "simulated cpu usage");
                metrics.set_cpu(cpu)
            }
        })
    }

    /// Start the periodic loop; the first update happens one interval in.
    pub fn spawn(mut self, cancel: CancellationToken) -> JoinHandle<()> {
        let period = Duration::from_millis(self.cfg.interval_ms);
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.tick() {
                            tracing::warn!(error = %e, "cpu simulator update failed");
                        }
                    }
                }
            }
            tracing::info!("cpu simulator stopped");
        })
    }
}

/// Draw a CPU percentage: a spike with `spike_probability`, otherwise a
/// value in the normal band.
pub fn sample_cpu(cfg: &SimulatorSection, rng: &mut impl Rng) -> f64 {
    if rng.gen::<f64>() < cfg.spike_probability {
        rng.gen_range(cfg.spike_min..cfg.spike_max)
    } else {
        rng.gen_range(cfg.normal_min..cfg.normal_max)
    }
}
