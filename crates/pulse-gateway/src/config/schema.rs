use serde::Deserialize;
use pulse_core::error::{PulseError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub simulator: SimulatorSection,

    #[serde(default)]
    pub stress: StressSection,

    #[serde(default)]
    pub health: HealthSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            simulator: SimulatorSection::default(),
            stress: StressSection::default(),
            health: HealthSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PulseError::UnsupportedVersion);
        }

        self.simulator.validate()?;
        self.stress.validate()?;
        self.health.validate()?;
        self.metrics.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}

/// Background CPU simulator.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorSection {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_initial_cpu")]
    pub initial_cpu: f64,
    #[serde(default = "default_spike_probability")]
    pub spike_probability: f64,
    #[serde(default = "default_normal_min")]
    pub normal_min: f64,
    #[serde(default = "default_normal_max")]
    pub normal_max: f64,
    #[serde(default = "default_spike_min")]
    pub spike_min: f64,
    #[serde(default = "default_spike_max")]
    pub spike_max: f64,
    /// Fixed RNG seed; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulatorSection {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            initial_cpu: default_initial_cpu(),
            spike_probability: default_spike_probability(),
            normal_min: default_normal_min(),
            normal_max: default_normal_max(),
            spike_min: default_spike_min(),
            spike_max: default_spike_max(),
            seed: None,
        }
    }
}

impl SimulatorSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=600_000).contains(&self.interval_ms) {
            return Err(PulseError::BadRequest(
                "simulator.interval_ms must be between 100 and 600000".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.spike_probability) {
            return Err(PulseError::BadRequest(
                "simulator.spike_probability must be between 0 and 1".into(),
            ));
        }
        if !self.initial_cpu.is_finite() {
            return Err(PulseError::BadRequest("simulator.initial_cpu must be finite".into()));
        }
        check_band("normal", self.normal_min, self.normal_max)?;
        check_band("spike", self.spike_min, self.spike_max)?;
        Ok(())
    }
}

/// A sampling band must be finite, non-empty, and have a finite width.
fn check_band(band: &str, min: f64, max: f64) -> Result<()> {
    if !min.is_finite() || !max.is_finite() || !(max - min).is_finite() {
        return Err(PulseError::BadRequest(format!(
            "simulator.{band}_min and {band}_max must be finite with a finite width"
        )));
    }
    if !(min < max) {
        return Err(PulseError::BadRequest(format!(
            "simulator.{band}_max must be greater than {band}_min"
        )));
    }
    Ok(())
}

fn default_interval_ms() -> u64 {
    5000
}
fn default_initial_cpu() -> f64 {
    30.0
}
fn default_spike_probability() -> f64 {
    0.2
}
fn default_normal_min() -> f64 {
    20.0
}
fn default_normal_max() -> f64 {
    50.0
}
fn default_spike_min() -> f64 {
    60.0
}
fn default_spike_max() -> f64 {
    85.0
}

/// `/stress` behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StressSection {
    #[serde(default = "default_stress_cpu")]
    pub cpu_percent: f64,
    #[serde(default = "default_stress_duration_ms")]
    pub duration_ms: u64,
    #[serde(default = "default_baseline_cpu")]
    pub baseline_cpu: f64,
}

impl Default for StressSection {
    fn default() -> Self {
        Self {
            cpu_percent: default_stress_cpu(),
            duration_ms: default_stress_duration_ms(),
            baseline_cpu: default_baseline_cpu(),
        }
    }
}

impl StressSection {
    pub fn validate(&self) -> Result<()> {
        if !self.cpu_percent.is_finite() || !self.baseline_cpu.is_finite() {
            return Err(PulseError::BadRequest(
                "stress.cpu_percent and stress.baseline_cpu must be finite".into(),
            ));
        }
        if self.duration_ms == 0 {
            return Err(PulseError::BadRequest("stress.duration_ms must be at least 1".into()));
        }
        Ok(())
    }
}

fn default_stress_cpu() -> f64 {
    85.0
}
fn default_stress_duration_ms() -> u64 {
    60_000
}
fn default_baseline_cpu() -> f64 {
    30.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthSection {
    #[serde(default = "default_unhealthy_probability")]
    pub unhealthy_probability: f64,
}

impl Default for HealthSection {
    fn default() -> Self {
        Self { unhealthy_probability: default_unhealthy_probability() }
    }
}

impl HealthSection {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.unhealthy_probability) {
            return Err(PulseError::BadRequest(
                "health.unhealthy_probability must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_unhealthy_probability() -> f64 {
    0.1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default = "default_latency_buckets_ms")]
    pub latency_buckets_ms: Vec<f64>,
    #[serde(default = "default_process_metrics")]
    pub process_metrics: bool,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            latency_buckets_ms: default_latency_buckets_ms(),
            process_metrics: default_process_metrics(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        if self.latency_buckets_ms.is_empty() {
            return Err(PulseError::BadRequest(
                "metrics.latency_buckets_ms must not be empty".into(),
            ));
        }
        if self.latency_buckets_ms.iter().any(|b| !b.is_finite()) {
            return Err(PulseError::BadRequest(
                "metrics.latency_buckets_ms must be finite".into(),
            ));
        }
        if self.latency_buckets_ms.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(PulseError::BadRequest(
                "metrics.latency_buckets_ms must be strictly ascending".into(),
            ));
        }
        Ok(())
    }
}

fn default_latency_buckets_ms() -> Vec<f64> {
    vec![50.0, 100.0, 200.0, 300.0, 400.0, 500.0, 1000.0, 2000.0, 5000.0]
}
fn default_process_metrics() -> bool {
    true
}
