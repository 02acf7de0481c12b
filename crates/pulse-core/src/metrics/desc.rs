//! Immutable instrument identity.

use crate::error::{PulseError, Result};

/// Instrument kind, rendered in the `# TYPE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Counter,
    Gauge,
    Histogram,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Counter => "counter",
            Kind::Gauge => "gauge",
            Kind::Histogram => "histogram",
        }
    }
}

/// Name, help text and declared label names of an instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desc {
    name: String,
    help: String,
    label_names: Vec<String>,
}

impl Desc {
    /// Validate and build a descriptor.
    ///
    /// Metric names follow `[a-zA-Z_:][a-zA-Z0-9_:]*`, label names follow
    /// `[a-zA-Z_][a-zA-Z0-9_]*` and may not use the reserved `__` prefix.
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        if !is_valid_metric_name(name) {
            return Err(PulseError::InvalidDescriptor(format!("invalid metric name: {name:?}")));
        }
        for (i, l) in label_names.iter().enumerate() {
            if !is_valid_label_name(l) {
                return Err(PulseError::InvalidDescriptor(format!(
                    "invalid label name {l:?} on {name}"
                )));
            }
            if label_names[..i].contains(l) {
                return Err(PulseError::InvalidDescriptor(format!(
                    "duplicate label name {l:?} on {name}"
                )));
            }
        }
        Ok(Self {
            name: name.to_string(),
            help: help.to_string(),
            label_names: label_names.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }
}

fn is_valid_metric_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_valid_label_name(s: &str) -> bool {
    if s.starts_with("__") {
        return false;
    }
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
