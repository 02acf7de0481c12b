//! Prometheus text exposition (format 0.0.4).
//!
//! Rendering is a pure read over `Registry::collect`. An instrument that
//! cannot be rendered is replaced by a `# StructuralFault` comment and the
//! rest of the registry is still written.

use std::fmt::Write;

use crate::error::{PulseError, Result};
use crate::metrics::registry::Registry;
use crate::metrics::snapshot::{MetricFamily, SeriesValue};

/// Content type of the scrape response.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render every registered instrument.
pub fn encode(registry: &Registry) -> String {
    encode_families(registry.collect())
}

/// Render an already-collected sequence of families.
pub fn encode_families(families: impl IntoIterator<Item = Result<MetricFamily>>) -> String {
    let mut out = String::new();
    for family in families {
        match family {
            Ok(f) => render_family(&f, &mut out),
            Err(PulseError::StructuralFault { name, reason }) => {
                tracing::warn!(instrument = %name, %reason, "skipping instrument in exposition");
                let _ = writeln!(out, "# StructuralFault {}: {}", name, escape_help(&reason));
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping instrument in exposition");
                let _ = writeln!(out, "# StructuralFault: {}", escape_help(&e.to_string()));
            }
        }
    }
    out
}

fn render_family(f: &MetricFamily, out: &mut String) {
    let _ = writeln!(out, "# HELP {} {}", f.name, escape_help(&f.help));
    let _ = writeln!(out, "# TYPE {} {}", f.name, f.kind.as_str());

    for s in &f.series {
        let labels = label_pairs(&f.label_names, &s.label_values);
        match &s.value {
            SeriesValue::Scalar(v) => {
                let _ = writeln!(out, "{}{} {}", f.name, braced(&labels), format_value(*v));
            }
            SeriesValue::Histogram(h) => {
                let prefix = if labels.is_empty() { String::new() } else { format!("{labels},") };
                for (le, count) in &h.buckets {
                    let _ = writeln!(
                        out,
                        "{}_bucket{{{}le=\"{}\"}} {}",
                        f.name,
                        prefix,
                        format_value(*le),
                        count
                    );
                }
                let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", f.name, prefix, h.count);
                let _ = writeln!(out, "{}_sum{} {}", f.name, braced(&labels), format_value(h.sum));
                let _ = writeln!(out, "{}_count{} {}", f.name, braced(&labels), h.count);
            }
        }
    }
}

fn label_pairs(names: &[String], values: &[String]) -> String {
    names
        .iter()
        .zip(values)
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn braced(labels: &str) -> String {
    if labels.is_empty() {
        String::new()
    } else {
        format!("{{{labels}}}")
    }
}

/// Format a sample value so it parses as a float literal.
///
/// Integral values print without fraction or exponent; other finite values
/// use the shortest representation that round-trips.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else if v == 0.0 {
        // also folds -0
        "0".to_string()
    } else {
        v.to_string()
    }
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}
