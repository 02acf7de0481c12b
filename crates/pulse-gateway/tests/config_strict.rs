#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use pulse_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
server:
  listen: "0.0.0.0:3000"
simulator:
  intervl_ms: 1000 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.listen, "0.0.0.0:3000");
    assert_eq!(cfg.simulator.interval_ms, 5000);
    assert_eq!(cfg.stress.duration_ms, 60_000);
    assert_eq!(cfg.health.unhealthy_probability, 0.1);
    assert_eq!(
        cfg.metrics.latency_buckets_ms,
        [50.0, 100.0, 200.0, 300.0, 400.0, 500.0, 1000.0, 2000.0, 5000.0]
    );
    assert!(cfg.metrics.process_metrics);
}

#[test]
fn ok_full_config() {
    let ok = r#"
version: 1
server:
  listen: "127.0.0.1:9000"
simulator:
  interval_ms: 250
  initial_cpu: 10
  spike_probability: 0.5
  normal_min: 5
  normal_max: 15
  spike_min: 90
  spike_max: 99
  seed: 42
stress:
  cpu_percent: 95
  duration_ms: 1000
  baseline_cpu: 10
health:
  unhealthy_probability: 0
metrics:
  latency_buckets_ms: [1, 10, 100]
  process_metrics: false
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.simulator.seed, Some(42));
    assert_eq!(cfg.stress.cpu_percent, 95.0);
    assert_eq!(cfg.metrics.latency_buckets_ms, [1.0, 10.0, 100.0]);
    assert!(!cfg.metrics.process_metrics);
}

#[test]
fn unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn range_checks() {
    for bad in [
        "version: 1\nsimulator: { interval_ms: 10 }\n",
        "version: 1\nsimulator: { spike_probability: 1.5 }\n",
        "version: 1\nsimulator: { normal_min: 50, normal_max: 20 }\n",
        "version: 1\nsimulator: { spike_min: 85, spike_max: 85 }\n",
        "version: 1\nsimulator: { normal_min: -1.0e308, normal_max: 1.0e308 }\n",
        "version: 1\nsimulator: { spike_min: -1.7e308, spike_max: 1.7e308 }\n",
        "version: 1\nsimulator: { spike_max: .inf }\n",
        "version: 1\nsimulator: { normal_min: .nan }\n",
        "version: 1\nsimulator: { initial_cpu: .inf }\n",
        "version: 1\nstress: { cpu_percent: .nan }\n",
        "version: 1\nmetrics: { latency_buckets_ms: [100, .inf] }\n",
        "version: 1\nstress: { duration_ms: 0 }\n",
        "version: 1\nhealth: { unhealthy_probability: -0.1 }\n",
        "version: 1\nmetrics: { latency_buckets_ms: [] }\n",
        "version: 1\nmetrics: { latency_buckets_ms: [100, 50] }\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.code().as_str(), "BAD_REQUEST", "{bad}");
    }
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let cfg = config::load_or_default("/nonexistent/pulse.yaml").expect("defaults");
    assert_eq!(cfg.server.listen, "0.0.0.0:3000");
    assert!(config::load_from_file("/nonexistent/pulse.yaml").is_err());
}
