//! Default process instruments.
//!
//! Registered through `Registry::register` like any other instrument; the
//! scrape path calls `refresh` to update the dynamic ones. Readings come from
//! `/proc` and stay at 0 on other platforms.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;
use crate::metrics::counter::Counter;
use crate::metrics::gauge::Gauge;
use crate::metrics::registry::Registry;

#[derive(Debug)]
pub struct ProcessMetrics {
    cpu_user: Arc<Counter>,
    cpu_system: Arc<Counter>,
    cpu_total: Arc<Counter>,
    resident_memory: Arc<Gauge>,
    virtual_memory: Arc<Gauge>,
    open_fds: Arc<Gauge>,
    max_fds: Arc<Gauge>,
    // serialises counter catch-up so concurrent scrapes never add a delta twice
    refresh_lock: Mutex<()>,
}

impl ProcessMetrics {
    pub fn register(registry: &Registry) -> Result<Self> {
        let start_time = registry.register(Arc::new(Gauge::new(
            "process_start_time_seconds",
            "Start time of the process since unix epoch in seconds.",
            &[],
        )?))?;
        let cpu_user = registry.register(Arc::new(Counter::new(
            "process_cpu_user_seconds_total",
            "Total user CPU time spent in seconds.",
            &[],
        )?))?;
        let cpu_system = registry.register(Arc::new(Counter::new(
            "process_cpu_system_seconds_total",
            "Total system CPU time spent in seconds.",
            &[],
        )?))?;
        let cpu_total = registry.register(Arc::new(Counter::new(
            "process_cpu_seconds_total",
            "Total user and system CPU time spent in seconds.",
            &[],
        )?))?;
        let resident_memory = registry.register(Arc::new(Gauge::new(
            "process_resident_memory_bytes",
            "Resident memory size in bytes.",
            &[],
        )?))?;
        let virtual_memory = registry.register(Arc::new(Gauge::new(
            "process_virtual_memory_bytes",
            "Virtual memory size in bytes.",
            &[],
        )?))?;
        let open_fds = registry.register(Arc::new(Gauge::new(
            "process_open_fds",
            "Number of open file descriptors.",
            &[],
        )?))?;
        let max_fds = registry.register(Arc::new(Gauge::new(
            "process_max_fds",
            "Maximum number of open file descriptors.",
            &[],
        )?))?;

        let epoch_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64().floor())
            .unwrap_or(0.0);
        start_time.set(&[], epoch_secs)?;

        let pm = Self {
            cpu_user,
            cpu_system,
            cpu_total,
            resident_memory,
            virtual_memory,
            open_fds,
            max_fds,
            refresh_lock: Mutex::new(()),
        };
        pm.refresh()?;
        Ok(pm)
    }

    /// Update CPU time, memory and file descriptor readings.
    pub fn refresh(&self) -> Result<()> {
        let _guard = self.refresh_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some((user, system)) = proc::cpu_seconds() {
            catch_up(&self.cpu_user, user)?;
            catch_up(&self.cpu_system, system)?;
            catch_up(&self.cpu_total, user + system)?;
        }
        if let Some(mem) = proc::memory_bytes() {
            self.resident_memory.set(&[], mem.resident)?;
            self.virtual_memory.set(&[], mem.virtual_size)?;
        }
        if let Some(fds) = proc::open_fds() {
            self.open_fds.set(&[], fds)?;
        }
        if let Some(max) = proc::max_fds() {
            self.max_fds.set(&[], max)?;
        }
        Ok(())
    }
}

/// Advance a label-free counter to `total`; never moves it backwards.
fn catch_up(counter: &Counter, total: f64) -> Result<()> {
    let delta = total - counter.get(&[])?;
    if delta > 0.0 {
        counter.inc_by(&[], delta)?;
    }
    Ok(())
}

#[cfg(target_os = "linux")]
mod proc {
    use std::fs;

    /// Kernel USER_HZ: `/proc` reports CPU time in 1/100 s.
    const USER_HZ: f64 = 100.0;

    pub(super) struct Memory {
        pub(super) resident: f64,
        pub(super) virtual_size: f64,
    }

    /// `(utime, stime)` in seconds from `/proc/self/stat`.
    pub(super) fn cpu_seconds() -> Option<(f64, f64)> {
        let stat = fs::read_to_string("/proc/self/stat").ok()?;
        parse_stat(&stat)
    }

    pub(super) fn parse_stat(stat: &str) -> Option<(f64, f64)> {
        // comm may contain spaces and parens; fields resume after the last ')'
        let rest = &stat[stat.rfind(')')? + 1..];
        let mut fields = rest.split_whitespace();
        // rest starts at field 3 (state); utime and stime are fields 14 and 15
        let utime: f64 = fields.nth(11)?.parse().ok()?;
        let stime: f64 = fields.next()?.parse().ok()?;
        Some((utime / USER_HZ, stime / USER_HZ))
    }

    pub(super) fn memory_bytes() -> Option<Memory> {
        let status = fs::read_to_string("/proc/self/status").ok()?;
        Some(Memory {
            resident: kib_field(&status, "VmRSS:")?,
            virtual_size: kib_field(&status, "VmSize:")?,
        })
    }

    pub(super) fn kib_field(status: &str, key: &str) -> Option<f64> {
        let line = status.lines().find(|l| l.starts_with(key))?;
        // "VmRSS:    1234 kB"
        let kib: f64 = line.split_whitespace().nth(1)?.parse().ok()?;
        Some(kib * 1024.0)
    }

    pub(super) fn open_fds() -> Option<f64> {
        let dir = fs::read_dir("/proc/self/fd").ok()?;
        Some(dir.count() as f64)
    }

    pub(super) fn max_fds() -> Option<f64> {
        let limits = fs::read_to_string("/proc/self/limits").ok()?;
        parse_max_fds(&limits)
    }

    /// Soft limit from the "Max open files" row.
    pub(super) fn parse_max_fds(limits: &str) -> Option<f64> {
        let line = limits.lines().find(|l| l.starts_with("Max open files"))?;
        line.split_whitespace().nth(3)?.parse().ok()
    }
}

#[cfg(not(target_os = "linux"))]
mod proc {
    pub(super) struct Memory {
        pub(super) resident: f64,
        pub(super) virtual_size: f64,
    }

    pub(super) fn cpu_seconds() -> Option<(f64, f64)> {
        None
    }

    pub(super) fn memory_bytes() -> Option<Memory> {
        None
    }

    pub(super) fn open_fds() -> Option<f64> {
        None
    }

    pub(super) fn max_fds() -> Option<f64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 8] = [
        "process_start_time_seconds",
        "process_cpu_user_seconds_total",
        "process_cpu_system_seconds_total",
        "process_cpu_seconds_total",
        "process_resident_memory_bytes",
        "process_virtual_memory_bytes",
        "process_open_fds",
        "process_max_fds",
    ];

    #[test]
    fn registers_and_refreshes() {
        let r = Registry::new();
        let pm = ProcessMetrics::register(&r).unwrap();
        let names: Vec<String> = r.collect().map(|f| f.unwrap().name).collect();
        assert_eq!(names, NAMES);
        assert!(r.gauge("process_start_time_seconds").unwrap().get(&[]).unwrap() > 0.0);

        let total_before = r.counter("process_cpu_seconds_total").unwrap().get(&[]).unwrap();
        pm.refresh().unwrap();
        let total_after = r.counter("process_cpu_seconds_total").unwrap().get(&[]).unwrap();
        assert!(total_after >= total_before);

        #[cfg(target_os = "linux")]
        {
            let gauge = |n: &str| r.gauge(n).unwrap().get(&[]).unwrap();
            assert!(gauge("process_resident_memory_bytes") > 0.0);
            let rss = gauge("process_resident_memory_bytes");
            assert!(gauge("process_virtual_memory_bytes") >= rss);
            assert!(gauge("process_open_fds") > 0.0);
            assert!(gauge("process_max_fds") >= gauge("process_open_fds"));

            let counter = |n: &str| r.counter(n).unwrap().get(&[]).unwrap();
            let sum = counter("process_cpu_user_seconds_total")
                + counter("process_cpu_system_seconds_total");
            assert!((counter("process_cpu_seconds_total") - sum).abs() < 1e-9);
        }
    }

    #[test]
    fn catch_up_only_moves_forward() {
        let c = Counter::new("cpu_total", "h", &[]).unwrap();
        catch_up(&c, 1.5).unwrap();
        catch_up(&c, 1.0).unwrap();
        assert_eq!(c.get(&[]).unwrap(), 1.5);
        catch_up(&c, 2.25).unwrap();
        assert_eq!(c.get(&[]).unwrap(), 2.25);
    }

    #[test]
    fn second_registration_is_a_duplicate() {
        let r = Registry::new();
        ProcessMetrics::register(&r).unwrap();
        assert!(ProcessMetrics::register(&r).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn parses_proc_files() {
        let stat = "4242 (my (odd) name) S 1 4242 4242 0 -1 4194560 \
                    1000 0 0 0 250 75 0 0 20 0 8 0 12345 1000000 500";
        assert_eq!(proc::parse_stat(stat), Some((2.5, 0.75)));

        let status = "Name:\tpulse\nVmSize:\t  20480 kB\nVmRSS:\t    1024 kB\n";
        assert_eq!(proc::kib_field(status, "VmSize:"), Some(20480.0 * 1024.0));
        assert_eq!(proc::kib_field(status, "VmRSS:"), Some(1024.0 * 1024.0));

        let limits = "Limit            Soft Limit  Hard Limit  Units\n\
                      Max open files   1024        1048576     files\n";
        assert_eq!(proc::parse_max_fds(limits), Some(1024.0));
    }
}
