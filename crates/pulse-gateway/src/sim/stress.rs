//! Stress window toggled by `/stress` and honoured by the simulator.
//!
//! Both sides write the CPU gauge inside the window's lock, so an
//! activation can never be overwritten by a simulator tick that read the
//! window just before it opened.

use std::sync::{Mutex, PoisonError};

use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StressPoll {
    /// No window open.
    Idle,
    /// Window open; the simulator must not touch the gauge.
    Active,
    /// Window just closed; reported once.
    Expired,
}

#[derive(Debug, Default)]
pub struct StressWindow {
    until: Mutex<Option<Instant>>,
}

impl StressWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or extend) the window for `duration` from now, then run `f`
    /// before the lock is released.
    pub fn activate_with<R>(&self, duration: Duration, f: impl FnOnce() -> R) -> R {
        let mut until = self.until.lock().unwrap_or_else(PoisonError::into_inner);
        *until = Some(Instant::now() + duration);
        f()
    }

    /// Classify the window at `now` and run `f` with the result while the
    /// lock is held. `Expired` is consumed: the next call sees `Idle`.
    pub fn poll_with<R>(&self, now: Instant, f: impl FnOnce(StressPoll) -> R) -> R {
        let mut until = self.until.lock().unwrap_or_else(PoisonError::into_inner);
        let poll = match *until {
            None => StressPoll::Idle,
            Some(t) if now < t => StressPoll::Active,
            Some(_) => {
                *until = None;
                StressPoll::Expired
            }
        };
        f(poll)
    }
}
