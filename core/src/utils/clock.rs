//! Logical time sources
//!
//! Registration timestamps come from the execution environment, never from
//! the caller. [`Clock`] abstracts that source so tests can drive time by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use chrono::Utc;

/// Source of `registeredTimestamp` values
pub trait Clock: Send + Sync {
    /// Current time as an epoch-like counter
    fn now(&self) -> u64;
}

/// Wall clock in seconds since the UNIX epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        Utc::now().timestamp().max(0) as u64
    }
}

/// Hand-driven clock
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading `start`
    pub fn new(start: u64) -> Self {
        ManualClock { now: AtomicU64::new(start) }
    }

    /// Set the reading, including backwards
    pub fn set(&self, value: u64) {
        self.now.store(value, Ordering::SeqCst);
    }

    /// Move the reading forward by `delta`
    pub fn advance(&self, delta: u64) -> u64 {
        self.now.fetch_add(delta, Ordering::SeqCst) + delta
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
