// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A clock that provides commit timestamps
pub trait Clock: Clone + Send + Sync {
    /// Milliseconds on a monotonic, non-decreasing timeline
    fn monotonic_ms(&self) -> u64;

    /// Wallclock time as Unix seconds. Informational only, never used
    /// for validation.
    fn wallclock_unix(&self) -> f64;
}

/// Real system clock
#[derive(Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn monotonic_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn wallclock_unix(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    current_ms: Arc<Mutex<u64>>,
    wallclock: Arc<Mutex<f64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current_ms: Arc::new(Mutex::new(0)),
            wallclock: Arc::new(Mutex::new(0.0)),
        }
    }

    /// Advance the monotonic clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current_ms.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration.as_millis() as u64;
    }

    /// Set the monotonic clock to a specific millisecond value
    pub fn set_monotonic_ms(&self, ms: u64) {
        let mut current = self.current_ms.lock().unwrap_or_else(|e| e.into_inner());
        *current = ms;
    }

    /// Set the wallclock to a specific Unix-seconds value
    pub fn set_wallclock_unix(&self, secs: f64) {
        let mut wallclock = self.wallclock.lock().unwrap_or_else(|e| e.into_inner());
        *wallclock = secs;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn monotonic_ms(&self) -> u64 {
        *self.current_ms.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn wallclock_unix(&self) -> f64 {
        *self.wallclock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
