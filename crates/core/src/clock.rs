// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time, abstracted so tests can control it.
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> Instant;

    /// Whole seconds since the Unix epoch.
    fn epoch_seconds(&self) -> u64;

    /// The 60-bit coordinator timestamp: seconds since the epoch shifted
    /// left by 4 bits, OR'd with a decisecond fraction in the low nibble.
    fn coord_timestamp(&self) -> u64 {
        let seconds = self.epoch_seconds();
        let deciseconds = (self.epoch_millis() / 100) % 10;
        (seconds << 4) | deciseconds
    }

    /// Milliseconds since the Unix epoch; used to derive sub-second precision.
    fn epoch_millis(&self) -> u64;
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_seconds(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
    }

    fn epoch_millis(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

/// Fake clock for testing with controllable time.
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
    epoch_millis: Arc<Mutex<u64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
            epoch_millis: Arc::new(Mutex::new(1_000_000_000)),
        }
    }

    pub fn advance(&self, duration: Duration) {
        *self.current.lock() += duration;
        *self.epoch_millis.lock() += duration.as_millis() as u64;
    }

    pub fn set_epoch_seconds(&self, seconds: u64) {
        *self.epoch_millis.lock() = seconds * 1000;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }

    fn epoch_seconds(&self) -> u64 {
        *self.epoch_millis.lock() / 1000
    }

    fn epoch_millis(&self) -> u64 {
        *self.epoch_millis.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
