//! Clock providers for the default timing aggregator
//!
//! The aggregator only needs `now()` in seconds, monotonic within a session.
//! The host decides where time comes from: [`MonotonicClock`] for real runs,
//! [`ManualClock`] when the caller drives time explicitly.

use std::cell::Cell;
use std::time::Instant;

/// Source of monotonic time in seconds
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall clock backed by [`Instant`], counting seconds since creation
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock whose time only changes when told to
///
/// # Example
/// ```
/// use moonwatch::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1.0);
/// clock.advance(0.25);
/// assert_eq!(clock.now(), 1.25);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    time: Cell<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            time: Cell::new(start),
        }
    }

    pub fn set(&self, time: f64) {
        self.time.set(time);
    }

    pub fn advance(&self, seconds: f64) {
        self.time.set(self.time.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.time.get()
    }
}
