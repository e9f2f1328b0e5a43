//! Simulation time model.
//!
//! # Design
//!
//! Time is an absolute count of simulated **milliseconds** held in a `u64`.
//! Using an integer as the canonical unit means event-queue keys have a total
//! order, schedule arithmetic is exact, and equal-time events tie-break
//! deterministically — none of which hold for `f64` timestamps.
//!
//! Millisecond resolution is fine enough for everything the simulator
//! computes from time (travel legs of seconds to minutes, per-second metric
//! windows, sub-second radio serialization delays) while keeping a u64 good
//! for ~584 million simulated years.

use std::fmt;
use std::ops::{Add, Sub};

/// An absolute simulation timestamp, in milliseconds since the run started.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// One millisecond — the smallest representable step.
    pub const MILLI: SimTime = SimTime(1);

    #[inline]
    pub fn from_millis(ms: u64) -> SimTime {
        SimTime(ms)
    }

    #[inline]
    pub fn from_secs(secs: u64) -> SimTime {
        SimTime(secs * 1_000)
    }

    /// Convert from fractional seconds, rounding to the nearest millisecond.
    /// Negative inputs clamp to zero.
    #[inline]
    pub fn from_secs_f64(secs: f64) -> SimTime {
        SimTime((secs.max(0.0) * 1_000.0).round() as u64)
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// Elapsed time from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(earlier.0))
    }
}

impl Add for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: SimTime) -> SimTime {
        SimTime(self.0 + rhs.0)
    }
}

impl Sub for SimTime {
    type Output = SimTime;
    #[inline]
    fn sub(self, rhs: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.as_secs_f64())
    }
}
