//! Monotonic interval measurement.
//!
//! Intervals are taken from [`Instant`], never from calendar time, so clock
//! adjustments during a run cannot produce negative or inflated samples.

use std::time::{Duration, Instant};

/// Mark the beginning of a unit of work.
#[inline]
pub fn start() -> Instant {
    Instant::now()
}

/// Time elapsed since `since`.
#[inline]
pub fn elapsed(since: Instant) -> Duration {
    since.elapsed()
}

/// Whole nanoseconds in `d`, saturating at `u64::MAX`.
#[inline]
pub fn as_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
