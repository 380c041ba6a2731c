use crate::clock;
use crate::constants::NANOS_PER_MILLI;
use std::time::Duration;

/// Running min/max/total/count over a sequence of measured durations.
///
/// `record` consumes the accumulator and returns the next state, so a driver
/// threads one value through its loop instead of mutating shared counters.
///
/// Only strictly positive samples can become the new min or max. A sample of
/// exactly zero still counts towards `count` and `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    count: u64,
    total_nanos: u64,
    min_nanos: u64,
    max_nanos: u64,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyStats {
    pub const fn new() -> Self {
        LatencyStats {
            count: 0,
            total_nanos: 0,
            min_nanos: u64::MAX,
            max_nanos: 0,
        }
    }

    #[must_use]
    pub fn record(self, d: Duration) -> Self {
        let nanos = clock::as_nanos(d);
        let mut next = LatencyStats {
            count: self.count + 1,
            total_nanos: self.total_nanos.saturating_add(nanos),
            ..self
        };

        if nanos > 0 {
            if nanos > next.max_nanos {
                next.max_nanos = nanos;
            }
            if nanos < next.min_nanos {
                next.min_nanos = nanos;
            }
        }
        next
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Truncating mean in nanoseconds; zero when nothing was recorded.
    pub fn average_nanos(&self) -> u64 {
        if self.count == 0 {
            return 0;
        }
        self.total_nanos / self.count
    }

    pub fn average(&self) -> Duration {
        Duration::from_nanos(self.average_nanos())
    }

    pub fn report(&self) -> LatencyReport {
        LatencyReport {
            count: self.count,
            total_nanos: self.total_nanos,
            min_nanos: (self.min_nanos != u64::MAX).then_some(self.min_nanos),
            max_nanos: self.max_nanos,
        }
    }
}

impl FromIterator<Duration> for LatencyStats {
    fn from_iter<I: IntoIterator<Item = Duration>>(iter: I) -> Self {
        iter.into_iter().fold(LatencyStats::new(), LatencyStats::record)
    }
}

/// Aggregated result of one benchmark phase.
///
/// `min_nanos` is `None` until a positive sample has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyReport {
    pub count: u64,
    pub total_nanos: u64,
    pub min_nanos: Option<u64>,
    pub max_nanos: u64,
}

impl LatencyReport {
    pub fn average_nanos(&self) -> u64 {
        if self.count == 0 {
            return 0;
        }
        self.total_nanos / self.count
    }
}

/// Whole milliseconds in a nanosecond value (truncating).
#[inline]
pub fn nanos_to_millis(nanos: u64) -> u64 {
    nanos / NANOS_PER_MILLI
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(n: u64) -> Duration {
        Duration::from_nanos(n)
    }

    #[test]
    fn new_reports_nothing_recorded() {
        let stats = LatencyStats::new();
        let report = stats.report();

        assert_eq!(report.count, 0);
        assert_eq!(report.total_nanos, 0);
        assert_eq!(report.min_nanos, None);
        assert_eq!(report.max_nanos, 0);
        assert_eq!(report.average_nanos(), 0);
        assert_eq!(stats.average(), Duration::ZERO);
    }

    #[test]
    fn record_single_sample() {
        let report = LatencyStats::new().record(ns(500)).report();

        assert_eq!(report.count, 1);
        assert_eq!(report.total_nanos, 500);
        assert_eq!(report.min_nanos, Some(500));
        assert_eq!(report.max_nanos, 500);
        assert_eq!(report.average_nanos(), 500);
    }

    #[test]
    fn record_tracks_min_max_and_truncating_average() {
        let stats: LatencyStats = [ns(10), ns(3), ns(8)].into_iter().collect();
        let report = stats.report();

        assert_eq!(report.count, 3);
        assert_eq!(report.total_nanos, 21);
        assert_eq!(report.min_nanos, Some(3));
        assert_eq!(report.max_nanos, 10);
        assert_eq!(report.average_nanos(), 7);

        let uneven: LatencyStats = [ns(1), ns(2)].into_iter().collect();
        assert_eq!(uneven.average_nanos(), 1);
    }

    #[test]
    fn zero_sample_counts_but_never_sets_min_or_max() {
        let stats = LatencyStats::new().record(ns(40)).record(Duration::ZERO);
        let report = stats.report();

        assert_eq!(report.count, 2);
        assert_eq!(report.total_nanos, 40);
        assert_eq!(report.min_nanos, Some(40));
        assert_eq!(report.max_nanos, 40);
        assert_eq!(report.average_nanos(), 20);
    }

    #[test]
    fn only_zero_samples_leave_min_undefined() {
        let report = LatencyStats::new()
            .record(Duration::ZERO)
            .record(Duration::ZERO)
            .report();

        assert_eq!(report.count, 2);
        assert_eq!(report.min_nanos, None);
        assert_eq!(report.max_nanos, 0);
        assert_eq!(report.average_nanos(), 0);
    }

    #[test]
    fn record_leaves_previous_state_untouched() {
        let before = LatencyStats::new().record(ns(7));
        let after = before.record(ns(9));

        assert_eq!(before.count(), 1);
        assert_eq!(after.count(), 2);
    }

    #[test]
    fn min_never_exceeds_max() {
        let samples = [5, 1_000, 1, 0, 77, 3_000_000, 2];
        let report = samples
            .iter()
            .map(|&n| ns(n))
            .collect::<LatencyStats>()
            .report();

        let min = report.min_nanos.expect("positive samples recorded");
        assert!(min <= report.max_nanos);
        assert_eq!(min, 1);
        assert_eq!(report.max_nanos, 3_000_000);
    }

    #[test]
    fn millis_truncate() {
        assert_eq!(nanos_to_millis(999_999), 0);
        assert_eq!(nanos_to_millis(1_000_000), 1);
        assert_eq!(nanos_to_millis(2_999_999), 2);
    }
}
