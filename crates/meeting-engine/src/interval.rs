//! Half-open time intervals shared by events, slots and free/busy blocks.
//!
//! Every interval is `[start, end)`: two intervals that merely touch (one ends
//! exactly when the other starts) do not overlap.

use chrono::{DateTime, Utc};

/// Anything occupying a `[start, end)` span of time.
pub trait Interval {
    fn start(&self) -> DateTime<Utc>;

    fn end(&self) -> DateTime<Utc>;

    /// Whether this interval overlaps `[start, end)`.
    fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        overlaps(self.start(), self.end(), start, end)
    }

    /// Whether `[start, end)` lies entirely inside this interval.
    fn contains(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start() <= start && end <= self.end()
    }

    fn duration_minutes(&self) -> i64 {
        (self.end() - self.start()).num_minutes()
    }
}

impl Interval for (DateTime<Utc>, DateTime<Utc>) {
    fn start(&self) -> DateTime<Utc> {
        self.0
    }

    fn end(&self) -> DateTime<Utc> {
        self.1
    }
}

/// Two intervals overlap iff `a_start < b_end && a_end > b_start`.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Minutes shared by two intervals, or 0 when they do not overlap.
pub fn overlap_minutes(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> i64 {
    if !overlaps(a_start, a_end, b_start, b_end) {
        return 0;
    }
    (a_end.min(b_end) - a_start.max(b_start)).num_minutes()
}
