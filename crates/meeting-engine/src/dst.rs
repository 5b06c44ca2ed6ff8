//! DST transition policies for wall-clock preferred windows.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// How far past a nonexistent local time to look for the end of a DST gap.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// Policy for window boundaries that fall in a spring-forward gap.
///
/// Ambiguous fall-back times always resolve to the earlier instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Drop the window for that day (e.g., 02:30 during spring forward).
    Skip,
    /// Use the first valid instant after the gap.
    #[default]
    ShiftForward,
}

/// Resolve a wall-clock time on `date` in `tz` to a UTC instant.
///
/// Returns `None` only when the time is nonexistent and `policy` is `Skip`.
pub fn resolve_local(
    tz: &Tz,
    date: NaiveDate,
    time: NaiveTime,
    policy: DstPolicy,
) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::new(date, time);

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => match policy {
            DstPolicy::Skip => None,
            DstPolicy::ShiftForward => first_instant_after_gap(tz, naive),
        },
    }
}

fn first_instant_after_gap(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    (1..=MAX_GAP_MINUTES).find_map(|minutes| {
        tz.from_local_datetime(&(naive + Duration::minutes(minutes)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}
