//! Tests for candidate slot generation.

use chrono::{DateTime, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use meeting_engine::slots::generate_slots;
use meeting_engine::{
    suggest_meetings, AvailabilityMap, DateRange, DstPolicy, ScoringWeights, SlotGenerator,
    SuggestionOptions, SuggestionRequest, TimeWindow, ValidationError,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

fn at(d: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, hour, min, 0).unwrap()
}

fn window(start: &str, end: &str) -> TimeWindow {
    TimeWindow::parse(start, end).unwrap()
}

fn starts(range: DateRange, windows: &[TimeWindow], minutes: i64, options: &SuggestionOptions) -> Vec<DateTime<Utc>> {
    generate_slots(range, windows, minutes, options)
        .unwrap()
        .into_iter()
        .map(|s| s.start)
        .collect()
}

#[test]
fn duration_equal_to_window_yields_exactly_one_slot() {
    // 2026-03-02 is a Monday.
    let slots = generate_slots(
        DateRange::single_day(day(2)),
        &[window("09:00", "10:00")],
        60,
        &SuggestionOptions::default(),
    )
    .unwrap();

    assert_eq!(slots.len(), 1);
    assert_eq!((slots[0].start, slots[0].end), (at(2, 9, 0), at(2, 10, 0)));
}

#[test]
fn cursor_steps_by_increment_while_meeting_fits() {
    let got = starts(
        DateRange::single_day(day(2)),
        &[window("09:00", "10:00")],
        30,
        &SuggestionOptions::default(),
    );

    assert_eq!(got, vec![at(2, 9, 0), at(2, 9, 15), at(2, 9, 30)]);
}

#[test]
fn custom_increment_is_honoured() {
    let options = SuggestionOptions {
        slot_increment_minutes: 30,
        ..SuggestionOptions::default()
    };

    let got = starts(DateRange::single_day(day(2)), &[window("09:00", "11:00")], 60, &options);

    assert_eq!(got, vec![at(2, 9, 0), at(2, 9, 30), at(2, 10, 0)]);
}

#[test]
fn duration_longer_than_window_yields_nothing() {
    let slots = generate_slots(
        DateRange::single_day(day(2)),
        &[window("09:00", "09:30")],
        45,
        &SuggestionOptions::default(),
    )
    .unwrap();

    assert!(slots.is_empty());
}

#[test]
fn weekends_skipped_unless_included() {
    // 2026-03-06 (Fri) through 2026-03-09 (Mon).
    let range = DateRange::new(day(6), day(9)).unwrap();
    let windows = [window("10:00", "11:00")];

    let weekdays_only = starts(range, &windows, 60, &SuggestionOptions::default());
    assert_eq!(weekdays_only, vec![at(6, 10, 0), at(9, 10, 0)]);

    let options = SuggestionOptions {
        include_weekends: true,
        ..SuggestionOptions::default()
    };
    let all_days = starts(range, &windows, 60, &options);
    assert_eq!(
        all_days,
        vec![at(6, 10, 0), at(7, 10, 0), at(8, 10, 0), at(9, 10, 0)]
    );
}

#[test]
fn preferred_days_filter_weekdays() {
    let options = SuggestionOptions {
        preferred_days: vec![Weekday::Tue, Weekday::Thu],
        ..SuggestionOptions::default()
    };

    let got = starts(
        DateRange::new(day(2), day(6)).unwrap(),
        &[window("10:00", "11:00")],
        60,
        &options,
    );

    assert_eq!(got, vec![at(3, 10, 0), at(5, 10, 0)]);
}

#[test]
fn overlapping_windows_do_not_duplicate_slots() {
    let options = SuggestionOptions {
        slot_increment_minutes: 30,
        ..SuggestionOptions::default()
    };

    let got = starts(
        DateRange::single_day(day(2)),
        &[window("09:00", "10:30"), window("09:30", "11:00")],
        60,
        &options,
    );

    assert_eq!(got, vec![at(2, 9, 0), at(2, 9, 30), at(2, 10, 0)]);
}

#[test]
fn working_hours_discard_slots_outside_nine_to_five() {
    let options = SuggestionOptions {
        consider_working_hours: true,
        slot_increment_minutes: 60,
        ..SuggestionOptions::default()
    };

    let got = starts(
        DateRange::single_day(day(2)),
        &[window("07:00", "19:00")],
        60,
        &options,
    );

    let expected: Vec<DateTime<Utc>> = (9..=16).map(|h| at(2, h, 0)).collect();
    assert_eq!(got, expected);
}

#[test]
fn working_hours_compare_whole_hours() {
    let options = SuggestionOptions {
        consider_working_hours: true,
        slot_increment_minutes: 30,
        ..SuggestionOptions::default()
    };

    // 16:30–17:30 ends in hour 17 and stays; 17:00–18:00 ends in hour 18.
    let late = starts(DateRange::single_day(day(2)), &[window("16:00", "18:00")], 60, &options);
    assert_eq!(late, vec![at(2, 16, 0), at(2, 16, 30)]);

    // 08:30 starts in hour 8.
    let early = starts(DateRange::single_day(day(2)), &[window("08:30", "10:00")], 60, &options);
    assert_eq!(early, vec![at(2, 9, 0)]);
}

#[test]
fn enormous_duration_yields_nothing_instead_of_overflowing() {
    for minutes in [1_000_000_000_000, i64::MAX] {
        let slots = generate_slots(
            DateRange::single_day(day(2)),
            &[window("09:00", "17:00")],
            minutes,
            &SuggestionOptions::default(),
        )
        .unwrap();
        assert!(slots.is_empty(), "{minutes} minutes");
    }
}

#[test]
fn enormous_duration_gives_empty_suggestions() {
    let request = SuggestionRequest::new(
        1_000_000_000_000,
        Vec::new(),
        vec![window("09:00", "17:00")],
        DateRange::single_day(day(2)),
    );

    let suggestions =
        suggest_meetings(&request, &AvailabilityMap::new(), &ScoringWeights::default(), at(1, 9, 0))
            .unwrap();

    assert!(suggestions.is_empty());
}

#[test]
fn generation_is_restartable_and_deterministic() {
    let generator = SlotGenerator::new(
        DateRange::new(day(2), day(13)).unwrap(),
        &[window("09:00", "12:00"), window("13:00", "17:30")],
        45,
        &SuggestionOptions::default(),
    )
    .unwrap();

    let first: Vec<_> = generator.iter().collect();
    let second: Vec<_> = generator.iter().collect();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn windows_are_read_in_the_request_timezone() {
    let options = SuggestionOptions {
        timezone: "America/New_York".parse::<Tz>().unwrap(),
        ..SuggestionOptions::default()
    };

    let got = starts(
        DateRange::single_day(day(2)),
        &[window("09:00", "10:00")],
        60,
        &options,
    );

    // EST is UTC-5 in early March.
    assert_eq!(got, vec![at(2, 14, 0)]);
}

#[test]
fn dst_gap_window_follows_policy() {
    // 2026-03-08 02:00-03:00 does not exist in New York.
    let base = SuggestionOptions {
        include_weekends: true,
        timezone: "America/New_York".parse::<Tz>().unwrap(),
        ..SuggestionOptions::default()
    };
    let windows = [window("02:30", "04:00")];
    let range = DateRange::single_day(day(8));

    let shifted = starts(range, &windows, 60, &base);
    // 03:00 EDT is 07:00 UTC; 04:00 EDT is 08:00 UTC.
    assert_eq!(shifted, vec![at(8, 7, 0)]);

    let skip = SuggestionOptions {
        dst_policy: DstPolicy::Skip,
        ..base
    };
    assert!(starts(range, &windows, 60, &skip).is_empty());
}

#[test]
fn non_positive_duration_rejected() {
    let err = SlotGenerator::new(
        DateRange::single_day(day(2)),
        &[window("09:00", "10:00")],
        0,
        &SuggestionOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err, ValidationError::NonPositiveDuration(0));
}

#[test]
fn inverted_window_rejected() {
    assert!(matches!(
        TimeWindow::parse("10:00", "09:00"),
        Err(ValidationError::InvalidWindow { .. })
    ));
    assert!(matches!(
        TimeWindow::parse("9am", "10:00"),
        Err(ValidationError::InvalidTime(_))
    ));
}

#[test]
fn inverted_date_range_rejected() {
    assert!(matches!(
        DateRange::new(day(5), day(2)),
        Err(ValidationError::InvalidDateRange { .. })
    ));
}
