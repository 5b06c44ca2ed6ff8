use chrono::{NaiveDate, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use meeting_engine::{
    suggest_meetings, AvailabilityMap, AvailabilityStatus, DateRange, ScoringWeights,
    SuggestionOptions, SuggestionRequest, TimeSlot, TimeWindow,
};

fn month_of_availability(attendees: &[String]) -> AvailabilityMap {
    let mut map = AvailabilityMap::new();
    for (i, attendee) in attendees.iter().enumerate() {
        let mut intervals = Vec::new();
        for day in 1..=31 {
            let busy_hour = 9 + (day + i as u32) % 8;
            let start = Utc.with_ymd_and_hms(2026, 3, day, busy_hour, 0, 0).unwrap();
            let end = Utc.with_ymd_and_hms(2026, 3, day, busy_hour + 1, 0, 0).unwrap();
            if let Ok(slot) = TimeSlot::new(start, end, AvailabilityStatus::Busy) {
                intervals.push(slot);
            }
            let open_start = Utc.with_ymd_and_hms(2026, 3, day, 8, 0, 0).unwrap();
            let open_end = Utc.with_ymd_and_hms(2026, 3, day, 18, 0, 0).unwrap();
            if let Ok(slot) = TimeSlot::new(open_start, open_end, AvailabilityStatus::Available) {
                intervals.push(slot);
            }
        }
        map.insert(attendee.clone(), intervals);
    }
    map
}

fn bench_suggest_month(c: &mut Criterion) {
    let attendees: Vec<String> = (0..8).map(|i| format!("person{}@example.com", i)).collect();
    let availability = month_of_availability(&attendees);
    let request = SuggestionRequest::new(
        45,
        attendees,
        vec![
            TimeWindow::parse("09:00", "12:00").unwrap(),
            TimeWindow::parse("13:00", "17:00").unwrap(),
        ],
        DateRange::new(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        )
        .unwrap(),
    )
    .with_options(SuggestionOptions {
        exclude_conflicts: false,
        ..SuggestionOptions::default()
    });
    let weights = ScoringWeights::default();
    let now = Utc.with_ymd_and_hms(2026, 2, 27, 9, 0, 0).unwrap();

    c.bench_function("suggest_month_8_attendees", |b| {
        b.iter(|| {
            suggest_meetings(
                black_box(&request),
                black_box(&availability),
                &weights,
                now,
            )
        })
    });
}

criterion_group!(benches, bench_suggest_month);
criterion_main!(benches);
