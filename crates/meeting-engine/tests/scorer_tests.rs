//! Tests for suggestion scoring, reasons and ranking.

use chrono::{DateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use meeting_engine::availability::SlotAvailability;
use meeting_engine::scorer::{day_of_week_score, rank, time_of_day_score};
use meeting_engine::{
    AvailabilityStatus, MeetingSuggestion, ScoringWeights, SuggestionOptions, SuggestionScorer,
    TimeSlot,
};

fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, min, 0).unwrap()
}

fn hour_slot(day: u32, hour: u32) -> TimeSlot {
    TimeSlot::new(at(day, hour, 0), at(day, hour + 1, 0), AvailabilityStatus::Available).unwrap()
}

fn availability(score: f64) -> SlotAvailability {
    SlotAvailability {
        score,
        attendee_scores: Vec::new(),
        conflicting_attendees: Vec::new(),
        attendee_count: 0,
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn suggestion(day: u32, hour: u32, score: f64) -> MeetingSuggestion {
    MeetingSuggestion {
        start: at(day, hour, 0),
        end: at(day, hour + 1, 0),
        score,
        reasons: Vec::new(),
        conflicting_attendees: Vec::new(),
    }
}

// ============================================================================
// Buckets
// ============================================================================

#[test]
fn time_of_day_buckets() {
    let expected = [
        (0, 0.0),
        (5, 0.0),
        (6, 0.4),
        (8, 0.4),
        (9, 1.0),
        (11, 1.0),
        (12, 0.9),
        (15, 0.9),
        (16, 0.7),
        (17, 0.7),
        (18, 0.3),
        (20, 0.3),
        (21, 0.1),
        (22, 0.1),
        (23, 0.0),
    ];
    for (hour, score) in expected {
        assert_eq!(time_of_day_score(hour), score, "hour {hour}");
    }
}

#[test]
fn day_of_week_buckets() {
    assert_eq!(day_of_week_score(Weekday::Mon, false), 1.0);
    assert_eq!(day_of_week_score(Weekday::Thu, false), 1.0);
    assert_eq!(day_of_week_score(Weekday::Fri, false), 0.9);
    assert_eq!(day_of_week_score(Weekday::Sat, false), 0.0);
    assert_eq!(day_of_week_score(Weekday::Sun, false), 0.0);
    assert_eq!(day_of_week_score(Weekday::Sat, true), 0.7);
    assert_eq!(day_of_week_score(Weekday::Sun, true), 0.6);
}

// ============================================================================
// Composite score
// ============================================================================

#[test]
fn ideal_slot_scores_one() {
    let weights = ScoringWeights::default();
    let options = SuggestionOptions::default();
    // Monday 10:00, exactly one day ahead.
    let scorer = SuggestionScorer::new(&weights, &options, at(1, 10, 0));

    let score = scorer.score(&hour_slot(2, 10), &availability(1.0));
    assert!(approx(score, 1.0), "got {score}");
}

#[test]
fn friday_afternoon_with_half_availability() {
    let weights = ScoringWeights::default();
    let options = SuggestionOptions::default();
    let scorer = SuggestionScorer::new(&weights, &options, at(5, 14, 0));

    // 30 + 40 * 0.5 + 20 * 0.9 + 10 * 0.9 = 77
    let score = scorer.score(&hour_slot(6, 14), &availability(0.5));
    assert!(approx(score, 0.77), "got {score}");
}

#[test]
fn far_future_penalty_per_day_beyond_a_week() {
    let weights = ScoringWeights::default();
    let options = SuggestionOptions::default();
    let scorer = SuggestionScorer::new(&weights, &options, at(1, 10, 0));

    // 15 days away: 100 - 2 * 8 = 84
    let score = scorer.score(&hour_slot(16, 10), &availability(1.0));
    assert!(approx(score, 0.84), "got {score}");
}

#[test]
fn short_notice_penalty_scales_with_remaining_day() {
    let weights = ScoringWeights::default();
    let options = SuggestionOptions::default();
    let scorer = SuggestionScorer::new(&weights, &options, at(2, 4, 0));

    // 6 hours away: 100 - 5 * 0.75 = 96.25
    let score = scorer.score(&hour_slot(2, 10), &availability(1.0));
    assert!(approx(score, 0.9625), "got {score}");
}

#[test]
fn conflicts_reduce_the_score() {
    let weights = ScoringWeights::default();
    let options = SuggestionOptions::default();
    let scorer = SuggestionScorer::new(&weights, &options, at(1, 10, 0));

    let conflicted = SlotAvailability {
        score: 0.0,
        attendee_scores: vec![0.0],
        conflicting_attendees: vec!["bob@example.com".to_string()],
        attendee_count: 1,
    };

    // 30 + 0 + 20 + 10 - 40 = 20
    let score = scorer.score(&hour_slot(2, 10), &conflicted);
    assert!(approx(score, 0.2), "got {score}");
}

#[test]
fn score_is_clamped_to_zero() {
    let weights = ScoringWeights::default();
    let options = SuggestionOptions::default();
    // A year ahead drives the far-future penalty far below zero.
    let scorer = SuggestionScorer::new(&weights, &options, at(1, 10, 0));
    let slot = TimeSlot::new(
        Utc.with_ymd_and_hms(2027, 3, 1, 3, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2027, 3, 1, 4, 0, 0).unwrap(),
        AvailabilityStatus::Available,
    )
    .unwrap();

    assert_eq!(scorer.score(&slot, &availability(0.0)), 0.0);
}

#[test]
fn local_hour_drives_time_of_day() {
    let weights = ScoringWeights::default();
    let options = SuggestionOptions {
        timezone: "America/New_York".parse::<Tz>().unwrap(),
        ..SuggestionOptions::default()
    };
    let scorer = SuggestionScorer::new(&weights, &options, at(1, 15, 0));

    // 15:00 UTC is 10:00 EST on Monday.
    let score = scorer.score(&hour_slot(2, 15), &availability(1.0));
    assert!(approx(score, 1.0), "got {score}");
}

#[test]
fn custom_weights_change_the_outcome() {
    let weights = ScoringWeights {
        time_of_day: 0.0,
        base: 50.0,
        ..ScoringWeights::default()
    };
    let options = SuggestionOptions::default();
    let scorer = SuggestionScorer::new(&weights, &options, at(1, 3, 0));

    // 50 + 40 + 0 + 10 = 100 even at 03:00.
    let score = scorer.score(&hour_slot(2, 3), &availability(1.0));
    assert!(approx(score, 1.0), "got {score}");
}

// ============================================================================
// Reasons
// ============================================================================

#[test]
fn reasons_for_a_good_morning_slot() {
    let weights = ScoringWeights::default();
    let options = SuggestionOptions::default();
    let scorer = SuggestionScorer::new(&weights, &options, at(1, 10, 0));
    let availability = SlotAvailability {
        score: 1.0,
        attendee_scores: vec![1.0, 1.0],
        conflicting_attendees: Vec::new(),
        attendee_count: 2,
    };

    let reasons = scorer.reasons(&hour_slot(3, 10), &availability);

    assert_eq!(
        reasons,
        vec![
            "All attendees are available",
            "Preferred morning time",
            "Good day of the week",
            "Within the next week",
        ]
    );
}

#[test]
fn reasons_for_a_poor_slot() {
    let weights = ScoringWeights::default();
    let options = SuggestionOptions::default();
    let scorer = SuggestionScorer::new(&weights, &options, at(7, 12, 0));
    let availability = SlotAvailability {
        score: 0.0,
        attendee_scores: vec![0.0],
        conflicting_attendees: vec!["bob@example.com".to_string()],
        attendee_count: 1,
    };

    // Saturday 19:00, seven hours ahead.
    let reasons = scorer.reasons(&hour_slot(7, 19), &availability);

    assert_eq!(
        reasons,
        vec![
            "No availability information for attendees",
            "Conflicts with 1 attendee",
            "Outside usual meeting hours",
            "Falls on a weekend",
            "Short notice",
        ]
    );
}

#[test]
fn suggestion_carries_slot_bounds_and_conflicts() {
    let weights = ScoringWeights::default();
    let options = SuggestionOptions::default();
    let scorer = SuggestionScorer::new(&weights, &options, at(1, 10, 0));
    let availability = SlotAvailability {
        score: 0.8,
        attendee_scores: vec![0.8],
        conflicting_attendees: Vec::new(),
        attendee_count: 1,
    };

    let suggestion = scorer.suggest(&hour_slot(4, 9), &availability);

    assert_eq!((suggestion.start, suggestion.end), (at(4, 9, 0), at(4, 10, 0)));
    assert!(suggestion.reasons.contains(&"Most attendees are available".to_string()));
    assert!((0.0..=1.0).contains(&suggestion.score));
}

// ============================================================================
// Ranking
// ============================================================================

#[test]
fn rank_filters_sorts_and_truncates() {
    let candidates = vec![
        suggestion(2, 9, 0.5),
        suggestion(2, 10, 0.2),
        suggestion(2, 11, 0.9),
        suggestion(2, 12, 0.7),
    ];

    let ranked = rank(candidates, 0.3, 2);

    let scores: Vec<f64> = ranked.iter().map(|s| s.score).collect();
    assert_eq!(scores, vec![0.9, 0.7]);
}

#[test]
fn ties_break_by_earlier_start() {
    let candidates = vec![
        suggestion(3, 10, 0.8),
        suggestion(2, 14, 0.8),
        suggestion(2, 9, 0.8),
    ];

    let ranked = rank(candidates, 0.0, 10);

    let starts: Vec<_> = ranked.iter().map(|s| s.start).collect();
    assert_eq!(starts, vec![at(2, 9, 0), at(2, 14, 0), at(3, 10, 0)]);
}

#[test]
fn min_score_is_inclusive() {
    let ranked = rank(vec![suggestion(2, 9, 0.3)], 0.3, 10);
    assert_eq!(ranked.len(), 1);
}

#[test]
fn weights_validation() {
    assert!(ScoringWeights::default().validate().is_ok());

    let negative = ScoringWeights {
        base: -1.0,
        ..ScoringWeights::default()
    };
    assert!(negative.validate().is_err());

    let unbalanced = ScoringWeights {
        availability_mean_weight: 0.5,
        availability_breadth_weight: 0.6,
        ..ScoringWeights::default()
    };
    assert!(unbalanced.validate().is_err());
}
