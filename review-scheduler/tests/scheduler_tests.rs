use chrono::{NaiveDate, TimeZone, Utc};
use review_scheduler::{update_review, ReviewRecord, SchedulerError, MIN_EASE_FACTOR};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn reviewed_at(y: i32, m: u32, d: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).single().expect("valid timestamp")
}

#[test]
fn first_perfect_review_moves_to_one_day() {
    let record = ReviewRecord::new(day(2026, 3, 1));
    let updated = update_review(&record, 5, reviewed_at(2026, 3, 1)).expect("valid quality");

    assert_eq!(updated.repetitions, 1);
    assert_eq!(updated.interval_days, 1);
    assert_eq!(updated.total_reviews, 1);
    assert_eq!(updated.correct_reviews, 1);
    // 2.5 + (0.1 - 0 * (0.08 + 0 * 0.02)) = 2.6
    assert!((updated.ease_factor - 2.6).abs() < 1e-9);
    assert_eq!(updated.next_review_date, day(2026, 3, 2));
    assert!(updated.last_reviewed.is_some());
}

#[test]
fn second_perfect_review_moves_to_six_days() {
    let record = ReviewRecord::new(day(2026, 3, 1));
    let after_first = update_review(&record, 5, reviewed_at(2026, 3, 1)).expect("valid quality");
    let after_second =
        update_review(&after_first, 5, reviewed_at(2026, 3, 2)).expect("valid quality");

    assert_eq!(after_second.repetitions, 2);
    assert_eq!(after_second.interval_days, 6);
    assert_eq!(after_second.next_review_date, day(2026, 3, 8));
}

#[test]
fn failed_review_resets_progress_but_not_correct_count() {
    let record = ReviewRecord::new(day(2026, 3, 1));
    let after_first = update_review(&record, 5, reviewed_at(2026, 3, 1)).expect("valid quality");
    let after_second =
        update_review(&after_first, 5, reviewed_at(2026, 3, 2)).expect("valid quality");
    let after_failure =
        update_review(&after_second, 2, reviewed_at(2026, 3, 8)).expect("valid quality");

    assert_eq!(after_failure.repetitions, 0);
    assert_eq!(after_failure.interval_days, 1);
    assert_eq!(after_failure.correct_reviews, after_second.correct_reviews);
    assert_eq!(after_failure.total_reviews, after_second.total_reviews + 1);
    assert_eq!(after_failure.next_review_date, day(2026, 3, 9));
}

#[test]
fn interval_grows_with_the_pre_review_ease_factor() {
    let record = ReviewRecord {
        ease_factor: 2.5,
        interval_days: 10,
        repetitions: 2,
        ..ReviewRecord::new(day(2026, 3, 1))
    };
    let updated = update_review(&record, 4, reviewed_at(2026, 3, 1)).expect("valid quality");

    // floor(10 * 2.5) = 25, using the ease factor from before this review.
    assert_eq!(updated.interval_days, 25);
    assert_eq!(updated.repetitions, 3);
}

#[test]
fn ease_factor_never_drops_below_floor() {
    let mut record = ReviewRecord::new(day(2026, 3, 1));
    for i in 0..10 {
        record = update_review(&record, 0, reviewed_at(2026, 3, 1 + i)).expect("valid quality");
        assert!(record.ease_factor >= MIN_EASE_FACTOR);
    }
    assert!((record.ease_factor - MIN_EASE_FACTOR).abs() < 1e-9);
}

#[test]
fn correct_reviews_never_decrease_repetitions() {
    let mut record = ReviewRecord::new(day(2026, 3, 1));
    let mut previous_repetitions = record.repetitions;
    for quality in [3u8, 4, 5, 3, 4] {
        record = update_review(&record, quality, reviewed_at(2026, 3, 1)).expect("valid quality");
        assert!(record.repetitions > previous_repetitions);
        previous_repetitions = record.repetitions;
    }
}

#[test]
fn out_of_range_quality_is_rejected() {
    let record = ReviewRecord::new(day(2026, 3, 1));
    let err = update_review(&record, 6, reviewed_at(2026, 3, 1))
        .expect_err("quality above 5 must fail");
    assert_eq!(err, SchedulerError::QualityOutOfRange(6));
}

#[test]
fn accuracy_rate_tracks_correct_share() {
    let record = ReviewRecord::new(day(2026, 3, 1));
    assert_eq!(record.accuracy_rate(), 0.0);

    let after_correct = update_review(&record, 4, reviewed_at(2026, 3, 1)).expect("valid quality");
    let after_miss = update_review(&after_correct, 1, reviewed_at(2026, 3, 2)).expect("valid quality");
    assert!((after_miss.accuracy_rate() - 50.0).abs() < 1e-9);
}

#[test]
fn records_become_due_on_their_review_date() {
    let record = ReviewRecord::new(day(2026, 3, 1));
    let updated = update_review(&record, 5, reviewed_at(2026, 3, 1)).expect("valid quality");
    assert!(!updated.is_due(day(2026, 3, 1)));
    assert!(updated.is_due(day(2026, 3, 2)));
    assert!(updated.is_due(day(2026, 3, 5)));
}
