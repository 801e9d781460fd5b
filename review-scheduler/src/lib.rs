//! SM-2 spaced-repetition scheduling.
//!
//! The scheduler is a pure state-update function: it takes the current
//! review record plus a recall quality score and returns the updated
//! record. Persistence, locking, and transaction handling stay with the
//! caller.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ease factor assigned to a freshly created record.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Lower bound on the ease factor, preventing runaway shrinking intervals.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Spaced-repetition state for one question. One record per question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// SM-2 ease factor; never drops below [`MIN_EASE_FACTOR`].
    pub ease_factor: f64,
    /// Days until the next review. Always at least 1.
    pub interval_days: u32,
    /// Consecutive correct reviews; reset to 0 on failure.
    pub repetitions: u32,
    /// Date the question becomes due again.
    pub next_review_date: NaiveDate,
    /// Timestamp of the most recent review, if any.
    pub last_reviewed: Option<DateTime<Utc>>,
    pub total_reviews: u32,
    pub correct_reviews: u32,
}

impl ReviewRecord {
    /// Fresh record due immediately.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            ease_factor: INITIAL_EASE_FACTOR,
            interval_days: 1,
            repetitions: 0,
            next_review_date: today,
            last_reviewed: None,
            total_reviews: 0,
            correct_reviews: 0,
        }
    }

    /// Percentage of reviews answered correctly, 0.0 when never reviewed.
    pub fn accuracy_rate(&self) -> f64 {
        if self.total_reviews == 0 {
            return 0.0;
        }
        f64::from(self.correct_reviews) / f64::from(self.total_reviews) * 100.0
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review_date <= today
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// Quality scores outside 0..=5 indicate a caller bug; they are
    /// rejected rather than clamped.
    #[error("review quality {0} is out of range 0..=5")]
    QualityOutOfRange(u8),
}

/// Apply one SM-2 review to `record` and return the updated copy.
///
/// `quality` grades the recall from 0 (total blackout) to 5 (perfect).
/// Scores of 3 and above count as correct. The interval ladder is 1 day,
/// then 6 days, then the previous interval scaled by the ease factor in
/// effect before this review. A failed review resets repetitions and the
/// interval, leaving `correct_reviews` untouched.
pub fn update_review(
    record: &ReviewRecord,
    quality: u8,
    reviewed_at: DateTime<Utc>,
) -> Result<ReviewRecord, SchedulerError> {
    if quality > 5 {
        return Err(SchedulerError::QualityOutOfRange(quality));
    }

    let mut next = record.clone();
    next.total_reviews += 1;
    next.last_reviewed = Some(reviewed_at);

    if quality >= 3 {
        next.correct_reviews += 1;
        next.interval_days = match record.repetitions {
            0 => 1,
            1 => 6,
            // The pre-review ease factor governs the growth step.
            _ => (f64::from(record.interval_days) * record.ease_factor).floor() as u32,
        };
        next.repetitions += 1;
    } else {
        next.repetitions = 0;
        next.interval_days = 1;
    }

    let shortfall = f64::from(5 - quality);
    next.ease_factor =
        (record.ease_factor + (0.1 - shortfall * (0.08 + shortfall * 0.02))).max(MIN_EASE_FACTOR);

    next.next_review_date = reviewed_at
        .date_naive()
        .checked_add_days(Days::new(u64::from(next.interval_days)))
        .unwrap_or(reviewed_at.date_naive());

    Ok(next)
}

/// [`update_review`] stamped with the current time.
pub fn update_review_now(record: &ReviewRecord, quality: u8) -> Result<ReviewRecord, SchedulerError> {
    update_review(record, quality, Utc::now())
}
