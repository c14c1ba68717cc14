use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

use super::UnknownVariant;
use crate::error::{Error, Result};

/// Percentage at or above which a completed attempt counts as passed.
pub const PASS_MARK_PERCENT: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Completed => "completed",
            AttemptStatus::Abandoned => "abandoned",
        }
    }

    pub fn can_transition_to(&self, next: AttemptStatus) -> bool {
        matches!(
            (*self, next),
            (AttemptStatus::InProgress, AttemptStatus::Completed)
                | (AttemptStatus::InProgress, AttemptStatus::Abandoned)
        )
    }

    pub fn transition_to(self, next: AttemptStatus) -> Result<AttemptStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl FromStr for AttemptStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(AttemptStatus::InProgress),
            "completed" => Ok(AttemptStatus::Completed),
            "abandoned" => Ok(AttemptStatus::Abandoned),
            other => Err(UnknownVariant {
                kind: "attempt status",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attempt {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub quiz_package_id: i64,
    pub status: AttemptStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub score: i32,
    pub total_points: i32,
    /// 1-based ordinal of this attempt for the student, course and package.
    pub attempt_count: i32,
    pub device_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Attempt {
    pub fn percent(&self) -> i64 {
        percent_floor(self.score as i64, self.total_points as i64)
    }

    pub fn percentage(&self) -> f64 {
        percentage(self.score as i64, self.total_points as i64)
    }

    pub fn passed(&self) -> bool {
        self.percent() >= PASS_MARK_PERCENT
    }

    /// Seconds between start and end, or zero while the attempt is still open.
    pub fn time_taken_seconds(&self) -> i64 {
        self.end_time
            .map(|end| (end - self.start_time).num_seconds().max(0))
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub student_id: i64,
    pub course_id: i64,
    pub quiz_package_id: i64,
    pub total_points: i32,
}

/// A guest submission, recorded already completed.
#[derive(Debug, Clone)]
pub struct NewGuestAttempt {
    pub student_id: i64,
    pub course_id: i64,
    pub quiz_package_id: i64,
    pub device_id: Option<String>,
    pub score: i32,
    pub total_points: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Attempt row joined with the taker's account.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AttemptWithStudent {
    pub id: i64,
    pub student_id: i64,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub status: AttemptStatus,
    pub score: i32,
    pub total_points: i32,
    pub device_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub student_created_at: Option<DateTime<Utc>>,
}

/// One (taker name, device) group within a course.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourseTakerSummary {
    pub student_name: String,
    pub device_id: Option<String>,
    pub attempt_count: i64,
    pub best_score: i32,
    pub total_points: i32,
    pub last_attempt: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, FromRow)]
pub struct AttemptCounts {
    pub total: i64,
    pub distinct_students: i64,
    pub distinct_devices: i64,
}

#[derive(Debug, Clone, Copy, Serialize, FromRow)]
pub struct StudentAttemptCounts {
    pub student_id: i64,
    pub total_attempts: i64,
    pub courses_attempted: i64,
}

pub fn percent_floor(score: i64, total: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        score * 100 / total
    }
}

pub fn percentage(score: i64, total: i64) -> f64 {
    if total <= 0 {
        0.0
    } else {
        score as f64 * 100.0 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_in_progress_can_move() {
        assert!(AttemptStatus::InProgress.can_transition_to(AttemptStatus::Completed));
        assert!(AttemptStatus::InProgress.can_transition_to(AttemptStatus::Abandoned));
        assert!(!AttemptStatus::Completed.can_transition_to(AttemptStatus::InProgress));
        assert!(!AttemptStatus::Completed.can_transition_to(AttemptStatus::Abandoned));
        assert!(!AttemptStatus::Abandoned.can_transition_to(AttemptStatus::Completed));
        assert!(!AttemptStatus::InProgress.can_transition_to(AttemptStatus::InProgress));
    }

    #[test]
    fn invalid_transition_is_an_error() {
        let err = AttemptStatus::Abandoned
            .transition_to(AttemptStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }

    #[test]
    fn percent_helpers_guard_zero_totals() {
        assert_eq!(percent_floor(7, 0), 0);
        assert_eq!(percentage(7, 0), 0.0);
        assert_eq!(percent_floor(2, 3), 66);
        assert!((percentage(2, 3) - 66.666).abs() < 0.01);
    }
}
