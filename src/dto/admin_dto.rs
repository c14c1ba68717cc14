use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::attempt::AttemptStatus;
use crate::models::enrollment::EnrollmentStatus;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateEnrollmentStatusRequest {
    #[validate(length(min = 1))]
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentStatusUpdated {
    pub message: String,
    pub status: EnrollmentStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub attempt_count: i64,
    /// Distinct courses the student has attempted.
    pub enrolled_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseStudent {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub attempts_in_course: i64,
    pub best_score: i32,
    pub best_percentage: f64,
    pub last_attempt_date: DateTime<Utc>,
    /// Status of the most recent attempt.
    pub status: AttemptStatus,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageListQuery {
    pub course_id: Option<i64>,
}
