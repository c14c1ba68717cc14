use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_STUDENT_LIMIT: i32 = 50;
pub const DEFAULT_RETRY_COUNT: i32 = 3;
pub const DEFAULT_EXAM_TIME_MINUTES: i32 = 60;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub student_limit: i32,
    /// Attempts allowed per student per quiz package in the authenticated flow.
    pub retry_count: i32,
    /// Minutes.
    pub exam_time: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub student_limit: i32,
    pub retry_count: i32,
    pub exam_time: i32,
    pub is_active: bool,
}
