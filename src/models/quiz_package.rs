use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_MAX_RETAKE_COUNT: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizPackage {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: String,
    /// Attempts allowed in the anonymous and phone-verified flows.
    pub max_retake_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct QuizPackageDraft {
    pub course_id: i64,
    pub title: String,
    pub description: String,
    pub max_retake_count: i32,
    pub is_active: bool,
}
