use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Answer {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub student_answer: String,
    pub is_correct: bool,
    pub points_earned: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AnswerDraft {
    pub question_id: i64,
    pub student_answer: String,
    pub is_correct: bool,
    pub points_earned: i32,
}
