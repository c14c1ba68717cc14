use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::str::FromStr;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
            QuestionType::ShortAnswer => "short_answer",
        }
    }
}

impl FromStr for QuestionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple_choice" => Ok(QuestionType::MultipleChoice),
            "true_false" => Ok(QuestionType::TrueFalse),
            "short_answer" => Ok(QuestionType::ShortAnswer),
            other => Err(UnknownVariant {
                kind: "question type",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: i64,
    pub quiz_package_id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub image_url: Option<String>,
    pub options: Json<Vec<String>>,
    pub correct_answer: String,
    pub points: i32,
    pub order_number: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub quiz_package_id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub image_url: Option<String>,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub points: i32,
    pub order_number: i32,
    pub is_active: bool,
}

/// A question as shown to someone taking an authenticated attempt.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub image_url: Option<String>,
    pub options: Vec<String>,
    pub points: i32,
    pub order_number: i32,
}

impl From<Question> for QuestionView {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text,
            question_type: q.question_type,
            image_url: q.image_url,
            options: q.options.0,
            points: q.points,
            order_number: q.order_number,
        }
    }
}
