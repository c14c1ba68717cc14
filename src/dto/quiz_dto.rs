use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::answer::Answer;
use crate::models::attempt::Attempt;
use crate::models::question::QuestionView;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartQuizRequest {
    #[validate(range(min = 1))]
    pub course_id: i64,
    #[validate(range(min = 1))]
    pub quiz_package_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartQuizResponse {
    pub attempt: Attempt,
    pub questions: Vec<QuestionView>,
    /// Minutes.
    pub exam_time: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(range(min = 1))]
    pub attempt_id: i64,
    #[validate(range(min = 1))]
    pub question_id: i64,
    #[validate(length(min = 1, max = 4000))]
    pub student_answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitAnswerResponse {
    pub answer: Answer,
    pub is_correct: bool,
    pub points_earned: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteQuizResponse {
    pub attempt: Attempt,
    pub score: i32,
    pub total_points: i32,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptDetail {
    #[serde(flatten)]
    pub attempt: Attempt,
    pub answers: Vec<Answer>,
}
