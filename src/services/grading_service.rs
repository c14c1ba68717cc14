use crate::models::question::Question;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradedAnswer {
    pub is_correct: bool,
    pub points_earned: i32,
}

pub struct GradingService;

impl GradingService {
    /// Exact match after trimming and case folding. No partial credit.
    pub fn grade(question: &Question, raw_answer: &str) -> GradedAnswer {
        let is_correct = normalize(raw_answer) == normalize(&question.correct_answer);
        GradedAnswer {
            is_correct,
            points_earned: if is_correct { question.points } else { 0 },
        }
    }
}

pub fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;
    use chrono::Utc;
    use sqlx::types::Json;

    fn question(correct: &str, points: i32) -> Question {
        Question {
            id: 1,
            quiz_package_id: 1,
            question_text: "Capital of Japan?".into(),
            question_type: QuestionType::ShortAnswer,
            image_url: None,
            options: Json(vec![]),
            correct_answer: correct.into(),
            points,
            order_number: 1,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn case_is_ignored() {
        let graded = GradingService::grade(&question("tokyo", 4), "TOKYO");
        assert_eq!(
            graded,
            GradedAnswer {
                is_correct: true,
                points_earned: 4
            }
        );
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert!(GradingService::grade(&question("tokyo", 4), "Tokyo ").is_correct);
        assert!(GradingService::grade(&question("  Tokyo", 4), "tokyo").is_correct);
    }

    #[test]
    fn wrong_answer_earns_nothing() {
        let graded = GradingService::grade(&question("Tokyo", 4), "Kyoto");
        assert!(!graded.is_correct);
        assert_eq!(graded.points_earned, 0);
    }

    #[test]
    fn inner_whitespace_still_matters() {
        assert!(!GradingService::grade(&question("New York", 2), "NewYork").is_correct);
    }
}
