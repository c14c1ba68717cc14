use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::course::{
    Course, CourseDraft, DEFAULT_EXAM_TIME_MINUTES, DEFAULT_RETRY_COUNT, DEFAULT_STUDENT_LIMIT,
};
use crate::models::question::{Question, QuestionDraft, QuestionType};
use crate::models::quiz_package::{QuizPackage, QuizPackageDraft, DEFAULT_MAX_RETAKE_COUNT};

/// Create or update body for a course. On update, omitted fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub student_limit: Option<i32>,
    #[validate(range(min = 0))]
    pub retry_count: Option<i32>,
    #[validate(range(min = 1))]
    pub exam_time: Option<i32>,
    pub is_active: Option<bool>,
}

impl CourseRequest {
    pub fn into_draft(self, current: Option<&Course>) -> CourseDraft {
        CourseDraft {
            title: self.title,
            description: self
                .description
                .or_else(|| current.map(|c| c.description.clone()))
                .unwrap_or_default(),
            student_limit: self
                .student_limit
                .or(current.map(|c| c.student_limit))
                .unwrap_or(DEFAULT_STUDENT_LIMIT),
            retry_count: self
                .retry_count
                .or(current.map(|c| c.retry_count))
                .unwrap_or(DEFAULT_RETRY_COUNT),
            exam_time: self
                .exam_time
                .or(current.map(|c| c.exam_time))
                .unwrap_or(DEFAULT_EXAM_TIME_MINUTES),
            is_active: self
                .is_active
                .or(current.map(|c| c.is_active))
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizPackageRequest {
    #[validate(range(min = 1))]
    pub course_id: i64,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub max_retake_count: Option<i32>,
    pub is_active: Option<bool>,
}

impl QuizPackageRequest {
    pub fn into_draft(self, current: Option<&QuizPackage>) -> QuizPackageDraft {
        QuizPackageDraft {
            course_id: self.course_id,
            title: self.title,
            description: self
                .description
                .or_else(|| current.map(|p| p.description.clone()))
                .unwrap_or_default(),
            max_retake_count: self
                .max_retake_count
                .or(current.map(|p| p.max_retake_count))
                .unwrap_or(DEFAULT_MAX_RETAKE_COUNT),
            is_active: self
                .is_active
                .or(current.map(|p| p.is_active))
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuestionRequest {
    #[validate(range(min = 1))]
    pub quiz_package_id: i64,
    #[validate(length(min = 1))]
    pub question_text: String,
    pub question_type: QuestionType,
    pub image_url: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[validate(length(min = 1))]
    pub correct_answer: String,
    #[validate(range(min = 0))]
    pub points: Option<i32>,
    pub order_number: Option<i32>,
    pub is_active: Option<bool>,
}

impl QuestionRequest {
    pub fn into_draft(self, current: Option<&Question>) -> QuestionDraft {
        QuestionDraft {
            quiz_package_id: self.quiz_package_id,
            question_text: self.question_text,
            question_type: self.question_type,
            image_url: self.image_url.or_else(|| current.and_then(|q| q.image_url.clone())),
            options: self.options,
            correct_answer: self.correct_answer,
            points: self.points.or(current.map(|q| q.points)).unwrap_or(1),
            order_number: self
                .order_number
                .or(current.map(|q| q.order_number))
                .unwrap_or(0),
            is_active: self
                .is_active
                .or(current.map(|q| q.is_active))
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseWithPackages {
    #[serde(flatten)]
    pub course: Course,
    pub quiz_packages: Vec<QuizPackage>,
}

/// Public package view. The guest flow scores on the client, so answers are included.
#[derive(Debug, Clone, Serialize)]
pub struct PackageWithQuestions {
    #[serde(flatten)]
    pub package: QuizPackage,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub quiz_packages: Vec<PackageWithQuestions>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn new_course_takes_defaults() {
        let draft = CourseRequest {
            title: "Chemistry".into(),
            description: None,
            student_limit: None,
            retry_count: None,
            exam_time: None,
            is_active: None,
        }
        .into_draft(None);
        assert_eq!(draft.student_limit, DEFAULT_STUDENT_LIMIT);
        assert_eq!(draft.retry_count, DEFAULT_RETRY_COUNT);
        assert_eq!(draft.exam_time, DEFAULT_EXAM_TIME_MINUTES);
        assert!(draft.is_active);
    }

    #[test]
    fn update_keeps_omitted_fields() {
        let now = Utc::now();
        let current = Course {
            id: 3,
            title: "Old".into(),
            description: "kept".into(),
            student_limit: 12,
            retry_count: 5,
            exam_time: 45,
            is_active: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let draft = CourseRequest {
            title: "New".into(),
            description: None,
            student_limit: None,
            retry_count: Some(2),
            exam_time: None,
            is_active: None,
        }
        .into_draft(Some(&current));
        assert_eq!(draft.title, "New");
        assert_eq!(draft.description, "kept");
        assert_eq!(draft.retry_count, 2);
        assert_eq!(draft.exam_time, 45);
        assert!(!draft.is_active);
    }
}
