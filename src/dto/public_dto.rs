use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::enrollment::EnrollmentStatus;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GuestAnswer {
    #[validate(range(min = 1))]
    pub question_id: i64,
    #[serde(default, alias = "student_answer")]
    pub user_answer: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub points_earned: i32,
}

/// Anonymous quiz result. Scores are computed by the client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PublicQuizSubmission {
    #[validate(length(min = 1, max = 255))]
    pub student_name: String,
    #[validate(range(min = 1))]
    pub course_id: i64,
    #[validate(range(min = 1))]
    pub quiz_package_id: i64,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub device_id: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub score: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub total_points: i32,
    /// Seconds.
    #[serde(default)]
    #[validate(range(min = 0, max = 86400))]
    pub time_taken: i64,
    #[serde(default)]
    #[validate(nested)]
    pub answers: Vec<GuestAnswer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicQuizSubmissionResponse {
    pub message: String,
    pub attempt_id: i64,
    pub score: i32,
    pub percentage: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCheckQuery {
    pub device_id: Option<String>,
    pub quiz_package_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhoneCheckQuery {
    pub phone_number: Option<String>,
    pub course_id: Option<i64>,
    pub quiz_package_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CourseRegistrationRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 32))]
    pub phone_number: String,
    #[validate(length(min = 1))]
    pub address: String,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub facebook_url: Option<String>,
    /// Generated when omitted.
    #[validate(length(min = 6))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationResponse {
    pub message: String,
    pub status: EnrollmentStatus,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub existing_account: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<RegisteredUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationStatusQuery {
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationStatusResponse {
    pub registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EnrollmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrolled_at: Option<DateTime<Utc>>,
}

impl RegistrationStatusResponse {
    pub fn not_registered(message: &str) -> Self {
        Self {
            registered: false,
            message: Some(message.to_string()),
            status: None,
            name: None,
            email: None,
            course_name: None,
            enrolled_at: None,
        }
    }
}
