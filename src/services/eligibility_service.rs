//! Gatekeeping for quiz access. Every check fails closed: a missing course, package or
//! enrollment makes the caller ineligible rather than erroring, while store failures
//! propagate unchanged.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{DenialReason, Error, Result};
use crate::models::course::Course;
use crate::models::enrollment::EnrollmentStatus;
use crate::models::quiz_package::QuizPackage;
use crate::repositories::Repositories;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseEligibility {
    Approved,
    Pending,
    Declined,
    NotRegistered,
}

impl From<EnrollmentStatus> for CourseEligibility {
    fn from(status: EnrollmentStatus) -> Self {
        match status {
            EnrollmentStatus::Approved => CourseEligibility::Approved,
            EnrollmentStatus::Pending => CourseEligibility::Pending,
            EnrollmentStatus::Declined => CourseEligibility::Declined,
        }
    }
}

/// Which limit governs a retake: the course's `retry_count` for logged-in students,
/// the package's `max_retake_count` for anonymous and phone-verified takers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptFlow {
    Authenticated,
    Anonymous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetakeEligibility {
    pub attempts_used: i64,
    pub max_allowed: i64,
    pub remaining: i64,
}

impl RetakeEligibility {
    pub fn new(attempts_used: i64, max_allowed: i64) -> Self {
        Self {
            attempts_used,
            max_allowed,
            remaining: (max_allowed - attempts_used).max(0),
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.attempts_used < self.max_allowed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviousAttempt {
    pub score: i32,
    pub total_points: i32,
    pub percentage: f64,
    pub time_taken: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_questions: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceEligibility {
    pub already_taken: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_attempt: Option<PreviousAttempt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetakeInfo {
    pub current_attempts: i64,
    pub max_retakes: i64,
    pub attempts_remaining: i64,
    pub quiz_package_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhoneQuizCheck {
    pub approved: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retake_info: Option<RetakeInfo>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retake_limit_reached: bool,
}

impl PhoneQuizCheck {
    fn denied(message: &str) -> Self {
        Self {
            approved: false,
            message: message.to_string(),
            student_id: None,
            student_name: None,
            retake_info: None,
            retake_limit_reached: false,
        }
    }
}

/// A configured attempt limit of zero or below still allows one attempt.
pub fn effective_limit(configured: i32) -> i64 {
    if configured <= 0 {
        1
    } else {
        configured as i64
    }
}

pub fn max_attempts_for(course: &Course, package: &QuizPackage, flow: AttemptFlow) -> i64 {
    match flow {
        AttemptFlow::Authenticated => effective_limit(course.retry_count),
        AttemptFlow::Anonymous => effective_limit(package.max_retake_count),
    }
}

#[derive(Clone)]
pub struct EligibilityService {
    repos: Repositories,
    guest_device_attempt_cap: i64,
}

impl EligibilityService {
    pub fn new(repos: Repositories, guest_device_attempt_cap: i64) -> Self {
        Self {
            repos,
            guest_device_attempt_cap,
        }
    }

    pub async fn check_course_eligibility(
        &self,
        student_id: i64,
        course_id: i64,
    ) -> Result<CourseEligibility> {
        let enrollment = self.repos.enrollments.find_for(student_id, course_id).await?;
        Ok(enrollment
            .map(|e| CourseEligibility::from(e.status))
            .unwrap_or(CourseEligibility::NotRegistered))
    }

    pub async fn check_retake_eligibility(
        &self,
        student_id: i64,
        course_id: i64,
        quiz_package_id: i64,
        flow: AttemptFlow,
    ) -> Result<RetakeEligibility> {
        let attempts_used = self
            .repos
            .attempts
            .count_for(student_id, course_id, quiz_package_id)
            .await?;

        let course = self.repos.courses.find_by_id(course_id).await?;
        let package = self.repos.packages.find_by_id(quiz_package_id).await?;
        let max_allowed = match (course, package) {
            (Some(course), Some(package)) if package.course_id == course.id => {
                max_attempts_for(&course, &package, flow)
            }
            _ => 0,
        };

        Ok(RetakeEligibility::new(attempts_used, max_allowed))
    }

    pub async fn check_device_eligibility(
        &self,
        device_id: &str,
        quiz_package_id: i64,
    ) -> Result<DeviceEligibility> {
        let attempts = &self.repos.attempts;

        if let Some(previous) = attempts
            .latest_completed_by_device(device_id, Some(quiz_package_id))
            .await?
        {
            let student_name = self
                .repos
                .users
                .find_by_id(previous.student_id)
                .await?
                .map(|u| u.name);
            let total_questions = self.repos.answers.count_by_attempt(previous.id).await?;
            return Ok(DeviceEligibility {
                already_taken: true,
                student_name,
                previous_attempt: Some(PreviousAttempt {
                    score: previous.score,
                    total_points: previous.total_points,
                    percentage: previous.percentage(),
                    time_taken: previous.time_taken_seconds(),
                    completed_at: previous.end_time,
                    total_questions,
                }),
            });
        }

        let student_name = match attempts.latest_completed_by_device(device_id, None).await? {
            Some(latest) => self
                .repos
                .users
                .find_by_id(latest.student_id)
                .await?
                .map(|u| u.name),
            None => None,
        };

        Ok(DeviceEligibility {
            already_taken: false,
            student_name,
            previous_attempt: None,
        })
    }

    /// Rejects a guest submission from a device that already finished this package or
    /// has hit the per-device cap.
    pub async fn ensure_device_may_submit(&self, device_id: &str, quiz_package_id: i64) -> Result<()> {
        let completed = self
            .repos
            .attempts
            .count_completed_by_device(device_id, quiz_package_id)
            .await?;

        if completed >= self.guest_device_attempt_cap {
            tracing::warn!(device_id, quiz_package_id, completed, "device attempt cap reached");
            return Err(Error::forbidden(
                DenialReason::DeviceLimitReached,
                format!(
                    "You have already taken this quiz {} times. No more attempts allowed.",
                    completed
                ),
            ));
        }

        if completed > 0 {
            tracing::warn!(device_id, quiz_package_id, "device already completed package");
            return Err(Error::forbidden(
                DenialReason::DeviceAlreadyCompleted,
                "This device has already completed this quiz.",
            ));
        }

        Ok(())
    }

    pub async fn check_phone_for_quiz(
        &self,
        phone_number: &str,
        course_id: i64,
        quiz_package_id: Option<i64>,
    ) -> Result<PhoneQuizCheck> {
        let Some(user) = self.repos.users.find_by_phone(phone_number).await? else {
            return Ok(PhoneQuizCheck::denied(
                "This phone number is not registered. Please register first.",
            ));
        };

        match self.check_course_eligibility(user.id, course_id).await? {
            CourseEligibility::Approved => {}
            CourseEligibility::NotRegistered => {
                return Ok(PhoneQuizCheck::denied(
                    "You are not registered for this course. Please register first.",
                ))
            }
            CourseEligibility::Pending => {
                return Ok(PhoneQuizCheck::denied(
                    "Your registration is pending approval. Please wait for admin confirmation.",
                ))
            }
            CourseEligibility::Declined => {
                return Ok(PhoneQuizCheck::denied(
                    "Your registration was declined. Please contact the administrator.",
                ))
            }
        }

        let mut check = PhoneQuizCheck {
            approved: true,
            message: "You are approved to take this quiz.".to_string(),
            student_id: Some(user.id),
            student_name: Some(user.name),
            retake_info: None,
            retake_limit_reached: false,
        };

        let Some(quiz_package_id) = quiz_package_id else {
            return Ok(check);
        };
        let Some(package) = self
            .repos
            .packages
            .find_by_id(quiz_package_id)
            .await?
            .filter(|p| p.course_id == course_id)
        else {
            return Ok(PhoneQuizCheck::denied(
                "This quiz package does not belong to the course.",
            ));
        };

        let retake = self
            .check_retake_eligibility(user.id, course_id, package.id, AttemptFlow::Anonymous)
            .await?;

        check.retake_info = Some(RetakeInfo {
            current_attempts: retake.attempts_used,
            max_retakes: retake.max_allowed,
            attempts_remaining: retake.remaining,
            quiz_package_name: package.title,
        });

        if !retake.is_eligible() {
            check.approved = false;
            check.retake_limit_reached = true;
            check.message =
                "You have reached the maximum number of retakes for this quiz.".to_string();
        } else if retake.attempts_used > 0 {
            check.message = format!(
                "You have {} attempt(s) remaining for this quiz.",
                retake.remaining
            );
        }

        Ok(check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::AnswerDraft;
    use crate::models::attempt::{NewAttempt, NewGuestAttempt};
    use crate::models::course::CourseDraft;
    use crate::models::quiz_package::QuizPackageDraft;
    use crate::models::user::{ContactDetails, NewUser, UserRole};
    use crate::repositories::attempt_repository::MockAttemptRepository;
    use chrono::Duration;
    use std::sync::Arc;

    async fn seed_course(repos: &Repositories, retry_count: i32, max_retake: i32) -> (Course, QuizPackage) {
        let course = repos
            .courses
            .create(CourseDraft {
                title: "Rust".into(),
                description: String::new(),
                student_limit: 50,
                retry_count,
                exam_time: 60,
                is_active: true,
            })
            .await
            .unwrap();
        let package = repos
            .packages
            .create(QuizPackageDraft {
                course_id: course.id,
                title: "Week 1".into(),
                description: String::new(),
                max_retake_count: max_retake,
                is_active: true,
            })
            .await
            .unwrap();
        (course, package)
    }

    async fn seed_student(repos: &Repositories, phone: &str) -> i64 {
        repos
            .users
            .create(NewUser {
                email: format!("{}@example.com", phone),
                password_hash: "x".into(),
                name: "Mia".into(),
                role: UserRole::Student,
                contact: ContactDetails {
                    phone_number: Some(phone.to_string()),
                    ..Default::default()
                },
            })
            .await
            .unwrap()
            .id
    }

    #[test]
    fn zero_limit_means_one() {
        assert_eq!(effective_limit(0), 1);
        assert_eq!(effective_limit(-2), 1);
        assert_eq!(effective_limit(4), 4);
    }

    #[tokio::test]
    async fn retake_limit_uses_flow_specific_source() {
        let repos = Repositories::in_memory();
        let (course, package) = seed_course(&repos, 3, 1).await;
        let service = EligibilityService::new(repos.clone(), 3);
        let student = seed_student(&repos, "555").await;

        repos
            .attempts
            .create_within_limit(
                NewAttempt {
                    student_id: student,
                    course_id: course.id,
                    quiz_package_id: package.id,
                    total_points: 5,
                },
                3,
            )
            .await
            .unwrap();

        let auth = service
            .check_retake_eligibility(student, course.id, package.id, AttemptFlow::Authenticated)
            .await
            .unwrap();
        assert_eq!(auth, RetakeEligibility::new(1, 3));
        assert!(auth.is_eligible());

        let anon = service
            .check_retake_eligibility(student, course.id, package.id, AttemptFlow::Anonymous)
            .await
            .unwrap();
        assert_eq!(anon.max_allowed, 1);
        assert!(!anon.is_eligible());
    }

    #[tokio::test]
    async fn unknown_package_fails_closed() {
        let repos = Repositories::in_memory();
        let service = EligibilityService::new(repos, 3);
        let retake = service
            .check_retake_eligibility(1, 2, 3, AttemptFlow::Authenticated)
            .await
            .unwrap();
        assert_eq!(retake.max_allowed, 0);
        assert!(!retake.is_eligible());
    }

    #[tokio::test]
    async fn device_check_is_per_package() {
        let repos = Repositories::in_memory();
        let (course, first) = seed_course(&repos, 3, 1).await;
        let second = repos
            .packages
            .create(QuizPackageDraft {
                course_id: course.id,
                title: "Week 2".into(),
                description: String::new(),
                max_retake_count: 1,
                is_active: true,
            })
            .await
            .unwrap();
        let student = seed_student(&repos, "777").await;
        let now = Utc::now();
        repos
            .attempts
            .create_guest(
                NewGuestAttempt {
                    student_id: student,
                    course_id: course.id,
                    quiz_package_id: first.id,
                    device_id: Some("D1".into()),
                    score: 8,
                    total_points: 10,
                    start_time: now,
                    end_time: now + Duration::seconds(95),
                },
                vec![AnswerDraft {
                    question_id: 1,
                    student_answer: "a".into(),
                    is_correct: true,
                    points_earned: 8,
                }],
            )
            .await
            .unwrap();

        let service = EligibilityService::new(repos, 3);

        let taken = service.check_device_eligibility("D1", first.id).await.unwrap();
        assert!(taken.already_taken);
        let previous = taken.previous_attempt.unwrap();
        assert_eq!(previous.score, 8);
        assert_eq!(previous.time_taken, 95);
        assert_eq!(previous.total_questions, 1);
        assert!((previous.percentage - 80.0).abs() < f64::EPSILON);

        let other = service.check_device_eligibility("D1", second.id).await.unwrap();
        assert!(!other.already_taken);
        assert_eq!(other.student_name.as_deref(), Some("Mia"));

        let err = service.ensure_device_may_submit("D1", first.id).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Forbidden {
                reason: DenialReason::DeviceAlreadyCompleted,
                ..
            }
        ));
        service.ensure_device_may_submit("D1", second.id).await.unwrap();
    }

    #[tokio::test]
    async fn phone_check_reports_each_enrollment_state() {
        let repos = Repositories::in_memory();
        let (course, package) = seed_course(&repos, 3, 2).await;
        let service = EligibilityService::new(repos.clone(), 3);

        let unknown = service.check_phone_for_quiz("000", course.id, None).await.unwrap();
        assert!(!unknown.approved);

        let student = seed_student(&repos, "123").await;
        let none = service.check_phone_for_quiz("123", course.id, None).await.unwrap();
        assert!(!none.approved);
        assert!(none.message.contains("not registered for this course"));

        let enrollment = repos.enrollments.create(student, course.id).await.unwrap();
        let pending = service.check_phone_for_quiz("123", course.id, None).await.unwrap();
        assert!(pending.message.contains("pending"));

        repos
            .enrollments
            .update_status(enrollment.id, EnrollmentStatus::Approved)
            .await
            .unwrap();
        let approved = service
            .check_phone_for_quiz("123", course.id, Some(package.id))
            .await
            .unwrap();
        assert!(approved.approved);
        let info = approved.retake_info.unwrap();
        assert_eq!(info.max_retakes, 2);
        assert_eq!(info.attempts_remaining, 2);

        for _ in 0..2 {
            repos
                .attempts
                .create_within_limit(
                    NewAttempt {
                        student_id: student,
                        course_id: course.id,
                        quiz_package_id: package.id,
                        total_points: 1,
                    },
                    10,
                )
                .await
                .unwrap();
        }
        let exhausted = service
            .check_phone_for_quiz("123", course.id, Some(package.id))
            .await
            .unwrap();
        assert!(!exhausted.approved);
        assert!(exhausted.retake_limit_reached);
    }

    #[tokio::test]
    async fn phone_check_rejects_package_from_another_course() {
        let repos = Repositories::in_memory();
        let (course, _) = seed_course(&repos, 3, 2).await;
        let (_, foreign) = seed_course(&repos, 3, 2).await;
        let service = EligibilityService::new(repos.clone(), 3);
        let student = seed_student(&repos, "321").await;
        let enrollment = repos.enrollments.create(student, course.id).await.unwrap();
        repos
            .enrollments
            .update_status(enrollment.id, EnrollmentStatus::Approved)
            .await
            .unwrap();

        let check = service
            .check_phone_for_quiz("321", course.id, Some(foreign.id))
            .await
            .unwrap();
        assert!(!check.approved);
        assert!(check.retake_info.is_none());
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let mut attempts = MockAttemptRepository::new();
        attempts
            .expect_count_completed_by_device()
            .returning(|_, _| Err(Error::Internal("connection reset".into())));
        let mut repos = Repositories::in_memory();
        repos.attempts = Arc::new(attempts);
        let service = EligibilityService::new(repos, 3);

        let err = service.ensure_device_may_submit("D9", 1).await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
