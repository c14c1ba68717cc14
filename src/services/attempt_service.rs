use chrono::{Duration, Utc};

use crate::dto::public_dto::{PublicQuizSubmission, PublicQuizSubmissionResponse};
use crate::dto::quiz_dto::{
    AttemptDetail, CompleteQuizResponse, StartQuizRequest, StartQuizResponse,
    SubmitAnswerRequest, SubmitAnswerResponse,
};
use crate::error::{DenialReason, Error, Result};
use crate::models::answer::AnswerDraft;
use crate::models::attempt::{Attempt, AttemptStatus, NewAttempt, NewGuestAttempt};
use crate::models::course::Course;
use crate::models::question::QuestionView;
use crate::models::quiz_package::QuizPackage;
use crate::models::user::{guest_email, ContactDetails, NewUser, User, UserRole};
use crate::repositories::Repositories;
use crate::services::eligibility_service::{max_attempts_for, AttemptFlow, EligibilityService};
use crate::services::grading_service::GradingService;
use crate::utils::crypto::hash_password;
use crate::utils::token::generate_password;

#[derive(Clone)]
pub struct AttemptService {
    repos: Repositories,
    eligibility: EligibilityService,
}

impl AttemptService {
    pub fn new(repos: Repositories, eligibility: EligibilityService) -> Self {
        Self { repos, eligibility }
    }

    async fn course_and_package(&self, course_id: i64, quiz_package_id: i64) -> Result<(Course, QuizPackage)> {
        let course = self
            .repos
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or_else(|| Error::NotFound("Course not found".to_string()))?;
        let package = self
            .repos
            .packages
            .find_by_id(quiz_package_id)
            .await?
            .filter(|p| p.course_id == course.id)
            .ok_or_else(|| Error::NotFound("Quiz package not found".to_string()))?;
        Ok((course, package))
    }

    async fn owned_attempt(&self, student_id: i64, attempt_id: i64) -> Result<Attempt> {
        self.repos
            .attempts
            .find_by_id(attempt_id)
            .await?
            .filter(|a| a.student_id == student_id)
            .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))
    }

    pub async fn start_attempt(&self, student_id: i64, req: StartQuizRequest) -> Result<StartQuizResponse> {
        let (course, package) = self
            .course_and_package(req.course_id, req.quiz_package_id)
            .await?;

        let questions = self
            .repos
            .questions
            .list_active_by_package(package.id)
            .await?;
        let total_points: i64 = questions.iter().map(|q| q.points as i64).sum();
        let total_points = i32::try_from(total_points).map_err(|_| {
            tracing::warn!(quiz_package_id = package.id, total_points, "package points overflow");
            Error::BadRequest("Quiz package total points are too large".to_string())
        })?;
        let max_allowed = max_attempts_for(&course, &package, AttemptFlow::Authenticated);

        let attempt = self
            .repos
            .attempts
            .create_within_limit(
                NewAttempt {
                    student_id,
                    course_id: course.id,
                    quiz_package_id: package.id,
                    total_points,
                },
                max_allowed,
            )
            .await?
            .ok_or_else(|| {
                tracing::info!(student_id, quiz_package_id = package.id, max_allowed, "retake limit reached");
                Error::forbidden(
                    DenialReason::RetakeLimitReached,
                    format!(
                        "You have reached the maximum number of attempts ({}) for this quiz",
                        max_allowed
                    ),
                )
            })?;

        tracing::info!(
            attempt_id = attempt.id,
            student_id,
            attempt_count = attempt.attempt_count,
            "attempt started"
        );

        Ok(StartQuizResponse {
            attempt,
            questions: questions.into_iter().map(QuestionView::from).collect(),
            exam_time: course.exam_time,
        })
    }

    pub async fn submit_answer(&self, student_id: i64, req: SubmitAnswerRequest) -> Result<SubmitAnswerResponse> {
        let attempt = self.owned_attempt(student_id, req.attempt_id).await?;
        if attempt.status != AttemptStatus::InProgress {
            return Err(Error::BadRequest("Invalid attempt".to_string()));
        }

        let question = self
            .repos
            .questions
            .find_by_id(req.question_id)
            .await?
            .filter(|q| q.quiz_package_id == attempt.quiz_package_id)
            .ok_or_else(|| Error::NotFound("Question not found".to_string()))?;

        let graded = GradingService::grade(&question, &req.student_answer);
        let answer = self
            .repos
            .answers
            .upsert(
                attempt.id,
                AnswerDraft {
                    question_id: question.id,
                    student_answer: req.student_answer,
                    is_correct: graded.is_correct,
                    points_earned: graded.points_earned,
                },
            )
            .await?;

        Ok(SubmitAnswerResponse {
            answer,
            is_correct: graded.is_correct,
            points_earned: graded.points_earned,
        })
    }

    /// Scores and closes an attempt. Completing twice returns the stored result.
    pub async fn complete_attempt(&self, student_id: i64, attempt_id: i64) -> Result<CompleteQuizResponse> {
        let attempt = self.owned_attempt(student_id, attempt_id).await?;

        let attempt = match attempt.status {
            AttemptStatus::Completed => attempt,
            AttemptStatus::Abandoned => {
                attempt.status.transition_to(AttemptStatus::Completed)?;
                attempt
            }
            AttemptStatus::InProgress => {
                let earned = self.repos.answers.sum_points(attempt.id).await?;
                let total = attempt.total_points as i64;
                if earned > total {
                    tracing::warn!(attempt_id, earned, total, "earned points exceed total, clamping");
                }
                let score = earned.min(total).max(0) as i32;

                match self.repos.attempts.complete(attempt.id, score, Utc::now()).await? {
                    Some(completed) => completed,
                    None => {
                        let current = self.owned_attempt(student_id, attempt_id).await?;
                        if current.status != AttemptStatus::Completed {
                            current.status.transition_to(AttemptStatus::Completed)?;
                        }
                        current
                    }
                }
            }
        };

        tracing::info!(attempt_id, score = attempt.score, "attempt completed");

        Ok(CompleteQuizResponse {
            score: attempt.score,
            total_points: attempt.total_points,
            percentage: attempt.percentage(),
            attempt,
        })
    }

    pub async fn list_my_attempts(&self, student_id: i64) -> Result<Vec<Attempt>> {
        self.repos.attempts.list_by_student(student_id).await
    }

    pub async fn get_attempt_detail(&self, student_id: i64, attempt_id: i64) -> Result<AttemptDetail> {
        let attempt = self.owned_attempt(student_id, attempt_id).await?;
        let answers = self.repos.answers.list_by_attempt(attempt.id).await?;
        Ok(AttemptDetail { attempt, answers })
    }

    /// Records an anonymous, client-scored result as a completed attempt.
    pub async fn submit_guest_attempt(&self, sub: PublicQuizSubmission) -> Result<PublicQuizSubmissionResponse> {
        let (course, package) = self
            .course_and_package(sub.course_id, sub.quiz_package_id)
            .await?;

        if sub.score > sub.total_points {
            return Err(Error::BadRequest(
                "score cannot exceed total_points".to_string(),
            ));
        }

        let device_id = sub
            .device_id
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        if let Some(device) = device_id.as_deref() {
            self.eligibility
                .ensure_device_may_submit(device, package.id)
                .await?;
        }

        let student = self.guest_student(&sub.student_name).await?;

        let answered: i64 = sub.answers.iter().map(|a| a.points_earned as i64).sum();
        if answered != sub.score as i64 {
            tracing::warn!(
                claimed = sub.score,
                answered,
                quiz_package_id = package.id,
                "guest score differs from answer points"
            );
        }

        let end_time = Utc::now();
        let start_time = end_time - Duration::seconds(sub.time_taken.max(0));
        let answers = sub
            .answers
            .into_iter()
            .map(|a| AnswerDraft {
                question_id: a.question_id,
                student_answer: a.user_answer,
                is_correct: a.is_correct,
                points_earned: a.points_earned,
            })
            .collect();

        let attempt = self
            .repos
            .attempts
            .create_guest(
                NewGuestAttempt {
                    student_id: student.id,
                    course_id: course.id,
                    quiz_package_id: package.id,
                    device_id,
                    score: sub.score,
                    total_points: sub.total_points,
                    start_time,
                    end_time,
                },
                answers,
            )
            .await?;

        tracing::info!(attempt_id = attempt.id, student_id = student.id, "guest attempt recorded");

        Ok(PublicQuizSubmissionResponse {
            message: "Quiz submitted successfully".to_string(),
            attempt_id: attempt.id,
            score: attempt.score,
            percentage: attempt.percentage(),
        })
    }

    async fn guest_student(&self, name: &str) -> Result<User> {
        let email = guest_email(name);
        if let Some(user) = self.repos.users.find_by_email(&email).await? {
            return Ok(user);
        }

        let password_hash = hash_password(&generate_password(24))?;
        let created = self
            .repos
            .users
            .create(NewUser {
                email: email.clone(),
                password_hash,
                name: name.trim().to_string(),
                role: UserRole::Student,
                contact: ContactDetails::default(),
            })
            .await;

        match created {
            Ok(user) => Ok(user),
            Err(Error::Conflict(_)) => self
                .repos
                .users
                .find_by_email(&email)
                .await?
                .ok_or_else(|| Error::Internal("guest account vanished after conflict".to_string())),
            Err(e) => Err(e),
        }
    }

    /// Abandons attempts left in progress for longer than `max_age`.
    pub async fn abandon_stale(&self, max_age: Duration) -> Result<u64> {
        let abandoned = self
            .repos
            .attempts
            .abandon_started_before(Utc::now() - max_age)
            .await?;
        if abandoned > 0 {
            tracing::info!(abandoned, "stale attempts abandoned");
        }
        Ok(abandoned)
    }
}
