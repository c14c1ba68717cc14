//! Process-local store backing every repository trait. Used by the test suites and for
//! running the API without a database. Mirrors the Postgres semantics: soft-deleted
//! rows are invisible and attempt starts count and insert under one write lock.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::models::answer::{Answer, AnswerDraft};
use crate::models::attempt::{
    Attempt, AttemptCounts, AttemptStatus, AttemptWithStudent, CourseTakerSummary, NewAttempt,
    NewGuestAttempt, StudentAttemptCounts,
};
use crate::models::course::{Course, CourseDraft};
use crate::models::enrollment::{Enrollment, EnrollmentDetail, EnrollmentStatus};
use crate::models::question::{Question, QuestionDraft};
use crate::models::quiz_package::{QuizPackage, QuizPackageDraft};
use crate::models::user::{NewUser, User, UserRole};

use super::{
    AnswerRepository, AttemptRepository, CourseRepository, EnrollmentRepository,
    QuestionRepository, QuizPackageRepository, UserRepository,
};

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    users: BTreeMap<i64, User>,
    courses: BTreeMap<i64, Course>,
    packages: BTreeMap<i64, QuizPackage>,
    questions: BTreeMap<i64, Question>,
    enrollments: BTreeMap<i64, Enrollment>,
    attempts: BTreeMap<i64, Attempt>,
    answers: BTreeMap<i64, Answer>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn live_users(&self) -> impl Iterator<Item = &User> {
        self.users.values().filter(|u| u.deleted_at.is_none())
    }

    fn live_attempts(&self) -> impl Iterator<Item = &Attempt> {
        self.attempts.values().filter(|a| a.deleted_at.is_none())
    }

    fn insert_user(&mut self, user: NewUser) -> Result<User> {
        if self.live_users().any(|u| u.email == user.email) {
            return Err(Error::Conflict("Email already registered".to_string()));
        }
        let now = Utc::now();
        let created = User {
            id: self.next_id(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            role: user.role,
            phone_number: user.contact.phone_number,
            address: user.contact.address,
            city: user.contact.city,
            postal_code: user.contact.postal_code,
            facebook_url: user.contact.facebook_url,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.users.insert(created.id, created.clone());
        Ok(created)
    }

    fn insert_enrollment(&mut self, student_id: i64, course_id: i64) -> Result<Enrollment> {
        let exists = self.enrollments.values().any(|e| {
            e.student_id == student_id && e.course_id == course_id && e.deleted_at.is_none()
        });
        if exists {
            return Err(Error::Conflict("Enrollment already exists".to_string()));
        }
        let now = Utc::now();
        let enrollment = Enrollment {
            id: self.next_id(),
            student_id,
            course_id,
            status: EnrollmentStatus::Pending,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.enrollments.insert(enrollment.id, enrollment.clone());
        Ok(enrollment)
    }

    fn upsert_answer(&mut self, attempt_id: i64, draft: AnswerDraft) -> Answer {
        let now = Utc::now();
        let existing = self
            .answers
            .values_mut()
            .find(|a| a.attempt_id == attempt_id && a.question_id == draft.question_id);
        if let Some(answer) = existing {
            answer.student_answer = draft.student_answer;
            answer.is_correct = draft.is_correct;
            answer.points_earned = draft.points_earned;
            answer.updated_at = now;
            return answer.clone();
        }
        let answer = Answer {
            id: self.next_id(),
            attempt_id,
            question_id: draft.question_id,
            student_answer: draft.student_answer,
            is_correct: draft.is_correct,
            points_earned: draft.points_earned,
            created_at: now,
            updated_at: now,
        };
        self.answers.insert(answer.id, answer.clone());
        answer
    }

    fn count_for(&self, student_id: i64, course_id: i64, quiz_package_id: i64) -> i64 {
        self.live_attempts()
            .filter(|a| {
                a.student_id == student_id
                    && a.course_id == course_id
                    && a.quiz_package_id == quiz_package_id
            })
            .count() as i64
    }

    fn with_student(&self, attempt: &Attempt) -> AttemptWithStudent {
        let user = self.users.get(&attempt.student_id);
        AttemptWithStudent {
            id: attempt.id,
            student_id: attempt.student_id,
            student_name: user.map(|u| u.name.clone()),
            student_email: user.map(|u| u.email.clone()),
            status: attempt.status,
            score: attempt.score,
            total_points: attempt.total_points,
            device_id: attempt.device_id.clone(),
            start_time: attempt.start_time,
            end_time: attempt.end_time,
            created_at: attempt.created_at,
            student_created_at: user.map(|u| u.created_at),
        }
    }
}

fn newest_first(a: &Attempt, b: &Attempt) -> std::cmp::Ordering {
    (b.created_at, b.id).cmp(&(a.created_at, a.id))
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let state = self.state.read().await;
        let found = state.live_users().find(|u| u.id == id).cloned();
        Ok(found)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        let found = state.live_users().find(|u| u.email == email).cloned();
        Ok(found)
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        let found = state
            .live_users()
            .find(|u| u.phone_number.as_deref() == Some(phone_number))
            .cloned();
        Ok(found)
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        self.state.write().await.insert_user(user)
    }

    async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.live_users().filter(|u| u.role == role).cloned().collect();
        users.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(users)
    }

    async fn count_by_role(&self, role: UserRole) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.live_users().filter(|u| u.role == role).count() as i64)
    }

    async fn soft_delete_with_attempts(&self, id: i64) -> Result<Option<u64>> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        match state.users.get_mut(&id) {
            Some(user) if user.deleted_at.is_none() => user.deleted_at = Some(now),
            _ => return Ok(None),
        }
        let mut deleted = 0;
        for attempt in state.attempts.values_mut() {
            if attempt.student_id == id && attempt.deleted_at.is_none() {
                attempt.deleted_at = Some(now);
                deleted += 1;
            }
        }
        Ok(Some(deleted))
    }
}

#[async_trait]
impl CourseRepository for InMemoryStore {
    async fn create(&self, draft: CourseDraft) -> Result<Course> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let course = Course {
            id: state.next_id(),
            title: draft.title,
            description: draft.description,
            student_limit: draft.student_limit,
            retry_count: draft.retry_count,
            exam_time: draft.exam_time,
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.courses.insert(course.id, course.clone());
        Ok(course)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Course>> {
        let state = self.state.read().await;
        Ok(state.courses.get(&id).filter(|c| c.deleted_at.is_none()).cloned())
    }

    async fn list(&self) -> Result<Vec<Course>> {
        let state = self.state.read().await;
        let mut courses: Vec<Course> = state
            .courses
            .values()
            .filter(|c| c.deleted_at.is_none())
            .cloned()
            .collect();
        courses.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(courses)
    }

    async fn update(&self, id: i64, draft: CourseDraft) -> Result<Option<Course>> {
        let mut state = self.state.write().await;
        let Some(course) = state.courses.get_mut(&id).filter(|c| c.deleted_at.is_none()) else {
            return Ok(None);
        };
        course.title = draft.title;
        course.description = draft.description;
        course.student_limit = draft.student_limit;
        course.retry_count = draft.retry_count;
        course.exam_time = draft.exam_time;
        course.is_active = draft.is_active;
        course.updated_at = Utc::now();
        Ok(Some(course.clone()))
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.courses.get_mut(&id) {
            Some(course) if course.deleted_at.is_none() => {
                course.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl QuizPackageRepository for InMemoryStore {
    async fn create(&self, draft: QuizPackageDraft) -> Result<QuizPackage> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let package = QuizPackage {
            id: state.next_id(),
            course_id: draft.course_id,
            title: draft.title,
            description: draft.description,
            max_retake_count: draft.max_retake_count,
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.packages.insert(package.id, package.clone());
        Ok(package)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<QuizPackage>> {
        let state = self.state.read().await;
        Ok(state.packages.get(&id).filter(|p| p.deleted_at.is_none()).cloned())
    }

    async fn list_by_course(&self, course_id: i64) -> Result<Vec<QuizPackage>> {
        let state = self.state.read().await;
        Ok(state
            .packages
            .values()
            .filter(|p| p.course_id == course_id && p.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, draft: QuizPackageDraft) -> Result<Option<QuizPackage>> {
        let mut state = self.state.write().await;
        let Some(package) = state.packages.get_mut(&id).filter(|p| p.deleted_at.is_none()) else {
            return Ok(None);
        };
        package.course_id = draft.course_id;
        package.title = draft.title;
        package.description = draft.description;
        package.max_retake_count = draft.max_retake_count;
        package.is_active = draft.is_active;
        package.updated_at = Utc::now();
        Ok(Some(package.clone()))
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.packages.get_mut(&id) {
            Some(package) if package.deleted_at.is_none() => {
                package.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl QuestionRepository for InMemoryStore {
    async fn create(&self, draft: QuestionDraft) -> Result<Question> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let question = Question {
            id: state.next_id(),
            quiz_package_id: draft.quiz_package_id,
            question_text: draft.question_text,
            question_type: draft.question_type,
            image_url: draft.image_url,
            options: Json(draft.options),
            correct_answer: draft.correct_answer,
            points: draft.points,
            order_number: draft.order_number,
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Question>> {
        let state = self.state.read().await;
        Ok(state.questions.get(&id).filter(|q| q.deleted_at.is_none()).cloned())
    }

    async fn list_active_by_package(&self, quiz_package_id: i64) -> Result<Vec<Question>> {
        let state = self.state.read().await;
        let mut questions: Vec<Question> = state
            .questions
            .values()
            .filter(|q| q.quiz_package_id == quiz_package_id && q.is_active && q.deleted_at.is_none())
            .cloned()
            .collect();
        questions.sort_by_key(|q| (q.order_number, q.id));
        Ok(questions)
    }

    async fn update(&self, id: i64, draft: QuestionDraft) -> Result<Option<Question>> {
        let mut state = self.state.write().await;
        let Some(question) = state.questions.get_mut(&id).filter(|q| q.deleted_at.is_none()) else {
            return Ok(None);
        };
        question.quiz_package_id = draft.quiz_package_id;
        question.question_text = draft.question_text;
        question.question_type = draft.question_type;
        question.image_url = draft.image_url;
        question.options = Json(draft.options);
        question.correct_answer = draft.correct_answer;
        question.points = draft.points;
        question.order_number = draft.order_number;
        question.is_active = draft.is_active;
        question.updated_at = Utc::now();
        Ok(Some(question.clone()))
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.questions.get_mut(&id) {
            Some(question) if question.deleted_at.is_none() => {
                question.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryStore {
    async fn find_for(&self, student_id: i64, course_id: i64) -> Result<Option<Enrollment>> {
        let state = self.state.read().await;
        Ok(state
            .enrollments
            .values()
            .find(|e| e.student_id == student_id && e.course_id == course_id && e.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Enrollment>> {
        let state = self.state.read().await;
        Ok(state.enrollments.get(&id).filter(|e| e.deleted_at.is_none()).cloned())
    }

    async fn create(&self, student_id: i64, course_id: i64) -> Result<Enrollment> {
        self.state.write().await.insert_enrollment(student_id, course_id)
    }

    async fn update_status(&self, id: i64, status: EnrollmentStatus) -> Result<Option<Enrollment>> {
        let mut state = self.state.write().await;
        let Some(enrollment) = state.enrollments.get_mut(&id).filter(|e| e.deleted_at.is_none())
        else {
            return Ok(None);
        };
        enrollment.status = status;
        enrollment.updated_at = Utc::now();
        Ok(Some(enrollment.clone()))
    }

    async fn register_student(&self, user: NewUser, course_id: i64) -> Result<(User, Enrollment)> {
        let mut state = self.state.write().await;
        let user = state.insert_user(user)?;
        let enrollment = state.insert_enrollment(user.id, course_id)?;
        Ok((user, enrollment))
    }

    async fn list_live_by_course(&self, course_id: i64) -> Result<Vec<EnrollmentDetail>> {
        let state = self.state.read().await;
        let mut rows: Vec<EnrollmentDetail> = state
            .enrollments
            .values()
            .filter(|e| e.course_id == course_id && e.status.is_live() && e.deleted_at.is_none())
            .filter_map(|e| {
                let user = state.users.get(&e.student_id).filter(|u| u.deleted_at.is_none())?;
                Some(EnrollmentDetail {
                    id: e.id,
                    student_id: e.student_id,
                    course_id: e.course_id,
                    status: e.status,
                    enrolled_at: e.created_at,
                    student_name: user.name.clone(),
                    email: user.email.clone(),
                    phone_number: user.phone_number.clone(),
                    address: user.address.clone(),
                    city: user.city.clone(),
                    postal_code: user.postal_code.clone(),
                    facebook_url: user.facebook_url.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| (b.enrolled_at, b.id).cmp(&(a.enrolled_at, a.id)));
        Ok(rows)
    }

    async fn count_live_by_course(&self, course_id: i64) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .enrollments
            .values()
            .filter(|e| e.course_id == course_id && e.status.is_live() && e.deleted_at.is_none())
            .count() as i64)
    }
}

#[async_trait]
impl AttemptRepository for InMemoryStore {
    async fn create_within_limit(
        &self,
        attempt: NewAttempt,
        max_allowed: i64,
    ) -> Result<Option<Attempt>> {
        let mut state = self.state.write().await;
        let prior = state.count_for(attempt.student_id, attempt.course_id, attempt.quiz_package_id);
        if prior >= max_allowed {
            return Ok(None);
        }
        let now = Utc::now();
        let created = Attempt {
            id: state.next_id(),
            student_id: attempt.student_id,
            course_id: attempt.course_id,
            quiz_package_id: attempt.quiz_package_id,
            status: AttemptStatus::InProgress,
            start_time: now,
            end_time: None,
            score: 0,
            total_points: attempt.total_points,
            attempt_count: (prior + 1) as i32,
            device_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.attempts.insert(created.id, created.clone());
        Ok(Some(created))
    }

    async fn create_guest(
        &self,
        attempt: NewGuestAttempt,
        answers: Vec<AnswerDraft>,
    ) -> Result<Attempt> {
        let mut state = self.state.write().await;
        let prior = state.count_for(attempt.student_id, attempt.course_id, attempt.quiz_package_id);
        let now = Utc::now();
        let created = Attempt {
            id: state.next_id(),
            student_id: attempt.student_id,
            course_id: attempt.course_id,
            quiz_package_id: attempt.quiz_package_id,
            status: AttemptStatus::Completed,
            start_time: attempt.start_time,
            end_time: Some(attempt.end_time),
            score: attempt.score,
            total_points: attempt.total_points,
            attempt_count: (prior + 1) as i32,
            device_id: attempt.device_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.attempts.insert(created.id, created.clone());
        for answer in answers {
            state.upsert_answer(created.id, answer);
        }
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Attempt>> {
        let state = self.state.read().await;
        let found = state.live_attempts().find(|a| a.id == id).cloned();
        Ok(found)
    }

    async fn count_for(
        &self,
        student_id: i64,
        course_id: i64,
        quiz_package_id: i64,
    ) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.count_for(student_id, course_id, quiz_package_id))
    }

    async fn complete(
        &self,
        id: i64,
        score: i32,
        end_time: DateTime<Utc>,
    ) -> Result<Option<Attempt>> {
        let mut state = self.state.write().await;
        let Some(attempt) = state.attempts.get_mut(&id).filter(|a| {
            a.deleted_at.is_none() && a.status == AttemptStatus::InProgress
        }) else {
            return Ok(None);
        };
        attempt.status = AttemptStatus::Completed;
        attempt.score = score;
        attempt.end_time = Some(end_time);
        attempt.updated_at = Utc::now();
        Ok(Some(attempt.clone()))
    }

    async fn abandon_started_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut swept = 0;
        for attempt in state.attempts.values_mut() {
            if attempt.deleted_at.is_none()
                && attempt.status == AttemptStatus::InProgress
                && attempt.start_time < cutoff
            {
                attempt.status = AttemptStatus::Abandoned;
                attempt.end_time = Some(now);
                attempt.updated_at = now;
                swept += 1;
            }
        }
        Ok(swept)
    }

    async fn list_by_student(&self, student_id: i64) -> Result<Vec<Attempt>> {
        let state = self.state.read().await;
        let mut attempts: Vec<Attempt> = state
            .live_attempts()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect();
        attempts.sort_by(newest_first);
        Ok(attempts)
    }

    async fn list_by_package(&self, quiz_package_id: i64) -> Result<Vec<Attempt>> {
        let state = self.state.read().await;
        let mut attempts: Vec<Attempt> = state
            .live_attempts()
            .filter(|a| a.quiz_package_id == quiz_package_id)
            .cloned()
            .collect();
        attempts.sort_by(newest_first);
        Ok(attempts)
    }

    async fn recent_by_package(
        &self,
        quiz_package_id: i64,
        limit: i64,
    ) -> Result<Vec<AttemptWithStudent>> {
        let state = self.state.read().await;
        let mut attempts: Vec<&Attempt> = state
            .live_attempts()
            .filter(|a| a.quiz_package_id == quiz_package_id)
            .collect();
        attempts.sort_by(|a, b| newest_first(a, b));
        Ok(attempts
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|a| state.with_student(a))
            .collect())
    }

    async fn list_by_course_with_student(
        &self,
        course_id: i64,
    ) -> Result<Vec<AttemptWithStudent>> {
        let state = self.state.read().await;
        let mut attempts: Vec<&Attempt> = state
            .live_attempts()
            .filter(|a| a.course_id == course_id)
            .collect();
        attempts.sort_by(|a, b| newest_first(a, b));
        Ok(attempts.into_iter().map(|a| state.with_student(a)).collect())
    }

    async fn counts_by_course(&self, course_id: i64) -> Result<AttemptCounts> {
        let state = self.state.read().await;
        let mut counts = AttemptCounts::default();
        let mut students = BTreeSet::new();
        let mut devices = BTreeSet::new();
        for attempt in state.live_attempts().filter(|a| a.course_id == course_id) {
            counts.total += 1;
            students.insert(attempt.student_id);
            if let Some(device) = &attempt.device_id {
                devices.insert(device.clone());
            }
        }
        counts.distinct_students = students.len() as i64;
        counts.distinct_devices = devices.len() as i64;
        Ok(counts)
    }

    async fn counts_by_student(&self) -> Result<Vec<StudentAttemptCounts>> {
        let state = self.state.read().await;
        let mut grouped: BTreeMap<i64, (i64, BTreeSet<i64>)> = BTreeMap::new();
        for attempt in state.live_attempts() {
            let entry = grouped.entry(attempt.student_id).or_default();
            entry.0 += 1;
            entry.1.insert(attempt.course_id);
        }
        Ok(grouped
            .into_iter()
            .map(|(student_id, (total, courses))| StudentAttemptCounts {
                student_id,
                total_attempts: total,
                courses_attempted: courses.len() as i64,
            })
            .collect())
    }

    async fn course_taker_summaries(&self, course_id: i64) -> Result<Vec<CourseTakerSummary>> {
        let state = self.state.read().await;
        let mut grouped: HashMap<(String, Option<String>), CourseTakerSummary> = HashMap::new();
        for attempt in state.live_attempts().filter(|a| a.course_id == course_id) {
            let name = state
                .users
                .get(&attempt.student_id)
                .map(|u| u.name.clone())
                .unwrap_or_else(|| "Unknown".to_string());
            let key = (name.clone(), attempt.device_id.clone());
            let summary = grouped.entry(key).or_insert_with(|| CourseTakerSummary {
                student_name: name,
                device_id: attempt.device_id.clone(),
                attempt_count: 0,
                best_score: attempt.score,
                total_points: attempt.total_points,
                last_attempt: attempt.created_at,
            });
            summary.attempt_count += 1;
            summary.best_score = summary.best_score.max(attempt.score);
            summary.total_points = summary.total_points.max(attempt.total_points);
            summary.last_attempt = summary.last_attempt.max(attempt.created_at);
        }
        let mut rows: Vec<CourseTakerSummary> = grouped.into_values().collect();
        rows.sort_by(|a, b| b.last_attempt.cmp(&a.last_attempt));
        Ok(rows)
    }

    async fn latest_completed_by_device(
        &self,
        device_id: &str,
        quiz_package_id: Option<i64>,
    ) -> Result<Option<Attempt>> {
        let state = self.state.read().await;
        Ok(state
            .live_attempts()
            .filter(|a| {
                a.device_id.as_deref() == Some(device_id)
                    && a.status == AttemptStatus::Completed
                    && quiz_package_id.map_or(true, |p| a.quiz_package_id == p)
            })
            .max_by_key(|a| (a.end_time, a.id))
            .cloned())
    }

    async fn count_completed_by_device(
        &self,
        device_id: &str,
        quiz_package_id: i64,
    ) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .live_attempts()
            .filter(|a| {
                a.device_id.as_deref() == Some(device_id)
                    && a.quiz_package_id == quiz_package_id
                    && a.status == AttemptStatus::Completed
            })
            .count() as i64)
    }
}

#[async_trait]
impl AnswerRepository for InMemoryStore {
    async fn upsert(&self, attempt_id: i64, draft: AnswerDraft) -> Result<Answer> {
        Ok(self.state.write().await.upsert_answer(attempt_id, draft))
    }

    async fn list_by_attempt(&self, attempt_id: i64) -> Result<Vec<Answer>> {
        let state = self.state.read().await;
        Ok(state
            .answers
            .values()
            .filter(|a| a.attempt_id == attempt_id)
            .cloned()
            .collect())
    }

    async fn sum_points(&self, attempt_id: i64) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .answers
            .values()
            .filter(|a| a.attempt_id == attempt_id)
            .map(|a| a.points_earned as i64)
            .sum())
    }

    async fn count_by_attempt(&self, attempt_id: i64) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.answers.values().filter(|a| a.attempt_id == attempt_id).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::ContactDetails;

    fn new_student(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: "Student".to_string(),
            role: UserRole::Student,
            contact: ContactDetails::default(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = InMemoryStore::new();
        UserRepository::create(&store, new_student("a@example.com")).await.unwrap();
        let err = UserRepository::create(&store, new_student("a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn create_within_limit_stops_at_max() {
        let store = InMemoryStore::new();
        let attempt = NewAttempt {
            student_id: 1,
            course_id: 2,
            quiz_package_id: 3,
            total_points: 10,
        };
        let first = store.create_within_limit(attempt.clone(), 2).await.unwrap().unwrap();
        let second = store.create_within_limit(attempt.clone(), 2).await.unwrap().unwrap();
        assert_eq!(first.attempt_count, 1);
        assert_eq!(second.attempt_count, 2);
        assert!(store.create_within_limit(attempt, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_keeps_one_answer_per_question() {
        let store = InMemoryStore::new();
        let draft = |answer: &str, points| AnswerDraft {
            question_id: 9,
            student_answer: answer.to_string(),
            is_correct: points > 0,
            points_earned: points,
        };
        store.upsert(1, draft("wrong", 0)).await.unwrap();
        store.upsert(1, draft("right", 5)).await.unwrap();
        let answers = store.list_by_attempt(1).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].student_answer, "right");
        assert_eq!(store.sum_points(1).await.unwrap(), 5);
    }
}
