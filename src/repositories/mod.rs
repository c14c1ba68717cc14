//! Persistence seam. Each aggregate has an async trait with a Postgres implementation;
//! [`memory::InMemoryStore`] implements all of them for tests and local runs.

pub mod answer_repository;
pub mod attempt_repository;
pub mod course_repository;
pub mod enrollment_repository;
pub mod memory;
pub mod question_repository;
pub mod quiz_package_repository;
pub mod user_repository;

use std::sync::Arc;

use sqlx::PgPool;

pub use answer_repository::{AnswerRepository, PgAnswerRepository};
pub use attempt_repository::{AttemptRepository, PgAttemptRepository};
pub use course_repository::{CourseRepository, PgCourseRepository};
pub use enrollment_repository::{EnrollmentRepository, PgEnrollmentRepository};
pub use memory::InMemoryStore;
pub use question_repository::{PgQuestionRepository, QuestionRepository};
pub use quiz_package_repository::{PgQuizPackageRepository, QuizPackageRepository};
pub use user_repository::{PgUserRepository, UserRepository};

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub packages: Arc<dyn QuizPackageRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub answers: Arc<dyn AnswerRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            courses: Arc::new(PgCourseRepository::new(pool.clone())),
            packages: Arc::new(PgQuizPackageRepository::new(pool.clone())),
            questions: Arc::new(PgQuestionRepository::new(pool.clone())),
            enrollments: Arc::new(PgEnrollmentRepository::new(pool.clone())),
            attempts: Arc::new(PgAttemptRepository::new(pool.clone())),
            answers: Arc::new(PgAnswerRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryStore::new()))
    }

    pub fn from_store(store: Arc<InMemoryStore>) -> Self {
        Self {
            users: store.clone(),
            courses: store.clone(),
            packages: store.clone(),
            questions: store.clone(),
            enrollments: store.clone(),
            attempts: store.clone(),
            answers: store,
        }
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}
