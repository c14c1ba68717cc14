use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::enrollment::{Enrollment, EnrollmentDetail, EnrollmentStatus};
use crate::models::user::{NewUser, User};

use super::is_unique_violation;
use super::user_repository::insert_user;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find_for(&self, student_id: i64, course_id: i64) -> Result<Option<Enrollment>>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Enrollment>>;
    /// Inserts a pending enrollment. Fails with `Conflict` when one already exists.
    async fn create(&self, student_id: i64, course_id: i64) -> Result<Enrollment>;
    async fn update_status(&self, id: i64, status: EnrollmentStatus) -> Result<Option<Enrollment>>;
    /// Creates the user and a pending enrollment atomically.
    async fn register_student(&self, user: NewUser, course_id: i64) -> Result<(User, Enrollment)>;
    /// Pending and approved enrollments, newest first.
    async fn list_live_by_course(&self, course_id: i64) -> Result<Vec<EnrollmentDetail>>;
    async fn count_live_by_course(&self, course_id: i64) -> Result<i64>;
}

pub struct PgEnrollmentRepository {
    pool: PgPool,
}

impl PgEnrollmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_ENROLLMENT: &str = r#"
    INSERT INTO enrollments (student_id, course_id, status)
    VALUES ($1, $2, 'pending')
    RETURNING *
"#;

fn enrollment_conflict(err: sqlx::Error) -> Error {
    if is_unique_violation(&err) {
        Error::Conflict("Enrollment already exists".to_string())
    } else {
        Error::from(err)
    }
}

#[async_trait]
impl EnrollmentRepository for PgEnrollmentRepository {
    async fn find_for(&self, student_id: i64, course_id: i64) -> Result<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"SELECT * FROM enrollments
               WHERE student_id = $1 AND course_id = $2 AND deleted_at IS NULL"#,
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"SELECT * FROM enrollments WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }

    async fn create(&self, student_id: i64, course_id: i64) -> Result<Enrollment> {
        sqlx::query_as::<_, Enrollment>(INSERT_ENROLLMENT)
            .bind(student_id)
            .bind(course_id)
            .fetch_one(&self.pool)
            .await
            .map_err(enrollment_conflict)
    }

    async fn update_status(&self, id: i64, status: EnrollmentStatus) -> Result<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"UPDATE enrollments SET status = $2, updated_at = NOW()
               WHERE id = $1 AND deleted_at IS NULL
               RETURNING *"#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }

    async fn register_student(&self, user: NewUser, course_id: i64) -> Result<(User, Enrollment)> {
        let mut tx = self.pool.begin().await?;
        let user = insert_user(&mut *tx, user).await?;
        let enrollment = sqlx::query_as::<_, Enrollment>(INSERT_ENROLLMENT)
            .bind(user.id)
            .bind(course_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(enrollment_conflict)?;
        tx.commit().await?;
        Ok((user, enrollment))
    }

    async fn list_live_by_course(&self, course_id: i64) -> Result<Vec<EnrollmentDetail>> {
        let rows = sqlx::query_as::<_, EnrollmentDetail>(
            r#"
            SELECT e.id, e.student_id, e.course_id, e.status, e.created_at AS enrolled_at,
                   u.name AS student_name, u.email, u.phone_number, u.address, u.city,
                   u.postal_code, u.facebook_url
            FROM enrollments e
            JOIN users u ON u.id = e.student_id AND u.deleted_at IS NULL
            WHERE e.course_id = $1 AND e.status <> 'declined' AND e.deleted_at IS NULL
            ORDER BY e.created_at DESC
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_live_by_course(&self, course_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM enrollments
               WHERE course_id = $1 AND status <> 'declined' AND deleted_at IS NULL"#,
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
