use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::answer::AnswerDraft;
use crate::models::attempt::{
    Attempt, AttemptCounts, AttemptWithStudent, CourseTakerSummary, NewAttempt, NewGuestAttempt,
    StudentAttemptCounts,
};

use super::answer_repository::UPSERT_ANSWER;
use super::is_unique_violation;

/// Concurrent starts that race on the same ordinal are re-run this many times.
const START_RETRIES: usize = 3;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Counts prior attempts and inserts an `in_progress` one in a single step.
    /// Returns `None` when `max_allowed` attempts already exist.
    async fn create_within_limit(
        &self,
        attempt: NewAttempt,
        max_allowed: i64,
    ) -> Result<Option<Attempt>>;
    /// Records a completed guest attempt and its answers atomically.
    async fn create_guest(
        &self,
        attempt: NewGuestAttempt,
        answers: Vec<AnswerDraft>,
    ) -> Result<Attempt>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Attempt>>;
    async fn count_for(&self, student_id: i64, course_id: i64, quiz_package_id: i64)
        -> Result<i64>;
    /// Moves an `in_progress` attempt to `completed`. `None` if it was not in progress.
    async fn complete(
        &self,
        id: i64,
        score: i32,
        end_time: DateTime<Utc>,
    ) -> Result<Option<Attempt>>;
    /// Marks every `in_progress` attempt started before `cutoff` as `abandoned`.
    async fn abandon_started_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
    async fn list_by_student(&self, student_id: i64) -> Result<Vec<Attempt>>;
    async fn list_by_package(&self, quiz_package_id: i64) -> Result<Vec<Attempt>>;
    async fn recent_by_package(
        &self,
        quiz_package_id: i64,
        limit: i64,
    ) -> Result<Vec<AttemptWithStudent>>;
    async fn list_by_course_with_student(&self, course_id: i64)
        -> Result<Vec<AttemptWithStudent>>;
    async fn counts_by_course(&self, course_id: i64) -> Result<AttemptCounts>;
    async fn counts_by_student(&self) -> Result<Vec<StudentAttemptCounts>>;
    /// Groups a course's attempts by (taker name, device).
    async fn course_taker_summaries(&self, course_id: i64) -> Result<Vec<CourseTakerSummary>>;
    /// Most recent completed attempt from a device, optionally restricted to one package.
    async fn latest_completed_by_device(
        &self,
        device_id: &str,
        quiz_package_id: Option<i64>,
    ) -> Result<Option<Attempt>>;
    async fn count_completed_by_device(&self, device_id: &str, quiz_package_id: i64)
        -> Result<i64>;
}

pub struct PgAttemptRepository {
    pool: PgPool,
}

impl PgAttemptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ATTEMPT_WITH_STUDENT: &str = r#"
    SELECT a.id, a.student_id, u.name AS student_name, u.email AS student_email,
           a.status, a.score, a.total_points, a.device_id, a.start_time, a.end_time,
           a.created_at, u.created_at AS student_created_at
    FROM attempts a
    LEFT JOIN users u ON u.id = a.student_id
"#;

#[async_trait]
impl AttemptRepository for PgAttemptRepository {
    async fn create_within_limit(
        &self,
        attempt: NewAttempt,
        max_allowed: i64,
    ) -> Result<Option<Attempt>> {
        for _ in 0..START_RETRIES {
            let inserted = sqlx::query_as::<_, Attempt>(
                r#"
                INSERT INTO attempts (
                    student_id, course_id, quiz_package_id, status, start_time,
                    total_points, attempt_count
                )
                SELECT $1, $2, $3, 'in_progress', NOW(), $4, COUNT(*) + 1
                FROM attempts
                WHERE student_id = $1 AND course_id = $2 AND quiz_package_id = $3
                  AND deleted_at IS NULL
                HAVING COUNT(*) < $5
                RETURNING *
                "#,
            )
            .bind(attempt.student_id)
            .bind(attempt.course_id)
            .bind(attempt.quiz_package_id)
            .bind(attempt.total_points)
            .bind(max_allowed)
            .fetch_optional(&self.pool)
            .await;

            match inserted {
                Ok(row) => return Ok(row),
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(
                        student_id = attempt.student_id,
                        quiz_package_id = attempt.quiz_package_id,
                        "concurrent attempt start collided, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(Error::Conflict(
            "Another attempt was started at the same time, please retry".to_string(),
        ))
    }

    async fn create_guest(
        &self,
        attempt: NewGuestAttempt,
        answers: Vec<AnswerDraft>,
    ) -> Result<Attempt> {
        let mut tx = self.pool.begin().await?;
        let created = sqlx::query_as::<_, Attempt>(
            r#"
            INSERT INTO attempts (
                student_id, course_id, quiz_package_id, status, start_time, end_time,
                score, total_points, attempt_count, device_id
            )
            SELECT $1, $2, $3, 'completed', $4, $5, $6, $7, COUNT(*) + 1, $8
            FROM attempts
            WHERE student_id = $1 AND course_id = $2 AND quiz_package_id = $3
              AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(attempt.student_id)
        .bind(attempt.course_id)
        .bind(attempt.quiz_package_id)
        .bind(attempt.start_time)
        .bind(attempt.end_time)
        .bind(attempt.score)
        .bind(attempt.total_points)
        .bind(&attempt.device_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Conflict("Another submission was recorded at the same time".to_string())
            } else {
                Error::from(e)
            }
        })?;

        for answer in &answers {
            sqlx::query(UPSERT_ANSWER)
                .bind(created.id)
                .bind(answer.question_id)
                .bind(&answer.student_answer)
                .bind(answer.is_correct)
                .bind(answer.points_earned)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Attempt>> {
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"SELECT * FROM attempts WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempt)
    }

    async fn count_for(
        &self,
        student_id: i64,
        course_id: i64,
        quiz_package_id: i64,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM attempts
               WHERE student_id = $1 AND course_id = $2 AND quiz_package_id = $3
                 AND deleted_at IS NULL"#,
        )
        .bind(student_id)
        .bind(course_id)
        .bind(quiz_package_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn complete(
        &self,
        id: i64,
        score: i32,
        end_time: DateTime<Utc>,
    ) -> Result<Option<Attempt>> {
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"
            UPDATE attempts
            SET status = 'completed', score = $2, end_time = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'in_progress' AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(score)
        .bind(end_time)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempt)
    }

    async fn abandon_started_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE attempts
            SET status = 'abandoned', end_time = NOW(), updated_at = NOW()
            WHERE status = 'in_progress' AND start_time < $1 AND deleted_at IS NULL
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn list_by_student(&self, student_id: i64) -> Result<Vec<Attempt>> {
        let attempts = sqlx::query_as::<_, Attempt>(
            r#"SELECT * FROM attempts
               WHERE student_id = $1 AND deleted_at IS NULL
               ORDER BY created_at DESC, id DESC"#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(attempts)
    }

    async fn list_by_package(&self, quiz_package_id: i64) -> Result<Vec<Attempt>> {
        let attempts = sqlx::query_as::<_, Attempt>(
            r#"SELECT * FROM attempts
               WHERE quiz_package_id = $1 AND deleted_at IS NULL
               ORDER BY created_at DESC, id DESC"#,
        )
        .bind(quiz_package_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(attempts)
    }

    async fn recent_by_package(
        &self,
        quiz_package_id: i64,
        limit: i64,
    ) -> Result<Vec<AttemptWithStudent>> {
        let sql = format!(
            "{} WHERE a.quiz_package_id = $1 AND a.deleted_at IS NULL \
             ORDER BY a.created_at DESC, a.id DESC LIMIT $2",
            ATTEMPT_WITH_STUDENT
        );
        let rows = sqlx::query_as::<_, AttemptWithStudent>(&sql)
            .bind(quiz_package_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_by_course_with_student(
        &self,
        course_id: i64,
    ) -> Result<Vec<AttemptWithStudent>> {
        let sql = format!(
            "{} WHERE a.course_id = $1 AND a.deleted_at IS NULL \
             ORDER BY a.created_at DESC, a.id DESC",
            ATTEMPT_WITH_STUDENT
        );
        let rows = sqlx::query_as::<_, AttemptWithStudent>(&sql)
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn counts_by_course(&self, course_id: i64) -> Result<AttemptCounts> {
        let counts = sqlx::query_as::<_, AttemptCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(DISTINCT student_id) AS distinct_students,
                   COUNT(DISTINCT device_id) AS distinct_devices
            FROM attempts
            WHERE course_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    async fn counts_by_student(&self) -> Result<Vec<StudentAttemptCounts>> {
        let rows = sqlx::query_as::<_, StudentAttemptCounts>(
            r#"
            SELECT student_id,
                   COUNT(*) AS total_attempts,
                   COUNT(DISTINCT course_id) AS courses_attempted
            FROM attempts
            WHERE deleted_at IS NULL
            GROUP BY student_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn course_taker_summaries(&self, course_id: i64) -> Result<Vec<CourseTakerSummary>> {
        let rows = sqlx::query_as::<_, CourseTakerSummary>(
            r#"
            SELECT COALESCE(u.name, 'Unknown') AS student_name,
                   a.device_id,
                   COUNT(*) AS attempt_count,
                   MAX(a.score) AS best_score,
                   MAX(a.total_points) AS total_points,
                   MAX(a.created_at) AS last_attempt
            FROM attempts a
            LEFT JOIN users u ON u.id = a.student_id
            WHERE a.course_id = $1 AND a.deleted_at IS NULL
            GROUP BY COALESCE(u.name, 'Unknown'), a.device_id
            ORDER BY last_attempt DESC
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn latest_completed_by_device(
        &self,
        device_id: &str,
        quiz_package_id: Option<i64>,
    ) -> Result<Option<Attempt>> {
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"
            SELECT * FROM attempts
            WHERE device_id = $1 AND status = 'completed' AND deleted_at IS NULL
              AND ($2::BIGINT IS NULL OR quiz_package_id = $2)
            ORDER BY end_time DESC NULLS LAST, id DESC
            LIMIT 1
            "#,
        )
        .bind(device_id)
        .bind(quiz_package_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempt)
    }

    async fn count_completed_by_device(
        &self,
        device_id: &str,
        quiz_package_id: i64,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM attempts
               WHERE device_id = $1 AND quiz_package_id = $2 AND status = 'completed'
                 AND deleted_at IS NULL"#,
        )
        .bind(device_id)
        .bind(quiz_package_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
