use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::answer::{Answer, AnswerDraft};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Writes the answer for (attempt, question), replacing any earlier one.
    async fn upsert(&self, attempt_id: i64, draft: AnswerDraft) -> Result<Answer>;
    async fn list_by_attempt(&self, attempt_id: i64) -> Result<Vec<Answer>>;
    async fn sum_points(&self, attempt_id: i64) -> Result<i64>;
    async fn count_by_attempt(&self, attempt_id: i64) -> Result<i64>;
}

pub struct PgAnswerRepository {
    pool: PgPool,
}

impl PgAnswerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) const UPSERT_ANSWER: &str = r#"
    INSERT INTO answers (attempt_id, question_id, student_answer, is_correct, points_earned)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (attempt_id, question_id) DO UPDATE
    SET student_answer = EXCLUDED.student_answer,
        is_correct = EXCLUDED.is_correct,
        points_earned = EXCLUDED.points_earned,
        updated_at = NOW()
    RETURNING *
"#;

#[async_trait]
impl AnswerRepository for PgAnswerRepository {
    async fn upsert(&self, attempt_id: i64, draft: AnswerDraft) -> Result<Answer> {
        let answer = sqlx::query_as::<_, Answer>(UPSERT_ANSWER)
            .bind(attempt_id)
            .bind(draft.question_id)
            .bind(&draft.student_answer)
            .bind(draft.is_correct)
            .bind(draft.points_earned)
            .fetch_one(&self.pool)
            .await?;
        Ok(answer)
    }

    async fn list_by_attempt(&self, attempt_id: i64) -> Result<Vec<Answer>> {
        let answers = sqlx::query_as::<_, Answer>(
            r#"SELECT * FROM answers WHERE attempt_id = $1 ORDER BY id ASC"#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }

    async fn sum_points(&self, attempt_id: i64) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"SELECT COALESCE(SUM(points_earned), 0)::BIGINT FROM answers WHERE attempt_id = $1"#,
        )
        .bind(attempt_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn count_by_attempt(&self, attempt_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM answers WHERE attempt_id = $1"#)
            .bind(attempt_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
