use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::question::{Question, QuestionDraft};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn create(&self, draft: QuestionDraft) -> Result<Question>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Question>>;
    /// Active questions of a package ordered by `order_number`.
    async fn list_active_by_package(&self, quiz_package_id: i64) -> Result<Vec<Question>>;
    async fn update(&self, id: i64, draft: QuestionDraft) -> Result<Option<Question>>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
}

pub struct PgQuestionRepository {
    pool: PgPool,
}

impl PgQuestionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionRepository for PgQuestionRepository {
    async fn create(&self, draft: QuestionDraft) -> Result<Question> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (
                quiz_package_id, question_text, question_type, image_url, options,
                correct_answer, points, order_number, is_active
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(draft.quiz_package_id)
        .bind(&draft.question_text)
        .bind(draft.question_type)
        .bind(&draft.image_url)
        .bind(Json(&draft.options))
        .bind(&draft.correct_answer)
        .bind(draft.points)
        .bind(draft.order_number)
        .bind(draft.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(question)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(
            r#"SELECT * FROM questions WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn list_active_by_package(&self, quiz_package_id: i64) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(
            r#"SELECT * FROM questions
               WHERE quiz_package_id = $1 AND is_active AND deleted_at IS NULL
               ORDER BY order_number ASC, id ASC"#,
        )
        .bind(quiz_package_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    async fn update(&self, id: i64, draft: QuestionDraft) -> Result<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions
            SET quiz_package_id = $2, question_text = $3, question_type = $4, image_url = $5,
                options = $6, correct_answer = $7, points = $8, order_number = $9,
                is_active = $10, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(draft.quiz_package_id)
        .bind(&draft.question_text)
        .bind(draft.question_type)
        .bind(&draft.image_url)
        .bind(Json(&draft.options))
        .bind(&draft.correct_answer)
        .bind(draft.points)
        .bind(draft.order_number)
        .bind(draft.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"UPDATE questions SET deleted_at = NOW(), updated_at = NOW()
               WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
