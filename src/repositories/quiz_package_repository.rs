use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::quiz_package::{QuizPackage, QuizPackageDraft};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizPackageRepository: Send + Sync {
    async fn create(&self, draft: QuizPackageDraft) -> Result<QuizPackage>;
    async fn find_by_id(&self, id: i64) -> Result<Option<QuizPackage>>;
    async fn list_by_course(&self, course_id: i64) -> Result<Vec<QuizPackage>>;
    async fn update(&self, id: i64, draft: QuizPackageDraft) -> Result<Option<QuizPackage>>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
}

pub struct PgQuizPackageRepository {
    pool: PgPool,
}

impl PgQuizPackageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuizPackageRepository for PgQuizPackageRepository {
    async fn create(&self, draft: QuizPackageDraft) -> Result<QuizPackage> {
        let package = sqlx::query_as::<_, QuizPackage>(
            r#"
            INSERT INTO quiz_packages (course_id, title, description, max_retake_count, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(draft.course_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.max_retake_count)
        .bind(draft.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(package)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<QuizPackage>> {
        let package = sqlx::query_as::<_, QuizPackage>(
            r#"SELECT * FROM quiz_packages WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(package)
    }

    async fn list_by_course(&self, course_id: i64) -> Result<Vec<QuizPackage>> {
        let packages = sqlx::query_as::<_, QuizPackage>(
            r#"SELECT * FROM quiz_packages
               WHERE course_id = $1 AND deleted_at IS NULL
               ORDER BY id ASC"#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(packages)
    }

    async fn update(&self, id: i64, draft: QuizPackageDraft) -> Result<Option<QuizPackage>> {
        let package = sqlx::query_as::<_, QuizPackage>(
            r#"
            UPDATE quiz_packages
            SET course_id = $2, title = $3, description = $4, max_retake_count = $5,
                is_active = $6, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(draft.course_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.max_retake_count)
        .bind(draft.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(package)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"UPDATE quiz_packages SET deleted_at = NOW(), updated_at = NOW()
               WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
