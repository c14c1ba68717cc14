use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::course::{Course, CourseDraft};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create(&self, draft: CourseDraft) -> Result<Course>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Course>>;
    async fn list(&self) -> Result<Vec<Course>>;
    async fn update(&self, id: i64, draft: CourseDraft) -> Result<Option<Course>>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
}

pub struct PgCourseRepository {
    pool: PgPool,
}

impl PgCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseRepository for PgCourseRepository {
    async fn create(&self, draft: CourseDraft) -> Result<Course> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (title, description, student_limit, retry_count, exam_time, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.student_limit)
        .bind(draft.retry_count)
        .bind(draft.exam_time)
        .bind(draft.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(course)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            r#"SELECT * FROM courses WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn list(&self) -> Result<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(
            r#"SELECT * FROM courses WHERE deleted_at IS NULL ORDER BY created_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    async fn update(&self, id: i64, draft: CourseDraft) -> Result<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET title = $2, description = $3, student_limit = $4, retry_count = $5,
                exam_time = $6, is_active = $7, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.student_limit)
        .bind(draft.retry_count)
        .bind(draft.exam_time)
        .bind(draft.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"UPDATE courses SET deleted_at = NOW(), updated_at = NOW()
               WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
