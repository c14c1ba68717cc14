use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::user::{NewUser, User, UserRole};

use super::is_unique_violation;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>>;
    async fn create(&self, user: NewUser) -> Result<User>;
    async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>>;
    async fn count_by_role(&self, role: UserRole) -> Result<i64>;
    /// Hides a live user together with their attempts. `None` when no live user matched.
    async fn soft_delete_with_attempts(&self, id: i64) -> Result<Option<u64>>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT * FROM users WHERE email = $1 AND deleted_at IS NULL"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT * FROM users
               WHERE phone_number = $1 AND deleted_at IS NULL
               ORDER BY id ASC
               LIMIT 1"#,
        )
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        insert_user(&self.pool, user).await
    }

    async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"SELECT * FROM users
               WHERE role = $1 AND deleted_at IS NULL
               ORDER BY created_at DESC"#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn count_by_role(&self, role: UserRole) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM users WHERE role = $1 AND deleted_at IS NULL"#,
        )
        .bind(role)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn soft_delete_with_attempts(&self, id: i64) -> Result<Option<u64>> {
        let mut tx = self.pool.begin().await?;
        let user = sqlx::query(
            r#"UPDATE users SET deleted_at = NOW(), updated_at = NOW()
               WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if user.rows_affected() == 0 {
            return Ok(None);
        }

        let attempts = sqlx::query(
            r#"UPDATE attempts SET deleted_at = NOW(), updated_at = NOW()
               WHERE student_id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(attempts.rows_affected()))
    }
}

/// Shared by plain user creation and the registration transaction.
pub(crate) async fn insert_user<'e, E>(executor: E, user: NewUser) -> Result<User>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (
            email, password_hash, name, role,
            phone_number, address, city, postal_code, facebook_url
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.name)
    .bind(user.role)
    .bind(&user.contact.phone_number)
    .bind(&user.contact.address)
    .bind(&user.contact.city)
    .bind(&user.contact.postal_code)
    .bind(&user.contact.facebook_url)
    .fetch_one(executor)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::Conflict("Email already registered".to_string())
        } else {
            Error::from(e)
        }
    })
}
