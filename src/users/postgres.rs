use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::DatabaseError;
use crate::users::{NewUser, RepositoryError, User, UserRepository};

/// `UserRepository` backed by the `users` table
#[derive(Clone)]
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
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, company, password_hash, token_version
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, company, password_hash, token_version
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, company, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, company, password_hash, token_version
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.company)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn bump_token_version(&self, id: i32) -> Result<Option<i32>, DatabaseError> {
        let version = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users
            SET token_version = token_version + 1
            WHERE id = $1
            RETURNING token_version
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(version)
    }

    async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, company, password_hash, token_version
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
