use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{check_password, NewUser, StoreError, StoreResult, User, UserStore};
use crate::auth::password::hash_password_blocking;

const USER_COLUMNS: &str =
    "id, email, username, password, oauth_provider, oauth_id, created_at, updated_at";

/// Postgres-backed store over the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, column: &str, value: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1 LIMIT 1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_one("email", email).await
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let NewUser {
            email,
            username,
            password,
        } = new_user;
        let password = password.ok_or(StoreError::MissingPassword)?;
        let digest = hash_password_blocking(password)
            .await
            .map_err(|e| StoreError::Hashing(e.to_string()))?;

        let sql = format!(
            r#"
            INSERT INTO users (email, username, password)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&email)
            .bind(&username)
            .bind(&digest)
            .fetch_one(&self.db)
            .await
            .map_err(map_insert_error)?;

        debug!(user_id = %user.id, "user row inserted");
        Ok(user)
    }

    async fn validate_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<User>> {
        let user = self.find_by_email(email).await?;
        check_password(user, password).await
    }
}

/// The unique index on `email` is the real guard against concurrent signups.
fn map_insert_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Database(e),
    }
}
