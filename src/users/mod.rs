//! User persistence: the [`UserStore`] capability set and its two backends.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::password::{verify_dummy_blocking, verify_password_blocking};

mod memory;
mod repo;
mod repo_types;

pub use memory::MemoryUserStore;
pub use repo::PgUserStore;
pub use repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("password is required for regular registration")]
    MissingPassword,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Inserts a user, hashing the password first. Returns the stored record
    /// with its generated id and timestamps.
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    /// Returns the user only when `email` exists, has a password, and the
    /// password matches. Callers cannot tell those three failures apart.
    async fn validate_credentials(&self, email: &str, password: &str)
        -> StoreResult<Option<User>>;
}

/// Shared tail of `validate_credentials` for both backends. Unknown email and
/// missing digest still run one bcrypt verify, so all three misses cost the same.
pub(crate) async fn check_password(user: Option<User>, password: &str) -> StoreResult<Option<User>> {
    let Some((user, digest)) = user.and_then(|u| u.password.clone().map(|d| (u, d))) else {
        verify_dummy_blocking(password.to_owned())
            .await
            .map_err(|e| StoreError::Hashing(e.to_string()))?;
        return Ok(None);
    };

    let ok = verify_password_blocking(password.to_owned(), digest)
        .await
        .map_err(|e| StoreError::Hashing(e.to_string()))?;

    Ok(ok.then_some(user))
}
