use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{check_password, NewUser, StoreError, StoreResult, User, UserStore};
use crate::auth::password::hash_password_blocking;

/// Process-local store for development and tests. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn find_by(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.users.read().await.values().find(|u| pred(*u)).cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.find_by(|u| u.username == username).await)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.find_by(|u| u.email == email).await)
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let NewUser {
            email,
            username,
            password,
        } = new_user;

        // Hash outside the lock.
        let password = match password {
            Some(plain) => Some(
                hash_password_blocking(plain)
                    .await
                    .map_err(|e| StoreError::Hashing(e.to_string()))?,
            ),
            None => None,
        };

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email,
            username,
            password,
            oauth_provider: None,
            oauth_id: None,
            created_at: now,
            updated_at: now,
        };

        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
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
