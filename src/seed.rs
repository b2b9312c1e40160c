use tracing::info;

use crate::users::{NewUser, StoreError, UserStore};

pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_USERNAME: &str = "Demo User";
pub const DEMO_PASSWORD: &str = "demo123";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    AlreadyPresent,
}

/// Creates the demo account unless its email is already taken.
pub async fn seed_demo_user(users: &dyn UserStore) -> anyhow::Result<SeedOutcome> {
    if users.find_by_email(DEMO_EMAIL).await?.is_some() {
        info!(email = DEMO_EMAIL, "demo user already exists");
        return Ok(SeedOutcome::AlreadyPresent);
    }

    let created = users
        .create_user(NewUser {
            email: DEMO_EMAIL.into(),
            username: DEMO_USERNAME.into(),
            password: Some(DEMO_PASSWORD.into()),
        })
        .await;

    match created {
        Ok(user) => {
            info!(user_id = %user.id, email = DEMO_EMAIL, "created demo user");
            Ok(SeedOutcome::Created)
        }
        // another seeder won the race
        Err(StoreError::DuplicateEmail) => Ok(SeedOutcome::AlreadyPresent),
        Err(e) => Err(e.into()),
    }
}
