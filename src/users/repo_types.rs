use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String, // unique, compared as stored
    pub username: String,
    #[serde(skip_serializing)]
    pub password: Option<String>, // bcrypt digest; None for OAuth-only accounts
    pub oauth_provider: Option<String>,
    pub oauth_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Insert payload. `password` is plaintext; stores hash it before keeping it.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: Option<String>,
}
