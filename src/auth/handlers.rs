use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, PublicUser},
        validation::{validate_login, validate_register, Violation},
    },
    error::ApiError,
    state::AppState,
    users::NewUser,
};

type AuthResult = Result<(StatusCode, Json<AuthResponse>), ApiError>;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
}

/// Unparseable bodies fail validation like any other malformed input.
fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            warn!(error = %rejection, "request body rejected");
            Err(ApiError::Validation(vec![Violation::new(
                rejection.body_text(),
                &[],
            )]))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AuthResult {
    let body = json_body(payload)?;
    let input = validate_login(&body).map_err(|errors| {
        warn!(count = errors.len(), "login validation failed");
        ApiError::Validation(errors)
    })?;

    let Some(user) = state
        .users
        .validate_credentials(&input.email, &input.password)
        .await?
    else {
        warn!(email = %input.email, "login rejected");
        return Err(ApiError::InvalidCredentials);
    };

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        StatusCode::OK,
        Json(AuthResponse::ok("Login successful", PublicUser::from(user))),
    ))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AuthResult {
    let body = json_body(payload)?;
    let input = validate_register(&body).map_err(|errors| {
        warn!(count = errors.len(), "register validation failed");
        ApiError::Validation(errors)
    })?;

    // Ensure email is not taken; the unique index still has the final word
    if state.users.find_by_email(&input.email).await?.is_some() {
        warn!(email = %input.email, "email already registered");
        return Err(ApiError::EmailTaken);
    }

    let user = state
        .users
        .create_user(NewUser {
            email: input.email,
            username: input.username,
            password: Some(input.password),
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::ok(
            "Account created successfully",
            PublicUser::from(user),
        )),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{StoreError, StoreResult, User, UserStore};
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request},
    };
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app(state: AppState) -> Router {
        Router::new().nest("/api", auth_routes()).with_state(state)
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        post_raw(app, uri, body.to_string()).await
    }

    async fn post_raw(app: &Router, uri: &str, body: String) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn demo_registration() -> Value {
        json!({
            "email": "demo@example.com",
            "username": "Demo User",
            "password": "demo123",
            "confirmPassword": "demo123",
        })
    }

    #[tokio::test]
    async fn register_then_login_scenario() {
        let app = app(AppState::fake());

        let (status, body) = post_json(&app, "/api/register", demo_registration()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["email"], "demo@example.com");
        assert!(body["user"].get("password").is_none());
        assert!(body["user"]["id"].is_string());

        let (status, body) = post_json(
            &app,
            "/api/login",
            json!({"email": "demo@example.com", "password": "demo123"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["username"], "Demo User");

        let (status, body) = post_json(
            &app,
            "/api/login",
            json!({"email": "demo@example.com", "password": "wrong1"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert!(body.get("user").is_none());
    }

    #[tokio::test]
    async fn short_wrong_password_is_a_validation_error() {
        let app = app(AppState::fake());
        post_json(&app, "/api/register", demo_registration()).await;

        let (status, body) = post_json(
            &app,
            "/api/login",
            json!({"email": "demo@example.com", "password": "wrong"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["path"], json!(["password"]));
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_identical() {
        let app = app(AppState::fake());
        post_json(&app, "/api/register", demo_registration()).await;

        let (s1, b1) = post_json(
            &app,
            "/api/login",
            json!({"email": "ghost@example.com", "password": "demo123"}),
        )
        .await;
        let (s2, b2) = post_json(
            &app,
            "/api/login",
            json!({"email": "demo@example.com", "password": "demo124"}),
        )
        .await;
        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!((s1, b1), (s2, b2));
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let app = app(AppState::fake());
        let (first, _) = post_json(&app, "/api/register", demo_registration()).await;
        let (second, body) = post_json(&app, "/api/register", demo_registration()).await;
        assert_eq!(first, StatusCode::CREATED);
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn password_mismatch_reports_confirm_password() {
        let app = app(AppState::fake());
        let mut payload = demo_registration();
        payload["confirmPassword"] = json!("demo321");

        let (status, body) = post_json(&app, "/api/register", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid data");
        let errors = body["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["path"], json!(["confirmPassword"]));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request_with_json_body() {
        let app = app(AppState::fake());
        let (status, body) = post_raw(&app, "/api/login", "{not json".into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0]["path"], json!([]));
    }

    /// Store whose every call fails, to drive the 500 path.
    struct BrokenStore;

    #[async_trait]
    impl UserStore for BrokenStore {
        async fn find_by_id(&self, _id: Uuid) -> StoreResult<Option<User>> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn find_by_username(&self, _u: &str) -> StoreResult<Option<User>> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn find_by_email(&self, _e: &str) -> StoreResult<Option<User>> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn create_user(&self, _n: NewUser) -> StoreResult<User> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn validate_credentials(&self, _e: &str, _p: &str) -> StoreResult<Option<User>> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn store_failure_is_internal_error() {
        let state = AppState::from_parts(
            Arc::new(BrokenStore),
            Arc::new(crate::config::AppConfig::memory()),
        );
        let app = app(state);

        let (status, body) = post_json(
            &app,
            "/api/login",
            json!({"email": "demo@example.com", "password": "demo123"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"success": false, "message": "Internal server error"}));

        let (status, _) = post_json(&app, "/api/register", demo_registration()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
