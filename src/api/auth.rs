use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::auth::TokenResponse;
use crate::schemas::user::{UserLogin, UserRegister, UserResponse};

/// Max attempts per window for auth endpoints (login/register).
const AUTH_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const AUTH_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/validate", get(validate))
        .route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<UserRegister>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let rate_key = format!("rl:register:{}", payload.email);
    let allowed = state
        .redis()
        .rate_limit(&rate_key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many register attempts, try again later"));
    }

    // Director accounts are provisioned at bootstrap, never self-registered.
    if payload.role == UserRole::Director {
        return Err(ApiError::Forbidden("Cannot self-register a director account"));
    }

    let school = repositories::schools::find_first(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load school"))?
        .ok_or_else(|| ApiError::BadRequest("School is not initialized yet".to_string()))?;

    let existing = repositories::users::exists_by_email(state.db(), &payload.email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;

    if existing.is_some() {
        return Err(ApiError::Conflict("User with this email already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let now = primitive_now_utc();

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            school_id: &school.id,
            email: &payload.email,
            hashed_password,
            first_name: &payload.first_name,
            last_name: &payload.last_name,
            phone: payload.phone.as_deref(),
            role: payload.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    let response = TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserLogin>,
) -> Result<Json<TokenResponse>, ApiError> {
    let rate_key = format!("rl:login:{}", payload.email);
    let allowed = state
        .redis()
        .rate_limit(&rate_key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let user = fetch_user_by_email(&state, &payload.email).await?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect email or password"))?;

    if !verified {
        return Err(ApiError::Unauthorized("Incorrect email or password"));
    }

    if !user.is_active {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    }))
}

async fn validate(CurrentUser(user): CurrentUser) -> Json<serde_json::Value> {
    Json(json!({ "valid": true, "user": UserResponse::from_db(user) }))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn fetch_user_by_email(state: &AppState, email: &str) -> Result<User, ApiError> {
    repositories::users::find_by_email(state.db(), email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect email or password"))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn register_then_login_roundtrip() {
        let ctx = test_support::setup_test_context().await;
        test_support::insert_school(ctx.state.db()).await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "email": "teacher@ecole.mr",
                    "first_name": "Aicha",
                    "last_name": "Mint",
                    "password": "teacher-pass",
                    "role": "teacher"
                })),
            ))
            .await
            .expect("register");

        let status = response.status();
        let created = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "response: {created}");
        assert!(created["access_token"].as_str().is_some());
        assert_eq!(created["user"]["role"], "teacher");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "email": "teacher@ecole.mr", "password": "teacher-pass" })),
            ))
            .await
            .expect("login");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        let token = body["access_token"].as_str().expect("token");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/auth/me",
                Some(token),
                None,
            ))
            .await
            .expect("me");

        let status = response.status();
        let me = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {me}");
        assert_eq!(me["email"], "teacher@ecole.mr");
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        test_support::insert_teacher(ctx.state.db(), &school_id, "prof@ecole.mr", "right-pass")
            .await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "email": "prof@ecole.mr", "password": "wrong-pass" })),
            ))
            .await
            .expect("login");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_rejects_director_role() {
        let ctx = test_support::setup_test_context().await;
        test_support::insert_school(ctx.state.db()).await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "email": "boss@ecole.mr",
                    "first_name": "Big",
                    "last_name": "Boss",
                    "password": "boss-pass-123",
                    "role": "director"
                })),
            ))
            .await
            .expect("register");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
