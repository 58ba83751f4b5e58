use axum::{extract::Query, routing::get, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentDirector;
use crate::api::pagination::default_limit;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::user::{AdminUserCreate, AdminUserUpdate, UserResponse};
use sqlx::{Postgres, QueryBuilder};

#[derive(Debug, Deserialize)]
pub(crate) struct UserListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    role: Option<UserRole>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    is_active: Option<bool>,
    #[serde(default)]
    search: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:user_id", get(get_user).patch(update_user))
}

async fn list_users(
    Query(params): Query<UserListQuery>,
    CurrentDirector(director): CurrentDirector,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM users WHERE school_id = ",
        repositories::users::COLUMNS
    ));
    builder.push_bind(&director.school_id);

    if let Some(role) = params.role {
        builder.push(" AND role = ");
        builder.push_bind(role);
    }
    if let Some(is_active) = params.is_active {
        builder.push(" AND is_active = ");
        builder.push_bind(is_active);
    }
    if let Some(search) = params.search.as_ref().filter(|value| !value.is_empty()) {
        let pattern = format!("%{search}%");
        builder.push(" AND (first_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR last_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR email ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    builder.push(" ORDER BY created_at DESC");
    builder.push(" OFFSET ");
    builder.push_bind(params.skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(params.limit.clamp(1, 1000));

    let users = builder
        .build_query_as::<User>()
        .fetch_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}

async fn get_user(
    axum::extract::Path(user_id): axum::extract::Path<String>,
    CurrentDirector(director): CurrentDirector,
    state: axum::extract::State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = repositories::users::find_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;

    let Some(user) = user.filter(|user| user.school_id == director.school_id) else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    Ok(Json(UserResponse::from_db(user)))
}

async fn create_user(
    CurrentDirector(director): CurrentDirector,
    state: axum::extract::State<AppState>,
    Json(payload): Json<AdminUserCreate>,
) -> Result<(axum::http::StatusCode, Json<UserResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

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
            school_id: &director.school_id,
            email: &payload.email,
            hashed_password,
            first_name: &payload.first_name,
            last_name: &payload.last_name,
            phone: payload.phone.as_deref(),
            role: payload.role,
            is_active: payload.is_active,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    tracing::info!(
        director_id = %director.id,
        user_id = %user.id,
        action = "user_create",
        "Director created user"
    );

    Ok((axum::http::StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

async fn update_user(
    axum::extract::Path(user_id): axum::extract::Path<String>,
    CurrentDirector(director): CurrentDirector,
    state: axum::extract::State<AppState>,
    Json(payload): Json<AdminUserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let user = repositories::users::find_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;

    if user.filter(|user| user.school_id == director.school_id).is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let hashed_password = if let Some(password) = payload.password.as_ref() {
        Some(
            security::hash_password(password)
                .map_err(|e| ApiError::internal(e, "Failed to hash password"))?,
        )
    } else {
        None
    };

    repositories::users::update(
        state.db(),
        &user_id,
        repositories::users::UpdateUser {
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
            role: payload.role,
            is_active: payload.is_active,
            hashed_password,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update user"))?;

    let updated = repositories::users::fetch_one_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated user"))?;

    tracing::info!(
        director_id = %director.id,
        user_id = %updated.id,
        action = "user_update",
        "Director updated user"
    );

    Ok(Json(UserResponse::from_db(updated)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn director_can_create_and_update_user() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let director =
            test_support::insert_director(ctx.state.db(), &school_id, "dir@ecole.mr", "dir-pass")
                .await;
        let token = test_support::bearer_token(&director.id, ctx.state.settings());

        let create_payload = json!({
            "email": "prof@ecole.mr",
            "first_name": "Aicha",
            "last_name": "Mint",
            "password": "prof-pass-123",
            "role": "teacher"
        });

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/users",
                Some(&token),
                Some(create_payload),
            ))
            .await
            .expect("create user");

        let status = response.status();
        let created = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "response: {created}");
        let user_id = created["id"].as_str().expect("user id").to_string();
        assert_eq!(created["email"], "prof@ecole.mr");
        assert_eq!(created["role"], "teacher");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PATCH,
                &format!("/api/v1/users/{user_id}"),
                Some(&token),
                Some(json!({ "first_name": "Updated", "is_active": false })),
            ))
            .await
            .expect("update user");

        let status = response.status();
        let updated = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {updated}");
        assert_eq!(updated["first_name"], "Updated");
        assert_eq!(updated["is_active"], false);
    }

    #[tokio::test]
    async fn teacher_cannot_list_users() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let teacher =
            test_support::insert_teacher(ctx.state.db(), &school_id, "prof@ecole.mr", "prof-pass")
                .await;
        let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/users", Some(&token), None))
            .await
            .expect("list users");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
