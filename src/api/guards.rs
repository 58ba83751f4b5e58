use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentDirector(pub(crate) User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        if !user.is_active {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentDirector {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.role == UserRole::Director {
            Ok(CurrentDirector(user))
        } else {
            Err(ApiError::Forbidden("Director access required"))
        }
    }
}

/// School staff (director or teacher) may manage records; parents may not.
pub(crate) fn require_staff(user: &User) -> Result<(), ApiError> {
    match user.role {
        UserRole::Director | UserRole::Teacher => Ok(()),
        UserRole::Parent => Err(ApiError::Forbidden("Staff access required")),
    }
}

/// Student ids a user may read. `None` means unrestricted (staff); parents
/// are limited to their linked children.
pub(crate) async fn student_scope(
    state: &AppState,
    user: &User,
) -> Result<Option<Vec<String>>, ApiError> {
    if user.role != UserRole::Parent {
        return Ok(None);
    }

    let student_ids = repositories::parent_students::student_ids_for_parent(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load linked students"))?;

    Ok(Some(student_ids))
}
