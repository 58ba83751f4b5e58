use axum::{extract::Query, routing::get, routing::post, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_staff, CurrentUser};
use crate::api::pagination::default_limit;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Notification;
use crate::db::types::NotificationKind;
use crate::repositories;
use crate::schemas::notification::{
    NotificationCreate, NotificationListResponse, NotificationResponse,
};
use sqlx::{Postgres, QueryBuilder};

#[derive(Debug, Deserialize)]
pub(crate) struct NotificationListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    #[serde(alias = "unreadOnly")]
    unread_only: bool,
    #[serde(default)]
    kind: Option<NotificationKind>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications).post(create_notification))
        .route("/:notification_id/read", axum::routing::patch(mark_read))
        .route("/read-all", post(mark_all_read))
}

/// A user's own inbox, newest first.
async fn list_notifications(
    Query(params): Query<NotificationListQuery>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM notifications WHERE recipient_id = ",
        repositories::notifications::COLUMNS
    ));
    builder.push_bind(&user.id);

    if params.unread_only {
        builder.push(" AND NOT is_read");
    }
    if let Some(kind) = params.kind {
        builder.push(" AND kind = ");
        builder.push_bind(kind);
    }

    builder.push(" ORDER BY created_at DESC");
    builder.push(" OFFSET ");
    builder.push_bind(params.skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(params.limit.clamp(1, 1000));

    let notifications = builder
        .build_query_as::<Notification>()
        .fetch_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list notifications"))?;

    let unread_count = repositories::notifications::unread_count(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count unread notifications"))?;

    let notifications: Vec<NotificationResponse> =
        notifications.into_iter().map(NotificationResponse::from_db).collect();
    let total = notifications.len();

    Ok(Json(NotificationListResponse { notifications, unread_count, total }))
}

async fn create_notification(
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<NotificationCreate>,
) -> Result<(axum::http::StatusCode, Json<NotificationResponse>), ApiError> {
    require_staff(&user)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let recipient = repositories::users::find_by_id(state.db(), &payload.recipient_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch recipient"))?;

    if recipient.filter(|recipient| recipient.school_id == user.school_id).is_none() {
        return Err(ApiError::NotFound("Recipient not found".to_string()));
    }

    if let Some(student_id) = payload.student_id.as_ref() {
        let student = repositories::students::find_by_id(state.db(), student_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?;
        if student.filter(|student| student.school_id == user.school_id).is_none() {
            return Err(ApiError::NotFound("Student not found".to_string()));
        }
    }

    let now = primitive_now_utc();
    let notification = repositories::notifications::create(
        state.db(),
        repositories::notifications::CreateNotification {
            id: &Uuid::new_v4().to_string(),
            school_id: &user.school_id,
            recipient_id: &payload.recipient_id,
            student_id: payload.student_id.as_deref(),
            title: &payload.title,
            content: &payload.content,
            content_ar: payload.content_ar.as_deref(),
            kind: payload.kind,
            channel: payload.channel,
            sent_at: payload.send_immediately.then_some(now),
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create notification"))?;

    Ok((axum::http::StatusCode::CREATED, Json(NotificationResponse::from_db(notification))))
}

async fn mark_read(
    axum::extract::Path(notification_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let updated = repositories::notifications::mark_read(state.db(), &notification_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to mark notification read"))?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(NotificationResponse::from_db(updated)))
}

async fn mark_all_read(
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = repositories::notifications::mark_all_read(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to mark notifications read"))?;

    Ok(Json(serde_json::json!({ "updated": updated })))
}
