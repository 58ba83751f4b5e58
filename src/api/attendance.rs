use axum::{extract::Query, routing::get, Json, Router};
use serde::Deserialize;
use time::Date;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_staff, student_scope, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{format_date, primitive_now_utc, today_utc};
use crate::db::models::{Attendance, Student};
use crate::db::types::{AttendanceStatus, NotificationChannel, NotificationKind};
use crate::repositories;
use crate::schemas::attendance::{AttendanceResponse, AttendanceSheet, AttendanceUpdate};
use sqlx::{Postgres, QueryBuilder};

#[derive(Debug, Deserialize)]
pub(crate) struct AttendanceListQuery {
    #[serde(default)]
    date: Option<Date>,
    #[serde(default)]
    #[serde(alias = "classId")]
    class_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "studentId")]
    student_id: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_attendance).post(record_sheet))
        .route("/:attendance_id", axum::routing::patch(update_attendance))
}

async fn list_attendance(
    Query(params): Query<AttendanceListQuery>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<AttendanceResponse>>, ApiError> {
    let scope = student_scope(&state, &user).await?;

    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM attendance WHERE school_id = ",
        repositories::attendance::COLUMNS
    ));
    builder.push_bind(&user.school_id);

    if let Some(student_ids) = scope.as_ref() {
        builder.push(" AND student_id = ANY(");
        builder.push_bind(student_ids);
        builder.push(")");
    }

    // Defaults to today's sheet, like the register a teacher opens each
    // morning.
    let date = params.date.unwrap_or_else(today_utc);
    builder.push(" AND date = ");
    builder.push_bind(date);

    if let Some(class_id) = params.class_id.as_ref() {
        builder.push(" AND student_id IN (SELECT id FROM students WHERE class_id = ");
        builder.push_bind(class_id);
        builder.push(")");
    }
    if let Some(student_id) = params.student_id.as_ref() {
        builder.push(" AND student_id = ");
        builder.push_bind(student_id);
    }

    builder.push(" ORDER BY created_at");

    let rows = builder
        .build_query_as::<Attendance>()
        .fetch_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attendance"))?;

    Ok(Json(rows.into_iter().map(AttendanceResponse::from_db).collect()))
}

async fn record_sheet(
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<AttendanceSheet>,
) -> Result<Json<Vec<AttendanceResponse>>, ApiError> {
    require_staff(&user)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut results = Vec::with_capacity(payload.entries.len());

    for mark in &payload.entries {
        let student = repositories::students::find_by_id(state.db(), &mark.student_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?;

        // A sheet may still reference a freshly transferred student; skip
        // rather than fail the whole day.
        let Some(student) = student.filter(|student| student.school_id == user.school_id) else {
            tracing::warn!(student_id = %mark.student_id, "Skipping attendance for unknown student");
            continue;
        };

        let attendance = repositories::attendance::upsert(
            state.db(),
            repositories::attendance::UpsertAttendance {
                id: &Uuid::new_v4().to_string(),
                school_id: &user.school_id,
                student_id: &student.id,
                teacher_id: &user.id,
                date: payload.date,
                status: mark.status,
                reason: mark.reason.as_deref(),
                now: primitive_now_utc(),
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to record attendance"))?;

        let response = if mark.status == AttendanceStatus::Absent {
            let notified = notify_absence(&state, &student, payload.date).await?;
            AttendanceResponse::from_db(attendance).with_notified_parents(notified)
        } else {
            AttendanceResponse::from_db(attendance)
        };

        results.push(response);
    }

    Ok(Json(results))
}

async fn update_attendance(
    axum::extract::Path(attendance_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<AttendanceUpdate>,
) -> Result<Json<AttendanceResponse>, ApiError> {
    require_staff(&user)?;

    let existing = repositories::attendance::find_by_id(state.db(), &attendance_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attendance"))?;

    if existing.filter(|row| row.school_id == user.school_id).is_none() {
        return Err(ApiError::NotFound("Attendance record not found".to_string()));
    }

    let updated = repositories::attendance::update(
        state.db(),
        &attendance_id,
        repositories::attendance::UpdateAttendance {
            status: payload.status,
            reason: payload.reason,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update attendance"))?
    .ok_or_else(|| ApiError::NotFound("Attendance record not found".to_string()))?;

    Ok(Json(AttendanceResponse::from_db(updated)))
}

/// In-app notification to every linked parent when a student is marked
/// absent. Returns how many parents were notified.
async fn notify_absence(
    state: &AppState,
    student: &Student,
    date: Date,
) -> Result<i64, ApiError> {
    let parent_ids = repositories::parent_students::parent_ids_for_student(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student parents"))?;

    let now = primitive_now_utc();
    let title = format!("Absence - {} {}", student.first_name, student.last_name);
    let content = format!(
        "Votre enfant {} {} est absent(e) le {}.",
        student.first_name,
        student.last_name,
        format_date(date)
    );

    for parent_id in &parent_ids {
        repositories::notifications::create(
            state.db(),
            repositories::notifications::CreateNotification {
                id: &Uuid::new_v4().to_string(),
                school_id: &student.school_id,
                recipient_id: parent_id,
                student_id: Some(&student.id),
                title: &title,
                content: &content,
                content_ar: None,
                kind: NotificationKind::Absence,
                channel: NotificationChannel::InApp,
                sent_at: Some(now),
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create absence notification"))?;
    }

    Ok(parent_ids.len() as i64)
}
