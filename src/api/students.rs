use axum::{extract::Query, routing::get, Json, Router};
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_staff, CurrentUser};
use crate::api::pagination::{default_limit, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Student;
use crate::repositories;
use crate::schemas::student::{StudentCreate, StudentResponse, StudentUpdate};
use sqlx::{Postgres, QueryBuilder};

#[derive(Debug, Deserialize)]
pub(crate) struct StudentListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    #[serde(alias = "classId")]
    class_id: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    #[serde(alias = "includeInactive")]
    include_inactive: bool,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/:student_id", get(get_student).patch(update_student))
        .route("/:student_id/parents", axum::routing::post(link_parent))
}

async fn list_students(
    Query(params): Query<StudentListQuery>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<PaginatedResponse<StudentResponse>>, ApiError> {
    require_staff(&user)?;

    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM students WHERE school_id = ",
        repositories::students::COLUMNS
    ));
    builder.push_bind(&user.school_id);

    let mut count_builder =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM students WHERE school_id = ");
    count_builder.push_bind(&user.school_id);

    for current in [&mut builder, &mut count_builder] {
        if !params.include_inactive {
            current.push(" AND is_active");
        }
        if let Some(class_id) = params.class_id.as_ref() {
            current.push(" AND class_id = ");
            current.push_bind(class_id);
        }
        if let Some(search) = params.search.as_ref().filter(|value| !value.is_empty()) {
            let pattern = format!("%{search}%");
            current.push(" AND (first_name ILIKE ");
            current.push_bind(pattern.clone());
            current.push(" OR last_name ILIKE ");
            current.push_bind(pattern.clone());
            current.push(" OR student_number ILIKE ");
            current.push_bind(pattern);
            current.push(")");
        }
    }

    builder.push(" ORDER BY created_at DESC");
    builder.push(" OFFSET ");
    builder.push_bind(params.skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(params.limit.clamp(1, 1000));

    let students = builder
        .build_query_as::<Student>()
        .fetch_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;

    let total_count = count_builder
        .build_query_scalar::<i64>()
        .fetch_one(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;

    Ok(Json(PaginatedResponse {
        items: students.into_iter().map(StudentResponse::from_db).collect(),
        total_count,
        skip: params.skip.max(0),
        limit: params.limit.clamp(1, 1000),
    }))
}

async fn get_student(
    axum::extract::Path(student_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<StudentResponse>, ApiError> {
    require_staff(&user)?;

    let student = repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?;

    let Some(student) = student.filter(|student| student.school_id == user.school_id) else {
        return Err(ApiError::NotFound("Student not found".to_string()));
    };

    Ok(Json(StudentResponse::from_db(student)))
}

async fn create_student(
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<StudentCreate>,
) -> Result<(axum::http::StatusCode, Json<StudentResponse>), ApiError> {
    require_staff(&user)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if let Some(class_id) = payload.class_id.as_ref() {
        let class = repositories::classes::find_by_id(state.db(), class_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch class"))?;
        if class.filter(|class| class.school_id == user.school_id).is_none() {
            return Err(ApiError::NotFound("Class not found".to_string()));
        }
    }

    let student_number = next_student_number(&state, &user.school_id).await?;
    let now = primitive_now_utc();

    let student = repositories::students::create(
        state.db(),
        repositories::students::CreateStudent {
            id: &Uuid::new_v4().to_string(),
            school_id: &user.school_id,
            class_id: payload.class_id.as_deref(),
            student_number: &student_number,
            first_name: &payload.first_name,
            last_name: &payload.last_name,
            first_name_ar: payload.first_name_ar.as_deref(),
            last_name_ar: payload.last_name_ar.as_deref(),
            date_of_birth: payload.date_of_birth,
            place_of_birth: payload.place_of_birth.as_deref(),
            gender: payload.gender,
            address: payload.address.as_deref(),
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create student"))?;

    tracing::info!(
        user_id = %user.id,
        student_id = %student.id,
        action = "student_create",
        "Enrolled student"
    );

    Ok((axum::http::StatusCode::CREATED, Json(StudentResponse::from_db(student))))
}

async fn update_student(
    axum::extract::Path(student_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<StudentUpdate>,
) -> Result<Json<StudentResponse>, ApiError> {
    require_staff(&user)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let student = repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?;

    if student.filter(|student| student.school_id == user.school_id).is_none() {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    repositories::students::update(
        state.db(),
        &student_id,
        repositories::students::UpdateStudent {
            class_id: payload.class_id,
            first_name: payload.first_name,
            last_name: payload.last_name,
            first_name_ar: payload.first_name_ar,
            last_name_ar: payload.last_name_ar,
            place_of_birth: payload.place_of_birth,
            address: payload.address,
            is_active: payload.is_active,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update student"))?;

    let updated = repositories::students::fetch_one_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated student"))?;

    Ok(Json(StudentResponse::from_db(updated)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ParentLink {
    #[serde(alias = "parentId")]
    parent_id: String,
    #[serde(default)]
    relationship: Option<String>,
}

/// Attach a parent account to a student so absence notices and bulletins
/// reach them.
async fn link_parent(
    axum::extract::Path(student_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ParentLink>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ApiError> {
    require_staff(&user)?;

    let student = repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?;

    if student.filter(|student| student.school_id == user.school_id).is_none() {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    let parent = repositories::users::find_by_id(state.db(), &payload.parent_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch parent"))?;

    let Some(parent) = parent.filter(|parent| parent.school_id == user.school_id) else {
        return Err(ApiError::NotFound("Parent not found".to_string()));
    };

    if parent.role != crate::db::types::UserRole::Parent {
        return Err(ApiError::BadRequest("User is not a parent account".to_string()));
    }

    repositories::parent_students::link(
        state.db(),
        &parent.id,
        &student_id,
        payload.relationship.as_deref(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to link parent"))?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(serde_json::json!({ "parent_id": parent.id, "student_id": student_id })),
    ))
}

/// Student numbers are `YYYY-NNN`, sequential per school.
async fn next_student_number(state: &AppState, school_id: &str) -> Result<String, ApiError> {
    let count = repositories::students::count_by_school(state.db(), school_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;

    let year = OffsetDateTime::now_utc().year();
    Ok(format!("{year}-{:03}", count + 1))
}
