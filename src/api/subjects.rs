use axum::{extract::Query, routing::get, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_staff, CurrentDirector, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Subject;
use crate::repositories;
use crate::schemas::subject::{SubjectCreate, SubjectResponse, SubjectUpdate};
use crate::services::grading::round2;
use sqlx::{Postgres, QueryBuilder};

#[derive(Debug, Deserialize)]
pub(crate) struct SubjectListQuery {
    #[serde(default)]
    #[serde(alias = "classId")]
    class_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "teacherId")]
    teacher_id: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_subjects).post(create_subject))
        .route("/:subject_id", get(get_subject).patch(update_subject))
}

async fn list_subjects(
    Query(params): Query<SubjectListQuery>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<SubjectResponse>>, ApiError> {
    require_staff(&user)?;

    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT id, school_id, class_id, teacher_id, name, name_ar, max_score,
                coefficient, created_at, updated_at
         FROM subjects WHERE school_id = ",
    );
    builder.push_bind(&user.school_id);

    if let Some(class_id) = params.class_id.as_ref() {
        builder.push(" AND class_id = ");
        builder.push_bind(class_id);
    }
    if let Some(teacher_id) = params.teacher_id.as_ref() {
        builder.push(" AND teacher_id = ");
        builder.push_bind(teacher_id);
    }

    builder.push(" ORDER BY name");

    let subjects = builder
        .build_query_as::<Subject>()
        .fetch_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;

    let stats: std::collections::HashMap<String, (f64, i64)> =
        repositories::grades::stats_by_subject(state.db(), &user.school_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load subject statistics"))?
            .into_iter()
            .map(|(subject_id, average, count)| (subject_id, (average, count)))
            .collect();

    let responses = subjects
        .into_iter()
        .map(|subject| {
            let stat = stats.get(&subject.id).copied();
            let response = SubjectResponse::from_db(subject);
            match stat {
                Some((average, count)) => response.with_stats(round2(average), count),
                None => response,
            }
        })
        .collect();

    Ok(Json(responses))
}

async fn get_subject(
    axum::extract::Path(subject_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<SubjectResponse>, ApiError> {
    require_staff(&user)?;

    let subject = repositories::subjects::find_by_id(state.db(), &subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch subject"))?;

    let Some(subject) = subject.filter(|subject| subject.school_id == user.school_id) else {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    };

    Ok(Json(SubjectResponse::from_db(subject)))
}

async fn create_subject(
    CurrentDirector(director): CurrentDirector,
    state: axum::extract::State<AppState>,
    Json(payload): Json<SubjectCreate>,
) -> Result<(axum::http::StatusCode, Json<SubjectResponse>), ApiError> {
    // Rejects max_score <= 0 here, before any grade can reference it.
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let class = repositories::classes::find_by_id(state.db(), &payload.class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch class"))?;

    if class.filter(|class| class.school_id == director.school_id).is_none() {
        return Err(ApiError::NotFound("Class not found".to_string()));
    }

    let existing =
        repositories::subjects::exists_by_name(state.db(), &payload.class_id, &payload.name)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check existing subject"))?;

    if existing.is_some() {
        return Err(ApiError::Conflict(
            "This subject already exists for this class".to_string(),
        ));
    }

    let now = primitive_now_utc();
    let subject = repositories::subjects::create(
        state.db(),
        repositories::subjects::CreateSubject {
            id: &Uuid::new_v4().to_string(),
            school_id: &director.school_id,
            class_id: &payload.class_id,
            teacher_id: payload.teacher_id.as_deref(),
            name: &payload.name,
            name_ar: payload.name_ar.as_deref(),
            max_score: payload.max_score,
            coefficient: payload.coefficient,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create subject"))?;

    Ok((axum::http::StatusCode::CREATED, Json(SubjectResponse::from_db(subject))))
}

async fn update_subject(
    axum::extract::Path(subject_id): axum::extract::Path<String>,
    CurrentDirector(director): CurrentDirector,
    state: axum::extract::State<AppState>,
    Json(payload): Json<SubjectUpdate>,
) -> Result<Json<SubjectResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let subject = repositories::subjects::find_by_id(state.db(), &subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch subject"))?;

    if subject.filter(|subject| subject.school_id == director.school_id).is_none() {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    }

    repositories::subjects::update(
        state.db(),
        &subject_id,
        repositories::subjects::UpdateSubject {
            name: payload.name,
            name_ar: payload.name_ar,
            teacher_id: payload.teacher_id,
            max_score: payload.max_score,
            coefficient: payload.coefficient,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update subject"))?;

    let updated = repositories::subjects::fetch_one_by_id(state.db(), &subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated subject"))?;

    Ok(Json(SubjectResponse::from_db(updated)))
}
