use axum::{extract::Query, routing::get, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_staff, student_scope, CurrentUser};
use crate::api::pagination::default_limit;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Observation;
use crate::db::types::{ObservationKind, ObservationSeverity};
use crate::repositories;
use crate::schemas::observation::{ObservationCreate, ObservationResponse, ObservationUpdate};
use sqlx::{Postgres, QueryBuilder};

#[derive(Debug, Deserialize)]
pub(crate) struct ObservationListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    #[serde(alias = "studentId")]
    student_id: Option<String>,
    #[serde(default)]
    kind: Option<ObservationKind>,
    #[serde(default)]
    severity: Option<ObservationSeverity>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_observations).post(create_observation))
        .route("/:observation_id", axum::routing::patch(update_observation))
}

async fn list_observations(
    Query(params): Query<ObservationListQuery>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<ObservationResponse>>, ApiError> {
    // Parents only see observations about their own children.
    let scope = student_scope(&state, &user).await?;

    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM observations WHERE school_id = ",
        repositories::observations::COLUMNS
    ));
    builder.push_bind(&user.school_id);

    if let Some(student_ids) = scope.as_ref() {
        builder.push(" AND student_id = ANY(");
        builder.push_bind(student_ids);
        builder.push(")");
    }
    if let Some(student_id) = params.student_id.as_ref() {
        builder.push(" AND student_id = ");
        builder.push_bind(student_id);
    }
    if let Some(kind) = params.kind {
        builder.push(" AND kind = ");
        builder.push_bind(kind);
    }
    if let Some(severity) = params.severity {
        builder.push(" AND severity = ");
        builder.push_bind(severity);
    }

    builder.push(" ORDER BY created_at DESC");
    builder.push(" OFFSET ");
    builder.push_bind(params.skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(params.limit.clamp(1, 1000));

    let observations = builder
        .build_query_as::<Observation>()
        .fetch_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list observations"))?;

    Ok(Json(observations.into_iter().map(ObservationResponse::from_db).collect()))
}

async fn create_observation(
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ObservationCreate>,
) -> Result<(axum::http::StatusCode, Json<ObservationResponse>), ApiError> {
    require_staff(&user)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let student = repositories::students::find_by_id(state.db(), &payload.student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?;

    if student.filter(|student| student.school_id == user.school_id).is_none() {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    let now = primitive_now_utc();
    let observation = repositories::observations::create(
        state.db(),
        repositories::observations::CreateObservation {
            id: &Uuid::new_v4().to_string(),
            school_id: &user.school_id,
            student_id: &payload.student_id,
            teacher_id: &user.id,
            content: &payload.content,
            content_ar: payload.content_ar.as_deref(),
            kind: payload.kind,
            severity: payload.severity,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create observation"))?;

    Ok((axum::http::StatusCode::CREATED, Json(ObservationResponse::from_db(observation))))
}

async fn update_observation(
    axum::extract::Path(observation_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ObservationUpdate>,
) -> Result<Json<ObservationResponse>, ApiError> {
    require_staff(&user)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let existing = repositories::observations::find_by_id(state.db(), &observation_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch observation"))?;

    if existing.filter(|observation| observation.school_id == user.school_id).is_none() {
        return Err(ApiError::NotFound("Observation not found".to_string()));
    }

    let updated = repositories::observations::update(
        state.db(),
        &observation_id,
        repositories::observations::UpdateObservation {
            content: payload.content,
            content_ar: payload.content_ar,
            kind: payload.kind,
            severity: payload.severity,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update observation"))?
    .ok_or_else(|| ApiError::NotFound("Observation not found".to_string()))?;

    Ok(Json(ObservationResponse::from_db(updated)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn parent_sees_only_their_childrens_observations() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let teacher =
            test_support::insert_teacher(ctx.state.db(), &school_id, "prof@ecole.mr", "prof-pass")
                .await;
        let parent =
            test_support::insert_parent(ctx.state.db(), &school_id, "parent@ecole.mr", "parent-pw")
                .await;
        let teacher_token = test_support::bearer_token(&teacher.id, ctx.state.settings());
        let class_id = test_support::insert_class(ctx.state.db(), &school_id, "CM2", 40).await;
        let own_child =
            test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-001", "Salem")
                .await;
        let other_child =
            test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-002", "Bint")
                .await;
        test_support::link_parent(ctx.state.db(), &parent.id, &own_child).await;

        for (student, content) in
            [(&own_child, "Très bon comportement"), (&other_child, "Bavardage en classe")]
        {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    "/api/v1/observations",
                    Some(&teacher_token),
                    Some(json!({
                        "student_id": student,
                        "content": content,
                        "kind": "behavior"
                    })),
                ))
                .await
                .expect("create observation");
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let parent_token = test_support::bearer_token(&parent.id, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/observations",
                Some(&parent_token),
                None,
            ))
            .await
            .expect("list observations as parent");

        let status = response.status();
        let observations = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {observations}");
        assert_eq!(observations.as_array().map(|list| list.len()), Some(1));
        assert_eq!(observations[0]["student_id"], json!(own_child));
    }
}
