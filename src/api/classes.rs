use axum::{routing::get, Json, Router};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_staff, CurrentDirector, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::class::{ClassCreate, ClassResponse, ClassUpdate};
use crate::schemas::subject::SubjectResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classes).post(create_class))
        .route("/:class_id", get(get_class).patch(update_class))
        .route("/:class_id/subjects", get(list_class_subjects))
}

async fn list_classes(
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<ClassResponse>>, ApiError> {
    require_staff(&user)?;

    let classes = repositories::classes::list_by_school(state.db(), &user.school_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list classes"))?;

    Ok(Json(classes.into_iter().map(ClassResponse::from_db).collect()))
}

async fn get_class(
    axum::extract::Path(class_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_staff(&user)?;

    let class = repositories::classes::find_by_id(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch class"))?;

    let Some(class) = class.filter(|class| class.school_id == user.school_id) else {
        return Err(ApiError::NotFound("Class not found".to_string()));
    };

    let roster = repositories::students::roster_for_class(state.db(), &class.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load roster"))?;

    Ok(Json(serde_json::json!({
        "id": class.id,
        "name": class.name,
        "level": class.level,
        "capacity": class.capacity,
        "teacher_id": class.teacher_id,
        "students": roster
            .into_iter()
            .map(crate::schemas::student::StudentResponse::from_db)
            .collect::<Vec<_>>(),
    })))
}

async fn list_class_subjects(
    axum::extract::Path(class_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<SubjectResponse>>, ApiError> {
    require_staff(&user)?;

    let class = repositories::classes::find_by_id(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch class"))?;

    if class.filter(|class| class.school_id == user.school_id).is_none() {
        return Err(ApiError::NotFound("Class not found".to_string()));
    }

    let subjects = repositories::subjects::list_by_class(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;

    Ok(Json(subjects.into_iter().map(SubjectResponse::from_db).collect()))
}

async fn create_class(
    CurrentDirector(director): CurrentDirector,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ClassCreate>,
) -> Result<(axum::http::StatusCode, Json<ClassResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let existing =
        repositories::classes::exists_by_name(state.db(), &director.school_id, &payload.name)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check existing class"))?;

    if existing.is_some() {
        return Err(ApiError::Conflict("A class with this name already exists".to_string()));
    }

    let now = primitive_now_utc();
    let class = repositories::classes::create(
        state.db(),
        repositories::classes::CreateClass {
            id: &Uuid::new_v4().to_string(),
            school_id: &director.school_id,
            teacher_id: payload.teacher_id.as_deref(),
            name: &payload.name,
            level: &payload.level,
            capacity: payload.capacity,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create class"))?;

    let response = ClassResponse::from_db(repositories::classes::ClassWithEnrollment {
        id: class.id,
        school_id: class.school_id,
        teacher_id: class.teacher_id,
        name: class.name,
        level: class.level,
        capacity: class.capacity,
        created_at: class.created_at,
        updated_at: class.updated_at,
        student_count: 0,
    });

    Ok((axum::http::StatusCode::CREATED, Json(response)))
}

async fn update_class(
    axum::extract::Path(class_id): axum::extract::Path<String>,
    CurrentDirector(director): CurrentDirector,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ClassUpdate>,
) -> Result<Json<ClassResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let class = repositories::classes::find_by_id(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch class"))?;

    if class.filter(|class| class.school_id == director.school_id).is_none() {
        return Err(ApiError::NotFound("Class not found".to_string()));
    }

    repositories::classes::update(
        state.db(),
        &class_id,
        repositories::classes::UpdateClass {
            name: payload.name,
            level: payload.level,
            capacity: payload.capacity,
            teacher_id: payload.teacher_id,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update class"))?;

    let updated = repositories::classes::find_with_enrollment(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated class"))?
        .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;

    Ok(Json(ClassResponse::from_db(updated)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn create_rejects_duplicate_name() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let director =
            test_support::insert_director(ctx.state.db(), &school_id, "dir@ecole.mr", "dir-pass")
                .await;
        let token = test_support::bearer_token(&director.id, ctx.state.settings());

        let payload = json!({ "name": "CM2", "level": "Primaire", "capacity": 40 });

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/classes",
                Some(&token),
                Some(payload.clone()),
            ))
            .await
            .expect("create class");
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/classes",
                Some(&token),
                Some(payload),
            ))
            .await
            .expect("create duplicate class");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn listing_reports_enrollment_and_fill_rate() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let director =
            test_support::insert_director(ctx.state.db(), &school_id, "dir@ecole.mr", "dir-pass")
                .await;
        let token = test_support::bearer_token(&director.id, ctx.state.settings());

        let class_id = test_support::insert_class(ctx.state.db(), &school_id, "CM2", 20).await;
        test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-001", "Salem")
            .await;
        test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-002", "Bint")
            .await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/classes",
                Some(&token),
                None,
            ))
            .await
            .expect("list classes");

        let status = response.status();
        let classes = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {classes}");
        let class = &classes[0];
        assert_eq!(class["name"], "CM2");
        assert_eq!(class["student_count"], 2);
        assert_eq!(class["fill_rate"], 10);
        assert_eq!(class["available_slots"], 18);
    }
}
