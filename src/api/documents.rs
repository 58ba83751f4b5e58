use axum::{extract::Query, routing::get, Json, Router};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::{require_staff, student_scope, CurrentUser};
use crate::core::state::AppState;
use crate::db::models::{School, SchoolClass, Student};
use crate::db::types::Term;
use crate::repositories;
use crate::services::bulletins::{self, Bulletin};
use crate::services::grading::{self, RosterStudent, ScoreEntry, StudentAggregate};

#[derive(Debug, Deserialize)]
pub(crate) struct ClassBulletinsQuery {
    #[serde(alias = "classId")]
    class_id: String,
    term: Term,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StudentBulletinQuery {
    term: Term,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/bulletins", get(class_bulletins))
        .route("/bulletins/:student_id", get(student_bulletin))
}

/// Bulletin payloads for a whole class, in rank order. The renderer that
/// turns these into PDFs lives outside this service.
async fn class_bulletins(
    Query(params): Query<ClassBulletinsQuery>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<Bulletin>>, ApiError> {
    require_staff(&user)?;

    let (school, class, roster, aggregates) =
        class_aggregates(&state, &user.school_id, &params.class_id, params.term).await?;

    let bulletins = aggregates
        .iter()
        .filter_map(|aggregate| {
            roster
                .iter()
                .find(|student| student.id == aggregate.student.id)
                .map(|student| bulletins::build(&school, &class, student, aggregate, params.term))
        })
        .collect();

    Ok(Json(bulletins))
}

async fn student_bulletin(
    axum::extract::Path(student_id): axum::extract::Path<String>,
    Query(params): Query<StudentBulletinQuery>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Bulletin>, ApiError> {
    // Parents can pull their own children's bulletins.
    if let Some(allowed) = student_scope(&state, &user).await? {
        if !allowed.iter().any(|id| id == &student_id) {
            return Err(ApiError::NotFound("Student not found".to_string()));
        }
    }

    let student = repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
        .filter(|student| student.school_id == user.school_id)
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    let class_id = student
        .class_id
        .clone()
        .ok_or_else(|| ApiError::BadRequest("Student is not enrolled in a class".to_string()))?;

    let (school, class, _roster, aggregates) =
        class_aggregates(&state, &user.school_id, &class_id, params.term).await?;

    let aggregate = aggregates
        .iter()
        .find(|aggregate| aggregate.student.id == student.id)
        .ok_or_else(|| ApiError::NotFound("Student is not on the class roster".to_string()))?;

    Ok(Json(bulletins::build(&school, &class, &student, aggregate, params.term)))
}

/// Shared fetch-and-rank step: the same aggregation feeds both the class
/// sheet and individual bulletins.
async fn class_aggregates(
    state: &AppState,
    school_id: &str,
    class_id: &str,
    term: Term,
) -> Result<(School, SchoolClass, Vec<Student>, Vec<StudentAggregate>), ApiError> {
    let school = repositories::schools::find_by_id(state.db(), school_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch school"))?
        .ok_or_else(|| ApiError::NotFound("School not found".to_string()))?;

    let class = repositories::classes::find_by_id(state.db(), class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch class"))?
        .filter(|class| class.school_id == school_id)
        .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;

    let roster = repositories::students::roster_for_class(state.db(), &class.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load roster"))?;

    let rows = repositories::grades::list_for_class_term(state.db(), &class.id, term)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load grades"))?;

    let ranking_roster: Vec<RosterStudent> = roster
        .iter()
        .map(|student| RosterStudent {
            id: student.id.clone(),
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            student_number: student.student_number.clone(),
        })
        .collect();

    let entries: Vec<ScoreEntry> = rows
        .into_iter()
        .map(|row| ScoreEntry {
            student_id: row.student_id,
            subject_name: row.subject_name,
            score: row.score,
            max_score: row.max_score,
            term: row.term,
        })
        .collect();

    let aggregates = grading::compute_ranking(&ranking_roster, &entries, term);

    Ok((school, class, roster, aggregates))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn class_bulletins_carry_appreciations_and_ranks() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let director =
            test_support::insert_director(ctx.state.db(), &school_id, "dir@ecole.mr", "dir-pass")
                .await;
        let token = test_support::bearer_token(&director.id, ctx.state.settings());
        let class_id = test_support::insert_class(ctx.state.db(), &school_id, "CM2", 40).await;
        let first =
            test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-001", "Salem")
                .await;
        let second =
            test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-002", "Bint")
                .await;
        let math = test_support::insert_subject(
            ctx.state.db(),
            &school_id,
            &class_id,
            "Mathématiques",
            50.0,
            None,
        )
        .await;

        for (student, score) in [(&first, 45.0), (&second, 20.0)] {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    "/api/v1/grades",
                    Some(&token),
                    Some(json!({
                        "student_id": student,
                        "subject_id": math,
                        "score": score,
                        "term": "T1"
                    })),
                ))
                .await
                .expect("submit grade");
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/documents/bulletins?class_id={class_id}&term=T1"),
                Some(&token),
                None,
            ))
            .await
            .expect("class bulletins");

        let status = response.status();
        let bulletins = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {bulletins}");
        let list = bulletins.as_array().expect("bulletins");
        assert_eq!(list.len(), 2);

        let top = &list[0];
        assert_eq!(top["student"]["last_name"], "Salem");
        assert_eq!(top["rank"], 1);
        assert_eq!(top["total_students"], 2);
        assert_eq!(top["general_average"], 90.0);
        assert_eq!(top["general_appreciation"], "Excellent");
        assert_eq!(top["lines"][0]["subject"], "Mathématiques");
        assert_eq!(top["lines"][0]["appreciation"], "Excellent");
        assert_eq!(top["school"]["name"], "École Primaire Nouakchott");

        let bottom = &list[1];
        assert_eq!(bottom["rank"], 2);
        assert_eq!(bottom["general_average"], 40.0);
        assert_eq!(bottom["general_appreciation"], "Peut mieux faire");
        assert_eq!(bottom["lines"][0]["appreciation"], "Insuffisant");
    }

    #[tokio::test]
    async fn parent_can_fetch_own_childs_bulletin_only() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let parent =
            test_support::insert_parent(ctx.state.db(), &school_id, "parent@ecole.mr", "parent-pw")
                .await;
        let class_id = test_support::insert_class(ctx.state.db(), &school_id, "CM1", 40).await;
        let own_child =
            test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-001", "Salem")
                .await;
        let other_child =
            test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-002", "Bint")
                .await;
        test_support::link_parent(ctx.state.db(), &parent.id, &own_child).await;

        let parent_token = test_support::bearer_token(&parent.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/documents/bulletins/{own_child}?term=T1"),
                Some(&parent_token),
                None,
            ))
            .await
            .expect("own bulletin");
        let status = response.status();
        let bulletin = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {bulletin}");
        // Zero averages tie; roster order (Bint before Salem) decides the
        // dense ranks.
        assert_eq!(bulletin["rank"], 2);
        assert_eq!(bulletin["general_average"], 0.0);
        assert_eq!(bulletin["total_students"], 2);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/documents/bulletins/{other_child}?term=T1"),
                Some(&parent_token),
                None,
            ))
            .await
            .expect("other bulletin");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
