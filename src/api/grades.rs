use axum::{extract::Query, routing::get, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_staff, student_scope, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{Term, UserRole};
use crate::repositories;
use crate::schemas::grade::{GradeListItem, GradeResponse, GradeSubmit, RankingResponse};
use crate::services::grading::{self, RosterStudent, ScoreEntry};
use sqlx::{Postgres, QueryBuilder};

#[derive(Debug, Deserialize)]
pub(crate) struct GradeListQuery {
    #[serde(default)]
    #[serde(alias = "classId")]
    class_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "subjectId")]
    subject_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "studentId")]
    student_id: Option<String>,
    #[serde(default)]
    term: Option<Term>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RankingQuery {
    #[serde(alias = "classId")]
    class_id: String,
    term: Term,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_grades).post(submit_grade))
        .route("/ranking", get(class_ranking))
}

async fn list_grades(
    Query(params): Query<GradeListQuery>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<GradeListItem>>, ApiError> {
    let scope = student_scope(&state, &user).await?;

    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT g.id, g.student_id, s.first_name AS student_first_name,
                s.last_name AS student_last_name, s.student_number,
                g.subject_id, sub.name AS subject_name, g.score, g.max_score,
                g.percentage, g.term, g.exam_type, g.comment
         FROM grades g
         JOIN students s ON s.id = g.student_id
         JOIN subjects sub ON sub.id = g.subject_id
         WHERE g.school_id = ",
    );
    builder.push_bind(&user.school_id);

    if let Some(student_ids) = scope.as_ref() {
        builder.push(" AND g.student_id = ANY(");
        builder.push_bind(student_ids);
        builder.push(")");
    }
    if let Some(class_id) = params.class_id.as_ref() {
        builder.push(" AND s.class_id = ");
        builder.push_bind(class_id);
    }
    if let Some(subject_id) = params.subject_id.as_ref() {
        builder.push(" AND g.subject_id = ");
        builder.push_bind(subject_id);
    }
    if let Some(student_id) = params.student_id.as_ref() {
        builder.push(" AND g.student_id = ");
        builder.push_bind(student_id);
    }
    if let Some(term) = params.term {
        builder.push(" AND g.term = ");
        builder.push_bind(term);
    }

    builder.push(" ORDER BY s.last_name, sub.name");

    let grades = builder
        .build_query_as::<GradeListItem>()
        .fetch_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list grades"))?;

    Ok(Json(grades))
}

async fn submit_grade(
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<GradeSubmit>,
) -> Result<Json<GradeResponse>, ApiError> {
    require_staff(&user)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let subject = repositories::subjects::find_by_id(state.db(), &payload.subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch subject"))?
        .filter(|subject| subject.school_id == user.school_id)
        .ok_or_else(|| ApiError::NotFound("Subject not found".to_string()))?;

    let student = repositories::students::find_by_id(state.db(), &payload.student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
        .filter(|student| student.school_id == user.school_id)
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    // Only the subject's teacher or the director may record this grade.
    if user.role != UserRole::Director && subject.teacher_id.as_deref() != Some(user.id.as_str()) {
        return Err(ApiError::Forbidden("Not allowed to record grades for this subject"));
    }

    if student.class_id.as_deref() != Some(subject.class_id.as_str()) {
        return Err(ApiError::BadRequest(
            "Student is not enrolled in this subject's class".to_string(),
        ));
    }

    if payload.score > subject.max_score {
        return Err(ApiError::BadRequest(format!(
            "score {} exceeds the subject maximum of {}",
            payload.score, subject.max_score
        )));
    }

    // The catalog guarantees max_score > 0; refuse loudly if it ever is not.
    let percentage = grading::score_percentage(payload.score, subject.max_score)
        .map_err(|e| ApiError::internal(e, "Subject has an invalid max_score"))?;

    let grade = repositories::grades::upsert(
        state.db(),
        repositories::grades::UpsertGrade {
            id: &Uuid::new_v4().to_string(),
            school_id: &user.school_id,
            student_id: &payload.student_id,
            subject_id: &payload.subject_id,
            teacher_id: &user.id,
            score: payload.score,
            max_score: subject.max_score,
            percentage,
            term: payload.term,
            exam_type: payload.exam_type.as_deref(),
            comment: payload.comment.as_deref(),
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record grade"))?;

    tracing::info!(
        teacher_id = %user.id,
        student_id = %grade.student_id,
        subject_id = %grade.subject_id,
        term = ?grade.term,
        action = "grade_submit",
        "Recorded grade"
    );

    Ok(Json(GradeResponse::from_db(grade)))
}

/// Ranked weighted averages for one class and term.
async fn class_ranking(
    Query(params): Query<RankingQuery>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<RankingResponse>, ApiError> {
    require_staff(&user)?;

    let class = repositories::classes::find_by_id(state.db(), &params.class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch class"))?
        .filter(|class| class.school_id == user.school_id)
        .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;

    let roster = repositories::students::roster_for_class(state.db(), &class.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load roster"))?;

    let rows = repositories::grades::list_for_class_term(state.db(), &class.id, params.term)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load grades"))?;

    let roster: Vec<RosterStudent> = roster
        .into_iter()
        .map(|student| RosterStudent {
            id: student.id,
            first_name: student.first_name,
            last_name: student.last_name,
            student_number: student.student_number,
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

    let results = grading::compute_ranking(&roster, &entries, params.term);

    Ok(Json(RankingResponse {
        class_id: class.id,
        term: params.term,
        total_students: roster.len(),
        results,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn submit_is_last_write_wins_per_student_subject_term() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let director =
            test_support::insert_director(ctx.state.db(), &school_id, "dir@ecole.mr", "dir-pass")
                .await;
        let token = test_support::bearer_token(&director.id, ctx.state.settings());
        let class_id = test_support::insert_class(ctx.state.db(), &school_id, "CM2", 40).await;
        let student_id =
            test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-001", "Salem")
                .await;
        let subject_id = test_support::insert_subject(
            ctx.state.db(),
            &school_id,
            &class_id,
            "Mathématiques",
            50.0,
            None,
        )
        .await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/grades",
                Some(&token),
                Some(json!({
                    "student_id": &student_id,
                    "subject_id": &subject_id,
                    "score": 40.0,
                    "term": "T1"
                })),
            ))
            .await
            .expect("submit grade");

        let status = response.status();
        let first = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {first}");
        assert_eq!(first["percentage"], 80.0);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/grades",
                Some(&token),
                Some(json!({
                    "student_id": &student_id,
                    "subject_id": &subject_id,
                    "score": 45.0,
                    "term": "T1"
                })),
            ))
            .await
            .expect("resubmit grade");

        let status = response.status();
        let second = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {second}");
        assert_eq!(second["id"], first["id"], "resubmission must overwrite, not duplicate");
        assert_eq!(second["score"], 45.0);
        assert_eq!(second["percentage"], 90.0);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/grades?student_id={student_id}&term=T1"),
                Some(&token),
                None,
            ))
            .await
            .expect("list grades");

        let grades = test_support::read_json(response).await;
        assert_eq!(grades.as_array().map(|list| list.len()), Some(1));
        assert_eq!(grades[0]["score"], 45.0);
    }

    #[tokio::test]
    async fn submit_rejects_score_above_subject_maximum() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let director =
            test_support::insert_director(ctx.state.db(), &school_id, "dir@ecole.mr", "dir-pass")
                .await;
        let token = test_support::bearer_token(&director.id, ctx.state.settings());
        let class_id = test_support::insert_class(ctx.state.db(), &school_id, "CM2", 40).await;
        let student_id =
            test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-001", "Salem")
                .await;
        let subject_id = test_support::insert_subject(
            ctx.state.db(),
            &school_id,
            &class_id,
            "Arabe",
            30.0,
            None,
        )
        .await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/grades",
                Some(&token),
                Some(json!({
                    "student_id": student_id,
                    "subject_id": subject_id,
                    "score": 31.0,
                    "term": "T1"
                })),
            ))
            .await
            .expect("submit grade");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn only_subject_teacher_or_director_may_submit() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let assigned =
            test_support::insert_teacher(ctx.state.db(), &school_id, "math@ecole.mr", "math-pass")
                .await;
        let other =
            test_support::insert_teacher(ctx.state.db(), &school_id, "other@ecole.mr", "other-pw")
                .await;
        let class_id = test_support::insert_class(ctx.state.db(), &school_id, "CM2", 40).await;
        let student_id =
            test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-001", "Salem")
                .await;
        let subject_id = test_support::insert_subject(
            ctx.state.db(),
            &school_id,
            &class_id,
            "Mathématiques",
            50.0,
            Some(&assigned.id),
        )
        .await;

        let payload = json!({
            "student_id": student_id,
            "subject_id": subject_id,
            "score": 25.0,
            "term": "T2"
        });

        let other_token = test_support::bearer_token(&other.id, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/grades",
                Some(&other_token),
                Some(payload.clone()),
            ))
            .await
            .expect("submit as other teacher");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let assigned_token = test_support::bearer_token(&assigned.id, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/grades",
                Some(&assigned_token),
                Some(payload),
            ))
            .await
            .expect("submit as assigned teacher");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ranking_orders_by_weighted_average_with_dense_ranks() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let director =
            test_support::insert_director(ctx.state.db(), &school_id, "dir@ecole.mr", "dir-pass")
                .await;
        let token = test_support::bearer_token(&director.id, ctx.state.settings());
        let class_id = test_support::insert_class(ctx.state.db(), &school_id, "CM2", 40).await;

        let alpha =
            test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-001", "Alpha")
                .await;
        let bravo =
            test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-002", "Bravo")
                .await;
        test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-003", "Zulu")
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
        let arabic = test_support::insert_subject(
            ctx.state.db(),
            &school_id,
            &class_id,
            "Arabe",
            30.0,
            None,
        )
        .await;

        for (student, subject, score) in [
            (&alpha, &math, 45.0),
            (&alpha, &arabic, 25.0),
            (&bravo, &math, 40.0),
        ] {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    "/api/v1/grades",
                    Some(&token),
                    Some(json!({
                        "student_id": student,
                        "subject_id": subject,
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
                &format!("/api/v1/grades/ranking?class_id={class_id}&term=T1"),
                Some(&token),
                None,
            ))
            .await
            .expect("ranking");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["total_students"], 3);

        let results = body["results"].as_array().expect("results");
        assert_eq!(results.len(), 3);

        assert_eq!(results[0]["student"]["last_name"], "Alpha");
        assert_eq!(results[0]["general_average"], 87.5);
        assert_eq!(results[0]["total_obtained"], 70.0);
        assert_eq!(results[0]["total_possible"], 80.0);
        assert_eq!(results[0]["rank"], 1);

        assert_eq!(results[1]["student"]["last_name"], "Bravo");
        assert_eq!(results[1]["general_average"], 80.0);
        assert_eq!(results[1]["rank"], 2);

        // No grades at all still lands the student in the ranking with a zero
        // average.
        assert_eq!(results[2]["student"]["last_name"], "Zulu");
        assert_eq!(results[2]["general_average"], 0.0);
        assert_eq!(results[2]["rank"], 3);
    }

    #[tokio::test]
    async fn ranking_of_empty_class_is_empty() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let director =
            test_support::insert_director(ctx.state.db(), &school_id, "dir@ecole.mr", "dir-pass")
                .await;
        let token = test_support::bearer_token(&director.id, ctx.state.settings());
        let class_id = test_support::insert_class(ctx.state.db(), &school_id, "CE1", 40).await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/grades/ranking?class_id={class_id}&term=T3"),
                Some(&token),
                None,
            ))
            .await
            .expect("ranking");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["total_students"], 0);
        assert_eq!(body["results"].as_array().map(|list| list.len()), Some(0));
    }
}
