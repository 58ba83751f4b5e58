use axum::{extract::Query, routing::get, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_staff, student_scope, CurrentUser};
use crate::api::pagination::{default_limit, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Payment;
use crate::db::types::{PaymentKind, PaymentStatus};
use crate::repositories;
use crate::schemas::payment::{PaymentCreate, PaymentResponse, PaymentUpdate};
use sqlx::{Postgres, QueryBuilder};

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    kind: Option<PaymentKind>,
    #[serde(default)]
    status: Option<PaymentStatus>,
    #[serde(default)]
    #[serde(alias = "studentId")]
    student_id: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payments).post(create_payment))
        .route("/:payment_id", axum::routing::patch(update_payment))
}

async fn list_payments(
    Query(params): Query<PaymentListQuery>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<PaginatedResponse<PaymentResponse>>, ApiError> {
    let scope = student_scope(&state, &user).await?;

    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM payments WHERE school_id = ",
        repositories::payments::COLUMNS
    ));
    builder.push_bind(&user.school_id);

    let mut count_builder =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM payments WHERE school_id = ");
    count_builder.push_bind(&user.school_id);

    for current in [&mut builder, &mut count_builder] {
        if let Some(student_ids) = scope.as_ref() {
            current.push(" AND student_id = ANY(");
            current.push_bind(student_ids);
            current.push(")");
        }
        if let Some(kind) = params.kind {
            current.push(" AND kind = ");
            current.push_bind(kind);
        }
        if let Some(status) = params.status {
            current.push(" AND status = ");
            current.push_bind(status);
        }
        if let Some(student_id) = params.student_id.as_ref() {
            current.push(" AND student_id = ");
            current.push_bind(student_id);
        }
    }

    builder.push(" ORDER BY created_at DESC");
    builder.push(" OFFSET ");
    builder.push_bind(params.skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(params.limit.clamp(1, 1000));

    let payments = builder
        .build_query_as::<Payment>()
        .fetch_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list payments"))?;

    let total_count = count_builder
        .build_query_scalar::<i64>()
        .fetch_one(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count payments"))?;

    Ok(Json(PaginatedResponse {
        items: payments.into_iter().map(PaymentResponse::from_db).collect(),
        total_count,
        skip: params.skip.max(0),
        limit: params.limit.clamp(1, 1000),
    }))
}

async fn create_payment(
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<PaymentCreate>,
) -> Result<(axum::http::StatusCode, Json<PaymentResponse>), ApiError> {
    require_staff(&user)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let student = repositories::students::find_by_id(state.db(), &payload.student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?;

    if student.filter(|student| student.school_id == user.school_id).is_none() {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    let now = primitive_now_utc();
    let payment = repositories::payments::create(
        state.db(),
        repositories::payments::CreatePayment {
            id: &Uuid::new_v4().to_string(),
            school_id: &user.school_id,
            student_id: &payload.student_id,
            kind: payload.kind,
            amount: payload.amount,
            due_date: payload.due_date,
            status: PaymentStatus::Pending,
            description: payload.description.as_deref(),
            payment_method: payload.payment_method,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create payment"))?;

    Ok((axum::http::StatusCode::CREATED, Json(PaymentResponse::from_db(payment))))
}

async fn update_payment(
    axum::extract::Path(payment_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<PaymentUpdate>,
) -> Result<Json<PaymentResponse>, ApiError> {
    require_staff(&user)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let existing = repositories::payments::find_by_id(state.db(), &payment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch payment"))?;

    if existing.filter(|payment| payment.school_id == user.school_id).is_none() {
        return Err(ApiError::NotFound("Payment not found".to_string()));
    }

    let updated = repositories::payments::update(
        state.db(),
        &payment_id,
        repositories::payments::UpdatePayment {
            status: payload.status,
            payment_method: payload.payment_method,
            paid_amount: payload.paid_amount,
            paid_date: payload.paid_date,
            description: payload.description,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update payment"))?
    .ok_or_else(|| ApiError::NotFound("Payment not found".to_string()))?;

    Ok(Json(PaymentResponse::from_db(updated)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn create_then_settle_payment() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let director =
            test_support::insert_director(ctx.state.db(), &school_id, "dir@ecole.mr", "dir-pass")
                .await;
        let token = test_support::bearer_token(&director.id, ctx.state.settings());
        let class_id = test_support::insert_class(ctx.state.db(), &school_id, "CM2", 40).await;
        let student =
            test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-001", "Salem")
                .await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/payments",
                Some(&token),
                Some(json!({
                    "student_id": student,
                    "kind": "tuition",
                    "amount": 25000.0,
                    "due_date": "2024-01-31",
                    "description": "Frais de scolarité - Janvier"
                })),
            ))
            .await
            .expect("create payment");

        let status = response.status();
        let created = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "response: {created}");
        assert_eq!(created["status"], "pending");
        let payment_id = created["id"].as_str().expect("payment id").to_string();

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PATCH,
                &format!("/api/v1/payments/{payment_id}"),
                Some(&token),
                Some(json!({
                    "status": "paid",
                    "payment_method": "cash",
                    "paid_amount": 25000.0,
                    "paid_date": "2024-01-15"
                })),
            ))
            .await
            .expect("settle payment");

        let status = response.status();
        let settled = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {settled}");
        assert_eq!(settled["status"], "paid");
        assert_eq!(settled["paid_amount"], 25000.0);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let director =
            test_support::insert_director(ctx.state.db(), &school_id, "dir@ecole.mr", "dir-pass")
                .await;
        let token = test_support::bearer_token(&director.id, ctx.state.settings());
        let class_id = test_support::insert_class(ctx.state.db(), &school_id, "CM2", 40).await;
        let student =
            test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-001", "Salem")
                .await;

        for _ in 0..2 {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    "/api/v1/payments",
                    Some(&token),
                    Some(json!({ "student_id": &student, "kind": "transport", "amount": 500.0 })),
                ))
                .await
                .expect("create payment");
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/payments?status=pending",
                Some(&token),
                None,
            ))
            .await
            .expect("list payments");

        let body = test_support::read_json(response).await;
        assert_eq!(body["total_count"], 2);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/payments?status=paid",
                Some(&token),
                None,
            ))
            .await
            .expect("list paid payments");

        let body = test_support::read_json(response).await;
        assert_eq!(body["total_count"], 0);
    }
}
