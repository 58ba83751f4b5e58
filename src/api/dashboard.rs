use axum::{routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::{require_staff, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{first_of_month, today_utc};
use crate::db::types::AttendanceStatus;
use crate::repositories;
use crate::schemas::dashboard::DashboardStats;
use crate::services::grading::round2;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/stats", get(stats))
}

async fn stats(
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<DashboardStats>, ApiError> {
    require_staff(&user)?;

    let school_id = &user.school_id;
    let today = today_utc();
    let month_start = first_of_month(today);
    let month_start_at = time::PrimitiveDateTime::new(month_start, time::Time::MIDNIGHT);

    let total_students = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM students WHERE school_id = $1 AND is_active",
    )
    .bind(school_id)
    .fetch_one(state.db())
    .await
    .map_err(|e| ApiError::internal(e, "Failed to count students"))?;

    let present_today = repositories::attendance::count_for_date_status(
        state.db(),
        school_id,
        today,
        &[AttendanceStatus::Present, AttendanceStatus::Late],
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to count attendance"))?;

    let absent_today = repositories::attendance::count_for_date_status(
        state.db(),
        school_id,
        today,
        &[AttendanceStatus::Absent, AttendanceStatus::Excused],
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to count absences"))?;

    let total_teachers = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE school_id = $1 AND role = 'teacher' AND is_active",
    )
    .bind(school_id)
    .fetch_one(state.db())
    .await
    .map_err(|e| ApiError::internal(e, "Failed to count teachers"))?;

    let total_classes =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM classes WHERE school_id = $1")
            .bind(school_id)
            .fetch_one(state.db())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count classes"))?;

    let monthly_revenue =
        repositories::payments::sum_paid_since(state.db(), school_id, month_start)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to sum revenue"))?;

    let pending_payments = repositories::payments::sum_outstanding(state.db(), school_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to sum outstanding payments"))?;

    let unread_notifications =
        repositories::notifications::unread_count_for_school(state.db(), school_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count notifications"))?;

    let monthly_grade_average =
        repositories::grades::average_percentage_since(state.db(), school_id, month_start_at)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to average grades"))?
            .map(round2);

    Ok(Json(DashboardStats {
        total_students,
        present_today,
        absent_today,
        total_teachers,
        total_classes,
        monthly_revenue,
        pending_payments,
        unread_notifications,
        monthly_grade_average,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn stats_report_counts() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let director =
            test_support::insert_director(ctx.state.db(), &school_id, "dir@ecole.mr", "dir-pass")
                .await;
        test_support::insert_teacher(ctx.state.db(), &school_id, "prof@ecole.mr", "prof-pass")
            .await;
        let token = test_support::bearer_token(&director.id, ctx.state.settings());
        let class_id = test_support::insert_class(ctx.state.db(), &school_id, "CM2", 40).await;
        test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-001", "Salem")
            .await;
        test_support::insert_student(ctx.state.db(), &school_id, &class_id, "2024-002", "Bint")
            .await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/dashboard/stats",
                Some(&token),
                None,
            ))
            .await
            .expect("stats");

        let status = response.status();
        let stats = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {stats}");
        assert_eq!(stats["total_students"], 2);
        assert_eq!(stats["total_teachers"], 1);
        assert_eq!(stats["total_classes"], 1);
        assert_eq!(stats["pending_payments"], 0.0);
        assert_eq!(stats["monthly_grade_average"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn parent_cannot_read_stats() {
        let ctx = test_support::setup_test_context().await;
        let school_id = test_support::insert_school(ctx.state.db()).await;
        let parent =
            test_support::insert_parent(ctx.state.db(), &school_id, "parent@ecole.mr", "parent-pw")
                .await;
        let token = test_support::bearer_token(&parent.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/dashboard/stats",
                Some(&token),
                None,
            ))
            .await
            .expect("stats");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
