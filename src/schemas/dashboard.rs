use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct DashboardStats {
    pub(crate) total_students: i64,
    pub(crate) present_today: i64,
    pub(crate) absent_today: i64,
    pub(crate) total_teachers: i64,
    pub(crate) total_classes: i64,
    pub(crate) monthly_revenue: f64,
    pub(crate) pending_payments: f64,
    pub(crate) unread_notifications: i64,
    pub(crate) monthly_grade_average: Option<f64>,
}
