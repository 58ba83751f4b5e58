use sqlx::PgPool;
use time::{Date, PrimitiveDateTime};

use crate::db::models::Payment;
use crate::db::types::{PaymentKind, PaymentMethod, PaymentStatus};

pub(crate) const COLUMNS: &str = "\
    id, school_id, student_id, kind, amount, due_date, status, description, \
    payment_method, paid_amount, paid_date, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(&format!("SELECT {COLUMNS} FROM payments WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreatePayment<'a> {
    pub id: &'a str,
    pub school_id: &'a str,
    pub student_id: &'a str,
    pub kind: PaymentKind,
    pub amount: f64,
    pub due_date: Option<Date>,
    pub status: PaymentStatus,
    pub description: Option<&'a str>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreatePayment<'_>) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(&format!(
        "INSERT INTO payments (
            id, school_id, student_id, kind, amount, due_date, status,
            description, payment_method, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.school_id)
    .bind(params.student_id)
    .bind(params.kind)
    .bind(params.amount)
    .bind(params.due_date)
    .bind(params.status)
    .bind(params.description)
    .bind(params.payment_method)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdatePayment {
    pub status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub paid_amount: Option<f64>,
    pub paid_date: Option<Date>,
    pub description: Option<String>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdatePayment,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(&format!(
        "UPDATE payments SET
            status = COALESCE($1, status),
            payment_method = COALESCE($2, payment_method),
            paid_amount = COALESCE($3, paid_amount),
            paid_date = COALESCE($4, paid_date),
            description = COALESCE($5, description),
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}",
    ))
    .bind(params.status)
    .bind(params.payment_method)
    .bind(params.paid_amount)
    .bind(params.paid_date)
    .bind(params.description)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn sum_paid_since(
    pool: &PgPool,
    school_id: &str,
    since: Date,
) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar::<_, Option<f64>>(
        "SELECT SUM(COALESCE(paid_amount, amount)) FROM payments
         WHERE school_id = $1 AND status = 'paid' AND paid_date >= $2",
    )
    .bind(school_id)
    .bind(since)
    .fetch_one(pool)
    .await
    .map(|sum| sum.unwrap_or(0.0))
}

pub(crate) async fn sum_outstanding(pool: &PgPool, school_id: &str) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar::<_, Option<f64>>(
        "SELECT SUM(amount) FROM payments
         WHERE school_id = $1 AND status IN ('pending', 'overdue')",
    )
    .bind(school_id)
    .fetch_one(pool)
    .await
    .map(|sum| sum.unwrap_or(0.0))
}
