use sqlx::PgPool;
use time::{Date, PrimitiveDateTime};

use crate::db::models::Attendance;
use crate::db::types::AttendanceStatus;

pub(crate) const COLUMNS: &str = "\
    id, school_id, student_id, teacher_id, date, status, reason, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(&format!("SELECT {COLUMNS} FROM attendance WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct UpsertAttendance<'a> {
    pub id: &'a str,
    pub school_id: &'a str,
    pub student_id: &'a str,
    pub teacher_id: &'a str,
    pub date: Date,
    pub status: AttendanceStatus,
    pub reason: Option<&'a str>,
    pub now: PrimitiveDateTime,
}

/// One row per (student, date); re-recording a day sheet overwrites.
pub(crate) async fn upsert(
    pool: &PgPool,
    params: UpsertAttendance<'_>,
) -> Result<Attendance, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(&format!(
        "INSERT INTO attendance (
            id, school_id, student_id, teacher_id, date, status, reason,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
        ON CONFLICT (student_id, date) DO UPDATE SET
            status = EXCLUDED.status,
            reason = EXCLUDED.reason,
            teacher_id = EXCLUDED.teacher_id,
            updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.school_id)
    .bind(params.student_id)
    .bind(params.teacher_id)
    .bind(params.date)
    .bind(params.status)
    .bind(params.reason)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateAttendance {
    pub status: AttendanceStatus,
    pub reason: Option<String>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateAttendance,
) -> Result<Option<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(&format!(
        "UPDATE attendance SET status = $1, reason = $2, updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}",
    ))
    .bind(params.status)
    .bind(params.reason)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn count_for_date_status(
    pool: &PgPool,
    school_id: &str,
    date: Date,
    statuses: &[AttendanceStatus],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendance
         WHERE school_id = $1 AND date = $2 AND status = ANY($3)",
    )
    .bind(school_id)
    .bind(date)
    .bind(statuses)
    .fetch_one(pool)
    .await
}
