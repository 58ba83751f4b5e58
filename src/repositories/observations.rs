use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Observation;
use crate::db::types::{ObservationKind, ObservationSeverity};

pub(crate) const COLUMNS: &str = "\
    id, school_id, student_id, teacher_id, content, content_ar, kind, \
    severity, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Observation>, sqlx::Error> {
    sqlx::query_as::<_, Observation>(&format!("SELECT {COLUMNS} FROM observations WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateObservation<'a> {
    pub id: &'a str,
    pub school_id: &'a str,
    pub student_id: &'a str,
    pub teacher_id: &'a str,
    pub content: &'a str,
    pub content_ar: Option<&'a str>,
    pub kind: ObservationKind,
    pub severity: ObservationSeverity,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateObservation<'_>,
) -> Result<Observation, sqlx::Error> {
    sqlx::query_as::<_, Observation>(&format!(
        "INSERT INTO observations (
            id, school_id, student_id, teacher_id, content, content_ar, kind,
            severity, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.school_id)
    .bind(params.student_id)
    .bind(params.teacher_id)
    .bind(params.content)
    .bind(params.content_ar)
    .bind(params.kind)
    .bind(params.severity)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateObservation {
    pub content: Option<String>,
    pub content_ar: Option<String>,
    pub kind: Option<ObservationKind>,
    pub severity: Option<ObservationSeverity>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateObservation,
) -> Result<Option<Observation>, sqlx::Error> {
    sqlx::query_as::<_, Observation>(&format!(
        "UPDATE observations SET
            content = COALESCE($1, content),
            content_ar = COALESCE($2, content_ar),
            kind = COALESCE($3, kind),
            severity = COALESCE($4, severity),
            updated_at = $5
         WHERE id = $6
         RETURNING {COLUMNS}",
    ))
    .bind(params.content)
    .bind(params.content_ar)
    .bind(params.kind)
    .bind(params.severity)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}
