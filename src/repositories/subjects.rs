use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Subject;

const COLUMNS: &str = "\
    id, school_id, class_id, teacher_id, name, name_ar, max_score, \
    coefficient, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!("SELECT {COLUMNS} FROM subjects WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_class(
    pool: &PgPool,
    class_id: &str,
) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "SELECT {COLUMNS} FROM subjects WHERE class_id = $1 ORDER BY name"
    ))
    .bind(class_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn exists_by_name(
    pool: &PgPool,
    class_id: &str,
    name: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM subjects WHERE class_id = $1 AND name = $2")
        .bind(class_id)
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateSubject<'a> {
    pub id: &'a str,
    pub school_id: &'a str,
    pub class_id: &'a str,
    pub teacher_id: Option<&'a str>,
    pub name: &'a str,
    pub name_ar: Option<&'a str>,
    pub max_score: f64,
    pub coefficient: f64,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateSubject<'_>) -> Result<Subject, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "INSERT INTO subjects (
            id, school_id, class_id, teacher_id, name, name_ar, max_score,
            coefficient, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.school_id)
    .bind(params.class_id)
    .bind(params.teacher_id)
    .bind(params.name)
    .bind(params.name_ar)
    .bind(params.max_score)
    .bind(params.coefficient)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateSubject {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub teacher_id: Option<String>,
    pub max_score: Option<f64>,
    pub coefficient: Option<f64>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateSubject,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE subjects SET
            name = COALESCE($1, name),
            name_ar = COALESCE($2, name_ar),
            teacher_id = COALESCE($3, teacher_id),
            max_score = COALESCE($4, max_score),
            coefficient = COALESCE($5, coefficient),
            updated_at = $6
         WHERE id = $7",
    )
    .bind(params.name)
    .bind(params.name_ar)
    .bind(params.teacher_id)
    .bind(params.max_score)
    .bind(params.coefficient)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<Subject, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!("SELECT {COLUMNS} FROM subjects WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}
