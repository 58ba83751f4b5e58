use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::SchoolClass;

const COLUMNS: &str =
    "id, school_id, teacher_id, name, level, capacity, created_at, updated_at";

/// Class row joined with its active-enrollment count, for listings.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ClassWithEnrollment {
    pub(crate) id: String,
    pub(crate) school_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) name: String,
    pub(crate) level: String,
    pub(crate) capacity: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
    pub(crate) student_count: i64,
}

pub(crate) async fn list_by_school(
    pool: &PgPool,
    school_id: &str,
) -> Result<Vec<ClassWithEnrollment>, sqlx::Error> {
    sqlx::query_as::<_, ClassWithEnrollment>(
        "SELECT c.id, c.school_id, c.teacher_id, c.name, c.level, c.capacity,
                c.created_at, c.updated_at,
                COUNT(s.id) FILTER (WHERE s.is_active) AS student_count
         FROM classes c
         LEFT JOIN students s ON s.class_id = c.id
         WHERE c.school_id = $1
         GROUP BY c.id
         ORDER BY c.name",
    )
    .bind(school_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_with_enrollment(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ClassWithEnrollment>, sqlx::Error> {
    sqlx::query_as::<_, ClassWithEnrollment>(
        "SELECT c.id, c.school_id, c.teacher_id, c.name, c.level, c.capacity,
                c.created_at, c.updated_at,
                COUNT(s.id) FILTER (WHERE s.is_active) AS student_count
         FROM classes c
         LEFT JOIN students s ON s.class_id = c.id
         WHERE c.id = $1
         GROUP BY c.id",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<SchoolClass>, sqlx::Error> {
    sqlx::query_as::<_, SchoolClass>(&format!("SELECT {COLUMNS} FROM classes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_name(
    pool: &PgPool,
    school_id: &str,
    name: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM classes WHERE school_id = $1 AND name = $2")
        .bind(school_id)
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateClass<'a> {
    pub id: &'a str,
    pub school_id: &'a str,
    pub teacher_id: Option<&'a str>,
    pub name: &'a str,
    pub level: &'a str,
    pub capacity: i32,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateClass<'_>,
) -> Result<SchoolClass, sqlx::Error> {
    sqlx::query_as::<_, SchoolClass>(&format!(
        "INSERT INTO classes (id, school_id, teacher_id, name, level, capacity, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.school_id)
    .bind(params.teacher_id)
    .bind(params.name)
    .bind(params.level)
    .bind(params.capacity)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateClass {
    pub name: Option<String>,
    pub level: Option<String>,
    pub capacity: Option<i32>,
    pub teacher_id: Option<String>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateClass,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE classes SET
            name = COALESCE($1, name),
            level = COALESCE($2, level),
            capacity = COALESCE($3, capacity),
            teacher_id = COALESCE($4, teacher_id),
            updated_at = $5
         WHERE id = $6",
    )
    .bind(params.name)
    .bind(params.level)
    .bind(params.capacity)
    .bind(params.teacher_id)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}
