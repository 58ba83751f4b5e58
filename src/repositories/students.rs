use sqlx::PgPool;
use time::{Date, PrimitiveDateTime};

use crate::db::models::Student;
use crate::db::types::Gender;

pub(crate) const COLUMNS: &str = "\
    id, school_id, class_id, student_number, first_name, last_name, \
    first_name_ar, last_name_ar, date_of_birth, place_of_birth, gender, \
    address, is_active, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Active students of a class in the stable order rankings use: by last name,
/// first name, then id as the final tiebreaker.
pub(crate) async fn roster_for_class(
    pool: &PgPool,
    class_id: &str,
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {COLUMNS} FROM students
         WHERE class_id = $1 AND is_active
         ORDER BY last_name, first_name, id"
    ))
    .bind(class_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_school(pool: &PgPool, school_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students WHERE school_id = $1")
        .bind(school_id)
        .fetch_one(pool)
        .await
}

pub(crate) struct CreateStudent<'a> {
    pub id: &'a str,
    pub school_id: &'a str,
    pub class_id: Option<&'a str>,
    pub student_number: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub first_name_ar: Option<&'a str>,
    pub last_name_ar: Option<&'a str>,
    pub date_of_birth: Date,
    pub place_of_birth: Option<&'a str>,
    pub gender: Gender,
    pub address: Option<&'a str>,
    pub is_active: bool,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateStudent<'_>) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "INSERT INTO students (
            id, school_id, class_id, student_number, first_name, last_name,
            first_name_ar, last_name_ar, date_of_birth, place_of_birth, gender,
            address, is_active, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.school_id)
    .bind(params.class_id)
    .bind(params.student_number)
    .bind(params.first_name)
    .bind(params.last_name)
    .bind(params.first_name_ar)
    .bind(params.last_name_ar)
    .bind(params.date_of_birth)
    .bind(params.place_of_birth)
    .bind(params.gender)
    .bind(params.address)
    .bind(params.is_active)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateStudent {
    pub class_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub first_name_ar: Option<String>,
    pub last_name_ar: Option<String>,
    pub place_of_birth: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateStudent,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE students SET
            class_id = COALESCE($1, class_id),
            first_name = COALESCE($2, first_name),
            last_name = COALESCE($3, last_name),
            first_name_ar = COALESCE($4, first_name_ar),
            last_name_ar = COALESCE($5, last_name_ar),
            place_of_birth = COALESCE($6, place_of_birth),
            address = COALESCE($7, address),
            is_active = COALESCE($8, is_active),
            updated_at = $9
         WHERE id = $10",
    )
    .bind(params.class_id)
    .bind(params.first_name)
    .bind(params.last_name)
    .bind(params.first_name_ar)
    .bind(params.last_name_ar)
    .bind(params.place_of_birth)
    .bind(params.address)
    .bind(params.is_active)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}
