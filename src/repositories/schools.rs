use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::School;

const COLUMNS: &str = "id, name, name_ar, address, phone, email, created_at, updated_at";

pub(crate) async fn find_first(pool: &PgPool) -> Result<Option<School>, sqlx::Error> {
    sqlx::query_as::<_, School>(&format!(
        "SELECT {COLUMNS} FROM schools ORDER BY created_at LIMIT 1"
    ))
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<School>, sqlx::Error> {
    sqlx::query_as::<_, School>(&format!("SELECT {COLUMNS} FROM schools WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateSchool<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub name_ar: Option<&'a str>,
    pub address: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateSchool<'_>) -> Result<School, sqlx::Error> {
    sqlx::query_as::<_, School>(&format!(
        "INSERT INTO schools (id, name, name_ar, address, phone, email, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.name_ar)
    .bind(params.address)
    .bind(params.phone)
    .bind(params.email)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}
