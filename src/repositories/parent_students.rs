use sqlx::PgPool;

pub(crate) async fn link(
    pool: &PgPool,
    parent_id: &str,
    student_id: &str,
    relationship: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO parent_students (parent_id, student_id, relationship)
         VALUES ($1, $2, $3)
         ON CONFLICT (parent_id, student_id) DO UPDATE SET relationship = EXCLUDED.relationship",
    )
    .bind(parent_id)
    .bind(student_id)
    .bind(relationship)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn student_ids_for_parent(
    pool: &PgPool,
    parent_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT student_id FROM parent_students WHERE parent_id = $1",
    )
    .bind(parent_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn parent_ids_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT parent_id FROM parent_students WHERE student_id = $1",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}
