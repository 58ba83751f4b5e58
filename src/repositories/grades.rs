use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::Grade;
use crate::db::types::Term;

pub(crate) const COLUMNS: &str = "\
    id, school_id, student_id, subject_id, teacher_id, score, max_score, \
    percentage, term, exam_type, comment, created_at, updated_at";

/// Raw material for the ranking computation: one row per stored grade with
/// the subject name joined in. Ordered by update time so replays preserve
/// last-write-wins.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct RankingRow {
    pub(crate) student_id: String,
    pub(crate) subject_name: String,
    pub(crate) score: f64,
    pub(crate) max_score: f64,
    pub(crate) term: Term,
}

pub(crate) async fn list_for_class_term(
    pool: &PgPool,
    class_id: &str,
    term: Term,
) -> Result<Vec<RankingRow>, sqlx::Error> {
    sqlx::query_as::<_, RankingRow>(
        "SELECT g.student_id, sub.name AS subject_name, g.score, g.max_score, g.term
         FROM grades g
         JOIN students s ON s.id = g.student_id
         JOIN subjects sub ON sub.id = g.subject_id
         WHERE s.class_id = $1 AND g.term = $2
         ORDER BY g.updated_at, g.id",
    )
    .bind(class_id)
    .bind(term)
    .fetch_all(pool)
    .await
}

pub(crate) struct UpsertGrade<'a> {
    pub id: &'a str,
    pub school_id: &'a str,
    pub student_id: &'a str,
    pub subject_id: &'a str,
    pub teacher_id: &'a str,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub term: Term,
    pub exam_type: Option<&'a str>,
    pub comment: Option<&'a str>,
    pub now: PrimitiveDateTime,
}

/// One grade per (student, subject, term); resubmission overwrites the
/// previous row in place.
pub(crate) async fn upsert(pool: &PgPool, params: UpsertGrade<'_>) -> Result<Grade, sqlx::Error> {
    sqlx::query_as::<_, Grade>(&format!(
        "INSERT INTO grades (
            id, school_id, student_id, subject_id, teacher_id, score, max_score,
            percentage, term, exam_type, comment, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$12)
        ON CONFLICT (student_id, subject_id, term) DO UPDATE SET
            score = EXCLUDED.score,
            max_score = EXCLUDED.max_score,
            percentage = EXCLUDED.percentage,
            exam_type = EXCLUDED.exam_type,
            comment = EXCLUDED.comment,
            teacher_id = EXCLUDED.teacher_id,
            updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.school_id)
    .bind(params.student_id)
    .bind(params.subject_id)
    .bind(params.teacher_id)
    .bind(params.score)
    .bind(params.max_score)
    .bind(params.percentage)
    .bind(params.term)
    .bind(params.exam_type)
    .bind(params.comment)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

/// Per-subject grade statistics for catalog listings: (subject_id, average
/// percentage, grade count).
pub(crate) async fn stats_by_subject(
    pool: &PgPool,
    school_id: &str,
) -> Result<Vec<(String, f64, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, f64, i64)>(
        "SELECT subject_id, AVG(percentage), COUNT(*)
         FROM grades
         WHERE school_id = $1
         GROUP BY subject_id",
    )
    .bind(school_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn average_percentage_since(
    pool: &PgPool,
    school_id: &str,
    since: PrimitiveDateTime,
) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<f64>>(
        "SELECT AVG(percentage) FROM grades WHERE school_id = $1 AND created_at >= $2",
    )
    .bind(school_id)
    .bind(since)
    .fetch_one(pool)
    .await
}
