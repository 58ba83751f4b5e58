use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Notification;
use crate::db::types::{NotificationChannel, NotificationKind};

pub(crate) const COLUMNS: &str = "\
    id, school_id, recipient_id, student_id, title, content, content_ar, \
    kind, channel, is_read, sent_at, created_at";

pub(crate) struct CreateNotification<'a> {
    pub id: &'a str,
    pub school_id: &'a str,
    pub recipient_id: &'a str,
    pub student_id: Option<&'a str>,
    pub title: &'a str,
    pub content: &'a str,
    pub content_ar: Option<&'a str>,
    pub kind: NotificationKind,
    pub channel: NotificationChannel,
    pub sent_at: Option<PrimitiveDateTime>,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateNotification<'_>,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "INSERT INTO notifications (
            id, school_id, recipient_id, student_id, title, content, content_ar,
            kind, channel, is_read, sent_at, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,FALSE,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.school_id)
    .bind(params.recipient_id)
    .bind(params.student_id)
    .bind(params.title)
    .bind(params.content)
    .bind(params.content_ar)
    .bind(params.kind)
    .bind(params.channel)
    .bind(params.sent_at)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn unread_count(pool: &PgPool, recipient_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND NOT is_read",
    )
    .bind(recipient_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn unread_count_for_school(
    pool: &PgPool,
    school_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE school_id = $1 AND NOT is_read",
    )
    .bind(school_id)
    .fetch_one(pool)
    .await
}

/// Marks one notification read; scoped to the recipient so users cannot touch
/// each other's inboxes. Returns the updated row when it exists.
pub(crate) async fn mark_read(
    pool: &PgPool,
    id: &str,
    recipient_id: &str,
) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "UPDATE notifications SET is_read = TRUE
         WHERE id = $1 AND recipient_id = $2
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(recipient_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn mark_all_read(pool: &PgPool, recipient_id: &str) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND NOT is_read")
            .bind(recipient_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}
