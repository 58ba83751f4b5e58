use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Notification;
use crate::db::types::{NotificationChannel, NotificationKind};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct NotificationCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: String,
    #[serde(default)]
    #[serde(alias = "contentAr")]
    pub(crate) content_ar: Option<String>,
    pub(crate) kind: NotificationKind,
    pub(crate) channel: NotificationChannel,
    #[serde(alias = "recipientId")]
    pub(crate) recipient_id: String,
    #[serde(default)]
    #[serde(alias = "studentId")]
    pub(crate) student_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "sendImmediately")]
    pub(crate) send_immediately: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct NotificationResponse {
    pub(crate) id: String,
    pub(crate) recipient_id: String,
    pub(crate) student_id: Option<String>,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) content_ar: Option<String>,
    pub(crate) kind: NotificationKind,
    pub(crate) channel: NotificationChannel,
    pub(crate) is_read: bool,
    pub(crate) sent_at: Option<String>,
    pub(crate) created_at: String,
}

impl NotificationResponse {
    pub(crate) fn from_db(notification: Notification) -> Self {
        Self {
            id: notification.id,
            recipient_id: notification.recipient_id,
            student_id: notification.student_id,
            title: notification.title,
            content: notification.content,
            content_ar: notification.content_ar,
            kind: notification.kind,
            channel: notification.channel,
            is_read: notification.is_read,
            sent_at: notification.sent_at.map(format_primitive),
            created_at: format_primitive(notification.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NotificationListResponse {
    pub(crate) notifications: Vec<NotificationResponse>,
    pub(crate) unread_count: i64,
    pub(crate) total: usize,
}
