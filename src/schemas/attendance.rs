use serde::{Deserialize, Serialize};
use time::Date;
use validator::Validate;

use crate::core::time::{format_date, format_primitive};
use crate::db::models::Attendance;
use crate::db::types::AttendanceStatus;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct AttendanceMark {
    #[serde(alias = "studentId")]
    pub(crate) student_id: String,
    pub(crate) status: AttendanceStatus,
    #[serde(default)]
    pub(crate) reason: Option<String>,
}

/// A day sheet: every mark recorded for one date in a single request.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AttendanceSheet {
    pub(crate) date: Date,
    #[validate(length(min = 1, message = "entries must not be empty"))]
    #[validate(nested)]
    pub(crate) entries: Vec<AttendanceMark>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttendanceUpdate {
    pub(crate) status: AttendanceStatus,
    #[serde(default)]
    pub(crate) reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttendanceResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) date: String,
    pub(crate) status: AttendanceStatus,
    pub(crate) reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) notified_parents: Option<i64>,
    pub(crate) created_at: String,
}

impl AttendanceResponse {
    pub(crate) fn from_db(attendance: Attendance) -> Self {
        Self {
            id: attendance.id,
            student_id: attendance.student_id,
            teacher_id: attendance.teacher_id,
            date: format_date(attendance.date),
            status: attendance.status,
            reason: attendance.reason,
            notified_parents: None,
            created_at: format_primitive(attendance.created_at),
        }
    }

    pub(crate) fn with_notified_parents(mut self, count: i64) -> Self {
        self.notified_parents = Some(count);
        self
    }
}
