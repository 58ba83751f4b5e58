use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::repositories::classes::ClassWithEnrollment;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, message = "level must not be empty"))]
    pub(crate) level: String,
    #[serde(default = "default_capacity")]
    #[validate(range(min = 1, message = "capacity must be positive"))]
    pub(crate) capacity: i32,
    #[serde(default)]
    #[serde(alias = "teacherId")]
    pub(crate) teacher_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) level: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, message = "capacity must be positive"))]
    pub(crate) capacity: Option<i32>,
    #[serde(default)]
    #[serde(alias = "teacherId")]
    pub(crate) teacher_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassResponse {
    pub(crate) id: String,
    pub(crate) school_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) name: String,
    pub(crate) level: String,
    pub(crate) capacity: i32,
    pub(crate) student_count: i64,
    pub(crate) fill_rate: i32,
    pub(crate) available_slots: i64,
    pub(crate) created_at: String,
}

impl ClassResponse {
    pub(crate) fn from_db(class: ClassWithEnrollment) -> Self {
        let fill_rate = if class.capacity > 0 {
            ((class.student_count as f64 / class.capacity as f64) * 100.0).round() as i32
        } else {
            0
        };
        let available_slots = (class.capacity as i64 - class.student_count).max(0);

        Self {
            id: class.id,
            school_id: class.school_id,
            teacher_id: class.teacher_id,
            name: class.name,
            level: class.level,
            capacity: class.capacity,
            student_count: class.student_count,
            fill_rate,
            available_slots,
            created_at: format_primitive(class.created_at),
        }
    }
}

fn default_capacity() -> i32 {
    40
}
