use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Subject;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default)]
    #[serde(alias = "nameAr")]
    pub(crate) name_ar: Option<String>,
    #[serde(alias = "classId")]
    pub(crate) class_id: String,
    #[serde(default)]
    #[serde(alias = "teacherId")]
    pub(crate) teacher_id: Option<String>,
    #[serde(alias = "maxScore")]
    #[validate(range(exclusive_min = 0.0, message = "max_score must be positive"))]
    pub(crate) max_score: f64,
    #[serde(default = "default_coefficient")]
    #[validate(range(exclusive_min = 0.0, message = "coefficient must be positive"))]
    pub(crate) coefficient: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[serde(alias = "nameAr")]
    pub(crate) name_ar: Option<String>,
    #[serde(default)]
    #[serde(alias = "teacherId")]
    pub(crate) teacher_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "maxScore")]
    #[validate(range(exclusive_min = 0.0, message = "max_score must be positive"))]
    pub(crate) max_score: Option<f64>,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "coefficient must be positive"))]
    pub(crate) coefficient: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectResponse {
    pub(crate) id: String,
    pub(crate) school_id: String,
    pub(crate) class_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) name: String,
    pub(crate) name_ar: Option<String>,
    pub(crate) max_score: f64,
    pub(crate) coefficient: f64,
    pub(crate) average_score: Option<f64>,
    pub(crate) total_grades: i64,
    pub(crate) created_at: String,
}

impl SubjectResponse {
    pub(crate) fn from_db(subject: Subject) -> Self {
        Self {
            id: subject.id,
            school_id: subject.school_id,
            class_id: subject.class_id,
            teacher_id: subject.teacher_id,
            name: subject.name,
            name_ar: subject.name_ar,
            max_score: subject.max_score,
            coefficient: subject.coefficient,
            average_score: None,
            total_grades: 0,
            created_at: format_primitive(subject.created_at),
        }
    }

    pub(crate) fn with_stats(mut self, average_score: f64, total_grades: i64) -> Self {
        self.average_score = Some(average_score);
        self.total_grades = total_grades;
        self
    }
}

fn default_coefficient() -> f64 {
    1.0
}
