use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Observation;
use crate::db::types::{ObservationKind, ObservationSeverity};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ObservationCreate {
    #[serde(alias = "studentId")]
    pub(crate) student_id: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: String,
    #[serde(default)]
    #[serde(alias = "contentAr")]
    pub(crate) content_ar: Option<String>,
    pub(crate) kind: ObservationKind,
    #[serde(default = "default_severity")]
    pub(crate) severity: ObservationSeverity,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ObservationUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: Option<String>,
    #[serde(default)]
    #[serde(alias = "contentAr")]
    pub(crate) content_ar: Option<String>,
    #[serde(default)]
    pub(crate) kind: Option<ObservationKind>,
    #[serde(default)]
    pub(crate) severity: Option<ObservationSeverity>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ObservationResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) content: String,
    pub(crate) content_ar: Option<String>,
    pub(crate) kind: ObservationKind,
    pub(crate) severity: ObservationSeverity,
    pub(crate) created_at: String,
}

impl ObservationResponse {
    pub(crate) fn from_db(observation: Observation) -> Self {
        Self {
            id: observation.id,
            student_id: observation.student_id,
            teacher_id: observation.teacher_id,
            content: observation.content,
            content_ar: observation.content_ar,
            kind: observation.kind,
            severity: observation.severity,
            created_at: format_primitive(observation.created_at),
        }
    }
}

fn default_severity() -> ObservationSeverity {
    ObservationSeverity::Info
}
