use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Grade;
use crate::db::types::Term;
use crate::services::grading::StudentAggregate;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeSubmit {
    #[serde(alias = "studentId")]
    pub(crate) student_id: String,
    #[serde(alias = "subjectId")]
    pub(crate) subject_id: String,
    #[validate(range(min = 0.0, message = "score must be non-negative"))]
    pub(crate) score: f64,
    pub(crate) term: Term,
    #[serde(default)]
    #[serde(alias = "examType")]
    pub(crate) exam_type: Option<String>,
    #[serde(default)]
    pub(crate) comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GradeResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) subject_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) score: f64,
    pub(crate) max_score: f64,
    pub(crate) percentage: f64,
    pub(crate) term: Term,
    pub(crate) exam_type: Option<String>,
    pub(crate) comment: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl GradeResponse {
    pub(crate) fn from_db(grade: Grade) -> Self {
        Self {
            id: grade.id,
            student_id: grade.student_id,
            subject_id: grade.subject_id,
            teacher_id: grade.teacher_id,
            score: grade.score,
            max_score: grade.max_score,
            percentage: grade.percentage,
            term: grade.term,
            exam_type: grade.exam_type,
            comment: grade.comment,
            created_at: format_primitive(grade.created_at),
            updated_at: format_primitive(grade.updated_at),
        }
    }
}

/// Grade row joined with the names a grade list needs for display.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub(crate) struct GradeListItem {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_first_name: String,
    pub(crate) student_last_name: String,
    pub(crate) student_number: String,
    pub(crate) subject_id: String,
    pub(crate) subject_name: String,
    pub(crate) score: f64,
    pub(crate) max_score: f64,
    pub(crate) percentage: f64,
    pub(crate) term: Term,
    pub(crate) exam_type: Option<String>,
    pub(crate) comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RankingResponse {
    pub(crate) class_id: String,
    pub(crate) term: Term,
    pub(crate) total_students: usize,
    pub(crate) results: Vec<StudentAggregate>,
}
