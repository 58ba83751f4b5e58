use serde::{Deserialize, Serialize};
use time::Date;
use validator::Validate;

use crate::core::time::{format_date, format_primitive};
use crate::db::models::Student;
use crate::db::types::Gender;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentCreate {
    #[serde(alias = "firstName")]
    #[validate(length(min = 1, message = "first_name must not be empty"))]
    pub(crate) first_name: String,
    #[serde(alias = "lastName")]
    #[validate(length(min = 1, message = "last_name must not be empty"))]
    pub(crate) last_name: String,
    #[serde(default)]
    #[serde(alias = "firstNameAr")]
    pub(crate) first_name_ar: Option<String>,
    #[serde(default)]
    #[serde(alias = "lastNameAr")]
    pub(crate) last_name_ar: Option<String>,
    #[serde(alias = "dateOfBirth")]
    pub(crate) date_of_birth: Date,
    #[serde(default)]
    #[serde(alias = "placeOfBirth")]
    pub(crate) place_of_birth: Option<String>,
    pub(crate) gender: Gender,
    #[serde(default)]
    pub(crate) address: Option<String>,
    #[serde(default)]
    #[serde(alias = "classId")]
    pub(crate) class_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentUpdate {
    #[serde(default)]
    #[serde(alias = "firstName")]
    #[validate(length(min = 1, message = "first_name must not be empty"))]
    pub(crate) first_name: Option<String>,
    #[serde(default)]
    #[serde(alias = "lastName")]
    #[validate(length(min = 1, message = "last_name must not be empty"))]
    pub(crate) last_name: Option<String>,
    #[serde(default)]
    #[serde(alias = "firstNameAr")]
    pub(crate) first_name_ar: Option<String>,
    #[serde(default)]
    #[serde(alias = "lastNameAr")]
    pub(crate) last_name_ar: Option<String>,
    #[serde(default)]
    #[serde(alias = "placeOfBirth")]
    pub(crate) place_of_birth: Option<String>,
    #[serde(default)]
    pub(crate) address: Option<String>,
    #[serde(default)]
    #[serde(alias = "classId")]
    pub(crate) class_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentResponse {
    pub(crate) id: String,
    pub(crate) school_id: String,
    pub(crate) class_id: Option<String>,
    pub(crate) student_number: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) first_name_ar: Option<String>,
    pub(crate) last_name_ar: Option<String>,
    pub(crate) date_of_birth: String,
    pub(crate) place_of_birth: Option<String>,
    pub(crate) gender: Gender,
    pub(crate) address: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl StudentResponse {
    pub(crate) fn from_db(student: Student) -> Self {
        Self {
            id: student.id,
            school_id: student.school_id,
            class_id: student.class_id,
            student_number: student.student_number,
            first_name: student.first_name,
            last_name: student.last_name,
            first_name_ar: student.first_name_ar,
            last_name_ar: student.last_name_ar,
            date_of_birth: format_date(student.date_of_birth),
            place_of_birth: student.place_of_birth,
            gender: student.gender,
            address: student.address,
            is_active: student.is_active,
            created_at: format_primitive(student.created_at),
        }
    }
}
