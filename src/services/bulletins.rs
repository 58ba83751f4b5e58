//! Bulletin payload assembly.
//!
//! Produces the JSON consumed by the report/PDF layer: school header, student
//! identity, one line per graded subject with its appreciation, then the
//! weighted totals and class rank. Rendering itself lives outside this
//! service.

use serde::Serialize;

use crate::core::time::format_date;
use crate::db::models::{School, SchoolClass, Student};
use crate::db::types::Term;
use crate::services::grading::{Appreciation, StudentAggregate};

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SchoolHeader {
    pub(crate) name: String,
    pub(crate) name_ar: Option<String>,
    pub(crate) address: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct BulletinStudent {
    pub(crate) id: String,
    pub(crate) student_number: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) first_name_ar: Option<String>,
    pub(crate) last_name_ar: Option<String>,
    pub(crate) date_of_birth: String,
    pub(crate) place_of_birth: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct BulletinLine {
    pub(crate) subject: String,
    pub(crate) score: f64,
    pub(crate) max_score: f64,
    pub(crate) percentage: f64,
    pub(crate) appreciation: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Bulletin {
    pub(crate) school: SchoolHeader,
    pub(crate) class_name: String,
    pub(crate) term: Term,
    pub(crate) student: BulletinStudent,
    pub(crate) lines: Vec<BulletinLine>,
    pub(crate) total_obtained: f64,
    pub(crate) total_possible: f64,
    pub(crate) general_average: f64,
    pub(crate) general_appreciation: &'static str,
    pub(crate) rank: usize,
    pub(crate) total_students: usize,
}

/// General appreciation wording as printed under the average on bulletins.
pub(crate) fn general_appreciation(average: f64) -> &'static str {
    if average >= 80.0 {
        "Excellent"
    } else if average >= 60.0 {
        "Très bon travail"
    } else if average >= 50.0 {
        "Bon travail"
    } else {
        "Peut mieux faire"
    }
}

pub(crate) fn build(
    school: &School,
    class: &SchoolClass,
    student: &Student,
    aggregate: &StudentAggregate,
    term: Term,
) -> Bulletin {
    let lines = aggregate
        .subject_scores
        .iter()
        .map(|(subject, score)| BulletinLine {
            subject: subject.clone(),
            score: score.score,
            max_score: score.max_score,
            percentage: score.percentage,
            appreciation: Appreciation::for_percentage(score.percentage).label_fr(),
        })
        .collect();

    Bulletin {
        school: SchoolHeader {
            name: school.name.clone(),
            name_ar: school.name_ar.clone(),
            address: school.address.clone(),
            phone: school.phone.clone(),
            email: school.email.clone(),
        },
        class_name: class.name.clone(),
        term,
        student: BulletinStudent {
            id: student.id.clone(),
            student_number: student.student_number.clone(),
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            first_name_ar: student.first_name_ar.clone(),
            last_name_ar: student.last_name_ar.clone(),
            date_of_birth: format_date(student.date_of_birth),
            place_of_birth: student.place_of_birth.clone(),
        },
        lines,
        total_obtained: aggregate.total_obtained,
        total_possible: aggregate.total_possible,
        general_average: aggregate.general_average,
        general_appreciation: general_appreciation(aggregate.general_average),
        rank: aggregate.rank,
        total_students: aggregate.total_students,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_appreciation_boundaries() {
        assert_eq!(general_appreciation(80.0), "Excellent");
        assert_eq!(general_appreciation(79.99), "Très bon travail");
        assert_eq!(general_appreciation(60.0), "Très bon travail");
        assert_eq!(general_appreciation(50.0), "Bon travail");
        assert_eq!(general_appreciation(49.99), "Peut mieux faire");
    }
}
