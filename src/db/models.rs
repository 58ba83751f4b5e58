use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, PrimitiveDateTime};

use crate::db::types::{
    AttendanceStatus, Gender, NotificationChannel, NotificationKind, ObservationKind,
    ObservationSeverity, PaymentKind, PaymentMethod, PaymentStatus, Term, UserRole,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct School {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) name_ar: Option<String>,
    pub(crate) address: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) school_id: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) phone: Option<String>,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SchoolClass {
    pub(crate) id: String,
    pub(crate) school_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) name: String,
    pub(crate) level: String,
    pub(crate) capacity: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Student {
    pub(crate) id: String,
    pub(crate) school_id: String,
    pub(crate) class_id: Option<String>,
    pub(crate) student_number: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) first_name_ar: Option<String>,
    pub(crate) last_name_ar: Option<String>,
    pub(crate) date_of_birth: Date,
    pub(crate) place_of_birth: Option<String>,
    pub(crate) gender: Gender,
    pub(crate) address: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Subject Catalog row: the per-(class, subject) grading weight.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Subject {
    pub(crate) id: String,
    pub(crate) school_id: String,
    pub(crate) class_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) name: String,
    pub(crate) name_ar: Option<String>,
    pub(crate) max_score: f64,
    pub(crate) coefficient: f64,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One recorded grade per (student, subject, term); resubmission overwrites.
/// max_score snapshots the catalog weight at write time so historical
/// rankings stay stable when the catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Grade {
    pub(crate) id: String,
    pub(crate) school_id: String,
    pub(crate) student_id: String,
    pub(crate) subject_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) score: f64,
    pub(crate) max_score: f64,
    pub(crate) percentage: f64,
    pub(crate) term: Term,
    pub(crate) exam_type: Option<String>,
    pub(crate) comment: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Attendance {
    pub(crate) id: String,
    pub(crate) school_id: String,
    pub(crate) student_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) date: Date,
    pub(crate) status: AttendanceStatus,
    pub(crate) reason: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Payment {
    pub(crate) id: String,
    pub(crate) school_id: String,
    pub(crate) student_id: String,
    pub(crate) kind: PaymentKind,
    pub(crate) amount: f64,
    pub(crate) due_date: Option<Date>,
    pub(crate) status: PaymentStatus,
    pub(crate) description: Option<String>,
    pub(crate) payment_method: Option<PaymentMethod>,
    pub(crate) paid_amount: Option<f64>,
    pub(crate) paid_date: Option<Date>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Notification {
    pub(crate) id: String,
    pub(crate) school_id: String,
    pub(crate) recipient_id: String,
    pub(crate) student_id: Option<String>,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) content_ar: Option<String>,
    pub(crate) kind: NotificationKind,
    pub(crate) channel: NotificationChannel,
    pub(crate) is_read: bool,
    pub(crate) sent_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Observation {
    pub(crate) id: String,
    pub(crate) school_id: String,
    pub(crate) student_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) content: String,
    pub(crate) content_ar: Option<String>,
    pub(crate) kind: ObservationKind,
    pub(crate) severity: ObservationSeverity,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
