use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Director,
    Teacher,
    Parent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
pub(crate) enum Gender {
    Male,
    Female,
}

/// Academic trimester, the unit of grade aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "term", rename_all = "UPPERCASE")]
pub(crate) enum Term {
    T1,
    T2,
    T3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "attendancestatus", rename_all = "lowercase")]
pub(crate) enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "paymentkind", rename_all = "lowercase")]
pub(crate) enum PaymentKind {
    Tuition,
    Registration,
    Transport,
    Cafeteria,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "paymentstatus", rename_all = "lowercase")]
pub(crate) enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "paymentmethod", rename_all = "snake_case")]
pub(crate) enum PaymentMethod {
    Cash,
    BankTransfer,
    MobileMoney,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "notificationkind", rename_all = "lowercase")]
pub(crate) enum NotificationKind {
    Absence,
    Grade,
    Payment,
    General,
    Meeting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "notificationchannel", rename_all = "snake_case")]
pub(crate) enum NotificationChannel {
    InApp,
    Sms,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "observationkind", rename_all = "lowercase")]
pub(crate) enum ObservationKind {
    Behavior,
    Academic,
    Health,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "observationseverity", rename_all = "lowercase")]
pub(crate) enum ObservationSeverity {
    Info,
    Warning,
    Serious,
}
