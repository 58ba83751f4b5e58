use serde::{Deserialize, Serialize};
use time::Date;
use validator::Validate;

use crate::core::time::{format_date, format_primitive};
use crate::db::models::Payment;
use crate::db::types::{PaymentKind, PaymentMethod, PaymentStatus};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PaymentCreate {
    #[serde(alias = "studentId")]
    pub(crate) student_id: String,
    pub(crate) kind: PaymentKind,
    #[validate(range(exclusive_min = 0.0, message = "amount must be positive"))]
    pub(crate) amount: f64,
    #[serde(default)]
    #[serde(alias = "dueDate")]
    pub(crate) due_date: Option<Date>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "paymentMethod")]
    pub(crate) payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PaymentUpdate {
    #[serde(default)]
    pub(crate) status: Option<PaymentStatus>,
    #[serde(default)]
    #[serde(alias = "paymentMethod")]
    pub(crate) payment_method: Option<PaymentMethod>,
    #[serde(default)]
    #[serde(alias = "paidAmount")]
    #[validate(range(min = 0.0, message = "paid_amount must be non-negative"))]
    pub(crate) paid_amount: Option<f64>,
    #[serde(default)]
    #[serde(alias = "paidDate")]
    pub(crate) paid_date: Option<Date>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PaymentResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) kind: PaymentKind,
    pub(crate) amount: f64,
    pub(crate) due_date: Option<String>,
    pub(crate) status: PaymentStatus,
    pub(crate) description: Option<String>,
    pub(crate) payment_method: Option<PaymentMethod>,
    pub(crate) paid_amount: Option<f64>,
    pub(crate) paid_date: Option<String>,
    pub(crate) created_at: String,
}

impl PaymentResponse {
    pub(crate) fn from_db(payment: Payment) -> Self {
        Self {
            id: payment.id,
            student_id: payment.student_id,
            kind: payment.kind,
            amount: payment.amount,
            due_date: payment.due_date.map(format_date),
            status: payment.status,
            description: payment.description,
            payment_method: payment.payment_method,
            paid_amount: payment.paid_amount,
            paid_date: payment.paid_date.map(format_date),
            created_at: format_primitive(payment.created_at),
        }
    }
}
