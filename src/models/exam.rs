//! Medical exam entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ExamStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Exam {
    pub id: i64,
    pub patient_id: i64,
    pub hospitalization_id: Option<i64>,
    pub exam_type_id: i64,
    pub exam_date: DateTime<Utc>,
    pub result_date: Option<DateTime<Utc>>,
    pub status: ExamStatus,
    pub urgent: bool,
    pub results: Option<String>,
    pub interpretation: Option<String>,
    pub prescribing_doctor: Option<String>,
    pub performing_technician: Option<String>,
    pub observations: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
