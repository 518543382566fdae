//! Prescription entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PrescriptionStatus {
    Active,
    Completed,
    Cancelled,
    Suspended,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Prescription {
    pub id: i64,
    pub patient_id: i64,
    pub hospitalization_id: Option<i64>,
    pub medicament_id: Option<i64>,
    pub prescription_type_id: i64,
    pub prescribing_doctor: String,
    pub prescribed_on: DateTime<Utc>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub dosage: String,
    pub frequency: String,
    pub instructions: Option<String>,
    pub status: PrescriptionStatus,
    pub suspension_reason: Option<String>,
    pub observations: Option<String>,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
