//! Hospitalization entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle shared with crises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum StayStatus {
    Ongoing,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum HospitalizationSeverity {
    Mild,
    Moderate,
    Severe,
    Critical,
}

/// `length_of_stay_days` is computed in the read query (days elapsed from
/// start to end, or to now while ongoing) and never stored.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Hospitalization {
    pub id: i64,
    pub patient_id: i64,
    pub crisis_id: Option<i64>,
    pub reason: String,
    pub department: Option<String>,
    pub attending_doctor: Option<String>,
    pub diagnosis: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: StayStatus,
    pub severity: HospitalizationSeverity,
    pub intensive_care: bool,
    pub room_number: Option<String>,
    pub discharge_notes: Option<String>,
    pub observations: Option<String>,
    pub length_of_stay_days: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
