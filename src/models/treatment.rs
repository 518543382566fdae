//! Ongoing treatment entity linking a patient to a medicament.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TreatmentKind {
    Preventive,
    Curative,
    Rescue,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Treatment {
    pub id: i64,
    pub patient_id: i64,
    pub medicament_id: i64,
    pub dosage: String,
    pub frequency: String,
    pub kind: TreatmentKind,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub side_effects: Option<String>,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
