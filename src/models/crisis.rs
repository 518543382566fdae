//! Asthma crisis entity. Hospitalizations reference the crisis that
//! triggered them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::hospitalization::StayStatus;
use super::patient::AsthmaSeverity;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Crisis {
    pub id: i64,
    pub patient_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub intensity: AsthmaSeverity,
    pub symptoms: String,
    pub triggers: Option<String>,
    pub treatments_used: Option<String>,
    pub notes: Option<String>,
    pub status: StayStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
