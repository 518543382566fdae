//! Hospitalization queries. The length of stay is derived in the SELECT
//! list, never stored.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

use crate::models::hospitalization::{Hospitalization, HospitalizationSeverity, StayStatus};

// Days from admission to discharge, or to now while the stay is ongoing.
const COLUMNS: &str = "*, CAST(julianday(COALESCE(end_date, CURRENT_TIMESTAMP)) \
     - julianday(start_date) AS INTEGER) AS length_of_stay_days";

pub struct NewHospitalization {
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
}

#[derive(Default)]
pub struct HospitalizationFilter {
    pub patient_id: Option<i64>,
    pub crisis_id: Option<i64>,
    pub status: Option<StayStatus>,
    pub severity: Option<HospitalizationSeverity>,
}

#[instrument(skip(pool, stay), fields(patient_id = stay.patient_id))]
pub async fn insert(
    pool: &SqlitePool,
    stay: NewHospitalization,
) -> Result<Hospitalization, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO hospitalizations (
            patient_id, crisis_id, reason, department, attending_doctor, diagnosis,
            start_date, end_date, status, severity, intensive_care, room_number,
            discharge_notes, observations, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(stay.patient_id)
    .bind(stay.crisis_id)
    .bind(&stay.reason)
    .bind(&stay.department)
    .bind(&stay.attending_doctor)
    .bind(&stay.diagnosis)
    .bind(stay.start_date)
    .bind(stay.end_date)
    .bind(stay.status)
    .bind(stay.severity)
    .bind(stay.intensive_care)
    .bind(&stay.room_number)
    .bind(&stay.discharge_notes)
    .bind(&stay.observations)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find(pool, result.last_insert_rowid())
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

#[instrument(skip(pool))]
pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Hospitalization>, sqlx::Error> {
    sqlx::query_as::<_, Hospitalization>(&format!(
        "SELECT {} FROM hospitalizations WHERE id = ?",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM hospitalizations WHERE id = ?)")
            .bind(id)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

#[instrument(skip(pool, filter))]
pub async fn list(
    pool: &SqlitePool,
    filter: HospitalizationFilter,
) -> Result<Vec<Hospitalization>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM hospitalizations WHERE 1=1",
        COLUMNS
    ));
    if let Some(patient_id) = filter.patient_id {
        qb.push(" AND patient_id = ").push_bind(patient_id);
    }
    if let Some(crisis_id) = filter.crisis_id {
        qb.push(" AND crisis_id = ").push_bind(crisis_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(severity) = filter.severity {
        qb.push(" AND severity = ").push_bind(severity);
    }
    qb.push(" ORDER BY start_date DESC");
    qb.build_query_as::<Hospitalization>().fetch_all(pool).await
}

#[instrument(skip(pool, stay), fields(id = stay.id))]
pub async fn update(pool: &SqlitePool, stay: &Hospitalization) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE hospitalizations SET
            patient_id = ?, crisis_id = ?, reason = ?, department = ?, attending_doctor = ?,
            diagnosis = ?, start_date = ?, end_date = ?, status = ?, severity = ?,
            intensive_care = ?, room_number = ?, discharge_notes = ?, observations = ?,
            updated_at = ?
        WHERE id = ?",
    )
    .bind(stay.patient_id)
    .bind(stay.crisis_id)
    .bind(&stay.reason)
    .bind(&stay.department)
    .bind(&stay.attending_doctor)
    .bind(&stay.diagnosis)
    .bind(stay.start_date)
    .bind(stay.end_date)
    .bind(stay.status)
    .bind(stay.severity)
    .bind(stay.intensive_care)
    .bind(&stay.room_number)
    .bind(&stay.discharge_notes)
    .bind(&stay.observations)
    .bind(Utc::now())
    .bind(stay.id)
    .execute(pool)
    .await?;
    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM hospitalizations WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
