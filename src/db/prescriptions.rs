//! Prescription queries and status-transition helpers.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

use crate::models::prescription::{Prescription, PrescriptionStatus};

pub struct NewPrescription {
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
    pub observations: Option<String>,
    pub quantity: i64,
}

#[derive(Default)]
pub struct PrescriptionFilter {
    pub patient_id: Option<i64>,
    pub hospitalization_id: Option<i64>,
    pub medicament_id: Option<i64>,
    pub status: Option<PrescriptionStatus>,
}

#[instrument(skip(pool, rx), fields(patient_id = rx.patient_id))]
pub async fn insert(pool: &SqlitePool, rx: NewPrescription) -> Result<Prescription, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO prescriptions (
            patient_id, hospitalization_id, medicament_id, prescription_type_id,
            prescribing_doctor, prescribed_on, start_date, end_date, dosage, frequency,
            instructions, status, observations, quantity, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(rx.patient_id)
    .bind(rx.hospitalization_id)
    .bind(rx.medicament_id)
    .bind(rx.prescription_type_id)
    .bind(&rx.prescribing_doctor)
    .bind(rx.prescribed_on)
    .bind(rx.start_date)
    .bind(rx.end_date)
    .bind(&rx.dosage)
    .bind(&rx.frequency)
    .bind(&rx.instructions)
    .bind(rx.status)
    .bind(&rx.observations)
    .bind(rx.quantity)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find(pool, result.last_insert_rowid())
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

#[instrument(skip(pool))]
pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Prescription>, sqlx::Error> {
    sqlx::query_as::<_, Prescription>("SELECT * FROM prescriptions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[instrument(skip(pool, filter))]
pub async fn list(
    pool: &SqlitePool,
    filter: PrescriptionFilter,
) -> Result<Vec<Prescription>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM prescriptions WHERE 1=1");
    if let Some(patient_id) = filter.patient_id {
        qb.push(" AND patient_id = ").push_bind(patient_id);
    }
    if let Some(hospitalization_id) = filter.hospitalization_id {
        qb.push(" AND hospitalization_id = ").push_bind(hospitalization_id);
    }
    if let Some(medicament_id) = filter.medicament_id {
        qb.push(" AND medicament_id = ").push_bind(medicament_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    qb.push(" ORDER BY prescribed_on DESC");
    qb.build_query_as::<Prescription>().fetch_all(pool).await
}

#[instrument(skip(pool, rx), fields(id = rx.id))]
pub async fn update(pool: &SqlitePool, rx: &Prescription) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE prescriptions SET
            patient_id = ?, hospitalization_id = ?, medicament_id = ?,
            prescription_type_id = ?, prescribing_doctor = ?, prescribed_on = ?,
            start_date = ?, end_date = ?, dosage = ?, frequency = ?, instructions = ?,
            status = ?, suspension_reason = ?, observations = ?, quantity = ?, updated_at = ?
        WHERE id = ?",
    )
    .bind(rx.patient_id)
    .bind(rx.hospitalization_id)
    .bind(rx.medicament_id)
    .bind(rx.prescription_type_id)
    .bind(&rx.prescribing_doctor)
    .bind(rx.prescribed_on)
    .bind(rx.start_date)
    .bind(rx.end_date)
    .bind(&rx.dosage)
    .bind(&rx.frequency)
    .bind(&rx.instructions)
    .bind(rx.status)
    .bind(&rx.suspension_reason)
    .bind(&rx.observations)
    .bind(rx.quantity)
    .bind(Utc::now())
    .bind(rx.id)
    .execute(pool)
    .await?;
    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM prescriptions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
