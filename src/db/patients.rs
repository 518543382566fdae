//! Patient queries, including the account-security state machine.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

use crate::models::patient::{AsthmaSeverity, Gender, Patient};

const COLUMNS: &str = "id, name, last_name, email, phone, pin_hash, password_hash, gender, \
     birth_date, height, weight, blood_type, asthma_severity, allergies, medical_history, \
     current_medications, medical_notes, emergency_contact_name, emergency_contact_phone, \
     emergency_contact_relationship, attending_doctor, attending_doctor_phone, \
     asthma_specialist, asthma_specialist_phone, emergency_hospital, follow_up_hospital, \
     insurance_number, phone_verified, is_active_patient, registration_date, pin_created_at, \
     last_login_at, login_attempts, locked_until, created_at, updated_at";

/// Insertable patient record; security fields are pre-hashed by the caller.
pub struct NewPatient {
    pub name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: String,
    pub pin_hash: String,
    pub password_hash: String,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub blood_type: Option<String>,
    pub asthma_severity: AsthmaSeverity,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub medical_notes: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,
    pub attending_doctor: Option<String>,
    pub attending_doctor_phone: Option<String>,
    pub asthma_specialist: Option<String>,
    pub asthma_specialist_phone: Option<String>,
    pub emergency_hospital: Option<String>,
    pub follow_up_hospital: Option<String>,
    pub insurance_number: Option<String>,
}

/// Optional listing filters.
#[derive(Default)]
pub struct PatientFilter {
    pub severity: Option<AsthmaSeverity>,
    pub search: Option<String>,
}

#[instrument(skip(pool, patient), fields(phone = %patient.phone))]
pub async fn insert(pool: &SqlitePool, patient: NewPatient) -> Result<Patient, sqlx::Error> {
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO patients (
            name, last_name, email, phone, pin_hash, password_hash, gender, birth_date,
            height, weight, blood_type, asthma_severity, allergies, medical_history,
            current_medications, medical_notes, emergency_contact_name,
            emergency_contact_phone, emergency_contact_relationship, attending_doctor,
            attending_doctor_phone, asthma_specialist, asthma_specialist_phone,
            emergency_hospital, follow_up_hospital, insurance_number, phone_verified,
            is_active_patient, registration_date, pin_created_at, login_attempts,
            locked_until, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                  0, 1, ?, ?, 0, NULL, ?, ?)",
    )
    .bind(&patient.name)
    .bind(&patient.last_name)
    .bind(&patient.email)
    .bind(&patient.phone)
    .bind(&patient.pin_hash)
    .bind(&patient.password_hash)
    .bind(patient.gender)
    .bind(patient.birth_date)
    .bind(patient.height)
    .bind(patient.weight)
    .bind(&patient.blood_type)
    .bind(patient.asthma_severity)
    .bind(&patient.allergies)
    .bind(&patient.medical_history)
    .bind(&patient.current_medications)
    .bind(&patient.medical_notes)
    .bind(&patient.emergency_contact_name)
    .bind(&patient.emergency_contact_phone)
    .bind(&patient.emergency_contact_relationship)
    .bind(&patient.attending_doctor)
    .bind(&patient.attending_doctor_phone)
    .bind(&patient.asthma_specialist)
    .bind(&patient.asthma_specialist_phone)
    .bind(&patient.emergency_hospital)
    .bind(&patient.follow_up_hospital)
    .bind(&patient.insurance_number)
    .bind(now)
    .bind(now)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    find(pool, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

#[instrument(skip(pool))]
pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Patient>, sqlx::Error> {
    sqlx::query_as::<_, Patient>(&format!("SELECT {} FROM patients WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[instrument(skip(pool))]
pub async fn find_by_phone(pool: &SqlitePool, phone: &str) -> Result<Option<Patient>, sqlx::Error> {
    sqlx::query_as::<_, Patient>(&format!("SELECT {} FROM patients WHERE phone = ?", COLUMNS))
        .bind(phone)
        .fetch_optional(pool)
        .await
}

/// Phone uniqueness check; `exclude_id` skips the patient being updated.
pub async fn phone_exists(
    pool: &SqlitePool,
    phone: &str,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM patients WHERE phone = ? AND id != COALESCE(?, -1))",
    )
    .bind(phone)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Email uniqueness check; `exclude_id` skips the patient being updated.
pub async fn email_exists(
    pool: &SqlitePool,
    email: &str,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM patients WHERE email = ? AND id != COALESCE(?, -1))",
    )
    .bind(email)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

pub async fn exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM patients WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Active patients only; soft-deactivated records are excluded.
#[instrument(skip(pool, filter))]
pub async fn list_active(
    pool: &SqlitePool,
    filter: PatientFilter,
) -> Result<Vec<Patient>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM patients WHERE is_active_patient = 1",
        COLUMNS
    ));
    if let Some(severity) = filter.severity {
        qb.push(" AND asthma_severity = ").push_bind(severity);
    }
    if let Some(search) = filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (name LIKE ").push_bind(pattern.clone());
        qb.push(" OR last_name LIKE ").push_bind(pattern.clone());
        qb.push(" OR phone LIKE ").push_bind(pattern.clone());
        qb.push(" OR email LIKE ").push_bind(pattern);
        qb.push(")");
    }
    qb.push(" ORDER BY name, last_name");
    qb.build_query_as::<Patient>().fetch_all(pool).await
}

/// Full-row update after the caller merged patch fields into the struct.
#[instrument(skip(pool, patient), fields(id = patient.id))]
pub async fn update(pool: &SqlitePool, patient: &Patient) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE patients SET
            name = ?, last_name = ?, email = ?, phone = ?, gender = ?, birth_date = ?,
            height = ?, weight = ?, blood_type = ?, asthma_severity = ?, allergies = ?,
            medical_history = ?, current_medications = ?, medical_notes = ?,
            emergency_contact_name = ?, emergency_contact_phone = ?,
            emergency_contact_relationship = ?, attending_doctor = ?,
            attending_doctor_phone = ?, asthma_specialist = ?, asthma_specialist_phone = ?,
            emergency_hospital = ?, follow_up_hospital = ?, insurance_number = ?,
            updated_at = ?
        WHERE id = ?",
    )
    .bind(&patient.name)
    .bind(&patient.last_name)
    .bind(&patient.email)
    .bind(&patient.phone)
    .bind(patient.gender)
    .bind(patient.birth_date)
    .bind(patient.height)
    .bind(patient.weight)
    .bind(&patient.blood_type)
    .bind(patient.asthma_severity)
    .bind(&patient.allergies)
    .bind(&patient.medical_history)
    .bind(&patient.current_medications)
    .bind(&patient.medical_notes)
    .bind(&patient.emergency_contact_name)
    .bind(&patient.emergency_contact_phone)
    .bind(&patient.emergency_contact_relationship)
    .bind(&patient.attending_doctor)
    .bind(&patient.attending_doctor_phone)
    .bind(&patient.asthma_specialist)
    .bind(&patient.asthma_specialist_phone)
    .bind(&patient.emergency_hospital)
    .bind(&patient.follow_up_hospital)
    .bind(&patient.insurance_number)
    .bind(Utc::now())
    .bind(patient.id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Soft delete: the record stays readable by id but drops out of active
/// listings.
#[instrument(skip(pool))]
pub async fn deactivate(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE patients SET is_active_patient = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Atomic failure counter increment; returns the new attempt count. The
/// in-database increment avoids lost updates between concurrent failed
/// logins.
#[instrument(skip(pool))]
pub async fn record_failed_login(pool: &SqlitePool, id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query("UPDATE patients SET login_attempts = login_attempts + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    let (attempts,): (i64,) = sqlx::query_as("SELECT login_attempts FROM patients WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(attempts)
}

/// The counter is deliberately left untouched; only a successful login or
/// an explicit unlock resets it.
#[instrument(skip(pool))]
pub async fn lock_account(
    pool: &SqlitePool,
    id: i64,
    until: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE patients SET locked_until = ? WHERE id = ?")
        .bind(until)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[instrument(skip(pool))]
pub async fn record_successful_login(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE patients SET login_attempts = 0, locked_until = NULL, last_login_at = ? \
         WHERE id = ?",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

#[instrument(skip(pool, pin_hash))]
pub async fn set_pin(pool: &SqlitePool, id: i64, pin_hash: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE patients SET pin_hash = ?, pin_created_at = ?, updated_at = ? WHERE id = ?")
        .bind(pin_hash)
        .bind(Utc::now())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
