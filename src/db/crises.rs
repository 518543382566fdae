//! Crisis queries.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

use crate::models::hospitalization::StayStatus;
use crate::models::patient::AsthmaSeverity;
use crate::models::Crisis;

pub struct NewCrisis {
    pub patient_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub intensity: AsthmaSeverity,
    pub symptoms: String,
    pub triggers: Option<String>,
    pub treatments_used: Option<String>,
    pub notes: Option<String>,
    pub status: StayStatus,
}

#[derive(Default)]
pub struct CrisisFilter {
    pub patient_id: Option<i64>,
    pub status: Option<StayStatus>,
}

#[instrument(skip(pool, crisis), fields(patient_id = crisis.patient_id))]
pub async fn insert(pool: &SqlitePool, crisis: NewCrisis) -> Result<Crisis, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO crises (
            patient_id, started_at, ended_at, intensity, symptoms, triggers,
            treatments_used, notes, status, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(crisis.patient_id)
    .bind(crisis.started_at)
    .bind(crisis.ended_at)
    .bind(crisis.intensity)
    .bind(&crisis.symptoms)
    .bind(&crisis.triggers)
    .bind(&crisis.treatments_used)
    .bind(&crisis.notes)
    .bind(crisis.status)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find(pool, result.last_insert_rowid())
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

#[instrument(skip(pool))]
pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Crisis>, sqlx::Error> {
    sqlx::query_as::<_, Crisis>("SELECT * FROM crises WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM crises WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

#[instrument(skip(pool, filter))]
pub async fn list(pool: &SqlitePool, filter: CrisisFilter) -> Result<Vec<Crisis>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM crises WHERE 1=1");
    if let Some(patient_id) = filter.patient_id {
        qb.push(" AND patient_id = ").push_bind(patient_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    qb.push(" ORDER BY started_at DESC");
    qb.build_query_as::<Crisis>().fetch_all(pool).await
}

#[instrument(skip(pool, crisis), fields(id = crisis.id))]
pub async fn update(pool: &SqlitePool, crisis: &Crisis) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE crises SET
            patient_id = ?, started_at = ?, ended_at = ?, intensity = ?, symptoms = ?,
            triggers = ?, treatments_used = ?, notes = ?, status = ?, updated_at = ?
        WHERE id = ?",
    )
    .bind(crisis.patient_id)
    .bind(crisis.started_at)
    .bind(crisis.ended_at)
    .bind(crisis.intensity)
    .bind(&crisis.symptoms)
    .bind(&crisis.triggers)
    .bind(&crisis.treatments_used)
    .bind(&crisis.notes)
    .bind(crisis.status)
    .bind(Utc::now())
    .bind(crisis.id)
    .execute(pool)
    .await?;
    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM crises WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
