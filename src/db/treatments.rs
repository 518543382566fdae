//! Treatment queries.

use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

use crate::models::treatment::{Treatment, TreatmentKind};

pub struct NewTreatment {
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
}

#[derive(Default)]
pub struct TreatmentFilter {
    pub patient_id: Option<i64>,
    pub medicament_id: Option<i64>,
    pub kind: Option<TreatmentKind>,
    pub active: Option<bool>,
}

#[instrument(skip(pool, treatment), fields(patient_id = treatment.patient_id))]
pub async fn insert(pool: &SqlitePool, treatment: NewTreatment) -> Result<Treatment, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO treatments (
            patient_id, medicament_id, dosage, frequency, kind, start_date, end_date,
            active, side_effects, instructions, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(treatment.patient_id)
    .bind(treatment.medicament_id)
    .bind(&treatment.dosage)
    .bind(&treatment.frequency)
    .bind(treatment.kind)
    .bind(treatment.start_date)
    .bind(treatment.end_date)
    .bind(treatment.active)
    .bind(&treatment.side_effects)
    .bind(&treatment.instructions)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find(pool, result.last_insert_rowid())
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

#[instrument(skip(pool))]
pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Treatment>, sqlx::Error> {
    sqlx::query_as::<_, Treatment>("SELECT * FROM treatments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[instrument(skip(pool, filter))]
pub async fn list(
    pool: &SqlitePool,
    filter: TreatmentFilter,
) -> Result<Vec<Treatment>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM treatments WHERE 1=1");
    if let Some(patient_id) = filter.patient_id {
        qb.push(" AND patient_id = ").push_bind(patient_id);
    }
    if let Some(medicament_id) = filter.medicament_id {
        qb.push(" AND medicament_id = ").push_bind(medicament_id);
    }
    if let Some(kind) = filter.kind {
        qb.push(" AND kind = ").push_bind(kind);
    }
    if let Some(active) = filter.active {
        qb.push(" AND active = ").push_bind(active);
    }
    qb.push(" ORDER BY start_date DESC");
    qb.build_query_as::<Treatment>().fetch_all(pool).await
}

#[instrument(skip(pool, treatment), fields(id = treatment.id))]
pub async fn update(pool: &SqlitePool, treatment: &Treatment) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE treatments SET
            patient_id = ?, medicament_id = ?, dosage = ?, frequency = ?, kind = ?,
            start_date = ?, end_date = ?, active = ?, side_effects = ?, instructions = ?,
            updated_at = ?
        WHERE id = ?",
    )
    .bind(treatment.patient_id)
    .bind(treatment.medicament_id)
    .bind(&treatment.dosage)
    .bind(&treatment.frequency)
    .bind(treatment.kind)
    .bind(treatment.start_date)
    .bind(treatment.end_date)
    .bind(treatment.active)
    .bind(&treatment.side_effects)
    .bind(&treatment.instructions)
    .bind(Utc::now())
    .bind(treatment.id)
    .execute(pool)
    .await?;
    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM treatments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
