//! Exam queries.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

use crate::models::exam::{Exam, ExamStatus};

pub struct NewExam {
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
}

#[derive(Default)]
pub struct ExamFilter {
    pub patient_id: Option<i64>,
    pub hospitalization_id: Option<i64>,
    pub exam_type_id: Option<i64>,
    pub status: Option<ExamStatus>,
    pub urgent: Option<bool>,
}

#[instrument(skip(pool, exam), fields(patient_id = exam.patient_id))]
pub async fn insert(pool: &SqlitePool, exam: NewExam) -> Result<Exam, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO exams (
            patient_id, hospitalization_id, exam_type_id, exam_date, result_date, status,
            urgent, results, interpretation, prescribing_doctor, performing_technician,
            observations, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(exam.patient_id)
    .bind(exam.hospitalization_id)
    .bind(exam.exam_type_id)
    .bind(exam.exam_date)
    .bind(exam.result_date)
    .bind(exam.status)
    .bind(exam.urgent)
    .bind(&exam.results)
    .bind(&exam.interpretation)
    .bind(&exam.prescribing_doctor)
    .bind(&exam.performing_technician)
    .bind(&exam.observations)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find(pool, result.last_insert_rowid())
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

#[instrument(skip(pool))]
pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>("SELECT * FROM exams WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[instrument(skip(pool, filter))]
pub async fn list(pool: &SqlitePool, filter: ExamFilter) -> Result<Vec<Exam>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM exams WHERE 1=1");
    if let Some(patient_id) = filter.patient_id {
        qb.push(" AND patient_id = ").push_bind(patient_id);
    }
    if let Some(hospitalization_id) = filter.hospitalization_id {
        qb.push(" AND hospitalization_id = ").push_bind(hospitalization_id);
    }
    if let Some(exam_type_id) = filter.exam_type_id {
        qb.push(" AND exam_type_id = ").push_bind(exam_type_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(urgent) = filter.urgent {
        qb.push(" AND urgent = ").push_bind(urgent);
    }
    qb.push(" ORDER BY exam_date DESC");
    qb.build_query_as::<Exam>().fetch_all(pool).await
}

#[instrument(skip(pool, exam), fields(id = exam.id))]
pub async fn update(pool: &SqlitePool, exam: &Exam) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exams SET
            patient_id = ?, hospitalization_id = ?, exam_type_id = ?, exam_date = ?,
            result_date = ?, status = ?, urgent = ?, results = ?, interpretation = ?,
            prescribing_doctor = ?, performing_technician = ?, observations = ?,
            updated_at = ?
        WHERE id = ?",
    )
    .bind(exam.patient_id)
    .bind(exam.hospitalization_id)
    .bind(exam.exam_type_id)
    .bind(exam.exam_date)
    .bind(exam.result_date)
    .bind(exam.status)
    .bind(exam.urgent)
    .bind(&exam.results)
    .bind(&exam.interpretation)
    .bind(&exam.prescribing_doctor)
    .bind(&exam.performing_technician)
    .bind(&exam.observations)
    .bind(Utc::now())
    .bind(exam.id)
    .execute(pool)
    .await?;
    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM exams WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
