//! Medical exam CRUD and result recording.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::api::extractors::AuthPatient;
use crate::api::response;
use crate::db::exams::{self, ExamFilter, NewExam};
use crate::db::{catalogs, hospitalizations, patients};
use crate::error::ApiError;
use crate::models::ExamStatus;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub patient_id: Option<i64>,
    pub hospitalization_id: Option<i64>,
    pub exam_type_id: Option<i64>,
    pub status: Option<ExamStatus>,
    pub urgent: Option<bool>,
}

/// GET /api/exams
pub async fn index(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let list = exams::list(
        state.db.pool(),
        ExamFilter {
            patient_id: query.patient_id,
            hospitalization_id: query.hospitalization_id,
            exam_type_id: query.exam_type_id,
            status: query.status,
            urgent: query.urgent,
        },
    )
    .await?;
    Ok(response::ok(list))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StoreExamRequest {
    pub patient_id: i64,
    pub hospitalization_id: Option<i64>,
    pub exam_type_id: i64,
    pub exam_date: DateTime<Utc>,
    pub urgent: Option<bool>,
    pub prescribing_doctor: Option<String>,
    pub observations: Option<String>,
}

/// POST /api/exams
pub async fn store(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    body: web::Json<StoreExamRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    if !patients::exists(pool, body.patient_id).await? {
        return Err(ApiError::field(
            "patient_id",
            "The selected patient does not exist.",
        ));
    }
    if let Some(id) = body.hospitalization_id {
        if !hospitalizations::exists(pool, id).await? {
            return Err(ApiError::field(
                "hospitalization_id",
                "The selected hospitalization does not exist.",
            ));
        }
    }
    if !catalogs::exam_type_exists(pool, body.exam_type_id).await? {
        return Err(ApiError::field(
            "exam_type_id",
            "The selected exam type does not exist.",
        ));
    }

    let exam = exams::insert(
        pool,
        NewExam {
            patient_id: body.patient_id,
            hospitalization_id: body.hospitalization_id,
            exam_type_id: body.exam_type_id,
            exam_date: body.exam_date,
            result_date: None,
            status: ExamStatus::Scheduled,
            urgent: body.urgent.unwrap_or(false),
            results: None,
            interpretation: None,
            prescribing_doctor: body.prescribing_doctor,
            performing_technician: None,
            observations: body.observations,
        },
    )
    .await?;

    info!(exam_id = exam.id, patient_id = exam.patient_id, "exam scheduled");
    Ok(response::created("Exam scheduled.", exam))
}

/// GET /api/exams/{id}
pub async fn show(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let exam = exams::find(state.db.pool(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Exam"))?;
    Ok(response::ok(exam))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateExamRequest {
    pub exam_date: Option<DateTime<Utc>>,
    pub status: Option<ExamStatus>,
    pub urgent: Option<bool>,
    pub prescribing_doctor: Option<String>,
    pub performing_technician: Option<String>,
    pub observations: Option<String>,
}

/// PUT /api/exams/{id}
pub async fn update(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
    body: web::Json<UpdateExamRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let mut exam = exams::find(pool, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Exam"))?;

    if let Some(exam_date) = body.exam_date {
        exam.exam_date = exam_date;
    }
    if matches!(exam.result_date, Some(result_date) if result_date < exam.exam_date) {
        return Err(ApiError::field(
            "exam_date",
            "The exam date must not be after the result date.",
        ));
    }
    if let Some(status) = body.status {
        exam.status = status;
    }
    if let Some(urgent) = body.urgent {
        exam.urgent = urgent;
    }
    if let Some(doctor) = body.prescribing_doctor {
        exam.prescribing_doctor = Some(doctor);
    }
    if let Some(technician) = body.performing_technician {
        exam.performing_technician = Some(technician);
    }
    if let Some(observations) = body.observations {
        exam.observations = Some(observations);
    }

    exams::update(pool, &exam).await?;
    let exam = exams::find(pool, exam.id)
        .await?
        .ok_or(ApiError::NotFound("Exam"))?;
    Ok(response::ok_with("Exam updated.", exam))
}

/// DELETE /api/exams/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let id = path.into_inner();
    exams::find(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Exam"))?;
    exams::delete(pool, id).await?;
    Ok(response::message("Exam deleted."))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordResultsRequest {
    #[validate(length(min = 1, message = "The results text is required."))]
    pub results: String,
    pub interpretation: Option<String>,
    pub performing_technician: Option<String>,
    pub result_date: DateTime<Utc>,
}

/// POST /api/exams/{id}/results
///
/// Recording results completes the exam.
pub async fn record_results(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
    body: web::Json<RecordResultsRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let mut exam = exams::find(pool, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Exam"))?;

    if exam.status == ExamStatus::Cancelled {
        return Err(ApiError::BadRequest(
            "Results cannot be recorded for a cancelled exam.".into(),
        ));
    }
    if body.result_date < exam.exam_date {
        return Err(ApiError::field(
            "result_date",
            "The result date must not precede the exam date.",
        ));
    }

    exam.results = Some(body.results);
    exam.interpretation = body.interpretation.or(exam.interpretation);
    exam.performing_technician = body.performing_technician.or(exam.performing_technician);
    exam.result_date = Some(body.result_date);
    exam.status = ExamStatus::Completed;

    exams::update(pool, &exam).await?;
    let exam = exams::find(pool, exam.id)
        .await?
        .ok_or(ApiError::NotFound("Exam"))?;

    info!(exam_id = exam.id, "exam results recorded");
    Ok(response::ok_with("Exam results recorded.", exam))
}
