//! Hospitalization CRUD and discharge. Responses carry the derived
//! `length_of_stay_days` computed by the read queries.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::api::extractors::AuthPatient;
use crate::api::handlers::check_date_order;
use crate::api::response;
use crate::db::hospitalizations::{self, HospitalizationFilter, NewHospitalization};
use crate::db::{crises, patients};
use crate::error::ApiError;
use crate::models::{HospitalizationSeverity, StayStatus};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub patient_id: Option<i64>,
    pub crisis_id: Option<i64>,
    pub status: Option<StayStatus>,
    pub severity: Option<HospitalizationSeverity>,
}

/// GET /api/hospitalizations
pub async fn index(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let list = hospitalizations::list(
        state.db.pool(),
        HospitalizationFilter {
            patient_id: query.patient_id,
            crisis_id: query.crisis_id,
            status: query.status,
            severity: query.severity,
        },
    )
    .await?;
    Ok(response::ok(list))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StoreHospitalizationRequest {
    pub patient_id: i64,
    pub crisis_id: Option<i64>,
    #[validate(length(min = 1, message = "The admission reason is required."))]
    pub reason: String,
    pub department: Option<String>,
    pub attending_doctor: Option<String>,
    pub diagnosis: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub severity: HospitalizationSeverity,
    pub intensive_care: Option<bool>,
    pub room_number: Option<String>,
    pub observations: Option<String>,
}

/// POST /api/hospitalizations
pub async fn store(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    body: web::Json<StoreHospitalizationRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;
    check_date_order(Some(body.start_date), body.end_date)?;

    let pool = state.db.pool();
    if !patients::exists(pool, body.patient_id).await? {
        return Err(ApiError::field(
            "patient_id",
            "The selected patient does not exist.",
        ));
    }
    if let Some(crisis_id) = body.crisis_id {
        if !crises::exists(pool, crisis_id).await? {
            return Err(ApiError::field(
                "crisis_id",
                "The selected crisis does not exist.",
            ));
        }
    }

    let status = if body.end_date.is_some() {
        StayStatus::Completed
    } else {
        StayStatus::Ongoing
    };

    let stay = hospitalizations::insert(
        pool,
        NewHospitalization {
            patient_id: body.patient_id,
            crisis_id: body.crisis_id,
            reason: body.reason,
            department: body.department,
            attending_doctor: body.attending_doctor,
            diagnosis: body.diagnosis,
            start_date: body.start_date,
            end_date: body.end_date,
            status,
            severity: body.severity,
            intensive_care: body.intensive_care.unwrap_or(false),
            room_number: body.room_number,
            discharge_notes: None,
            observations: body.observations,
        },
    )
    .await?;

    info!(hospitalization_id = stay.id, patient_id = stay.patient_id, "admission recorded");
    Ok(response::created("Hospitalization recorded.", stay))
}

/// GET /api/hospitalizations/{id}
pub async fn show(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let stay = hospitalizations::find(state.db.pool(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Hospitalization"))?;
    Ok(response::ok(stay))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateHospitalizationRequest {
    #[validate(length(min = 1, message = "The admission reason may not be empty."))]
    pub reason: Option<String>,
    pub department: Option<String>,
    pub attending_doctor: Option<String>,
    pub diagnosis: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<StayStatus>,
    pub severity: Option<HospitalizationSeverity>,
    pub intensive_care: Option<bool>,
    pub room_number: Option<String>,
    pub discharge_notes: Option<String>,
    pub observations: Option<String>,
}

/// PUT /api/hospitalizations/{id}
pub async fn update(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
    body: web::Json<UpdateHospitalizationRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let mut stay = hospitalizations::find(pool, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Hospitalization"))?;

    if let Some(reason) = body.reason {
        stay.reason = reason;
    }
    if let Some(department) = body.department {
        stay.department = Some(department);
    }
    if let Some(doctor) = body.attending_doctor {
        stay.attending_doctor = Some(doctor);
    }
    if let Some(diagnosis) = body.diagnosis {
        stay.diagnosis = Some(diagnosis);
    }
    if let Some(start_date) = body.start_date {
        stay.start_date = start_date;
    }
    if let Some(end_date) = body.end_date {
        stay.end_date = Some(end_date);
    }
    if let Some(status) = body.status {
        stay.status = status;
    }
    if let Some(severity) = body.severity {
        stay.severity = severity;
    }
    if let Some(intensive_care) = body.intensive_care {
        stay.intensive_care = intensive_care;
    }
    if let Some(room_number) = body.room_number {
        stay.room_number = Some(room_number);
    }
    if let Some(notes) = body.discharge_notes {
        stay.discharge_notes = Some(notes);
    }
    if let Some(observations) = body.observations {
        stay.observations = Some(observations);
    }
    check_date_order(Some(stay.start_date), stay.end_date)?;

    hospitalizations::update(pool, &stay).await?;
    let stay = hospitalizations::find(pool, stay.id)
        .await?
        .ok_or(ApiError::NotFound("Hospitalization"))?;
    Ok(response::ok_with("Hospitalization updated.", stay))
}

/// DELETE /api/hospitalizations/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let id = path.into_inner();
    hospitalizations::find(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Hospitalization"))?;
    hospitalizations::delete(pool, id).await?;
    Ok(response::message("Hospitalization deleted."))
}

#[derive(Debug, Deserialize, Validate)]
pub struct TerminateStayRequest {
    pub end_date: DateTime<Utc>,
    pub discharge_notes: Option<String>,
}

/// POST /api/hospitalizations/{id}/terminate
///
/// Discharge: the stay completes with the discharge timestamp, which
/// freezes the derived length of stay.
pub async fn terminate(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
    body: web::Json<TerminateStayRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let mut stay = hospitalizations::find(pool, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Hospitalization"))?;

    if stay.status != StayStatus::Ongoing {
        return Err(ApiError::BadRequest(
            "Only an ongoing hospitalization can be terminated.".into(),
        ));
    }
    check_date_order(Some(stay.start_date), Some(body.end_date))?;

    stay.status = StayStatus::Completed;
    stay.end_date = Some(body.end_date);
    if let Some(notes) = body.discharge_notes {
        stay.discharge_notes = Some(notes);
    }
    hospitalizations::update(pool, &stay).await?;
    let stay = hospitalizations::find(pool, stay.id)
        .await?
        .ok_or(ApiError::NotFound("Hospitalization"))?;

    info!(hospitalization_id = stay.id, "patient discharged");
    Ok(response::ok_with("Hospitalization terminated.", stay))
}
