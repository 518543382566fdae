//! Prescription CRUD plus the suspend / reactivate / terminate status
//! transitions.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::api::extractors::AuthPatient;
use crate::api::handlers::check_date_order;
use crate::api::response;
use crate::db::prescriptions::{self, NewPrescription, PrescriptionFilter};
use crate::db::{catalogs, hospitalizations, patients};
use crate::error::ApiError;
use crate::models::PrescriptionStatus;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub patient_id: Option<i64>,
    pub hospitalization_id: Option<i64>,
    pub medicament_id: Option<i64>,
    pub status: Option<PrescriptionStatus>,
}

/// GET /api/prescriptions
pub async fn index(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let list = prescriptions::list(
        state.db.pool(),
        PrescriptionFilter {
            patient_id: query.patient_id,
            hospitalization_id: query.hospitalization_id,
            medicament_id: query.medicament_id,
            status: query.status,
        },
    )
    .await?;
    Ok(response::ok(list))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StorePrescriptionRequest {
    pub patient_id: i64,
    pub hospitalization_id: Option<i64>,
    pub medicament_id: Option<i64>,
    pub prescription_type_id: i64,
    #[validate(length(min = 1, message = "The prescribing doctor is required."))]
    pub prescribing_doctor: String,
    pub prescribed_on: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, message = "The dosage is required."))]
    pub dosage: String,
    #[validate(length(min = 1, message = "The frequency is required."))]
    pub frequency: String,
    pub instructions: Option<String>,
    pub observations: Option<String>,
    #[validate(range(min = 1, message = "The quantity must be at least 1."))]
    pub quantity: Option<i64>,
}

async fn check_references(
    pool: &sqlx::SqlitePool,
    patient_id: i64,
    hospitalization_id: Option<i64>,
    medicament_id: Option<i64>,
    prescription_type_id: i64,
) -> Result<(), ApiError> {
    if !patients::exists(pool, patient_id).await? {
        return Err(ApiError::field(
            "patient_id",
            "The selected patient does not exist.",
        ));
    }
    if let Some(id) = hospitalization_id {
        if !hospitalizations::exists(pool, id).await? {
            return Err(ApiError::field(
                "hospitalization_id",
                "The selected hospitalization does not exist.",
            ));
        }
    }
    if let Some(id) = medicament_id {
        if !catalogs::medicament_exists(pool, id).await? {
            return Err(ApiError::field(
                "medicament_id",
                "The selected medicament does not exist.",
            ));
        }
    }
    if !catalogs::prescription_type_exists(pool, prescription_type_id).await? {
        return Err(ApiError::field(
            "prescription_type_id",
            "The selected prescription type does not exist.",
        ));
    }
    Ok(())
}

/// POST /api/prescriptions
pub async fn store(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    body: web::Json<StorePrescriptionRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;
    check_date_order(body.start_date, body.end_date)?;

    let pool = state.db.pool();
    check_references(
        pool,
        body.patient_id,
        body.hospitalization_id,
        body.medicament_id,
        body.prescription_type_id,
    )
    .await?;

    let rx = prescriptions::insert(
        pool,
        NewPrescription {
            patient_id: body.patient_id,
            hospitalization_id: body.hospitalization_id,
            medicament_id: body.medicament_id,
            prescription_type_id: body.prescription_type_id,
            prescribing_doctor: body.prescribing_doctor,
            prescribed_on: body.prescribed_on.unwrap_or_else(Utc::now),
            start_date: body.start_date,
            end_date: body.end_date,
            dosage: body.dosage,
            frequency: body.frequency,
            instructions: body.instructions,
            status: PrescriptionStatus::Active,
            observations: body.observations,
            quantity: body.quantity.unwrap_or(1),
        },
    )
    .await?;

    info!(prescription_id = rx.id, patient_id = rx.patient_id, "prescription created");
    Ok(response::created("Prescription created.", rx))
}

/// GET /api/prescriptions/{id}
pub async fn show(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let rx = prescriptions::find(state.db.pool(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Prescription"))?;
    Ok(response::ok(rx))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePrescriptionRequest {
    pub medicament_id: Option<i64>,
    #[validate(length(min = 1, message = "The prescribing doctor may not be empty."))]
    pub prescribing_doctor: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, message = "The dosage may not be empty."))]
    pub dosage: Option<String>,
    #[validate(length(min = 1, message = "The frequency may not be empty."))]
    pub frequency: Option<String>,
    pub instructions: Option<String>,
    pub observations: Option<String>,
    #[validate(range(min = 1, message = "The quantity must be at least 1."))]
    pub quantity: Option<i64>,
}

/// PUT /api/prescriptions/{id}
pub async fn update(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
    body: web::Json<UpdatePrescriptionRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let mut rx = prescriptions::find(pool, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Prescription"))?;

    if let Some(id) = body.medicament_id {
        if !catalogs::medicament_exists(pool, id).await? {
            return Err(ApiError::field(
                "medicament_id",
                "The selected medicament does not exist.",
            ));
        }
        rx.medicament_id = Some(id);
    }
    if let Some(doctor) = body.prescribing_doctor {
        rx.prescribing_doctor = doctor;
    }
    if let Some(start_date) = body.start_date {
        rx.start_date = Some(start_date);
    }
    if let Some(end_date) = body.end_date {
        rx.end_date = Some(end_date);
    }
    if let Some(dosage) = body.dosage {
        rx.dosage = dosage;
    }
    if let Some(frequency) = body.frequency {
        rx.frequency = frequency;
    }
    if let Some(instructions) = body.instructions {
        rx.instructions = Some(instructions);
    }
    if let Some(observations) = body.observations {
        rx.observations = Some(observations);
    }
    if let Some(quantity) = body.quantity {
        rx.quantity = quantity;
    }
    check_date_order(rx.start_date, rx.end_date)?;

    prescriptions::update(pool, &rx).await?;
    let rx = prescriptions::find(pool, rx.id)
        .await?
        .ok_or(ApiError::NotFound("Prescription"))?;
    Ok(response::ok_with("Prescription updated.", rx))
}

/// DELETE /api/prescriptions/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let id = path.into_inner();
    prescriptions::find(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Prescription"))?;
    prescriptions::delete(pool, id).await?;
    Ok(response::message("Prescription deleted."))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SuspendRequest {
    #[validate(length(min = 1, message = "The suspension reason is required."))]
    pub reason: String,
}

/// POST /api/prescriptions/{id}/suspend
pub async fn suspend(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
    body: web::Json<SuspendRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let mut rx = prescriptions::find(pool, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Prescription"))?;

    if rx.status != PrescriptionStatus::Active {
        return Err(ApiError::BadRequest(
            "Only an active prescription can be suspended.".into(),
        ));
    }

    rx.status = PrescriptionStatus::Suspended;
    rx.suspension_reason = Some(body.reason);
    prescriptions::update(pool, &rx).await?;

    info!(prescription_id = rx.id, "prescription suspended");
    Ok(response::ok_with("Prescription suspended.", rx))
}

/// POST /api/prescriptions/{id}/reactivate
pub async fn reactivate(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let mut rx = prescriptions::find(pool, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Prescription"))?;

    if rx.status != PrescriptionStatus::Suspended {
        return Err(ApiError::BadRequest(
            "Only a suspended prescription can be reactivated.".into(),
        ));
    }

    rx.status = PrescriptionStatus::Active;
    rx.suspension_reason = None;
    prescriptions::update(pool, &rx).await?;

    info!(prescription_id = rx.id, "prescription reactivated");
    Ok(response::ok_with("Prescription reactivated.", rx))
}

#[derive(Debug, Deserialize, Validate)]
pub struct TerminateRequest {
    pub end_date: DateTime<Utc>,
}

/// POST /api/prescriptions/{id}/terminate
pub async fn terminate(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
    body: web::Json<TerminateRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let mut rx = prescriptions::find(pool, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Prescription"))?;

    if matches!(
        rx.status,
        PrescriptionStatus::Completed | PrescriptionStatus::Cancelled
    ) {
        return Err(ApiError::BadRequest(
            "The prescription is already terminated.".into(),
        ));
    }
    check_date_order(rx.start_date, Some(body.end_date))?;

    rx.status = PrescriptionStatus::Completed;
    rx.end_date = Some(body.end_date);
    prescriptions::update(pool, &rx).await?;

    info!(prescription_id = rx.id, "prescription terminated");
    Ok(response::ok_with("Prescription terminated.", rx))
}
