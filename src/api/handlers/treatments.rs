//! Ongoing treatment CRUD.

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::api::extractors::AuthPatient;
use crate::api::response;
use crate::db::treatments::{self, NewTreatment, TreatmentFilter};
use crate::db::{catalogs, patients};
use crate::error::ApiError;
use crate::models::TreatmentKind;
use crate::AppState;

fn check_day_order(start: NaiveDate, end: Option<NaiveDate>) -> Result<(), ApiError> {
    if matches!(end, Some(end) if end < start) {
        return Err(ApiError::field(
            "end_date",
            "The end date must be after the start date.",
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub patient_id: Option<i64>,
    pub medicament_id: Option<i64>,
    pub kind: Option<TreatmentKind>,
    pub active: Option<bool>,
}

/// GET /api/treatments
pub async fn index(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let list = treatments::list(
        state.db.pool(),
        TreatmentFilter {
            patient_id: query.patient_id,
            medicament_id: query.medicament_id,
            kind: query.kind,
            active: query.active,
        },
    )
    .await?;
    Ok(response::ok(list))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StoreTreatmentRequest {
    pub patient_id: i64,
    pub medicament_id: i64,
    #[validate(length(min = 1, message = "The dosage is required."))]
    pub dosage: String,
    #[validate(length(min = 1, message = "The frequency is required."))]
    pub frequency: String,
    pub kind: TreatmentKind,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: Option<bool>,
    pub side_effects: Option<String>,
    pub instructions: Option<String>,
}

/// POST /api/treatments
pub async fn store(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    body: web::Json<StoreTreatmentRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;
    check_day_order(body.start_date, body.end_date)?;

    let pool = state.db.pool();
    if !patients::exists(pool, body.patient_id).await? {
        return Err(ApiError::field(
            "patient_id",
            "The selected patient does not exist.",
        ));
    }
    if !catalogs::medicament_exists(pool, body.medicament_id).await? {
        return Err(ApiError::field(
            "medicament_id",
            "The selected medicament does not exist.",
        ));
    }

    let treatment = treatments::insert(
        pool,
        NewTreatment {
            patient_id: body.patient_id,
            medicament_id: body.medicament_id,
            dosage: body.dosage,
            frequency: body.frequency,
            kind: body.kind,
            start_date: body.start_date,
            end_date: body.end_date,
            active: body.active.unwrap_or(true),
            side_effects: body.side_effects,
            instructions: body.instructions,
        },
    )
    .await?;

    info!(treatment_id = treatment.id, patient_id = treatment.patient_id, "treatment created");
    Ok(response::created("Treatment created.", treatment))
}

/// GET /api/treatments/{id}
pub async fn show(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let treatment = treatments::find(state.db.pool(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Treatment"))?;
    Ok(response::ok(treatment))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTreatmentRequest {
    pub medicament_id: Option<i64>,
    #[validate(length(min = 1, message = "The dosage may not be empty."))]
    pub dosage: Option<String>,
    #[validate(length(min = 1, message = "The frequency may not be empty."))]
    pub frequency: Option<String>,
    pub kind: Option<TreatmentKind>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub active: Option<bool>,
    pub side_effects: Option<String>,
    pub instructions: Option<String>,
}

/// PUT /api/treatments/{id}
pub async fn update(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
    body: web::Json<UpdateTreatmentRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let mut treatment = treatments::find(pool, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Treatment"))?;

    if let Some(id) = body.medicament_id {
        if !catalogs::medicament_exists(pool, id).await? {
            return Err(ApiError::field(
                "medicament_id",
                "The selected medicament does not exist.",
            ));
        }
        treatment.medicament_id = id;
    }
    if let Some(dosage) = body.dosage {
        treatment.dosage = dosage;
    }
    if let Some(frequency) = body.frequency {
        treatment.frequency = frequency;
    }
    if let Some(kind) = body.kind {
        treatment.kind = kind;
    }
    if let Some(start_date) = body.start_date {
        treatment.start_date = start_date;
    }
    if let Some(end_date) = body.end_date {
        treatment.end_date = Some(end_date);
    }
    if let Some(active) = body.active {
        treatment.active = active;
    }
    if let Some(side_effects) = body.side_effects {
        treatment.side_effects = Some(side_effects);
    }
    if let Some(instructions) = body.instructions {
        treatment.instructions = Some(instructions);
    }
    check_day_order(treatment.start_date, treatment.end_date)?;

    treatments::update(pool, &treatment).await?;
    let treatment = treatments::find(pool, treatment.id)
        .await?
        .ok_or(ApiError::NotFound("Treatment"))?;
    Ok(response::ok_with("Treatment updated.", treatment))
}

/// DELETE /api/treatments/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let id = path.into_inner();
    treatments::find(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Treatment"))?;
    treatments::delete(pool, id).await?;
    Ok(response::message("Treatment deleted."))
}
