//! Asthma crisis CRUD.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::api::extractors::AuthPatient;
use crate::api::handlers::check_date_order;
use crate::api::response;
use crate::db::crises::{self, CrisisFilter, NewCrisis};
use crate::db::patients;
use crate::error::ApiError;
use crate::models::patient::AsthmaSeverity;
use crate::models::StayStatus;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub patient_id: Option<i64>,
    pub status: Option<StayStatus>,
}

/// GET /api/crises
pub async fn index(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let list = crises::list(
        state.db.pool(),
        CrisisFilter {
            patient_id: query.patient_id,
            status: query.status,
        },
    )
    .await?;
    Ok(response::ok(list))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StoreCrisisRequest {
    pub patient_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub intensity: AsthmaSeverity,
    #[validate(length(min = 1, message = "The symptoms description is required."))]
    pub symptoms: String,
    pub triggers: Option<String>,
    pub treatments_used: Option<String>,
    pub notes: Option<String>,
    pub status: Option<StayStatus>,
}

/// POST /api/crises
pub async fn store(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    body: web::Json<StoreCrisisRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;
    check_date_order(Some(body.started_at), body.ended_at)?;

    let pool = state.db.pool();
    if !patients::exists(pool, body.patient_id).await? {
        return Err(ApiError::field(
            "patient_id",
            "The selected patient does not exist.",
        ));
    }

    // An end timestamp implies the crisis is over.
    let status = body.status.unwrap_or(if body.ended_at.is_some() {
        StayStatus::Completed
    } else {
        StayStatus::Ongoing
    });

    let crisis = crises::insert(
        pool,
        NewCrisis {
            patient_id: body.patient_id,
            started_at: body.started_at,
            ended_at: body.ended_at,
            intensity: body.intensity,
            symptoms: body.symptoms,
            triggers: body.triggers,
            treatments_used: body.treatments_used,
            notes: body.notes,
            status,
        },
    )
    .await?;

    info!(crisis_id = crisis.id, patient_id = crisis.patient_id, "crisis recorded");
    Ok(response::created("Crisis recorded.", crisis))
}

/// GET /api/crises/{id}
pub async fn show(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let crisis = crises::find(state.db.pool(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Crisis"))?;
    Ok(response::ok(crisis))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCrisisRequest {
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub intensity: Option<AsthmaSeverity>,
    #[validate(length(min = 1, message = "The symptoms description may not be empty."))]
    pub symptoms: Option<String>,
    pub triggers: Option<String>,
    pub treatments_used: Option<String>,
    pub notes: Option<String>,
    pub status: Option<StayStatus>,
}

/// PUT /api/crises/{id}
pub async fn update(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
    body: web::Json<UpdateCrisisRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let mut crisis = crises::find(pool, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Crisis"))?;

    if let Some(started_at) = body.started_at {
        crisis.started_at = started_at;
    }
    if let Some(ended_at) = body.ended_at {
        crisis.ended_at = Some(ended_at);
    }
    if let Some(intensity) = body.intensity {
        crisis.intensity = intensity;
    }
    if let Some(symptoms) = body.symptoms {
        crisis.symptoms = symptoms;
    }
    if let Some(triggers) = body.triggers {
        crisis.triggers = Some(triggers);
    }
    if let Some(treatments_used) = body.treatments_used {
        crisis.treatments_used = Some(treatments_used);
    }
    if let Some(notes) = body.notes {
        crisis.notes = Some(notes);
    }
    if let Some(status) = body.status {
        crisis.status = status;
    }
    check_date_order(Some(crisis.started_at), crisis.ended_at)?;

    crises::update(pool, &crisis).await?;
    let crisis = crises::find(pool, crisis.id)
        .await?
        .ok_or(ApiError::NotFound("Crisis"))?;
    Ok(response::ok_with("Crisis updated.", crisis))
}

/// DELETE /api/crises/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let id = path.into_inner();
    crises::find(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Crisis"))?;
    crises::delete(pool, id).await?;
    Ok(response::message("Crisis deleted."))
}
