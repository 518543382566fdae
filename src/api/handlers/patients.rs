//! Patient record CRUD. Listing and detail views recompute the derived
//! attributes (age, BMI, BMI category) on every read.

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use validator::Validate;

use crate::api::extractors::AuthPatient;
use crate::api::handlers::auth::RegisterRequest;
use crate::api::response;
use crate::db::patients::{self, PatientFilter};
use crate::error::ApiError;
use crate::models::patient::{AsthmaSeverity, Gender};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub severity: Option<AsthmaSeverity>,
    pub search: Option<String>,
}

/// GET /api/patients
pub async fn index(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let list = patients::list_active(
        state.db.pool(),
        PatientFilter {
            severity: query.severity,
            search: query.search.filter(|s| !s.trim().is_empty()),
        },
    )
    .await?;
    let data: Vec<Value> = list.iter().map(|p| p.summary()).collect();
    Ok(response::ok(data))
}

/// POST /api/patients
///
/// Same payload as registration, but no session token is issued for the
/// created record.
pub async fn store(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    if patients::phone_exists(pool, &body.phone, None).await? {
        return Err(ApiError::field(
            "phone",
            "The phone number is already registered.",
        ));
    }
    if let Some(email) = &body.email {
        if patients::email_exists(pool, email, None).await? {
            return Err(ApiError::field(
                "email",
                "The email address is already registered.",
            ));
        }
    }

    let patient = patients::insert(pool, body.into_new_patient()?).await?;
    info!(patient_id = patient.id, "patient record created");
    Ok(response::created("Patient created.", patient.profile()))
}

/// GET /api/patients/{id}
pub async fn show(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let patient = patients::find(state.db.pool(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Patient"))?;
    Ok(response::ok(patient.profile()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePatientRequest {
    #[validate(length(min = 1, max = 100, message = "The name may not be empty."))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(email(message = "The email address is invalid."))]
    pub email: Option<String>,
    #[validate(regex(
        path = "super::auth::PHONE_RE",
        message = "The phone number may only contain digits, spaces and + - ( )."
    ))]
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    #[validate(range(min = 50.0, max = 300.0, message = "The height must be between 50 and 300 cm."))]
    pub height: Option<f64>,
    #[validate(range(min = 10.0, max = 500.0, message = "The weight must be between 10 and 500 kg."))]
    pub weight: Option<f64>,
    pub blood_type: Option<String>,
    pub asthma_severity: Option<AsthmaSeverity>,
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

/// PUT /api/patients/{id}
///
/// Partial update: absent fields keep their stored values.
pub async fn update(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
    body: web::Json<UpdatePatientRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let id = path.into_inner();
    let mut patient = patients::find(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Patient"))?;

    if let Some(phone) = &body.phone {
        if patients::phone_exists(pool, phone, Some(id)).await? {
            return Err(ApiError::field(
                "phone",
                "The phone number is already registered.",
            ));
        }
    }
    if let Some(email) = &body.email {
        if patients::email_exists(pool, email, Some(id)).await? {
            return Err(ApiError::field(
                "email",
                "The email address is already registered.",
            ));
        }
    }

    if let Some(name) = body.name {
        patient.name = name;
    }
    if let Some(last_name) = body.last_name {
        patient.last_name = Some(last_name);
    }
    if let Some(email) = body.email {
        patient.email = Some(email);
    }
    if let Some(phone) = body.phone {
        patient.phone = phone;
    }
    if let Some(gender) = body.gender {
        patient.gender = Some(gender);
    }
    if let Some(birth_date) = body.birth_date {
        patient.birth_date = Some(birth_date);
    }
    if let Some(height) = body.height {
        patient.height = Some(height);
    }
    if let Some(weight) = body.weight {
        patient.weight = Some(weight);
    }
    if let Some(blood_type) = body.blood_type {
        patient.blood_type = Some(blood_type);
    }
    if let Some(severity) = body.asthma_severity {
        patient.asthma_severity = severity;
    }
    if let Some(allergies) = body.allergies {
        patient.allergies = Some(allergies);
    }
    if let Some(history) = body.medical_history {
        patient.medical_history = Some(history);
    }
    if let Some(medications) = body.current_medications {
        patient.current_medications = Some(medications);
    }
    if let Some(notes) = body.medical_notes {
        patient.medical_notes = Some(notes);
    }
    if let Some(name) = body.emergency_contact_name {
        patient.emergency_contact_name = Some(name);
    }
    if let Some(phone) = body.emergency_contact_phone {
        patient.emergency_contact_phone = Some(phone);
    }
    if let Some(rel) = body.emergency_contact_relationship {
        patient.emergency_contact_relationship = Some(rel);
    }
    if let Some(doctor) = body.attending_doctor {
        patient.attending_doctor = Some(doctor);
    }
    if let Some(phone) = body.attending_doctor_phone {
        patient.attending_doctor_phone = Some(phone);
    }
    if let Some(specialist) = body.asthma_specialist {
        patient.asthma_specialist = Some(specialist);
    }
    if let Some(phone) = body.asthma_specialist_phone {
        patient.asthma_specialist_phone = Some(phone);
    }
    if let Some(hospital) = body.emergency_hospital {
        patient.emergency_hospital = Some(hospital);
    }
    if let Some(hospital) = body.follow_up_hospital {
        patient.follow_up_hospital = Some(hospital);
    }
    if let Some(number) = body.insurance_number {
        patient.insurance_number = Some(number);
    }

    patients::update(pool, &patient).await?;
    let patient = patients::find(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Patient"))?;
    Ok(response::ok_with("Patient updated.", patient.profile()))
}

/// DELETE /api/patients/{id}
///
/// Soft delete: the record is deactivated, not removed, so historical
/// clinical records keep a valid patient reference.
pub async fn destroy(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let id = path.into_inner();
    patients::find(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Patient"))?;
    patients::deactivate(pool, id).await?;
    info!(patient_id = id, "patient deactivated");
    Ok(response::message("Patient deactivated."))
}
