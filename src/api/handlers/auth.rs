//! Phone + PIN authentication: registration, login with the lockout state
//! machine, PIN change/reset, profile and logout.

use actix_web::{web, HttpResponse};
use chrono::{Duration, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use validator::Validate;

use crate::api::extractors::AuthPatient;
use crate::api::response;
use crate::db::patients::{self, NewPatient};
use crate::db::tokens;
use crate::error::ApiError;
use crate::models::patient::{AsthmaSeverity, Gender, LOCK_MINUTES, MAX_LOGIN_ATTEMPTS};
use crate::{security, AppState};

pub(crate) static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9+\-\s()]+$").unwrap());
pub(crate) static PIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}$").unwrap());

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "The name is required."))]
    pub name: String,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(email(message = "The email address is invalid."))]
    pub email: Option<String>,
    #[validate(
        regex(
            path = "PHONE_RE",
            message = "The phone number may only contain digits, spaces and + - ( )."
        ),
        length(min = 7, max = 20, message = "The phone number is invalid.")
    )]
    pub phone: String,
    #[validate(regex(path = "PIN_RE", message = "The PIN must contain exactly 4 digits."))]
    pub pin: String,
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

impl RegisterRequest {
    pub(crate) fn into_new_patient(self) -> Result<NewPatient, ApiError> {
        Ok(NewPatient {
            pin_hash: security::hash_pin(&self.pin)?,
            // The legacy password column stays filled with an unguessable
            // secret; only the PIN authenticates.
            password_hash: security::hash_pin(&security::random_secret())?,
            name: self.name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            gender: self.gender,
            birth_date: self.birth_date,
            height: self.height,
            weight: self.weight,
            blood_type: self.blood_type,
            asthma_severity: self.asthma_severity.unwrap_or(AsthmaSeverity::Moderate),
            allergies: self.allergies,
            medical_history: self.medical_history,
            current_medications: self.current_medications,
            medical_notes: self.medical_notes,
            emergency_contact_name: self.emergency_contact_name,
            emergency_contact_phone: self.emergency_contact_phone,
            emergency_contact_relationship: self.emergency_contact_relationship,
            attending_doctor: self.attending_doctor,
            attending_doctor_phone: self.attending_doctor_phone,
            asthma_specialist: self.asthma_specialist,
            asthma_specialist_phone: self.asthma_specialist_phone,
            emergency_hospital: self.emergency_hospital,
            follow_up_hospital: self.follow_up_hospital,
            insurance_number: self.insurance_number,
        })
    }
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
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
    let token = security::generate_token();
    tokens::issue(pool, patient.id, &token).await?;

    info!(patient_id = patient.id, "patient registered");
    Ok(response::created(
        "Registration successful.",
        json!({
            "patient": patient.summary(),
            "token": token,
            "token_type": "Bearer",
        }),
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "The phone number is required."))]
    pub phone: String,
    #[validate(regex(path = "PIN_RE", message = "The PIN must contain exactly 4 digits."))]
    pub pin: String,
}

/// POST /api/auth/login
///
/// Wrong PIN on a locked account never decrements anything; the lock is
/// checked before the PIN, so the correct PIN during a lock window still
/// gets a 423.
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let patient = patients::find_by_phone(pool, &body.phone)
        .await?
        .ok_or(ApiError::InvalidCredentials {
            attempts_remaining: None,
        })?;

    if patient.is_locked() {
        return Err(ApiError::AccountLocked {
            locked_until: patient.locked_until,
        });
    }

    if !security::verify_pin(&body.pin, &patient.pin_hash) {
        let attempts = patients::record_failed_login(pool, patient.id).await?;
        if attempts >= MAX_LOGIN_ATTEMPTS {
            let until = Utc::now() + Duration::minutes(LOCK_MINUTES);
            patients::lock_account(pool, patient.id, until).await?;
            warn!(patient_id = patient.id, "account locked after repeated failures");
            return Err(ApiError::AccountLocked {
                locked_until: Some(until),
            });
        }
        return Err(ApiError::InvalidCredentials {
            attempts_remaining: Some(MAX_LOGIN_ATTEMPTS - attempts),
        });
    }

    patients::record_successful_login(pool, patient.id).await?;
    let patient = patients::find(pool, patient.id)
        .await?
        .ok_or(ApiError::NotFound("Patient"))?;

    let token = security::generate_token();
    tokens::issue(pool, patient.id, &token).await?;

    info!(patient_id = patient.id, "login successful");
    Ok(response::ok_with(
        "Login successful.",
        json!({
            "patient": patient.summary(),
            "token": token,
            "token_type": "Bearer",
        }),
    ))
}

/// GET /api/auth/profile
pub async fn profile(auth: AuthPatient) -> Result<HttpResponse, ApiError> {
    Ok(response::ok(auth.patient.profile()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePinRequest {
    #[validate(regex(path = "PIN_RE", message = "The PIN must contain exactly 4 digits."))]
    pub current_pin: String,
    #[validate(regex(path = "PIN_RE", message = "The PIN must contain exactly 4 digits."))]
    pub new_pin: String,
}

/// POST /api/auth/change-pin
pub async fn change_pin(
    state: web::Data<AppState>,
    auth: AuthPatient,
    body: web::Json<ChangePinRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    if !security::verify_pin(&body.current_pin, &auth.patient.pin_hash) {
        return Err(ApiError::InvalidCredentials {
            attempts_remaining: None,
        });
    }
    if body.new_pin == body.current_pin {
        return Err(ApiError::field(
            "new_pin",
            "The new PIN must differ from the current one.",
        ));
    }

    let hash = security::hash_pin(&body.new_pin)?;
    patients::set_pin(state.db.pool(), auth.patient.id, &hash).await?;

    info!(patient_id = auth.patient.id, "PIN changed");
    Ok(response::message("PIN changed successfully."))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPinRequest {
    #[validate(length(min = 1, message = "The phone number is required."))]
    pub phone: String,
}

/// POST /api/auth/reset-pin
///
/// The temporary PIN travels only over the notification channel; it never
/// appears in the HTTP response.
pub async fn request_pin_reset(
    state: web::Data<AppState>,
    body: web::Json<ResetPinRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let patient = patients::find_by_phone(pool, &body.phone)
        .await?
        .ok_or(ApiError::NotFound("Patient"))?;

    let temp_pin = security::generate_temp_pin();
    let hash = security::hash_pin(&temp_pin)?;
    // Persist before notifying so a delivery failure never strands the
    // patient with a PIN that was announced but not stored.
    patients::set_pin(pool, patient.id, &hash).await?;
    state.notifier.send(
        &patient.phone,
        &format!(
            "Your temporary AsthmaCare PIN is {}. Change it after your next login.",
            temp_pin
        ),
    );

    info!(patient_id = patient.id, "temporary PIN issued");
    Ok(response::message(
        "A temporary PIN has been sent to your phone number.",
    ))
}

/// POST /api/auth/logout
pub async fn logout(
    state: web::Data<AppState>,
    auth: AuthPatient,
) -> Result<HttpResponse, ApiError> {
    tokens::revoke(state.db.pool(), &auth.token).await?;
    Ok(response::message("Logged out."))
}
