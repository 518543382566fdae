//! API error taxonomy.
//!
//! Every failure surfaces as the same JSON envelope the success path uses:
//! `{"success": false, "message": ..., "errors": {...}}`. Validation errors
//! carry a field -> messages map; everything else is a plain message.

use std::collections::HashMap;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Field name -> list of violation messages.
pub type FieldErrors = HashMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// 422 with per-field messages.
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// 401. The message never reveals which credential was wrong.
    #[error("Incorrect phone number or PIN")]
    InvalidCredentials { attempts_remaining: Option<i64> },

    /// 423 with the lock expiry.
    #[error("Account temporarily locked. Try again later.")]
    AccountLocked { locked_until: Option<DateTime<Utc>> },

    /// 404 for a missing entity; the argument names the resource.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// 422; the entity is referenced by existing records.
    #[error("{0}")]
    ConflictInUse(String),

    /// 400, e.g. a required query parameter is missing.
    #[error("{0}")]
    BadRequest(String),

    /// 401 for a missing or unknown bearer token.
    #[error("Authentication required")]
    Unauthenticated,

    #[error("A database error occurred")]
    Database(#[from] sqlx::Error),

    #[error("Credential hashing failed")]
    Hashing,
}

impl ApiError {
    /// Single-field validation failure.
    pub fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        ApiError::Validation(errors)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut map = FieldErrors::new();
        for (field, violations) in errors.field_errors() {
            let messages = violations
                .iter()
                .map(|v| {
                    v.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("The {} field is invalid.", field))
                })
                .collect();
            map.insert(field.to_string(), messages);
        }
        ApiError::Validation(map)
    }
}

impl From<argon2::password_hash::Error> for ApiError {
    fn from(_: argon2::password_hash::Error) -> Self {
        ApiError::Hashing
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::ConflictInUse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidCredentials { .. } | ApiError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::AccountLocked { .. } => StatusCode::LOCKED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Hashing => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Database(err) = self {
            tracing::error!(error = %err, "database error");
        }

        let mut body = json!({
            "success": false,
            "message": self.to_string(),
        });

        match self {
            ApiError::Validation(errors) => {
                body["errors"] = json!(errors);
            }
            ApiError::InvalidCredentials {
                attempts_remaining: Some(remaining),
            } => {
                body["attempts_remaining"] = json!(remaining);
            }
            ApiError::AccountLocked {
                locked_until: Some(until),
            } => {
                body["locked_until"] = json!(until);
            }
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_422_with_field_errors() {
        let err = ApiError::field("pin", "The PIN must contain exactly 4 digits.");
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        match err {
            ApiError::Validation(map) => {
                assert_eq!(map["pin"], vec!["The PIN must contain exactly 4 digits."]);
            }
            _ => panic!("expected validation error"),
        }
    }

    #[test]
    fn credential_errors_hide_the_failing_field() {
        let err = ApiError::InvalidCredentials {
            attempts_remaining: Some(3),
        };
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Incorrect phone number or PIN");
    }

    #[test]
    fn locked_maps_to_423() {
        let err = ApiError::AccountLocked {
            locked_until: Some(Utc::now()),
        };
        assert_eq!(err.status_code(), StatusCode::LOCKED);
    }
}
