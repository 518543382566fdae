//! Request-context extraction.
//!
//! Handlers that require authentication take an [`AuthPatient`] argument;
//! the extractor resolves the bearer token against the token store and
//! hands the handler the authenticated patient explicitly, instead of a
//! global middleware guard.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::db;
use crate::error::ApiError;
use crate::models::Patient;
use crate::AppState;

/// The authenticated principal plus the token it presented (logout revokes
/// exactly that token).
pub struct AuthPatient {
    pub patient: Patient,
    pub token: String,
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

impl FromRequest for AuthPatient {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let state = state.ok_or(ApiError::Unauthenticated)?;
            let token = token.ok_or(ApiError::Unauthenticated)?;
            let patient = db::tokens::authenticate(state.db.pool(), &token)
                .await?
                .ok_or(ApiError::Unauthenticated)?;
            Ok(AuthPatient { patient, token })
        })
    }
}
