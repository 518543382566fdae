//! Prescription type catalog. Codes are unique; a type referenced by
//! prescriptions cannot be deleted.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::api::extractors::AuthPatient;
use crate::api::response;
use crate::db::catalogs::{self, NewPrescriptionType};
use crate::error::ApiError;
use crate::models::PrescriptionTypeKind;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub kind: Option<PrescriptionTypeKind>,
}

/// GET /api/prescription-types
pub async fn index(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let list =
        catalogs::list_prescription_types(state.db.pool(), query.category, query.kind).await?;
    Ok(response::ok(list))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StorePrescriptionTypeRequest {
    #[validate(length(min = 1, max = 20, message = "The code is required."))]
    pub code: String,
    #[validate(length(min = 1, max = 150, message = "The name is required."))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100, message = "The category is required."))]
    pub category: String,
    pub kind: PrescriptionTypeKind,
    #[validate(range(min = 0.0, message = "The unit price may not be negative."))]
    pub unit_price: Option<f64>,
    pub renewable: Option<bool>,
    pub available: Option<bool>,
    pub sort_order: Option<i64>,
}

/// POST /api/prescription-types
pub async fn store(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    body: web::Json<StorePrescriptionTypeRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    if catalogs::prescription_type_code_exists(pool, &body.code, None).await? {
        return Err(ApiError::field("code", "The code is already taken."));
    }

    let ptype = catalogs::insert_prescription_type(
        pool,
        NewPrescriptionType {
            code: body.code,
            name: body.name,
            description: body.description,
            category: body.category,
            kind: body.kind,
            unit_price: body.unit_price.unwrap_or(0.0),
            renewable: body.renewable.unwrap_or(false),
            available: body.available.unwrap_or(true),
            sort_order: body.sort_order.unwrap_or(0),
        },
    )
    .await?;

    info!(prescription_type_id = ptype.id, "prescription type created");
    Ok(response::created("Prescription type created.", ptype))
}

/// GET /api/prescription-types/{id}
pub async fn show(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let ptype = catalogs::find_prescription_type(state.db.pool(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Prescription type"))?;
    Ok(response::ok(ptype))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePrescriptionTypeRequest {
    #[validate(length(min = 1, max = 20, message = "The code may not be empty."))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 150, message = "The name may not be empty."))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100, message = "The category may not be empty."))]
    pub category: Option<String>,
    pub kind: Option<PrescriptionTypeKind>,
    #[validate(range(min = 0.0, message = "The unit price may not be negative."))]
    pub unit_price: Option<f64>,
    pub renewable: Option<bool>,
    pub available: Option<bool>,
    pub sort_order: Option<i64>,
}

/// PUT /api/prescription-types/{id}
pub async fn update(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
    body: web::Json<UpdatePrescriptionTypeRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let id = path.into_inner();
    let mut ptype = catalogs::find_prescription_type(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Prescription type"))?;

    if let Some(code) = body.code {
        if catalogs::prescription_type_code_exists(pool, &code, Some(id)).await? {
            return Err(ApiError::field("code", "The code is already taken."));
        }
        ptype.code = code;
    }
    if let Some(name) = body.name {
        ptype.name = name;
    }
    if let Some(description) = body.description {
        ptype.description = Some(description);
    }
    if let Some(category) = body.category {
        ptype.category = category;
    }
    if let Some(kind) = body.kind {
        ptype.kind = kind;
    }
    if let Some(unit_price) = body.unit_price {
        ptype.unit_price = unit_price;
    }
    if let Some(renewable) = body.renewable {
        ptype.renewable = renewable;
    }
    if let Some(available) = body.available {
        ptype.available = available;
    }
    if let Some(sort_order) = body.sort_order {
        ptype.sort_order = sort_order;
    }

    catalogs::update_prescription_type(pool, &ptype).await?;
    let ptype = catalogs::find_prescription_type(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Prescription type"))?;
    Ok(response::ok_with("Prescription type updated.", ptype))
}

/// DELETE /api/prescription-types/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let id = path.into_inner();
    catalogs::find_prescription_type(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Prescription type"))?;

    let usage = catalogs::prescription_type_usage_count(pool, id).await?;
    if usage > 0 {
        return Err(ApiError::ConflictInUse(format!(
            "The prescription type cannot be deleted: {} prescriptions reference it.",
            usage
        )));
    }

    catalogs::delete_prescription_type(pool, id).await?;
    info!(prescription_type_id = id, "prescription type deleted");
    Ok(response::message("Prescription type deleted."))
}
