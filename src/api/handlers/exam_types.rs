//! Exam type catalog. Codes are unique; a type referenced by exams cannot
//! be deleted.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::api::extractors::AuthPatient;
use crate::api::response;
use crate::db::catalogs::{self, NewExamType};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

/// GET /api/exam-types
pub async fn index(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let list = catalogs::list_exam_types(state.db.pool(), query.into_inner().category).await?;
    Ok(response::ok(list))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StoreExamTypeRequest {
    #[validate(length(min = 1, max = 20, message = "The code is required."))]
    pub code: String,
    #[validate(length(min = 1, max = 150, message = "The name is required."))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100, message = "The category is required."))]
    pub category: String,
    pub urgent_possible: Option<bool>,
    pub available: Option<bool>,
    pub sort_order: Option<i64>,
}

/// POST /api/exam-types
pub async fn store(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    body: web::Json<StoreExamTypeRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    if catalogs::exam_type_code_exists(pool, &body.code, None).await? {
        return Err(ApiError::field("code", "The code is already taken."));
    }

    let exam_type = catalogs::insert_exam_type(
        pool,
        NewExamType {
            code: body.code,
            name: body.name,
            description: body.description,
            category: body.category,
            urgent_possible: body.urgent_possible.unwrap_or(false),
            available: body.available.unwrap_or(true),
            sort_order: body.sort_order.unwrap_or(0),
        },
    )
    .await?;

    info!(exam_type_id = exam_type.id, "exam type created");
    Ok(response::created("Exam type created.", exam_type))
}

/// GET /api/exam-types/{id}
pub async fn show(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let exam_type = catalogs::find_exam_type(state.db.pool(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Exam type"))?;
    Ok(response::ok(exam_type))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateExamTypeRequest {
    #[validate(length(min = 1, max = 20, message = "The code may not be empty."))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 150, message = "The name may not be empty."))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100, message = "The category may not be empty."))]
    pub category: Option<String>,
    pub urgent_possible: Option<bool>,
    pub available: Option<bool>,
    pub sort_order: Option<i64>,
}

/// PUT /api/exam-types/{id}
pub async fn update(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
    body: web::Json<UpdateExamTypeRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let id = path.into_inner();
    let mut exam_type = catalogs::find_exam_type(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Exam type"))?;

    if let Some(code) = body.code {
        if catalogs::exam_type_code_exists(pool, &code, Some(id)).await? {
            return Err(ApiError::field("code", "The code is already taken."));
        }
        exam_type.code = code;
    }
    if let Some(name) = body.name {
        exam_type.name = name;
    }
    if let Some(description) = body.description {
        exam_type.description = Some(description);
    }
    if let Some(category) = body.category {
        exam_type.category = category;
    }
    if let Some(urgent_possible) = body.urgent_possible {
        exam_type.urgent_possible = urgent_possible;
    }
    if let Some(available) = body.available {
        exam_type.available = available;
    }
    if let Some(sort_order) = body.sort_order {
        exam_type.sort_order = sort_order;
    }

    catalogs::update_exam_type(pool, &exam_type).await?;
    let exam_type = catalogs::find_exam_type(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Exam type"))?;
    Ok(response::ok_with("Exam type updated.", exam_type))
}

/// DELETE /api/exam-types/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let id = path.into_inner();
    catalogs::find_exam_type(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Exam type"))?;

    let usage = catalogs::exam_type_usage_count(pool, id).await?;
    if usage > 0 {
        return Err(ApiError::ConflictInUse(format!(
            "The exam type cannot be deleted: {} exams reference it.",
            usage
        )));
    }

    catalogs::delete_exam_type(pool, id).await?;
    info!(exam_type_id = id, "exam type deleted");
    Ok(response::message("Exam type deleted."))
}
