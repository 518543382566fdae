//! Medicament category catalog. A category holding medicaments cannot be
//! deleted.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::api::extractors::AuthPatient;
use crate::api::response;
use crate::db::catalogs::{self, MedicamentFilter, NewCategory};
use crate::error::ApiError;
use crate::AppState;

/// GET /api/categories
pub async fn index(
    state: web::Data<AppState>,
    _auth: AuthPatient,
) -> Result<HttpResponse, ApiError> {
    let list = catalogs::list_categories(state.db.pool()).await?;
    Ok(response::ok(list))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StoreCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "The name is required."))]
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub sort_order: Option<i64>,
    pub active: Option<bool>,
}

/// POST /api/categories
pub async fn store(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    body: web::Json<StoreCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    if catalogs::category_name_exists(pool, &body.name, None).await? {
        return Err(ApiError::field("name", "The category name is already taken."));
    }

    let category = catalogs::insert_category(
        pool,
        NewCategory {
            name: body.name,
            description: body.description,
            icon: body.icon,
            color: body.color,
            sort_order: body.sort_order.unwrap_or(0),
            active: body.active.unwrap_or(true),
        },
    )
    .await?;

    info!(category_id = category.id, "category created");
    Ok(response::created("Category created.", category))
}

/// GET /api/categories/{id}
pub async fn show(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let category = catalogs::find_category(state.db.pool(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Category"))?;
    Ok(response::ok(category))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "The name may not be empty."))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub sort_order: Option<i64>,
    pub active: Option<bool>,
}

/// PUT /api/categories/{id}
pub async fn update(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
    body: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let id = path.into_inner();
    let mut category = catalogs::find_category(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Category"))?;

    if let Some(name) = body.name {
        if catalogs::category_name_exists(pool, &name, Some(id)).await? {
            return Err(ApiError::field("name", "The category name is already taken."));
        }
        category.name = name;
    }
    if let Some(description) = body.description {
        category.description = Some(description);
    }
    if let Some(icon) = body.icon {
        category.icon = Some(icon);
    }
    if let Some(color) = body.color {
        category.color = Some(color);
    }
    if let Some(sort_order) = body.sort_order {
        category.sort_order = sort_order;
    }
    if let Some(active) = body.active {
        category.active = active;
    }

    catalogs::update_category(pool, &category).await?;
    let category = catalogs::find_category(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Category"))?;
    Ok(response::ok_with("Category updated.", category))
}

/// DELETE /api/categories/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let id = path.into_inner();
    catalogs::find_category(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Category"))?;

    let count = catalogs::category_medicament_count(pool, id).await?;
    if count > 0 {
        return Err(ApiError::ConflictInUse(format!(
            "The category cannot be deleted: {} medicaments belong to it.",
            count
        )));
    }

    catalogs::delete_category(pool, id).await?;
    info!(category_id = id, "category deleted");
    Ok(response::message("Category deleted."))
}

/// GET /api/categories/{id}/medicaments
pub async fn medicaments(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let id = path.into_inner();
    if !catalogs::category_exists(pool, id).await? {
        return Err(ApiError::NotFound("Category"));
    }
    let list = catalogs::list_medicaments(
        pool,
        MedicamentFilter {
            category_id: Some(id),
            available: None,
        },
    )
    .await?;
    Ok(response::ok(list))
}
