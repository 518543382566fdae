//! Medicament catalog CRUD and search. Deletion is guarded: a medicament
//! referenced by prescriptions or treatments cannot be removed.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::api::extractors::AuthPatient;
use crate::api::response;
use crate::db::catalogs::{self, MedicamentFilter, NewMedicament};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category_id: Option<i64>,
    pub available: Option<bool>,
}

/// GET /api/medicaments
pub async fn index(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let list = catalogs::list_medicaments(
        state.db.pool(),
        MedicamentFilter {
            category_id: query.category_id,
            available: query.available,
        },
    )
    .await?;
    Ok(response::ok(list))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /api/medicaments/search?q=...
pub async fn search(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let term = query
        .into_inner()
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("The search term q is required.".into()))?;
    let list = catalogs::search_medicaments(state.db.pool(), term.trim()).await?;
    Ok(response::ok(list))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StoreMedicamentRequest {
    #[validate(length(min = 1, max = 150, message = "The name is required."))]
    pub name: String,
    #[validate(length(min = 1, message = "The description is required."))]
    pub description: String,
    pub category_id: i64,
    pub form: Option<String>,
    pub indications: Option<String>,
    pub contraindications: Option<String>,
    pub side_effects: Option<String>,
    pub dosage: Option<String>,
    pub interactions: Option<String>,
    pub available: Option<bool>,
}

/// POST /api/medicaments
pub async fn store(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    body: web::Json<StoreMedicamentRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    if !catalogs::category_exists(pool, body.category_id).await? {
        return Err(ApiError::field(
            "category_id",
            "The selected category does not exist.",
        ));
    }

    let medicament = catalogs::insert_medicament(
        pool,
        NewMedicament {
            name: body.name,
            description: body.description,
            category_id: body.category_id,
            form: body.form,
            indications: body.indications,
            contraindications: body.contraindications,
            side_effects: body.side_effects,
            dosage: body.dosage,
            interactions: body.interactions,
            available: body.available.unwrap_or(true),
        },
    )
    .await?;

    info!(medicament_id = medicament.id, "medicament created");
    Ok(response::created("Medicament created.", medicament))
}

/// GET /api/medicaments/{id}
pub async fn show(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let medicament = catalogs::find_medicament(state.db.pool(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Medicament"))?;
    Ok(response::ok(medicament))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMedicamentRequest {
    #[validate(length(min = 1, max = 150, message = "The name may not be empty."))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "The description may not be empty."))]
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub form: Option<String>,
    pub indications: Option<String>,
    pub contraindications: Option<String>,
    pub side_effects: Option<String>,
    pub dosage: Option<String>,
    pub interactions: Option<String>,
    pub available: Option<bool>,
}

/// PUT /api/medicaments/{id}
pub async fn update(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
    body: web::Json<UpdateMedicamentRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let pool = state.db.pool();
    let mut medicament = catalogs::find_medicament(pool, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Medicament"))?;

    if let Some(category_id) = body.category_id {
        if !catalogs::category_exists(pool, category_id).await? {
            return Err(ApiError::field(
                "category_id",
                "The selected category does not exist.",
            ));
        }
        medicament.category_id = category_id;
    }
    if let Some(name) = body.name {
        medicament.name = name;
    }
    if let Some(description) = body.description {
        medicament.description = description;
    }
    if let Some(form) = body.form {
        medicament.form = Some(form);
    }
    if let Some(indications) = body.indications {
        medicament.indications = Some(indications);
    }
    if let Some(contraindications) = body.contraindications {
        medicament.contraindications = Some(contraindications);
    }
    if let Some(side_effects) = body.side_effects {
        medicament.side_effects = Some(side_effects);
    }
    if let Some(dosage) = body.dosage {
        medicament.dosage = Some(dosage);
    }
    if let Some(interactions) = body.interactions {
        medicament.interactions = Some(interactions);
    }
    if let Some(available) = body.available {
        medicament.available = available;
    }

    catalogs::update_medicament(pool, &medicament).await?;
    let medicament = catalogs::find_medicament(pool, medicament.id)
        .await?
        .ok_or(ApiError::NotFound("Medicament"))?;
    Ok(response::ok_with("Medicament updated.", medicament))
}

/// DELETE /api/medicaments/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    _auth: AuthPatient,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let id = path.into_inner();
    catalogs::find_medicament(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Medicament"))?;

    let usage = catalogs::medicament_usage_count(pool, id).await?;
    if usage > 0 {
        return Err(ApiError::ConflictInUse(format!(
            "The medicament cannot be deleted: {} prescriptions or treatments reference it.",
            usage
        )));
    }

    catalogs::delete_medicament(pool, id).await?;
    info!(medicament_id = id, "medicament deleted");
    Ok(response::message("Medicament deleted."))
}
